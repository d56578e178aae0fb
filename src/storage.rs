use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;

use crate::backend::BackendError;
use crate::rest::read_body;

pub const MAX_LOGO_BYTES: u64 = 5 * 1024 * 1024;
const LOGO_DIR: &str = "logos";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("the file must be an image (got {0})")]
    NotAnImage(String),
    #[error("the image cannot be larger than 5 MB ({0} bytes)")]
    TooLarge(u64),
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },
    #[error("upload failed: {0}")]
    Upload(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Public URL stored in `team_info.logo_url`.
    pub url: String,
    /// Object path inside the bucket.
    pub path: String,
}

pub trait AssetStore: Send + Sync {
    fn upload(&self, path: &str, bytes: Vec<u8>, mime: &str) -> Result<UploadedAsset, BackendError>;

    fn remove(&self, path: &str) -> Result<(), BackendError>;

    fn set_access_token(&self, _token: Option<&str>) {}
}

impl<T: AssetStore + ?Sized> AssetStore for std::sync::Arc<T> {
    fn upload(&self, path: &str, bytes: Vec<u8>, mime: &str) -> Result<UploadedAsset, BackendError> {
        (**self).upload(path, bytes, mime)
    }

    fn remove(&self, path: &str) -> Result<(), BackendError> {
        (**self).remove(path)
    }

    fn set_access_token(&self, token: Option<&str>) {
        (**self).set_access_token(token)
    }
}

/// MIME type guessed from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

pub fn validate_logo(mime: &str, size: u64) -> Result<(), AssetError> {
    if !mime.starts_with("image/") {
        return Err(AssetError::NotAnImage(mime.to_string()));
    }
    if size > MAX_LOGO_BYTES {
        return Err(AssetError::TooLarge(size));
    }
    Ok(())
}

pub fn logo_object_path(ext: &str, millis: i64) -> String {
    format!("{LOGO_DIR}/logo_{millis}.{}", ext.to_ascii_lowercase())
}

/// Object path for a logo URL this app uploaded; other URLs are not ours to delete.
pub fn logo_storage_path(url: &str) -> Option<String> {
    let (_, name) = url.split_once("/logos/")?;
    let name = name.split(['?', '#']).next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    Some(format!("{LOGO_DIR}/{name}"))
}

pub fn upload_logo(store: &dyn AssetStore, file: &Path) -> Result<UploadedAsset, AssetError> {
    let io_err = |e: std::io::Error| AssetError::Io {
        path: file.display().to_string(),
        message: e.to_string(),
    };
    let mime = mime_for_path(file);
    let size = fs::metadata(file).map_err(io_err)?.len();
    validate_logo(mime, size)?;
    let bytes = fs::read(file).map_err(io_err)?;
    let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("img");
    let path = logo_object_path(ext, Utc::now().timestamp_millis());
    Ok(store.upload(&path, bytes, mime)?)
}

/// Removes the stored object behind `url`. Returns false when the URL does
/// not point at an uploaded logo.
pub fn delete_logo(store: &dyn AssetStore, url: &str) -> Result<bool, BackendError> {
    let Some(path) = logo_storage_path(url) else {
        return Ok(false);
    };
    store.remove(&path)?;
    Ok(true)
}

/// Storage endpoint of a hosted project (`{base}/storage/v1`).
pub struct StorageClient {
    client: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    access_token: RwLock<Option<String>>,
}

impl StorageClient {
    pub fn new(client: Client, base_url: &str, anon_key: &str, bucket: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            bucket: bucket.to_string(),
            access_token: RwLock::new(None),
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.base_url, self.bucket
        )
    }

    fn bearer(&self) -> String {
        let token = self
            .access_token
            .read()
            .ok()
            .and_then(|t| t.clone())
            .unwrap_or_else(|| self.anon_key.clone());
        format!("Bearer {token}")
    }
}

impl AssetStore for StorageClient {
    fn upload(&self, path: &str, bytes: Vec<u8>, mime: &str) -> Result<UploadedAsset, BackendError> {
        let resp = self
            .client
            .post(format!(
                "{}/storage/v1/object/{}/{path}",
                self.base_url, self.bucket
            ))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, mime)
            .header("x-upsert", "false")
            .header("cache-control", "max-age=3600")
            .body(bytes)
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        read_body(resp)?;
        Ok(UploadedAsset {
            url: self.public_url(path),
            path: path.to_string(),
        })
    }

    fn remove(&self, path: &str) -> Result<(), BackendError> {
        let resp = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, self.bearer())
            .json(&serde_json::json!({ "prefixes": [path] }))
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        read_body(resp).map(|_| ())
    }

    fn set_access_token(&self, token: Option<&str>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token.map(str::to_string);
        }
    }
}

/// Bucket kept in memory, for demo mode and tests.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryAssets {
    pub const BASE_URL: &'static str = "memory://team-assets";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl AssetStore for MemoryAssets {
    fn upload(&self, path: &str, bytes: Vec<u8>, _mime: &str) -> Result<UploadedAsset, BackendError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| BackendError::Transport("asset store poisoned".to_string()))?;
        if objects.contains_key(path) {
            return Err(BackendError::Http {
                status: 409,
                code: Some("Duplicate".to_string()),
                message: "The resource already exists".to_string(),
            });
        }
        objects.insert(path.to_string(), bytes);
        Ok(UploadedAsset {
            url: format!("{}/{path}", Self::BASE_URL),
            path: path.to_string(),
        })
    }

    fn remove(&self, path: &str) -> Result<(), BackendError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| BackendError::Transport("asset store poisoned".to_string()))?;
        objects.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rejects_non_images_and_large_files() {
        assert!(matches!(
            validate_logo("application/pdf", 10),
            Err(AssetError::NotAnImage(_))
        ));
        assert!(matches!(
            validate_logo("image/png", MAX_LOGO_BYTES + 1),
            Err(AssetError::TooLarge(_))
        ));
        assert!(validate_logo("image/png", MAX_LOGO_BYTES).is_ok());
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_path(Path::new("crest.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("crest.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn only_logo_urls_map_to_paths() {
        assert_eq!(
            logo_storage_path(
                "https://abc.supabase.co/storage/v1/object/public/team-assets/logos/logo_17.png"
            ),
            Some("logos/logo_17.png".to_string())
        );
        assert_eq!(logo_storage_path("https://cdn.example.com/crest.png"), None);
        assert_eq!(logo_storage_path("https://x/logos/"), None);
        assert_eq!(logo_object_path("PNG", 42), "logos/logo_42.png");
    }

    #[test]
    fn upload_then_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("crest.png");
        fs::File::create(&file).unwrap().write_all(b"\x89PNG").unwrap();

        let store = MemoryAssets::new();
        let asset = upload_logo(&store, &file).unwrap();
        assert!(asset.path.starts_with("logos/logo_"));
        assert!(asset.url.ends_with(&asset.path));
        assert_eq!(store.paths(), vec![asset.path.clone()]);

        assert!(delete_logo(&store, &asset.url).unwrap());
        assert!(store.paths().is_empty());
        assert!(!delete_logo(&store, "https://cdn.example.com/crest.png").unwrap());
    }

    #[test]
    fn non_image_file_is_not_uploaded() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("roster.pdf");
        fs::write(&file, b"%PDF").unwrap();
        let store = MemoryAssets::new();
        assert!(matches!(
            upload_logo(&store, &file),
            Err(AssetError::NotAnImage(_))
        ));
        assert!(store.paths().is_empty());
    }
}

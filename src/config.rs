use std::env;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::callups::DEFAULT_SQUAD_SIZE;
use crate::http_client::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_SEASON: &str = "2025";
pub const DEFAULT_ASSET_BUCKET: &str = "team-assets";
pub const DEFAULT_LAST_MATCHES: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub supabase_url: String,
    pub anon_key: String,
    pub season: String,
    pub squad_size: usize,
    pub asset_bucket: String,
    pub last_matches: usize,
    pub http_timeout: Duration,
    /// In-memory demo club instead of the hosted project.
    pub demo: bool,
}

impl Config {
    /// Reads the process environment. `.env.local`/`.env` are loaded by the
    /// binary before this is called.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let opt = |key: &str| {
            lookup(key).and_then(|val| {
                if val.trim().is_empty() {
                    None
                } else {
                    Some(val.trim().to_string())
                }
            })
        };

        let demo = opt("CLUB_DEMO").is_some_and(|val| is_truthy(&val));
        let supabase_url = opt("SUPABASE_URL").unwrap_or_default();
        let anon_key = opt("SUPABASE_ANON_KEY").unwrap_or_default();
        if !demo && (supabase_url.is_empty() || anon_key.is_empty()) {
            bail!("SUPABASE_URL and SUPABASE_ANON_KEY must be set (or CLUB_DEMO=1 for the demo club)");
        }

        let season = opt("CLUB_SEASON").unwrap_or_else(|| DEFAULT_SEASON.to_string());
        let squad_size = opt("CLUB_SQUAD_SIZE")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_SQUAD_SIZE)
            .clamp(1, 40);
        let asset_bucket =
            opt("CLUB_ASSET_BUCKET").unwrap_or_else(|| DEFAULT_ASSET_BUCKET.to_string());
        let last_matches = opt("CLUB_LAST_MATCHES")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_LAST_MATCHES)
            .clamp(1, 20);
        let http_timeout = Duration::from_secs(
            opt("CLUB_HTTP_TIMEOUT_SECS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .max(2),
        );

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            anon_key,
            season,
            squad_size,
            asset_bucket,
            last_matches,
            http_timeout,
            demo,
        })
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(cfg.supabase_url, "https://abc.supabase.co");
        assert_eq!(cfg.season, "2025");
        assert_eq!(cfg.squad_size, 18);
        assert_eq!(cfg.asset_bucket, "team-assets");
        assert_eq!(cfg.last_matches, 8);
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert!(!cfg.demo);
    }

    #[test]
    fn missing_credentials_fail_outside_demo() {
        assert!(Config::from_lookup(lookup(&[("SUPABASE_URL", "https://x")])).is_err());
        let cfg = Config::from_lookup(lookup(&[("CLUB_DEMO", "true")])).unwrap();
        assert!(cfg.demo);
    }

    #[test]
    fn numeric_keys_are_clamped() {
        let cfg = Config::from_lookup(lookup(&[
            ("CLUB_DEMO", "1"),
            ("CLUB_SQUAD_SIZE", "99"),
            ("CLUB_LAST_MATCHES", "0"),
            ("CLUB_HTTP_TIMEOUT_SECS", "1"),
            ("CLUB_SEASON", "2026"),
        ]))
        .unwrap();
        assert_eq!(cfg.squad_size, 40);
        assert_eq!(cfg.last_matches, 1);
        assert_eq!(cfg.http_timeout, Duration::from_secs(2));
        assert_eq!(cfg.season, "2026");
    }

    #[test]
    fn unparsable_values_fall_back() {
        let cfg = Config::from_lookup(lookup(&[("CLUB_DEMO", "yes"), ("CLUB_SQUAD_SIZE", "eleven")]))
            .unwrap();
        assert_eq!(cfg.squad_size, DEFAULT_SQUAD_SIZE);
    }
}

use std::sync::RwLock;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

use crate::backend::{Backend, BackendError, Query};

/// PostgREST endpoint of a hosted project (`{base}/rest/v1`).
pub struct RestBackend {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl RestBackend {
    pub fn new(client: Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: RwLock::new(None),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let token = self
            .access_token
            .read()
            .ok()
            .and_then(|t| t.clone())
            .unwrap_or_else(|| self.anon_key.clone());
        req.header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {token}"))
    }

    fn send_rows(&self, req: RequestBuilder) -> Result<Vec<Value>, BackendError> {
        let resp = self
            .authorize(req)
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let body = read_body(resp)?;
        parse_rows(&body)
    }
}

impl Backend for RestBackend {
    fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        let req = self
            .client
            .get(self.table_url(&query.table))
            .query(&encode_query(query));
        self.send_rows(req)
    }

    fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>, BackendError> {
        let req = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(rows);
        self.send_rows(req)
    }

    fn update(&self, table: &str, id: i64, patch: &Value) -> Result<Value, BackendError> {
        let req = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(patch);
        self.send_rows(req)?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("{table} id {id}")))
    }

    fn delete(&self, table: &str, id: i64) -> Result<(), BackendError> {
        let req = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{id}"))]);
        self.send_rows(req).map(|_| ())
    }

    fn upsert(
        &self,
        table: &str,
        rows: &[Value],
        on_conflict: &[&str],
    ) -> Result<Vec<Value>, BackendError> {
        let req = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", on_conflict.join(","))])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(rows);
        self.send_rows(req)
    }

    fn set_access_token(&self, token: Option<&str>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token.map(str::to_string);
        }
    }
}

/// Query-string pairs in PostgREST syntax.
pub fn encode_query(query: &Query) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), query.columns.replace(' ', ""))];
    for (column, value) in &query.filters {
        let filter = match value {
            Value::Null => "is.null".to_string(),
            Value::String(s) => format!("eq.{s}"),
            other => format!("eq.{other}"),
        };
        pairs.push((column.clone(), filter));
    }
    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|(col, asc)| format!("{col}.{}", if *asc { "asc" } else { "desc" }))
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("order".to_string(), order));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

/// Body of a response, or the backend's error if the status is not 2xx.
pub(crate) fn read_body(resp: Response) -> Result<String, BackendError> {
    let status = resp.status();
    let json_body = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("json"));
    let body = resp
        .text()
        .map_err(|e| BackendError::Transport(format!("failed reading body: {e}")))?;
    if status.is_success() {
        return Ok(body);
    }
    if json_body || body.trim_start().starts_with('{') {
        return Err(parse_error_body(status, &body));
    }
    Err(BackendError::Http {
        status: status.as_u16(),
        code: None,
        message: if body.trim().is_empty() {
            status.to_string()
        } else {
            body
        },
    })
}

fn parse_rows(body: &str) -> Result<Vec<Value>, BackendError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(row @ Value::Object(_)) => Ok(vec![row]),
        Ok(other) => Err(BackendError::Decode(format!("unexpected payload: {other}"))),
        Err(e) => Err(BackendError::Decode(e.to_string())),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Error payloads from PostgREST (`code`/`message`), GoTrue
/// (`error_description`/`msg`) and Storage (`error`/`message`).
pub fn parse_error_body(status: StatusCode, body: &str) -> BackendError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = match parsed.code {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => parsed.error_code,
    };
    let message = parsed
        .message
        .or(parsed.error_description)
        .or(parsed.msg)
        .or(parsed.error)
        .unwrap_or_else(|| status.to_string());
    BackendError::Http {
        status: status.as_u16(),
        code,
        message,
    }
}

use serde_json::Value;
use thiserror::Error;

/// Postgres `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("{message}")]
    Http {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl BackendError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, BackendError::Http { code: Some(code), .. } if code == UNIQUE_VIOLATION)
    }

    /// Message reported by the backend itself, when it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            BackendError::Http { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    /// Text for a notification: the backend's own message verbatim when it
    /// sent one, a generic failure otherwise.
    pub fn user_message(&self) -> String {
        match self.backend_message() {
            Some(message) => message.to_string(),
            None => format!("The operation could not be completed ({self})"),
        }
    }
}

/// Read request against one table: eq-filters, ordering and an optional limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub columns: String,
    pub filters: Vec<(String, Value)>,
    pub order: Vec<(String, bool)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(name: &str) -> Self {
        Self {
            table: name.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Table-level operations the club data layer needs from the hosted database.
pub trait Backend: Send + Sync {
    fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError>;

    fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>, BackendError>;

    fn update(&self, table: &str, id: i64, patch: &Value) -> Result<Value, BackendError>;

    fn delete(&self, table: &str, id: i64) -> Result<(), BackendError>;

    fn upsert(
        &self,
        table: &str,
        rows: &[Value],
        on_conflict: &[&str],
    ) -> Result<Vec<Value>, BackendError>;

    /// Bearer token for row-level security; `None` falls back to the anon key.
    fn set_access_token(&self, _token: Option<&str>) {}
}

impl<T: Backend + ?Sized> Backend for std::sync::Arc<T> {
    fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        (**self).select(query)
    }

    fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>, BackendError> {
        (**self).insert(table, rows)
    }

    fn update(&self, table: &str, id: i64, patch: &Value) -> Result<Value, BackendError> {
        (**self).update(table, id, patch)
    }

    fn delete(&self, table: &str, id: i64) -> Result<(), BackendError> {
        (**self).delete(table, id)
    }

    fn upsert(
        &self,
        table: &str,
        rows: &[Value],
        on_conflict: &[&str],
    ) -> Result<Vec<Value>, BackendError> {
        (**self).upsert(table, rows, on_conflict)
    }

    fn set_access_token(&self, token: Option<&str>) {
        (**self).set_access_token(token)
    }
}

/// First row of a query, if any.
pub fn select_one(backend: &dyn Backend, query: Query) -> Result<Option<Value>, BackendError> {
    let rows = backend.select(&query.limit(1))?;
    Ok(rows.into_iter().next())
}

//! Request model: what the gateway hands to a transport and what comes back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{MSG_BUSINESS_FALLBACK, RequestFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

/// One part of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// ApiRequest は transport に渡される 1 回分のリクエスト
///
/// `path` は base URL からの相対パス（例: `/price-reference`）。
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Flattens a JSON object into query pairs. Nulls are skipped, other
    /// non-string scalars use their JSON text.
    pub fn with_query_object(mut self, params: &Value) -> Self {
        if let Some(map) = params.as_object() {
            for (key, value) in map {
                let text = match value {
                    Value::Null => continue,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                self.query.push((key.clone(), text));
            }
        }
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }
}

/// Per-call options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestOptions {
    /// No busy indicator and no error notification for this call.
    pub silent: bool,
}

impl RequestOptions {
    pub fn silent() -> Self {
        Self { silent: true }
    }
}

/// A response the transport considered successful (2xx).
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// Checks the business envelope: `"success": false` turns a transport
    /// success into a failure carrying `error`, then `message`, then a
    /// fallback text.
    pub fn into_result(self) -> Result<Value, RequestFailure> {
        if self.body.get("success").and_then(Value::as_bool) == Some(false) {
            let message = ["error", "message"]
                .iter()
                .filter_map(|field| self.body.get(*field).and_then(Value::as_str))
                .find(|s| !s.is_empty())
                .unwrap_or(MSG_BUSINESS_FALLBACK)
                .to_string();
            return Err(RequestFailure::business(self.status, message));
        }
        Ok(self.body)
    }
}

/// Why a transport call did not produce a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    /// No response before the transport's deadline.
    Timeout,
    /// No response; connection-level failure.
    Network(String),
    /// A response with a non-success status.
    Status { status: u16, body: Option<Value> },
    /// Anything else (request construction, unreadable body, ...).
    Other(String),
}

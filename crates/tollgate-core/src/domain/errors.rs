//! Errors - エラー型と分類
//!
//! Gateway の失敗はすべて `classify` を通して `RequestFailure` に正規化されます。
//! 分類は決定的な全域関数で、同じ失敗からは常に同じカテゴリとメッセージが得られます。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::request::TransportFailure;

/// ErrorCategory はユーザー向けメッセージの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 400
    Validation,
    /// 401
    Auth,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 500
    Server,
    /// 502 / 503
    Unavailable,
    Timeout,
    Network,
    /// transport は成功したが payload が `success: false` を宣言した
    BusinessFailure,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Forbidden => "forbidden",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Server => "server",
            ErrorCategory::Unavailable => "unavailable",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Network => "network",
            ErrorCategory::BusinessFailure => "business_failure",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MSG_TIMEOUT: &str = "请求超时，请检查网络后重试";
pub const MSG_NETWORK: &str = "网络连接失败，请检查您的网络";
pub const MSG_GENERIC: &str = "请求失败，请稍后重试";
pub const MSG_BAD_REQUEST: &str = "请求参数错误";
pub const MSG_UNAUTHORIZED: &str = "未授权，请重新登录";
pub const MSG_FORBIDDEN: &str = "没有权限访问";
pub const MSG_NOT_FOUND: &str = "请求的资源不存在";
pub const MSG_SERVER: &str = "服务器内部错误";
pub const MSG_UNAVAILABLE: &str = "服务暂时不可用，请稍后重试";
pub const MSG_BUSINESS_FALLBACK: &str = "操作失败";

/// A classified, user-presentable request failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RequestFailure {
    pub category: ErrorCategory,
    /// HTTP status when a response was received.
    pub status: Option<u16>,
    pub message: String,
}

impl RequestFailure {
    pub fn new(category: ErrorCategory, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            category,
            status,
            message: message.into(),
        }
    }

    /// Failure declared by the payload of an otherwise successful response.
    pub fn business(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::BusinessFailure, Some(status), message)
    }
}

/// Maps a transport failure to its category and message.
///
/// Only 400, 500 and unmapped statuses prefer the server-supplied `detail`.
pub fn classify(failure: &TransportFailure) -> RequestFailure {
    match failure {
        TransportFailure::Timeout => RequestFailure::new(ErrorCategory::Timeout, None, MSG_TIMEOUT),
        TransportFailure::Network(_) => {
            RequestFailure::new(ErrorCategory::Network, None, MSG_NETWORK)
        }
        TransportFailure::Other(_) => RequestFailure::new(ErrorCategory::Unknown, None, MSG_GENERIC),
        TransportFailure::Status { status, body } => {
            let detail = body.as_ref().and_then(detail_of);
            let status = *status;
            let (category, message) = match status {
                400 => (
                    ErrorCategory::Validation,
                    detail.unwrap_or(MSG_BAD_REQUEST).to_string(),
                ),
                401 => (ErrorCategory::Auth, MSG_UNAUTHORIZED.to_string()),
                403 => (ErrorCategory::Forbidden, MSG_FORBIDDEN.to_string()),
                404 => (ErrorCategory::NotFound, MSG_NOT_FOUND.to_string()),
                500 => (
                    ErrorCategory::Server,
                    detail.unwrap_or(MSG_SERVER).to_string(),
                ),
                502 | 503 => (ErrorCategory::Unavailable, MSG_UNAVAILABLE.to_string()),
                _ => (
                    ErrorCategory::Unknown,
                    detail
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("请求失败 ({status})")),
                ),
            };
            RequestFailure::new(category, Some(status), message)
        }
    }
}

fn detail_of(body: &Value) -> Option<&str> {
    body.get("detail")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// GatewayError は RequestGateway の呼び出し結果のエラー
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Request(#[from] RequestFailure),

    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::Request(failure) => failure.category,
            GatewayError::Decode(_) => ErrorCategory::Unknown,
        }
    }

    /// The text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Request(failure) => failure.message.clone(),
            GatewayError::Decode(_) => MSG_GENERIC.to_string(),
        }
    }
}

/// StoreError は KeyValueStore の操作エラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encode failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// DraftError は DraftCache の書き込み系操作のエラー
///
/// 壊れた draft の読み込みはここに含まれない（ローカルで回復する）。
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft store failed: {0}")]
    Store(#[from] StoreError),

    #[error("draft defaults must be a JSON object")]
    DefaultsNotObject,
}

/// ReportError は perf baseline の走査・書き出しのエラー
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("build output not found: {}", .0.display())]
    MissingEntry(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

//! HttpTransport port - HTTP 送受信の抽象化
//!
//! transport は「レスポンスが返ったか」と「ステータスが成功か」だけを判断します。
//! 業務エンベロープ（`success: false`）の解釈やメッセージ分類は Gateway の責務です。
//!
//! # 実装
//! - **ReqwestTransport**: 本番用（impls/reqwest_transport）
//! - テストではスクリプト化した fake を使う

use async_trait::async_trait;

use crate::domain::{ApiRequest, TransportFailure, TransportResponse};

/// HttpTransport は 1 リクエストを送り、2xx なら `TransportResponse` を返す
///
/// # Thread Safety
/// - `Send + Sync` を要求（Gateway は `Arc<dyn HttpTransport>` で共有する）
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<TransportResponse, TransportFailure>;
}

//! RequestGateway - すべての外向き HTTP 呼び出しの入口
//!
//! 各呼び出しに対して以下を一貫して行います：
//! 1. busy indicator の参照カウント（`BusyTracker`）
//! 2. transport の失敗 / 業務エンベロープの失敗を `RequestFailure` に分類
//! 3. 失敗時のユーザー通知（1 呼び出しにつき最大 1 回）
//!
//! `RequestOptions::silent` の呼び出しは 1 と 3 を行いません。
//!
//! # 失敗チャネル
//! transport の失敗と `success: false` はどちらも `GatewayError::Request` として返ります。
//! transport が失敗した場合は body の業務フラグを見ません（transport 側が優先）。

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;

use crate::app::busy::{BusyGuard, BusyTracker};
use crate::domain::{
    ApiRequest, FormPart, GatewayError, Method, RequestOptions, classify,
};
use crate::ports::{
    BusyIndicator, HttpTransport, IdGenerator, MessageKind, Notifier, SystemClock, UlidGenerator,
};

/// RequestGateway は transport と UI 側の通知を束ねるサービス
///
/// 起動時に 1 つ作り、`Arc` で共有します。
///
/// # 使用例
/// ```ignore
/// let gateway = RequestGateway::new(transport, notifier.clone(), notifier);
/// let body = gateway.get("/health", None).await?;
/// let quiet = gateway
///     .get_with("/statistics", None, RequestOptions::silent())
///     .await;
/// ```
pub struct RequestGateway {
    transport: Arc<dyn HttpTransport>,
    busy: BusyTracker,
    notifier: Arc<dyn Notifier>,
    ids: Arc<dyn IdGenerator>,
}

impl RequestGateway {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        indicator: Arc<dyn BusyIndicator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            busy: BusyTracker::new(indicator),
            notifier,
            ids: Arc::new(UlidGenerator::new(SystemClock)),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn busy(&self) -> &BusyTracker {
        &self.busy
    }

    /// Sends one request and returns the response body.
    ///
    /// # Errors
    /// `GatewayError::Request` for transport failures and for bodies that
    /// declare `success: false`.
    pub async fn send(
        &self,
        request: ApiRequest,
        options: RequestOptions,
    ) -> Result<Value, GatewayError> {
        let request_id = self.ids.generate_request_id();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            silent = options.silent,
        );
        self.dispatch(request, options).instrument(span).await
    }

    async fn dispatch(
        &self,
        request: ApiRequest,
        options: RequestOptions,
    ) -> Result<Value, GatewayError> {
        let busy = if options.silent {
            BusyGuard::detached()
        } else {
            self.busy.begin()
        };

        let outcome = match self.transport.send(&request).await {
            Ok(response) => response.into_result(),
            Err(failure) => Err(classify(&failure)),
        };
        // indicator を閉じてから通知する
        drop(busy);

        match outcome {
            Ok(body) => {
                tracing::debug!("request succeeded");
                Ok(body)
            }
            Err(failure) => {
                tracing::warn!(
                    category = %failure.category,
                    status = ?failure.status,
                    reason = %failure.message,
                    "request failed"
                );
                self.report(&failure.message, options);
                Err(failure.into())
            }
        }
    }

    /// Like [`send`](Self::send), decoding the body into `T`.
    pub async fn send_as<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        options: RequestOptions,
    ) -> Result<T, GatewayError> {
        let body = self.send(request, options).await?;
        serde_json::from_value(body).map_err(|e| {
            let err = GatewayError::Decode(e);
            tracing::warn!(error = %err, "response body did not match the expected shape");
            self.report(&err.user_message(), options);
            err
        })
    }

    fn report(&self, message: &str, options: RequestOptions) {
        if !options.silent {
            self.notifier.show_message(message, MessageKind::Error);
        }
    }

    pub async fn get(&self, path: &str, query: Option<&Value>) -> Result<Value, GatewayError> {
        self.get_with(path, query, RequestOptions::default()).await
    }

    pub async fn get_with(
        &self,
        path: &str,
        query: Option<&Value>,
        options: RequestOptions,
    ) -> Result<Value, GatewayError> {
        let mut request = ApiRequest::new(Method::Get, path);
        if let Some(query) = query {
            request = request.with_query_object(query);
        }
        self.send(request, options).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value, GatewayError> {
        self.post_with(path, body, RequestOptions::default()).await
    }

    pub async fn post_with(
        &self,
        path: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<Value, GatewayError> {
        self.send(ApiRequest::new(Method::Post, path).with_json(body), options)
            .await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value, GatewayError> {
        self.put_with(path, body, RequestOptions::default()).await
    }

    pub async fn put_with(
        &self,
        path: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<Value, GatewayError> {
        self.send(ApiRequest::new(Method::Put, path).with_json(body), options)
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, GatewayError> {
        self.delete_with(path, RequestOptions::default()).await
    }

    pub async fn delete_with(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Value, GatewayError> {
        self.send(ApiRequest::new(Method::Delete, path), options)
            .await
    }

    /// Multipart POST.
    pub async fn upload(&self, path: &str, parts: Vec<FormPart>) -> Result<Value, GatewayError> {
        self.upload_with(path, parts, RequestOptions::default()).await
    }

    pub async fn upload_with(
        &self,
        path: &str,
        parts: Vec<FormPart>,
        options: RequestOptions,
    ) -> Result<Value, GatewayError> {
        self.send(
            ApiRequest::new(Method::Post, path).with_multipart(parts),
            options,
        )
        .await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingNotifier, ScriptedTransport};
    use super::*;
    use crate::app::busy::testing::RecordingIndicator;
    use crate::domain::errors::{MSG_NOT_FOUND, MSG_TIMEOUT, MSG_UNAUTHORIZED};
    use crate::domain::{ErrorCategory, RequestBody, TransportFailure, TransportResponse};
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;

    struct Harness {
        gateway: RequestGateway,
        transport: Arc<ScriptedTransport>,
        indicator: Arc<RecordingIndicator>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(transport: ScriptedTransport) -> Harness {
        let transport = Arc::new(transport);
        let indicator = Arc::new(RecordingIndicator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let gateway = RequestGateway::new(transport.clone(), indicator.clone(), notifier.clone());
        Harness {
            gateway,
            transport,
            indicator,
            notifier,
        }
    }

    fn status(code: u16) -> TransportFailure {
        TransportFailure::Status {
            status: code,
            body: None,
        }
    }

    #[tokio::test]
    async fn success_returns_body_with_one_indicator_cycle() {
        let h = harness(
            ScriptedTransport::default()
                .reply("/health", Ok(TransportResponse::ok(json!({ "status": "ok" })))),
        );

        let body = h.gateway.get("/health", None).await.unwrap();

        assert_eq!(body, json!({ "status": "ok" }));
        assert_eq!(h.indicator.events(), vec!["show", "hide"]);
        assert!(h.notifier.messages().is_empty());
        assert_eq!(h.gateway.busy().pending(), 0);
    }

    #[tokio::test]
    async fn business_failure_rejects_with_declared_message() {
        let h = harness(ScriptedTransport::default().reply(
            "/price-reference/analyze",
            Ok(TransportResponse::ok(
                json!({ "success": false, "error": "预算字段缺失" }),
            )),
        ));

        let err = h
            .gateway
            .post("/price-reference/analyze", json!({ "item": "server" }))
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::BusinessFailure);
        assert_eq!(err.to_string(), "预算字段缺失");
        assert_eq!(
            h.notifier.messages(),
            vec![("预算字段缺失".to_string(), MessageKind::Error)]
        );
        assert_eq!(h.indicator.events(), vec!["show", "hide"]);
    }

    #[tokio::test]
    async fn status_failures_are_classified_and_notified_once() {
        let h = harness(
            ScriptedTransport::default()
                .reply("/me", Err(status(401)))
                .reply("/missing", Err(status(404))),
        );

        let auth = h.gateway.get("/me", None).await.unwrap_err();
        let missing = h.gateway.get("/missing", None).await.unwrap_err();

        assert_eq!(auth.category(), ErrorCategory::Auth);
        assert_eq!(missing.category(), ErrorCategory::NotFound);
        assert_eq!(
            h.notifier.messages(),
            vec![
                (MSG_UNAUTHORIZED.to_string(), MessageKind::Error),
                (MSG_NOT_FOUND.to_string(), MessageKind::Error),
            ]
        );
        assert_eq!(h.indicator.events(), vec!["show", "hide", "show", "hide"]);
    }

    #[tokio::test]
    async fn silent_calls_have_no_side_effects() {
        let h = harness(
            ScriptedTransport::default()
                .reply("/statistics", Ok(TransportResponse::ok(json!({ "total": 3 }))))
                .reply("/statistics", Err(TransportFailure::Timeout)),
        );

        let ok = h
            .gateway
            .get_with("/statistics", None, RequestOptions::silent())
            .await
            .unwrap();
        let err = h
            .gateway
            .get_with("/statistics", None, RequestOptions::silent())
            .await
            .unwrap_err();

        assert_eq!(ok, json!({ "total": 3 }));
        assert_eq!(err.category(), ErrorCategory::Timeout);
        assert_eq!(err.user_message(), MSG_TIMEOUT);
        assert!(h.indicator.events().is_empty());
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_busy_period() {
        let transport = ScriptedTransport::default();
        let gate_a = transport.gate("/a");
        let gate_b = transport.gate("/b");
        let gate_c = transport.gate("/c");
        let h = harness(transport);

        let release = async {
            tokio::task::yield_now().await;
            assert_eq!(h.gateway.busy().pending(), 3);
            // 開始順と違う順序で終わらせる。途中で失敗も混ぜる。
            gate_b.send(Err(status(503))).unwrap();
            tokio::task::yield_now().await;
            gate_c.send(Ok(TransportResponse::ok(json!(3)))).unwrap();
            tokio::task::yield_now().await;
            gate_a.send(Ok(TransportResponse::ok(json!(1)))).unwrap();
        };

        let (a, b, c, ()) = tokio::join!(
            h.gateway.get("/a", None),
            h.gateway.get("/b", None),
            h.gateway.get("/c", None),
            release,
        );

        assert_eq!(a.unwrap(), json!(1));
        assert_eq!(b.unwrap_err().category(), ErrorCategory::Unavailable);
        assert_eq!(c.unwrap(), json!(3));
        assert_eq!(h.indicator.events(), vec!["show", "hide"]);
        assert_eq!(h.gateway.busy().pending(), 0);
        assert_eq!(h.notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn abandoned_call_releases_the_indicator() {
        let transport = ScriptedTransport::default();
        let _never = transport.gate("/slow");
        let h = harness(transport);

        let result =
            tokio::time::timeout(Duration::from_millis(20), h.gateway.get("/slow", None)).await;

        assert!(result.is_err());
        assert_eq!(h.gateway.busy().pending(), 0);
        assert_eq!(h.indicator.events(), vec!["show", "hide"]);
    }

    #[derive(Default)]
    struct CountingIds {
        issued: std::sync::atomic::AtomicUsize,
    }

    impl IdGenerator for CountingIds {
        fn generate_request_id(&self) -> crate::domain::RequestId {
            self.issued
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            crate::domain::RequestId::from(ulid::Ulid::nil())
        }
    }

    #[tokio::test]
    async fn every_call_gets_a_request_id() {
        let ids = Arc::new(CountingIds::default());
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply("/health", Ok(TransportResponse::ok(json!({}))))
                .reply("/health", Err(status(500))),
        );
        let gateway = RequestGateway::new(
            transport,
            Arc::new(RecordingIndicator::default()),
            Arc::new(RecordingNotifier::default()),
        )
        .with_id_generator(ids.clone());

        gateway.get("/health", None).await.unwrap();
        gateway
            .get_with("/health", None, RequestOptions::silent())
            .await
            .unwrap_err();

        assert_eq!(ids.issued.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Health {
        status: String,
    }

    #[tokio::test]
    async fn send_as_decodes_or_reports() {
        let h = harness(
            ScriptedTransport::default()
                .reply("/health", Ok(TransportResponse::ok(json!({ "status": "ok" }))))
                .reply("/health", Ok(TransportResponse::ok(json!({ "unexpected": 1 })))),
        );

        let ok: Health = h
            .gateway
            .send_as(ApiRequest::new(Method::Get, "/health"), RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(ok.status, "ok");

        let err = h
            .gateway
            .send_as::<Health>(ApiRequest::new(Method::Get, "/health"), RequestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
        assert_eq!(h.notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn verbs_build_the_expected_requests() {
        let h = harness(
            ScriptedTransport::default()
                .reply("/price-reference", Ok(TransportResponse::ok(json!([]))))
                .reply("/items/1", Ok(TransportResponse::ok(json!({}))))
                .reply("/items/1", Ok(TransportResponse::ok(json!({}))))
                .reply("/review-requirements", Ok(TransportResponse::ok(json!({})))),
        );

        h.gateway
            .get("/price-reference", Some(&json!({ "keyword": "laptop" })))
            .await
            .unwrap();
        h.gateway.put("/items/1", json!({ "qty": 2 })).await.unwrap();
        h.gateway.delete("/items/1").await.unwrap();
        h.gateway
            .upload(
                "/review-requirements",
                vec![FormPart::Text {
                    name: "note".into(),
                    value: "draft".into(),
                }],
            )
            .await
            .unwrap();

        let requests = h.transport.requests();
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(
            requests[0].query,
            vec![("keyword".to_string(), "laptop".to_string())]
        );
        assert_eq!(requests[1].method, Method::Put);
        assert_eq!(requests[1].body, RequestBody::Json(json!({ "qty": 2 })));
        assert_eq!(requests[2].method, Method::Delete);
        assert_eq!(requests[3].method, Method::Post);
        assert!(matches!(requests[3].body, RequestBody::Multipart(_)));
    }
}

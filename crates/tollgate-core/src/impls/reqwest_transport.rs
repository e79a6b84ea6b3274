//! ReqwestTransport - reqwest による HttpTransport 実装
//!
//! base URL とタイムアウトは構築時に固定します（GatewayConfig から）。
//! タイムアウトはこの transport の責務で、Gateway 自身は期限を持ちません。

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::domain::{
    ApiRequest, FormPart, Method, RequestBody, TransportFailure, TransportResponse,
};
use crate::ports::HttpTransport;

pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn to_form(parts: &[FormPart]) -> Result<Form, TransportFailure> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());
                if let Some(mime) = content_type {
                    file = file
                        .mime_str(mime)
                        .map_err(|e| TransportFailure::Other(format!("invalid mime: {e}")))?;
                }
                form.part(name.clone(), file)
            }
        };
    }
    Ok(form)
}

fn map_error(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::Timeout
    } else if e.is_connect() || e.is_request() {
        TransportFailure::Network(e.to_string())
    } else {
        TransportFailure::Other(e.to_string())
    }
}

/// 空の body は Null、JSON でない body は文字列のまま渡す
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<TransportResponse, TransportFailure> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), self.url_for(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(parts) => builder.multipart(to_form(parts)?),
        };

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let success = response.status().is_success();
        let bytes = response.bytes().await.map_err(map_error)?;
        let body = parse_body(&bytes);

        if success {
            Ok(TransportResponse { status, body })
        } else {
            let body = (!body.is_null()).then_some(body);
            Err(TransportFailure::Status { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api", listener.local_addr().unwrap());
        (listener, base)
    }

    /// Reads one request head and returns it as text.
    async fn read_head(socket: &mut TcpStream) -> String {
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        String::from_utf8_lossy(&head).into_owned()
    }

    /// Answers one connection with `status` and a JSON body.
    fn respond_once(
        listener: TcpListener,
        status: &'static str,
        body: Value,
    ) -> tokio::task::JoinHandle<String> {
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = read_head(&mut socket).await;
            let body = body.to_string();
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            head
        })
    }

    #[tokio::test]
    async fn hung_server_times_out() {
        let (listener, base) = listener().await;
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });
        let transport = ReqwestTransport::new(base, Duration::from_millis(100)).unwrap();

        let result = transport.send(&ApiRequest::new(Method::Get, "/health")).await;

        assert!(matches!(result, Err(TransportFailure::Timeout)));
        server.abort();
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_failure() {
        let (listener, base) = listener().await;
        drop(listener);
        let transport = ReqwestTransport::new(base, Duration::from_secs(2)).unwrap();

        let result = transport.send(&ApiRequest::new(Method::Get, "/health")).await;

        assert!(matches!(result, Err(TransportFailure::Network(_))));
    }

    #[tokio::test]
    async fn error_status_keeps_the_json_body() {
        let (listener, base) = listener().await;
        let server = respond_once(listener, "404 Not Found", json!({ "detail": "合同不存在" }));
        let transport = ReqwestTransport::new(base, Duration::from_secs(2)).unwrap();

        let result = transport
            .send(&ApiRequest::new(Method::Get, "/contract-analysis/42"))
            .await;

        match result {
            Err(TransportFailure::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, Some(json!({ "detail": "合同不存在" })));
            }
            other => panic!("expected status failure, got {other:?}"),
        }
        let head = server.await.unwrap();
        assert!(head.starts_with("GET /api/contract-analysis/42 "));
    }

    #[tokio::test]
    async fn success_returns_status_and_body_with_query() {
        let (listener, base) = listener().await;
        let server = respond_once(listener, "200 OK", json!({ "items": [] }));
        let transport = ReqwestTransport::new(base, Duration::from_secs(2)).unwrap();
        let request = ApiRequest::new(Method::Get, "/price-reference")
            .with_query("keyword", "laptop")
            .with_query("page", "2");

        let response = transport.send(&request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "items": [] }));
        let head = server.await.unwrap();
        assert!(head.starts_with("GET /api/price-reference?keyword=laptop&page=2 "));
    }

    #[rstest]
    #[case::leading_slash("http://localhost:8000/api", "/health", "http://localhost:8000/api/health")]
    #[case::trailing_slash("http://localhost:8000/api/", "/health", "http://localhost:8000/api/health")]
    #[case::bare_path("http://localhost:8000/api", "health", "http://localhost:8000/api/health")]
    #[case::empty_path("http://localhost:8000/api/", "", "http://localhost:8000/api")]
    fn joins_base_and_path(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        assert_eq!(join_url(base, path), expected);
    }

    #[test]
    fn body_parsing_is_lenient() {
        assert_eq!(parse_body(b""), Value::Null);
        assert_eq!(parse_body(br#"{"ok":true}"#), serde_json::json!({ "ok": true }));
        assert_eq!(parse_body(b"Bad Gateway"), Value::String("Bad Gateway".into()));
    }

    #[test]
    fn multipart_rejects_bad_mime() {
        let parts = vec![FormPart::File {
            name: "file".into(),
            file_name: "a.pdf".into(),
            content_type: Some("not a mime".into()),
            bytes: vec![1, 2, 3],
        }];
        assert!(matches!(to_form(&parts), Err(TransportFailure::Other(_))));
    }
}

//! tollgate-core
//!
//! Client-side runtime building blocks beneath a business web UI.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（errors, request, ids, draft, chunk, asset）
//! - **ports**: 抽象化レイヤー（HttpTransport, Notifier, KeyValueStore, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（gateway, draft_cache, lazy_loader, chunking, perf_baseline など）
//! - **impls**: 実装（InMemoryKeyValueStore, JsonFileStore, ReqwestTransport, TracingNotifier）
//! - **config**: 設定の読み込み（ファイル + `TOLLGATE__*` 環境変数）

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;
pub mod config;

//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryKeyValueStore**: 開発・テスト用の storage
//! - **JsonFileStore**: ファイルに保存する storage
//! - **ReqwestTransport**: reqwest による HTTP transport
//! - **TracingNotifier**: indicator / メッセージをログに出す notifier

pub mod inmem_store;
pub mod file_store;
pub mod reqwest_transport;
pub mod tracing_notifier;

// 主要な型を再エクスポート
pub use self::inmem_store::InMemoryKeyValueStore;
pub use self::file_store::JsonFileStore;
pub use self::reqwest_transport::ReqwestTransport;
pub use self::tracing_notifier::TracingNotifier;

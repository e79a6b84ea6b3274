//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部の能力（HTTP, UI 通知, ローカル永続化, 時刻）への
//! インターフェースで、実装の詳細を隠蔽します。

pub mod transport;
pub mod notifier;
pub mod kv_store;
pub mod clock;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::transport::HttpTransport;
pub use self::notifier::{BusyIndicator, MessageKind, Notifier};
pub use self::kv_store::KeyValueStore;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};

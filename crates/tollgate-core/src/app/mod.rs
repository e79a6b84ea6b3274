//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **RequestGateway**: HTTP 呼び出しの入口（busy indicator・エラー分類・通知）
//! - **BusyTracker**: 同時実行中リクエストの参照カウント
//! - **ApiEndpoints**: バックエンドのエンドポイント表
//! - **DraftCache**: 入力途中のフォームの保存と自動復元
//! - **LazyLoader**: 重いランタイムの単一・再試行可能なロード
//! - **ChunkClassifier**: モジュール ID の vendor bundle 振り分け
//! - **perf_baseline**: ビルド成果物のサイズレポート

pub mod busy;
pub mod gateway;
pub mod endpoints;
pub mod observable;
pub mod draft_cache;
pub mod lazy_loader;
pub mod chunking;
pub mod perf_baseline;

// 主要な型を再エクスポート
pub use self::busy::{BusyGuard, BusyTracker};
pub use self::gateway::RequestGateway;
pub use self::endpoints::ApiEndpoints;
pub use self::observable::ObservableState;
pub use self::draft_cache::DraftCache;
pub use self::lazy_loader::LazyLoader;
pub use self::chunking::ChunkClassifier;

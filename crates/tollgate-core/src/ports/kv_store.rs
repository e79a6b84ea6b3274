//! KeyValueStore port - 同期 key-value 永続化の抽象化
//!
//! 値は文字列（JSON 文字列や `"true"`/`"false"`）。
//!
//! # 実装
//! - **InMemoryKeyValueStore**: テスト・開発用
//! - **JsonFileStore**: 1 ファイルの JSON オブジェクトとして保存（CLI 用）

use crate::domain::StoreError;

/// KeyValueStore は string-keyed な永続化面
///
/// # 設計原則
/// - 同期 API（呼び出し中に他の処理が割り込まない）
/// - 存在しない key の `remove` は成功扱い
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

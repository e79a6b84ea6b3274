//! InMemoryKeyValueStore - 開発・テスト用の key-value store
//!
//! clone したハンドル同士は同じ map を共有します。
//! 「リロード後の新しい DraftCache が同じ storage を見る」状況をテストで再現できます。

use crate::domain::StoreError;
use crate::ports::KeyValueStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// InMemoryKeyValueStore は HashMap ベースの KeyValueStore
///
/// # 使用例
/// ```ignore
/// let store = InMemoryKeyValueStore::new();
/// store.set("form", r#"{"budget":1}"#)?;
/// assert!(store.get("form")?.is_some());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        // 存在しない key の remove は成功
        store.remove("k").unwrap();
    }

    #[test]
    fn clones_share_entries() {
        let store = InMemoryKeyValueStore::new();
        let other = store.clone();
        store.set("shared", "1").unwrap();
        assert_eq!(other.get("shared").unwrap().as_deref(), Some("1"));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn clear_empties_every_clone() {
        let store = InMemoryKeyValueStore::new();
        let other = store.clone();
        store.set("form", "{}").unwrap();
        store.set("form:auto_restore", "false").unwrap();

        other.clear();

        assert!(store.is_empty());
        assert_eq!(store.get("form").unwrap(), None);
    }
}

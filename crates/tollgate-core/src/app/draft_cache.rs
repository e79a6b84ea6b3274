//! DraftCache - 入力途中のフォーム状態をローカルに保存・復元する
//!
//! # 保存
//! 作業状態（`ObservableState`）を構築時に 1 回だけ購読し、`flush()` のたびに
//! 現在値を JSON で draft key に書き込みます。明示的な保存操作はありません。
//!
//! # 一回だけの書き込み抑制
//! `clear_draft()` は状態をデフォルトに戻しますが、それ自体も変更です。
//! 次の flush でデフォルト値が書き戻されないよう、抑制フラグを立てます。
//! フラグは 1 スロット（カウンタではない）で、購読コールバック内で swap して消費します。
//!
//! # 自動復元
//! 自動復元の設定は `<key>:auto_restore` に `"true"` / `"false"` で保存します。
//! draft とは独立で、draft を消しても設定は残ります。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::app::observable::ObservableState;
use crate::domain::DraftKey;
use crate::domain::draft::{encode_auto_restore, merge_over_defaults, parse_auto_restore};
use crate::domain::{DraftError, StoreError};
use crate::ports::KeyValueStore;

/// 購読コールバックと共有するフラグ
#[derive(Default)]
struct DraftFlags {
    has_draft: AtomicBool,
    skip_next_persist: AtomicBool,
}

/// DraftCache は 1 つのフォームの draft を管理する
///
/// # 使用例
/// ```ignore
/// let mut cache = DraftCache::new(store, "requirements-form", json!({ "text": "", "budget": null }))?;
/// if cache.maybe_restore_draft() {
///     // 「前回の入力を復元しました」を表示
/// }
/// cache.set_field("text", json!("new value"));
/// cache.flush(); // storage に書き込まれる
/// ```
pub struct DraftCache {
    key: DraftKey,
    defaults: Map<String, Value>,
    store: Arc<dyn KeyValueStore>,
    state: ObservableState<Map<String, Value>>,
    flags: Arc<DraftFlags>,
    restored_from_draft: bool,
    auto_restore_enabled: bool,
}

impl DraftCache {
    /// Creates the cache and subscribes it to its working state.
    ///
    /// The working state starts at `defaults`; nothing is restored until
    /// [`load_draft`](Self::load_draft) or
    /// [`maybe_restore_draft`](Self::maybe_restore_draft) is called.
    ///
    /// # Errors
    /// `DraftError::DefaultsNotObject` if `defaults` is not a JSON object.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        defaults: Value,
    ) -> Result<Self, DraftError> {
        let Value::Object(defaults) = defaults else {
            return Err(DraftError::DefaultsNotObject);
        };
        let key = DraftKey::new(key);

        let has_draft = match store.get(key.as_str()) {
            Ok(raw) => raw.is_some_and(|r| !r.is_empty()),
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "draft presence check failed");
                false
            }
        };
        let auto_restore_enabled = match store.get(key.auto_restore_key()) {
            Ok(raw) => parse_auto_restore(raw.as_deref()),
            Err(e) => {
                tracing::warn!(key = key.auto_restore_key(), error = %e, "auto-restore preference unreadable");
                true
            }
        };

        let flags = Arc::new(DraftFlags::default());
        flags.has_draft.store(has_draft, Ordering::Release);

        let mut state = ObservableState::new(defaults.clone());
        state.subscribe(persist_on_change(
            store.clone(),
            key.as_str().to_string(),
            flags.clone(),
        ));

        Ok(Self {
            key,
            defaults,
            store,
            state,
            flags,
            restored_from_draft: false,
            auto_restore_enabled,
        })
    }

    pub fn key(&self) -> &DraftKey {
        &self.key
    }

    pub fn state(&self) -> &Map<String, Value> {
        self.state.get()
    }

    /// Working state decoded into a typed form.
    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.state.get().clone()))
    }

    pub fn update<R>(&mut self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        self.state.update(f)
    }

    pub fn set_field(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        self.state.update(move |state| {
            state.insert(field, value);
        });
    }

    /// Persists pending changes (one tick). Returns whether a change was observed.
    pub fn flush(&mut self) -> bool {
        self.state.flush()
    }

    pub fn has_draft(&self) -> bool {
        self.flags.has_draft.load(Ordering::Acquire)
    }

    pub fn restored_from_draft(&self) -> bool {
        self.restored_from_draft
    }

    pub fn auto_restore_enabled(&self) -> bool {
        self.auto_restore_enabled
    }

    /// Restores the stored draft over the defaults.
    ///
    /// Never fails: a missing draft leaves the working state alone, a
    /// corrupt one resets it to the defaults. Both report `false`.
    pub fn load_draft(&mut self) -> bool {
        let raw = match self.store.get(self.key.as_str()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = self.key.as_str(), error = %e, "draft read failed");
                return self.fall_back_to_defaults();
            }
        };
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            self.flags.has_draft.store(false, Ordering::Release);
            self.restored_from_draft = false;
            return false;
        };

        match merge_over_defaults(&self.defaults, &raw) {
            Ok(merged) => {
                self.state.set(merged);
                self.flags.has_draft.store(true, Ordering::Release);
                self.restored_from_draft = true;
                tracing::debug!(key = self.key.as_str(), "draft restored");
                true
            }
            Err(e) => {
                tracing::warn!(key = self.key.as_str(), error = %e, "stored draft is corrupt, using defaults");
                self.fall_back_to_defaults()
            }
        }
    }

    fn fall_back_to_defaults(&mut self) -> bool {
        self.state.set(self.defaults.clone());
        self.flags.has_draft.store(false, Ordering::Release);
        self.restored_from_draft = false;
        false
    }

    /// Restores only when a draft exists and auto-restore is enabled.
    pub fn maybe_restore_draft(&mut self) -> bool {
        if !self.auto_restore_enabled || !self.has_draft() {
            self.restored_from_draft = false;
            return false;
        }
        self.load_draft()
    }

    /// Deletes the stored draft and resets the working state.
    /// The auto-restore preference is kept.
    pub fn clear_draft(&mut self) -> Result<(), DraftError> {
        self.store.remove(self.key.as_str())?;
        self.flags.skip_next_persist.store(true, Ordering::Release);
        self.flags.has_draft.store(false, Ordering::Release);
        self.state.set(self.defaults.clone());
        self.restored_from_draft = false;
        tracing::debug!(key = self.key.as_str(), "draft cleared");
        Ok(())
    }

    pub fn set_auto_restore_enabled(&mut self, enabled: bool) -> Result<(), DraftError> {
        self.store
            .set(self.key.auto_restore_key(), encode_auto_restore(enabled))?;
        self.auto_restore_enabled = enabled;
        Ok(())
    }
}

fn persist_on_change(
    store: Arc<dyn KeyValueStore>,
    key: String,
    flags: Arc<DraftFlags>,
) -> impl FnMut(&Map<String, Value>) + Send + 'static {
    move |value| {
        if flags.skip_next_persist.swap(false, Ordering::AcqRel) {
            tracing::debug!(key = %key, "persist skipped after clear");
            return;
        }
        let written = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|text| store.set(&key, &text));
        match written {
            Ok(()) => flags.has_draft.store(true, Ordering::Release),
            Err(e) => tracing::warn!(key = %key, error = %e, "draft persist failed"),
        }
    }
}

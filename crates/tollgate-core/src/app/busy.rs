//! BusyTracker - 同時実行中リクエストの参照カウント
//!
//! # 不変条件
//! - カウンタは負にならない（0 未満は 0 に丸める）
//! - indicator は カウンタ > 0 の間だけ表示される
//! - `begin()` 1 回につき、ちょうど 1 回のデクリメント（`BusyGuard` の Drop）
//!
//! 表示/非表示の呼び出しはロック内で行うため、並行に終わるリクエストがあっても
//! show/hide の順序が入れ替わることはありません。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ports::BusyIndicator;

/// BusyTracker は PendingRequestCounter と indicator を所有する
///
/// # 使用例
/// ```ignore
/// let tracker = BusyTracker::new(indicator);
/// let guard = tracker.begin();   // 0 -> 1 で indicator.show()
/// // ... request ...
/// drop(guard);                   // 1 -> 0 で indicator.hide()
/// ```
#[derive(Clone)]
pub struct BusyTracker {
    inner: Arc<Inner>,
}

struct Inner {
    pending: Mutex<usize>,
    indicator: Arc<dyn BusyIndicator>,
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, usize> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self) {
        let mut pending = self.pending();
        if *pending == 0 {
            tracing::warn!("busy counter release without matching begin");
            return;
        }
        *pending -= 1;
        if *pending == 0 {
            self.indicator.hide();
        }
    }
}

impl BusyTracker {
    pub fn new(indicator: Arc<dyn BusyIndicator>) -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(0),
                indicator,
            }),
        }
    }

    /// Counts one request as pending until the returned guard is dropped.
    pub fn begin(&self) -> BusyGuard {
        let mut pending = self.inner.pending();
        if *pending == 0 {
            self.inner.indicator.show();
        }
        *pending += 1;
        BusyGuard {
            inner: Some(self.inner.clone()),
        }
    }

    pub fn pending(&self) -> usize {
        *self.inner.pending()
    }

    pub fn is_busy(&self) -> bool {
        self.pending() > 0
    }
}

/// 1 件分の pending。Drop でカウンタを戻す。
#[must_use = "dropping the guard immediately ends the busy period"]
pub struct BusyGuard {
    inner: Option<Arc<Inner>>,
}

impl BusyGuard {
    /// Guard for a silent request: counts nothing.
    pub fn detached() -> Self {
        Self { inner: None }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.release();
        }
    }
}

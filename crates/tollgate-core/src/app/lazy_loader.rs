//! LazyLoader - 重いランタイムの単一・再試行可能な遅延ロード
//!
//! # 状態
//! 1 スロットのセル `Empty | Pending(shared future) | Ready(value)` を mutex で保護します。
//!
//! - `Empty` で `get()` されたら factory を 1 回だけ呼び、`Pending` にする
//! - `Pending` 中の呼び出しは同じ future を待つ（重複ロードなし）
//! - 成功したら `Ready`。以後は clone を返すだけ
//! - 失敗したら、待っている呼び出し元にエラーが届く前に `Empty` に戻す
//!   （次の `get()` が新しいロードを試みる。その場での自動リトライはしない）
//!
//! 確認と設定は `get()` を呼んだ時点で、同じロック区間で行います（最初の poll を待たない）。
//! ロックを持ったまま await しないので、2 つの呼び出しが同時に `Empty` を観測することはありません。
//!
//! タイムアウトやバックオフは持ちません。

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::FutureExt;
use futures::future::{self, BoxFuture, Either, Shared};

type LoadFuture<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;
type Factory<T, E> = dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync;

enum Slot<T, E>
where
    T: Clone,
    E: Clone,
{
    Empty,
    Pending { attempt: u64, load: LoadFuture<T, E> },
    Ready(T),
}

/// LazyLoader はロード結果を 1 つだけ memo する
///
/// # 使用例
/// ```ignore
/// let charts = LazyLoader::new(|| async { ChartRuntime::load().await.map(Arc::new) });
/// let runtime = charts.get().await?; // 初回だけロード
/// let again = charts.get().await?;   // 同じ Arc
/// ```
///
/// `T` と `E` は全ての呼び出し元に配るため `Clone` が必要です
/// （重い値は `Arc` に包んで渡してください）。
///
/// factory はロック区間内で呼ばれます。factory の中から同じ loader の
/// `get()` を同期的に呼ばないでください。
pub struct LazyLoader<T, E>
where
    T: Clone,
    E: Clone,
{
    factory: Arc<Factory<T, E>>,
    slot: Arc<Mutex<Slot<T, E>>>,
    attempts: AtomicU64,
}

fn lock<T: Clone, E: Clone>(slot: &Mutex<Slot<T, E>>) -> MutexGuard<'_, Slot<T, E>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T, E> LazyLoader<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            factory: Arc::new(move || factory().boxed()),
            slot: Arc::new(Mutex::new(Slot::Empty)),
            attempts: AtomicU64::new(0),
        }
    }

    /// Returns the loaded value, starting a load if none is ready or in flight.
    ///
    /// The slot is checked and claimed when `get()` is called, not when the
    /// returned future is first polled. Futures created before the load
    /// settles all await the same attempt.
    ///
    /// # Errors
    /// The factory's error, unchanged. The memo is already cleared when it
    /// is returned.
    pub fn get(&self) -> impl Future<Output = Result<T, E>> + Send + 'static {
        let mut slot = lock(&self.slot);
        let load = match &*slot {
            Slot::Ready(value) => return Either::Left(future::ready(Ok(value.clone()))),
            Slot::Pending { load, .. } => load.clone(),
            Slot::Empty => {
                let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;
                tracing::debug!(attempt, "lazy load started");
                let load = self.start(attempt);
                *slot = Slot::Pending {
                    attempt,
                    load: load.clone(),
                };
                load
            }
        };
        Either::Right(load)
    }

    fn start(&self, attempt: u64) -> LoadFuture<T, E> {
        let underlying = (self.factory)();
        let slot: Weak<Mutex<Slot<T, E>>> = Arc::downgrade(&self.slot);
        async move {
            let result = underlying.await;
            if let Some(slot) = slot.upgrade() {
                let mut slot = lock(&slot);
                // reset() 後に終わった古い attempt は memo を上書きしない
                if matches!(&*slot, Slot::Pending { attempt: current, .. } if *current == attempt) {
                    *slot = match &result {
                        Ok(value) => Slot::Ready(value.clone()),
                        Err(_) => {
                            tracing::warn!(attempt, "lazy load failed, memo cleared");
                            Slot::Empty
                        }
                    };
                }
            }
            result
        }
        .boxed()
        .shared()
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*lock(&self.slot), Slot::Ready(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(&*lock(&self.slot), Slot::Pending { .. })
    }

    /// Number of times the factory has been invoked.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Forgets the memo. Callers already awaiting an in-flight load still
    /// receive its result.
    pub fn reset(&self) {
        *lock(&self.slot) = Slot::Empty;
    }
}

//! ObservableState - 書き込みを観測できる状態コンテナ
//!
//! 変更は即座には通知されません。`flush()`（1 tick 分）で、前回の flush 以降に
//! 変更があった場合だけ、購読者に現在値が 1 回通知されます。
//! 同じ tick 内の複数の変更は 1 回の通知にまとまります。

/// 購読者のコールバック
pub type Subscriber<T> = Box<dyn FnMut(&T) + Send>;

pub struct ObservableState<T> {
    value: T,
    dirty: bool,
    subscribers: Vec<Subscriber<T>>,
}

impl<T> ObservableState<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            dirty: false,
            subscribers: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replaces the value. Always counts as a change, even if equal.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.dirty = true;
    }

    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.value);
        self.dirty = true;
        result
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&T) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Delivers pending changes. Returns whether subscribers were called.
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        for subscriber in &mut self.subscribers {
            subscriber(&self.value);
        }
        true
    }
}

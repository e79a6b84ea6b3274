//! TracingNotifier - indicator とメッセージをログとして出す実装
//!
//! 画面を持たない環境（CLI）では、busy indicator も toast もログイベントになります。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::NotificationConfig;
use crate::ports::{BusyIndicator, MessageKind, Notifier};

#[derive(Default)]
pub struct TracingNotifier {
    loading_text: String,
    error_duration: Duration,
    shown: AtomicUsize,
}

impl TracingNotifier {
    pub fn new(loading_text: impl Into<String>) -> Self {
        Self {
            loading_text: loading_text.into(),
            error_duration: Duration::ZERO,
            shown: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(config.loading_text.clone()).with_error_duration(config.error_duration())
    }

    /// エラーメッセージの表示時間（ログの `duration_ms` に載る）
    pub fn with_error_duration(mut self, duration: Duration) -> Self {
        self.error_duration = duration;
        self
    }

    pub fn error_duration(&self) -> Duration {
        self.error_duration
    }

    /// indicator を表示した回数
    pub fn times_shown(&self) -> usize {
        self.shown.load(Ordering::Relaxed)
    }
}

impl BusyIndicator for TracingNotifier {
    fn show(&self) {
        self.shown.fetch_add(1, Ordering::Relaxed);
        tracing::info!(text = %self.loading_text, "busy indicator shown");
    }

    fn hide(&self) {
        tracing::info!("busy indicator hidden");
    }
}

impl Notifier for TracingNotifier {
    fn show_message(&self, text: &str, kind: MessageKind) {
        match kind {
            MessageKind::Error => tracing::error!(
                text,
                duration_ms = self.error_duration.as_millis() as u64,
                "notify"
            ),
            MessageKind::Warning => tracing::warn!(text, "notify"),
            MessageKind::Success | MessageKind::Info => tracing::info!(text, "notify"),
        }
    }
}

//! Notifier port - busy indicator とメッセージ表示の抽象化
//!
//! どちらも UI 側の外部コラボレーター。Gateway は呼び出すだけで実装はしない。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Success,
    Info,
    Warning,
    Error,
}

/// BusyIndicator は「リクエスト処理中」の表示
///
/// `show` と `hide` は BusyTracker から交互にしか呼ばれない。
pub trait BusyIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Notifier はユーザー向けメッセージ（toast など）を出す
pub trait Notifier: Send + Sync {
    fn show_message(&self, text: &str, kind: MessageKind);
}

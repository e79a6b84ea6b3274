//! ChunkClassifier - ビルド時のモジュール ID を vendor bundle に振り分ける
//!
//! 純粋・決定的で I/O を持ちません。ビルドグラフの走査中にモジュールごとに呼ばれます。
//!
//! # 判定
//! 1. パス区切り `\` を `/` に正規化
//! 2. `/node_modules/` を含まない ID（アプリのコード）は `None`（bundler のデフォルトに任せる）
//! 3. ルール表を順に見て、最初に一致したルールの bundle
//! 4. どれにも一致しない third-party は catch-all bundle

use std::borrow::Cow;

use crate::domain::{CATCH_ALL_CHUNK, ChunkRule, VENDOR_ROOT, default_rules};

#[derive(Debug, Clone)]
pub struct ChunkClassifier {
    rules: Vec<ChunkRule>,
    fallback: String,
}

impl Default for ChunkClassifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl ChunkClassifier {
    pub fn new(rules: Vec<ChunkRule>) -> Self {
        Self {
            rules,
            fallback: CATCH_ALL_CHUNK.to_string(),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn rules(&self) -> &[ChunkRule] {
        &self.rules
    }

    /// Bundle name for a module id, or `None` for application code.
    pub fn classify(&self, id: &str) -> Option<&str> {
        let id = normalize(id);
        if !id.contains(VENDOR_ROOT) {
            return None;
        }
        let chunk = self
            .rules
            .iter()
            .find(|rule| rule.matches(&id))
            .map_or(self.fallback.as_str(), |rule| rule.chunk.as_str());
        Some(chunk)
    }

    /// The bundler-facing callback.
    pub fn manual_chunks(&self) -> impl Fn(&str) -> Option<String> + '_ {
        move |id| self.classify(id).map(str::to_string)
    }
}

fn normalize(id: &str) -> Cow<'_, str> {
    if id.contains('\\') {
        Cow::Owned(id.replace('\\', "/"))
    } else {
        Cow::Borrowed(id)
    }
}

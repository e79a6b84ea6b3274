//! Chunk rules: which vendor bundle a third-party module belongs to.

use serde::{Deserialize, Serialize};

/// Path segment marking a third-party dependency.
pub const VENDOR_ROOT: &str = "/node_modules/";

/// Bundle for third-party modules no rule claims.
pub const CATCH_ALL_CHUNK: &str = "vendor-misc";

/// One `(bundle, patterns)` entry. Patterns are plain substrings of the
/// normalized module path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRule {
    pub chunk: String,
    pub patterns: Vec<String>,
}

impl ChunkRule {
    pub fn new(chunk: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            chunk: chunk.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn matches(&self, normalized_id: &str) -> bool {
        self.patterns.iter().any(|p| normalized_id.contains(p.as_str()))
    }
}

/// The vendor split used by the web build. Order matters: first match wins.
pub fn default_rules() -> Vec<ChunkRule> {
    vec![
        ChunkRule::new(
            "vendor-vue",
            &[
                "/node_modules/vue/",
                "/node_modules/@vue/",
                "/node_modules/vue-router/",
            ],
        ),
        ChunkRule::new(
            "vendor-element-plus",
            &["/node_modules/element-plus/", "/node_modules/@element-plus/"],
        ),
        ChunkRule::new(
            "vendor-echarts",
            &["/node_modules/echarts/", "/node_modules/zrender/"],
        ),
        ChunkRule::new(
            "vendor-utils",
            &["/node_modules/axios/", "/node_modules/dompurify/"],
        ),
    ]
}

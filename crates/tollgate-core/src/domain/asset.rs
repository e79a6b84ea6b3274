//! Build output assets and the size summary built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Js,
    Css,
    Html,
    Other,
}

impl AssetType {
    /// Detected from the file suffix only.
    pub fn detect(file: &str) -> Self {
        if file.ends_with(".js") {
            AssetType::Js
        } else if file.ends_with(".css") {
            AssetType::Css
        } else if file.ends_with(".html") {
            AssetType::Html
        } else {
            AssetType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Js => "js",
            AssetType::Css => "css",
            AssetType::Html => "html",
            AssetType::Other => "other",
        }
    }
}

/// A file in the build output, path relative to the output root with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub file: String,
    pub size: u64,
}

impl Asset {
    pub fn new(file: impl Into<String>, size: u64) -> Self {
        Self {
            file: file.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTotals {
    pub bytes: u64,
    pub files: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub js: TypeTotals,
    pub css: TypeTotals,
    pub html: TypeTotals,
    pub other: TypeTotals,
}

impl TypeSummary {
    pub fn get(&self, kind: AssetType) -> &TypeTotals {
        match kind {
            AssetType::Js => &self.js,
            AssetType::Css => &self.css,
            AssetType::Html => &self.html,
            AssetType::Other => &self.other,
        }
    }

    pub fn add(&mut self, kind: AssetType, bytes: u64) {
        let totals = match kind {
            AssetType::Js => &mut self.js,
            AssetType::Css => &mut self.css,
            AssetType::Html => &mut self.html,
            AssetType::Other => &mut self.other,
        };
        totals.bytes += bytes;
        totals.files += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedAsset {
    pub file: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: AssetType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfSummary {
    pub generated_at: DateTime<Utc>,
    pub file_count: usize,
    pub total_bytes: u64,
    pub by_type: TypeSummary,
    pub top_assets: Vec<RankedAsset>,
}

//! Perf baseline - ビルド成果物のサイズレポート
//!
//! # 流れ
//! 1. `collect_assets` で dist 以下のファイルを列挙
//! 2. `create_perf_summary` で種類別の合計と上位 N 件を集計
//! 3. `render_markdown` で markdown にし、`write_report` で日付付きファイルに保存

use std::fs;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;

use crate::domain::{Asset, AssetType, PerfSummary, RankedAsset, ReportError, TypeSummary};
use crate::ports::Clock;

pub const DEFAULT_TOP_N: usize = 5;

/// The build entry point that must exist before a report is taken.
pub const ENTRY_FILE: &str = "index.html";

/// Lists every file under `dist_dir`, paths relative to it with `/` separators.
///
/// Entries are visited in name order so the result is stable across platforms.
pub fn collect_assets(dist_dir: &Path) -> Result<Vec<Asset>, ReportError> {
    let mut assets = Vec::new();
    walk(dist_dir, dist_dir, &mut assets)?;
    Ok(assets)
}

fn walk(root: &Path, dir: &Path, assets: &mut Vec<Asset>) -> Result<(), ReportError> {
    let read_err = |source| ReportError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir)
        .map_err(read_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|source| ReportError::Read {
            path: path.clone(),
            source,
        })?;
        if file_type.is_dir() {
            walk(root, &path, assets)?;
        } else if file_type.is_file() {
            let size = entry
                .metadata()
                .map_err(|source| ReportError::Read {
                    path: path.clone(),
                    source,
                })?
                .len();
            assets.push(Asset::new(relative_name(root, &path), size));
        }
    }
    Ok(())
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Fails unless the build entry file exists in `dist_dir`.
pub fn ensure_build_output(dist_dir: &Path) -> Result<(), ReportError> {
    let entry = dist_dir.join(ENTRY_FILE);
    if entry.is_file() {
        Ok(())
    } else {
        Err(ReportError::MissingEntry(entry))
    }
}

pub fn create_perf_summary(assets: &[Asset], top_n: usize, clock: &dyn Clock) -> PerfSummary {
    let mut by_type = TypeSummary::default();
    let mut total_bytes = 0;
    for asset in assets {
        by_type.add(AssetType::detect(&asset.file), asset.size);
        total_bytes += asset.size;
    }

    let mut ranked: Vec<RankedAsset> = assets
        .iter()
        .map(|asset| RankedAsset {
            file: asset.file.clone(),
            size: asset.size,
            kind: AssetType::detect(&asset.file),
        })
        .collect();
    // stable: equal sizes keep input order
    ranked.sort_by(|a, b| b.size.cmp(&a.size));
    ranked.truncate(top_n);

    PerfSummary {
        generated_at: clock.now(),
        file_count: assets.len(),
        total_bytes,
        by_type,
        top_assets: ranked,
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.2} KiB", bytes as f64 / 1024.0)
    }
}

pub fn render_markdown(summary: &PerfSummary) -> String {
    let generated_at = summary
        .generated_at
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut lines = vec![
        "# Frontend Performance Baseline".to_string(),
        String::new(),
        format!("- Generated at: {generated_at}"),
        format!("- Asset files: {}", summary.file_count),
        format!(
            "- Total size: {} ({} B)",
            format_bytes(summary.total_bytes),
            summary.total_bytes
        ),
        String::new(),
        "## Breakdown".to_string(),
        String::new(),
        "| Type | Files | Size |".to_string(),
        "| --- | ---: | ---: |".to_string(),
    ];
    for (label, kind) in [
        ("JavaScript", AssetType::Js),
        ("CSS", AssetType::Css),
        ("HTML", AssetType::Html),
        ("Other", AssetType::Other),
    ] {
        let totals = summary.by_type.get(kind);
        lines.push(format!(
            "| {label} | {} | {} |",
            totals.files,
            format_bytes(totals.bytes)
        ));
    }
    lines.extend([
        String::new(),
        "## Top Assets".to_string(),
        String::new(),
        "| File | Type | Size |".to_string(),
        "| --- | --- | ---: |".to_string(),
    ]);
    for asset in &summary.top_assets {
        lines.push(format!(
            "| {} | {} | {} |",
            asset.file,
            asset.kind.as_str(),
            format_bytes(asset.size)
        ));
    }
    lines.push(String::new());
    lines.join("\n")
}

pub fn report_file_name(summary: &PerfSummary) -> String {
    format!(
        "{}-frontend-perf-baseline.md",
        summary.generated_at.format("%Y-%m-%d")
    )
}

/// Renders `summary` into `report_dir`, creating the directory if needed.
pub fn write_report(summary: &PerfSummary, report_dir: &Path) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(report_dir).map_err(|source| ReportError::Write {
        path: report_dir.to_path_buf(),
        source,
    })?;
    let path = report_dir.join(report_file_name(summary));
    fs::write(&path, render_markdown(summary)).map_err(|source| ReportError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        files = summary.file_count,
        total_bytes = summary.total_bytes,
        "perf baseline written"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap())
    }

    fn sample() -> Vec<Asset> {
        vec![
            Asset::new("assets/main-aaa.js", 2048),
            Asset::new("assets/vendor-bbb.js", 4096),
            Asset::new("assets/index-ccc.css", 1024),
            Asset::new("index.html", 512),
            Asset::new("assets/logo.svg", 256),
        ]
    }

    #[test]
    fn aggregates_sizes_by_type_and_total() {
        let summary = create_perf_summary(&sample(), DEFAULT_TOP_N, &clock());

        assert_eq!(summary.file_count, 5);
        assert_eq!(summary.total_bytes, 7936);
        assert_eq!(summary.by_type.js.bytes, 6144);
        assert_eq!(summary.by_type.js.files, 2);
        assert_eq!(summary.by_type.css.bytes, 1024);
        assert_eq!(summary.by_type.html.bytes, 512);
        assert_eq!(summary.by_type.other.bytes, 256);
    }

    #[test]
    fn top_assets_sorted_by_size() {
        let assets = vec![
            Asset::new("assets/a.js", 10),
            Asset::new("assets/c.js", 30),
            Asset::new("assets/b.css", 20),
        ];
        let summary = create_perf_summary(&assets, 2, &clock());

        assert_eq!(
            summary.top_assets,
            vec![
                RankedAsset {
                    file: "assets/c.js".into(),
                    size: 30,
                    kind: AssetType::Js
                },
                RankedAsset {
                    file: "assets/b.css".into(),
                    size: 20,
                    kind: AssetType::Css
                },
            ]
        );
    }

    #[test]
    fn equal_sizes_keep_input_order() {
        let assets = vec![Asset::new("x.js", 5), Asset::new("y.js", 5)];
        let summary = create_perf_summary(&assets, 5, &clock());
        let files: Vec<_> = summary.top_assets.iter().map(|a| a.file.as_str()).collect();
        assert_eq!(files, ["x.js", "y.js"]);
    }

    #[rstest]
    #[case(0, "0 B")]
    #[case(1023, "1023 B")]
    #[case(1024, "1.00 KiB")]
    #[case(1536, "1.50 KiB")]
    fn formats_bytes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_bytes(bytes), expected);
    }

    #[test]
    fn markdown_lists_breakdown_and_top_assets() {
        let summary = create_perf_summary(&sample(), 2, &clock());
        let markdown = render_markdown(&summary);

        assert!(markdown.starts_with("# Frontend Performance Baseline\n"));
        assert!(markdown.contains("- Generated at: 2026-03-14T09:30:00.000Z"));
        assert!(markdown.contains("- Asset files: 5"));
        assert!(markdown.contains("- Total size: 7.75 KiB (7936 B)"));
        assert!(markdown.contains("| JavaScript | 2 | 6.00 KiB |"));
        assert!(markdown.contains("| Other | 1 | 256 B |"));
        assert!(markdown.contains("| assets/vendor-bbb.js | js | 4.00 KiB |"));
        assert!(!markdown.contains("index-ccc.css | css"));
        assert!(markdown.ends_with("|\n"));
    }

    #[test]
    fn collects_nested_assets_with_forward_slashes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets/fonts")).unwrap();
        fs::write(dir.path().join("index.html"), vec![0u8; 12]).unwrap();
        fs::write(dir.path().join("assets/app.js"), vec![0u8; 40]).unwrap();
        fs::write(dir.path().join("assets/fonts/a.woff2"), vec![0u8; 7]).unwrap();

        let assets = collect_assets(dir.path()).unwrap();

        assert_eq!(
            assets,
            vec![
                Asset::new("assets/app.js", 40),
                Asset::new("assets/fonts/a.woff2", 7),
                Asset::new("index.html", 12),
            ]
        );
    }

    #[test]
    fn missing_entry_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_build_output(dir.path()).unwrap_err();
        assert!(matches!(err, ReportError::MissingEntry(_)));

        fs::write(dir.path().join(ENTRY_FILE), "<html></html>").unwrap();
        ensure_build_output(dir.path()).unwrap();
    }

    #[test]
    fn missing_dist_dir_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_assets(&dir.path().join("dist")).unwrap_err();
        assert!(matches!(err, ReportError::Read { .. }));
    }

    #[test]
    fn writes_dated_report() {
        let dir = tempfile::tempdir().unwrap();
        let report_dir = dir.path().join("docs/worklogs");
        let summary = create_perf_summary(&sample(), DEFAULT_TOP_N, &clock());

        let path = write_report(&summary, &report_dir).unwrap();

        assert_eq!(
            path.file_name().unwrap(),
            "2026-03-14-frontend-perf-baseline.md"
        );
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(written, render_markdown(&summary));
    }
}

//! tollgate - operator CLI for the tollgate core
//!
//! Usage: tollgate <command>
//!
//! 本番と同じ core を実際の adapter（reqwest, JSON ファイル storage, tracing 通知）で
//! 組み立てて、手元から動作を確認するためのツールです。

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tollgate_core::app::perf_baseline::{self, DEFAULT_TOP_N};
use tollgate_core::app::{ChunkClassifier, DraftCache, RequestGateway};
use tollgate_core::config::TollgateConfig;
use tollgate_core::domain::{ApiRequest, Method, RequestOptions};
use tollgate_core::impls::{JsonFileStore, ReqwestTransport, TracingNotifier};
use tollgate_core::ports::SystemClock;

#[derive(Parser)]
#[command(name = "tollgate")]
#[command(about = "Request gateway, draft cache and build tooling for the web client")]
struct Cli {
    /// Config file (toml / yaml / json); TOLLGATE__* env vars override it
    #[arg(long, global = true, env = "TOLLGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the vendor bundle for module ids (args, or one per line on stdin)
    Classify { ids: Vec<String> },

    /// Write the build size report for a dist directory
    PerfBaseline {
        #[arg(long, default_value = "dist")]
        dist: PathBuf,
        #[arg(long, default_value = "docs/worklogs")]
        report_dir: PathBuf,
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,
    },

    /// Send one request through the gateway and print the body
    Request {
        method: Method,
        path: String,
        /// JSON body
        #[arg(long)]
        data: Option<String>,
        /// JSON object flattened into query parameters
        #[arg(long)]
        query: Option<String>,
        /// No busy indicator, no error notification
        #[arg(long)]
        silent: bool,
    },

    /// Inspect or edit a stored draft
    Draft {
        #[arg(long)]
        key: String,
        /// Default form object the draft is merged over
        #[arg(long, default_value = "{}")]
        defaults: String,
        #[command(subcommand)]
        action: DraftAction,
    },
}

#[derive(Subcommand)]
enum DraftAction {
    /// Print the draft merged over the defaults
    Show,
    /// Set one field and persist the draft
    Set { field: String, value: String },
    /// Delete the draft (the auto-restore preference is kept)
    Clear,
    /// Restore the draft if auto-restore allows it
    Restore,
    /// Turn auto-restore on or off
    AutoRestore {
        #[arg(action = clap::ArgAction::Set, value_parser = parse_switch)]
        enabled: bool,
    },
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(format!("expected on/off, got {other}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tollgate_core=info,tollgate=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = TollgateConfig::load_from(cli.config.as_deref()).context("failed to load config")?;
    config.validate().context("invalid config")?;
    tracing::debug!(
        base_url = %config.gateway.base_url,
        timeout_ms = config.gateway.timeout_ms,
        store_path = %config.drafts.store_path.display(),
        "config loaded"
    );

    match cli.command {
        Command::Classify { ids } => classify(ids),
        Command::PerfBaseline {
            dist,
            report_dir,
            top,
        } => perf(&dist, &report_dir, top),
        Command::Request {
            method,
            path,
            data,
            query,
            silent,
        } => request(&config, method, path, data, query, silent).await,
        Command::Draft {
            key,
            defaults,
            action,
        } => draft(&config, &key, &defaults, action),
    }
}

fn classify(ids: Vec<String>) -> Result<()> {
    let classifier = ChunkClassifier::default();
    let ids = if ids.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read module ids from stdin")?
    } else {
        ids
    };
    for id in ids.iter().filter(|id| !id.trim().is_empty()) {
        println!("{}\t{}", classifier.classify(id).unwrap_or("-"), id);
    }
    Ok(())
}

fn perf(dist: &Path, report_dir: &Path, top: usize) -> Result<()> {
    perf_baseline::ensure_build_output(dist).context("run the frontend build first")?;
    let assets = perf_baseline::collect_assets(dist)?;
    let summary = perf_baseline::create_perf_summary(&assets, top, &SystemClock);
    let path = perf_baseline::write_report(&summary, report_dir)?;

    println!("Perf baseline saved: {}", path.display());
    println!(
        "Assets: {}, Total: {} B",
        summary.file_count, summary.total_bytes
    );
    Ok(())
}

fn parse_json(label: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).with_context(|| format!("--{label} is not valid JSON"))
}

async fn request(
    config: &TollgateConfig,
    method: Method,
    path: String,
    data: Option<String>,
    query: Option<String>,
    silent: bool,
) -> Result<()> {
    let transport =
        ReqwestTransport::from_config(&config.gateway).context("failed to build HTTP client")?;
    let notifier = Arc::new(TracingNotifier::from_config(&config.notifications));
    let gateway = RequestGateway::new(Arc::new(transport), notifier.clone(), notifier);

    let mut request = ApiRequest::new(method, path);
    if let Some(query) = query {
        request = request.with_query_object(&parse_json("query", &query)?);
    }
    if let Some(data) = data {
        request = request.with_json(parse_json("data", &data)?);
    }
    let options = if silent {
        RequestOptions::silent()
    } else {
        RequestOptions::default()
    };

    match gateway.send(request, options).await {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(e) => bail!("request failed [{}]: {}", e.category(), e.user_message()),
    }
}

fn draft(config: &TollgateConfig, key: &str, defaults: &str, action: DraftAction) -> Result<()> {
    let store = Arc::new(JsonFileStore::new(config.drafts.store_path.clone()));
    let mut cache = DraftCache::new(store, key, parse_json("defaults", defaults)?)
        .context("failed to open draft")?;

    match action {
        DraftAction::Show => {
            cache.load_draft();
            print_draft(&cache)?;
        }
        DraftAction::Set { field, value } => {
            cache.load_draft();
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            cache.set_field(field, value);
            cache.flush();
            print_draft(&cache)?;
        }
        DraftAction::Clear => {
            cache.clear_draft().context("failed to clear draft")?;
            println!("draft {key} cleared");
        }
        DraftAction::Restore => {
            if cache.maybe_restore_draft() {
                print_draft(&cache)?;
            } else if !cache.auto_restore_enabled() {
                println!("auto-restore is off for {key}");
            } else {
                println!("no draft stored for {key}");
            }
        }
        DraftAction::AutoRestore { enabled } => {
            cache
                .set_auto_restore_enabled(enabled)
                .context("failed to save auto-restore preference")?;
            println!(
                "auto-restore for {key}: {}",
                if enabled { "on" } else { "off" }
            );
        }
    }
    Ok(())
}

fn print_draft(cache: &DraftCache) -> Result<()> {
    let state = Value::Object(cache.state().clone());
    println!("{}", serde_json::to_string_pretty(&state)?);
    tracing::info!(
        key = cache.key().as_str(),
        has_draft = cache.has_draft(),
        restored = cache.restored_from_draft(),
        auto_restore = cache.auto_restore_enabled(),
        "draft state"
    );
    Ok(())
}

//! statcache CLI — split formatting and cache maintenance commands.
//!
//! Commands:
//! - `splits` — print the canonical `splitArr` value for split names/codes
//! - `cache status` — list cached entries, their dates and sizes
//! - `cache clear` — remove entries (all, stale, or older than N days)

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use statcache_core::splits::parse_split_arg;
use statcache_core::{format_split_array, CacheConfig, DailyCache, Split, SplitSelector};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "statcache",
    about = "statcache CLI — split selectors and the daily stats cache"
)]
struct Cli {
    /// TOML config file with `dir` / `enabled` (flat or under `[cache]`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache directory. Overrides the config file and STATCACHE_DIR.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the `splitArr` value for the given splits (names or codes).
    Splits {
        /// Split names (VS_LHH, as_rhp, ...), integer codes, or a joined "5,96".
        splits: Vec<String>,

        /// List the known split names and codes instead.
        #[arg(long, default_value_t = false)]
        list: bool,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached entries, their dates and sizes.
    Status,
    /// Remove cache entries.
    Clear {
        /// Only remove files last modified more than this many days ago.
        #[arg(long, conflicts_with = "stale")]
        older_than_days: Option<u64>,

        /// Only remove entries not dated today.
        #[arg(long, default_value_t = false)]
        stale: bool,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statcache_core=info,statcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Splits { splits, list } => run_splits(&splits, list),
        Commands::Cache { action } => {
            let config = resolve_config(cli.config.as_deref(), cli.cache_dir)?;
            let cache = DailyCache::from_config(&config);
            match action {
                CacheAction::Status => run_cache_status(&cache),
                CacheAction::Clear {
                    older_than_days,
                    stale,
                    confirm,
                } => run_cache_clear(&cache, older_than_days, stale, confirm),
            }
        }
    }
}

/// Config file (or defaults), then environment, then `--cache-dir`.
fn resolve_config(path: Option<&Path>, cache_dir: Option<PathBuf>) -> Result<CacheConfig> {
    let base = match path {
        Some(p) => CacheConfig::from_file(p)?,
        None => CacheConfig::default(),
    };
    let mut config = base.apply_env();
    if let Some(dir) = cache_dir {
        config.dir = dir;
    }
    Ok(config)
}

fn run_splits(args: &[String], list: bool) -> Result<()> {
    if list {
        println!("{:<8} {:>4}", "Name", "Code");
        println!("{}", "-".repeat(13));
        for split in Split::ALL {
            println!("{:<8} {:>4}", split.name(), split.code());
        }
        return Ok(());
    }

    let selector = match args {
        [] => bail!("give at least one split name or code (or --list)"),
        [single] if single.contains(',') => SplitSelector::Joined(single.clone()),
        items => SplitSelector::Many(items.iter().map(|a| parse_split_arg(a)).collect()),
    };

    println!("{}", format_split_array(selector)?);
    Ok(())
}

fn run_cache_status(cache: &DailyCache) -> Result<()> {
    let dir = cache.cache_dir();
    if !dir.exists() {
        println!("Cache directory does not exist: {}", dir.display());
        return Ok(());
    }

    let entries = cache.entries()?;
    if entries.is_empty() {
        println!("Cache is empty: {}", dir.display());
        return Ok(());
    }

    let total_size: u64 = entries.iter().map(|e| e.size_bytes).sum();
    let stale = entries.iter().filter(|e| e.stale).count();

    println!("Cache: {}", dir.display());
    println!("Entries: {} ({stale} stale)", entries.len());
    println!("Total size: {}", format_size(total_size));
    if !cache.is_enabled() {
        println!("Caching is disabled by configuration.");
    }
    println!();
    println!(
        "{:<32} {:<12} {:>6} {:>10} {:<6}",
        "Key", "Date", "Rows", "Size", ""
    );
    println!("{}", "-".repeat(70));
    for entry in &entries {
        let rows = entry
            .meta
            .as_ref()
            .map(|m| m.row_count.to_string())
            .unwrap_or_else(|| "?".into());
        println!(
            "{:<32} {:<12} {:>6} {:>10} {:<6}",
            entry.key.to_string(),
            entry.date.to_string(),
            rows,
            format_size(entry.size_bytes),
            if entry.stale { "stale" } else { "" }
        );
    }
    Ok(())
}

fn run_cache_clear(
    cache: &DailyCache,
    older_than_days: Option<u64>,
    stale: bool,
    confirm: bool,
) -> Result<()> {
    let older_than = older_than_days.map(|d| Duration::from_secs(d * 24 * 60 * 60));

    if !confirm {
        let now = SystemTime::now();
        let candidates: Vec<_> = cache
            .entries()?
            .into_iter()
            .filter(|e| {
                if stale {
                    return e.stale;
                }
                match older_than {
                    None => true,
                    Some(max_age) => std::fs::metadata(&e.path)
                        .and_then(|m| m.modified())
                        .ok()
                        .and_then(|mtime| now.duration_since(mtime).ok())
                        .is_some_and(|age| age >= max_age),
                }
            })
            .collect();

        if candidates.is_empty() {
            println!("Nothing to remove in {}.", cache.cache_dir().display());
            return Ok(());
        }
        println!("Would remove {} entr(ies):", candidates.len());
        for e in &candidates {
            println!("  {} {} ({})", e.key, e.date, format_size(e.size_bytes));
        }
        println!();
        println!("Dry run — pass --confirm to actually delete.");
        return Ok(());
    }

    let summary = if stale {
        cache.purge_stale()
    } else {
        cache.clear(older_than)
    };

    println!(
        "Done. Removed {} file(s), freed {}.",
        summary.removed,
        format_size(summary.bytes_freed)
    );
    if summary.failed > 0 {
        bail!("{} file(s) could not be removed", summary.failed);
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

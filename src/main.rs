use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use statblock_extractor::fetch::{FileProbe, HttpProbe};
use statblock_extractor::readiness::TokioClock;
use statblock_extractor::{classify_page, extract_page, extract_when_ready, AdapterKind, Extraction, Settings};

#[derive(Parser)]
#[command(name = "statblock", about = "Extract creature stat blocks from reference pages as JSON")]
struct Cli {
    /// Readiness probes before giving up (overrides STATBLOCK_MAX_ATTEMPTS)
    #[arg(long, global = true)]
    attempts: Option<u32>,
    /// Milliseconds between readiness probes (overrides STATBLOCK_INTERVAL_MS)
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one saved page, re-reading it until the stat block is present
    Extract {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = AdapterKind::Auto)]
        source: AdapterKind,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Fetch a page over HTTP and extract it
    Fetch {
        url: String,
        #[arg(short, long, value_enum, default_value_t = AdapterKind::Auto)]
        source: AdapterKind,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        compact: bool,
    },
    /// Extract many saved pages in parallel, one JSON file per page
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(short, long, value_enum, default_value_t = AdapterKind::Auto)]
        source: AdapterKind,
    },
    /// Show how each stat-block line of a page is classified
    Classify {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = AdapterKind::Auto)]
        source: AdapterKind,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(n) = cli.attempts {
        settings.max_attempts = n;
    }
    if let Some(ms) = cli.interval_ms {
        settings.interval_ms = ms;
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, abandoning readiness wait");
                cancel.cancel();
            }
        });
    }

    let code = match cli.command {
        Commands::Extract { file, source, out, compact } => {
            let mut probe = FileProbe::new(&file);
            let label = file.display().to_string();
            let extraction = with_spinner(
                &label,
                extract_when_ready(&mut probe, source, &settings, &TokioClock, &cancel),
            )
            .await?;
            write_extraction(&extraction, out.as_deref(), compact)?;
            exit_code(&extraction)
        }
        Commands::Fetch { url, source, out, compact } => {
            let mut probe = HttpProbe::new(&url, &settings)?;
            let extraction = with_spinner(
                &url,
                extract_when_ready(&mut probe, source, &settings, &TokioClock, &cancel),
            )
            .await?;
            write_extraction(&extraction, out.as_deref(), compact)?;
            exit_code(&extraction)
        }
        Commands::Batch { files, out_dir, source } => {
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            let stats = run_batch(&files, &out_dir, source, &settings)?;
            println!(
                "Extracted {} pages ({} ok, {} errors) into {}",
                stats.total,
                stats.ok,
                stats.errors,
                out_dir.display()
            );
            if stats.errors == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Classify { file, source } => {
            let page = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            match classify_page(&page, source, &settings) {
                Ok(rows) => {
                    println!("{:>3} | {:<32} | {:<12} | {:<6}", "#", "Label", "Kind", "Cost");
                    println!("{}", "-".repeat(62));
                    for (i, (fragment, kind)) in rows.iter().enumerate() {
                        let cost = match fragment.glyph.cost_label() {
                            "" => "-",
                            c => c,
                        };
                        println!(
                            "{:>3} | {:<32} | {:<12} | {:<6}",
                            i + 1,
                            truncate(&fragment.label, 32),
                            kind.to_string(),
                            cost
                        );
                    }
                    println!("\n{} fragments", rows.len());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", e);
                    if let Some(hint) = e.hint() {
                        eprintln!("{}", hint);
                    }
                    ExitCode::FAILURE
                }
            }
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("Done in {}", format_duration(elapsed));
    }

    Ok(code)
}

async fn with_spinner<F>(label: &str, work: F) -> Result<Extraction>
where
    F: Future<Output = Extraction>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    spinner.set_message(format!("Waiting for {}", label));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let extraction = work.await;
    spinner.finish_and_clear();
    Ok(extraction)
}

fn write_extraction(extraction: &Extraction, out: Option<&Path>, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(extraction)?
    } else {
        serde_json::to_string_pretty(extraction)?
    };
    match out {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn exit_code(extraction: &Extraction) -> ExitCode {
    if extraction.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

struct BatchStats {
    total: usize,
    ok: usize,
    errors: usize,
}

fn run_batch(files: &[PathBuf], out_dir: &Path, source: AdapterKind, settings: &Settings) -> Result<BatchStats> {
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let results: Vec<Result<bool>> = files
        .par_iter()
        .map(|file| {
            let outcome = extract_file(file, out_dir, source, settings);
            pb.inc(1);
            outcome
        })
        .collect();
    pb.finish_and_clear();

    let mut stats = BatchStats { total: files.len(), ok: 0, errors: 0 };
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(true) => stats.ok += 1,
            Ok(false) => stats.errors += 1,
            Err(e) => {
                warn!("Skipped {}: {:#}", file.display(), e);
                stats.errors += 1;
            }
        }
    }
    Ok(stats)
}

/// Extract one saved page into `<out_dir>/<stem>.json`. `Ok(false)` when the
/// error object was written instead of a record.
fn extract_file(file: &Path, out_dir: &Path, source: AdapterKind, settings: &Settings) -> Result<bool> {
    let page = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let extraction = extract_page(&page, source, settings);

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    let target = out_dir.join(format!("{}.json", stem));
    std::fs::write(&target, serde_json::to_string_pretty(&extraction)? + "\n")
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(!extraction.is_error())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

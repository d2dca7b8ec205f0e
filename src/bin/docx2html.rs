//! CLI binary for edgequake-docx2html.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docx2html::{
    batch::output_path_for, convert, convert_batch, convert_to_file, inspect, ConversionConfig,
    ConversionProgressCallback, ConversionStats, CustomClassMap, OutputMode, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// One-line summary of what the pipeline did to a document.
fn stats_line(stats: &ConversionStats) -> String {
    format!(
        "{} titles  {} images ({} inserted)  {} tables  {}ms",
        stats.titles_converted,
        stats.image_count,
        stats.images_inserted,
        stats.tables_processed,
        stats.total_duration_ms
    )
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS),
    );
    bar.set_prefix("Converting");
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback for batches: a live progress bar plus one log
/// line per document. Documents complete out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-document wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<String, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, name: &str) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(name))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} documents…"))
        ));
    }

    fn on_document_start(&self, name: &str, _index: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(name.to_string(), Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_document_complete(&self, name: &str, stats: &ConversionStats) {
        let elapsed = self.elapsed_secs(name);
        self.bar.println(format!(
            "  {} {:<32}  {}  {}",
            green("✓"),
            name,
            dim(&stats_line(stats)),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, name: &str, error: &str) {
        let elapsed = self.elapsed_secs(name);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep the log tidy: first line only, at most 80 chars.
        let first_line = error.lines().next().unwrap_or_default();
        let msg = if first_line.chars().count() > 80 {
            format!("{}\u{2026}", first_line.chars().take(79).collect::<String>())
        } else {
            first_line.to_string()
        };

        self.bar.println(format!(
            "  {} {:<32}  {}  {}",
            red("✗"),
            name,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let failed = total.saturating_sub(succeeded);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents converted successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (HTML fragment on stdout)
  docx2html rapport.docx

  # Convert to file
  docx2html rapport.docx -o rapport.html

  # Standalone page with title and stylesheet
  docx2html --full-document rapport.docx -o rapport.html

  # Batch: writes <name>_converted.html next to each input
  docx2html docs/*.docx

  # Batch into a directory, 8 documents at a time
  docx2html -c 8 --out-dir out/ docs/*.docx

  # Extra classes for the CMS theme
  docx2html --class 'h2=title is-4' --class 'table=is-striped' rapport.docx

  # Same, from a JSON file: {"h2": "title is-4", "table": ["is-striped"]}
  docx2html --classes-file classes.json rapport.docx

  # Show the paragraph inventory (text, image counts) only
  docx2html --inspect-only rapport.docx

  # JSON output with stats and the rebuilt table of contents
  docx2html --json rapport.docx > rapport.json

WHAT THE PIPELINE DOES:
  • bold-only short paragraphs become <h2> headings (with ids)
  • straight apostrophes become ’, hyphenated words never break
  • the list after "Table des matières" becomes a numbered anchor TOC
  • inline images become placeholders; missing ones are re-inserted
  • tables get caption, thead.well, tbody and a responsive wrapper
  • presentational attributes, spans and tracked insertions are removed

ENVIRONMENT VARIABLES:
  Every flag can also be set as DOCX2HTML_<FLAG>, e.g. DOCX2HTML_PLACEHOLDER.
  RUST_LOG overrides the log filter (e.g. RUST_LOG=edgequake_docx2html=debug).
"#;

/// Convert Word documents to clean HTML.
#[derive(Parser, Debug)]
#[command(
    name = "docx2html",
    version,
    about = "Convert Word documents to clean, publication-ready HTML",
    long_about = "Convert Word (.docx) documents to clean HTML fragments: headings promoted, \
typography normalised, table of contents rebuilt, images replaced by placeholders and tables \
restructured for Bootstrap.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// One or more .docx files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write HTML to this file instead of stdout (single input only).
    #[arg(short, long, env = "DOCX2HTML_OUTPUT")]
    output: Option<PathBuf>,

    /// Write `<name>_converted.html` files into this directory.
    #[arg(long, env = "DOCX2HTML_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// `src` of every placeholder image.
    #[arg(long, env = "DOCX2HTML_PLACEHOLDER", default_value = "img_sample.jpg")]
    placeholder: String,

    /// Inline images with a payload shorter than this are kept.
    #[arg(long, env = "DOCX2HTML_IMAGE_THRESHOLD", default_value_t = 100,
          value_parser = clap::value_parser!(u64).range(1..))]
    image_threshold: u64,

    /// Caption given to tables without one.
    #[arg(long, env = "DOCX2HTML_CAPTION", default_value = "(Tableau)")]
    caption: String,

    /// Emit a standalone HTML page instead of a fragment.
    #[arg(long, env = "DOCX2HTML_FULL_DOCUMENT")]
    full_document: bool,

    /// Extra classes per tag, as TAG=CLASSES. Repeatable.
    #[arg(long = "class", value_name = "TAG=CLASSES", env = "DOCX2HTML_CLASS",
          value_delimiter = ';')]
    classes: Vec<String>,

    /// JSON file mapping tags to classes.
    #[arg(long, env = "DOCX2HTML_CLASSES_FILE")]
    classes_file: Option<PathBuf>,

    /// Keep one-item lists before tables instead of using them as captions.
    #[arg(long, env = "DOCX2HTML_NO_LIST_CAPTIONS")]
    no_list_captions: bool,

    /// Output structured JSON (ConversionOutput) instead of HTML.
    #[arg(long, env = "DOCX2HTML_JSON")]
    json: bool,

    /// Print the paragraph inventory only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Number of documents converted at once in batch mode.
    #[arg(short, long, env = "DOCX2HTML_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Disable progress bar.
    #[arg(long, env = "DOCX2HTML_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCX2HTML_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCX2HTML_QUIET")]
    quiet: bool,
}

impl Cli {
    fn is_batch(&self) -> bool {
        self.inputs.len() > 1 || self.out_dir.is_some()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when a progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.output.is_some() && cli.is_batch() {
        anyhow::bail!("--output takes a single input; use --out-dir for several documents");
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        for path in &cli.inputs {
            print_inventory(path, cli.json).await?;
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress && cli.is_batch() {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run conversion ───────────────────────────────────────────────────
    if cli.is_batch() {
        return run_batch(&cli, &config).await;
    }

    let input = &cli.inputs[0];
    let bar = show_progress.then(|| spinner(input.display().to_string()));

    if let Some(ref output_path) = cli.output {
        let result = convert_to_file(input, output_path, &config).await;
        if let Some(ref bar) = bar {
            bar.finish_and_clear();
        }
        let stats = result.context("Conversion failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {}  →  {}",
                green("✔"),
                stats_line(&stats),
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let result = convert(input, &config).await;
        if let Some(ref bar) = bar {
            bar.finish_and_clear();
        }
        let output = result.context("Conversion failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.html.as_bytes())
                .context("Failed to write to stdout")?;
            if !output.html.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }

        if !cli.quiet && !cli.json {
            if let Some(ref e) = output.inventory_error {
                eprintln!("{} inventory unavailable: {}", cyan("⚠"), e);
            }
            eprintln!("{}  {}", green("✔"), dim(&stats_line(&output.stats)));
        }
    }

    Ok(())
}

async fn run_batch(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let items = convert_batch(&cli.inputs, cli.out_dir.as_deref(), config).await;
    let failed = items.iter().filter(|i| !i.is_ok()).count();

    if cli.json {
        let report: Vec<serde_json::Value> = items
            .iter()
            .map(|i| {
                serde_json::json!({
                    "input": i.input,
                    "output": i.output,
                    "stats": i.stats,
                    "error": i.error.as_ref().map(|e| e.to_string()),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise batch report")?
        );
    } else if !cli.quiet && config.progress_callback.is_none() {
        // The progress callback already printed one line per document.
        for item in &items {
            match (&item.stats, &item.error) {
                (Some(stats), _) => eprintln!(
                    "{} {}  →  {}  {}",
                    green("✓"),
                    item.input.display(),
                    item.output.display(),
                    dim(&stats_line(stats))
                ),
                (_, Some(e)) => eprintln!("{} {}  {}", red("✗"), item.input.display(), red(&e.to_string())),
                _ => {}
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} documents failed", items.len());
    }
    Ok(())
}

async fn print_inventory(path: &Path, json: bool) -> Result<()> {
    let inventory = inspect(path)
        .await
        .with_context(|| format!("Failed to inspect {}", path.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&inventory).context("Failed to serialise inventory")?
        );
        return Ok(());
    }

    println!("File:         {}", path.display());
    println!("Paragraphs:   {}", inventory.len());
    println!("Images:       {}", inventory.expected_images());
    println!("Would write:  {}", output_path_for(path, None).display());
    for record in inventory.records() {
        let text: String = record.text.chars().take(60).collect();
        let marker = if record.has_image {
            format!("[{} img]", record.image_count)
        } else {
            String::new()
        };
        println!("  {:>4}  {:<8} {}", record.index, marker, text);
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut classes = if let Some(ref path) = cli.classes_file {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read class map from {:?}", path))?;
        CustomClassMap::from_json(&json).context("Invalid class map")?
    } else {
        CustomClassMap::default()
    };
    for rule in &cli.classes {
        let (tag, value) = parse_class_rule(rule)?;
        classes.insert(tag, value);
    }

    let threshold = usize::try_from(cli.image_threshold).context("Image threshold too large")?;
    let mut builder = ConversionConfig::builder()
        .placeholder_src(&cli.placeholder)
        .inline_image_threshold(threshold)
        .table_caption(&cli.caption)
        .output_mode(if cli.full_document {
            OutputMode::Document
        } else {
            OutputMode::Fragment
        })
        .custom_classes(classes)
        .list_captions(!cli.no_list_captions)
        .concurrency(cli.concurrency);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--class TAG=CLASSES`.
fn parse_class_rule(s: &str) -> Result<(&str, &str)> {
    let (tag, classes) = s
        .split_once('=')
        .with_context(|| format!("Invalid --class '{s}': expected TAG=CLASSES"))?;
    let tag = tag.trim();
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        anyhow::bail!("Invalid tag name in --class '{s}'");
    }
    Ok((tag, classes))
}

//! Replays recorded JSON-lines frames through the compliance engine.
//!
//! ```text
//! hygiene-validate --input frames.jsonl [--config rules.toml] [--output events.jsonl] [--summary]
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::Parser;
use hygiene_core::config;
use hygiene_core::engine::dispatch;
use hygiene_core::{
    ComplianceEvent, EngineRegistry, EventKind, EventSink, JsonLinesSink, LogSink,
    PersonFrameObservation, RegionTransition,
};
use hygiene_types::formatting::{format_count, format_duration, format_dwell, format_pct_ratio};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Camera id for records that don't name one
const DEFAULT_CAMERA: &str = "default";

#[derive(Parser)]
#[command(version, about = "Replay recorded frames through the hygiene compliance rules")]
struct Cli {
    /// JSON-lines file, one frame record per line
    #[arg(short, long)]
    input: PathBuf,

    /// Rule config (TOML); falls back to the user config file, then defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write events as JSON lines (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print per-kind counts and dwell statistics to stderr
    #[arg(short, long)]
    summary: bool,

    /// Use `1.234,5` number formatting in the summary
    #[arg(long)]
    european: bool,
}

/// One recorded frame.
#[derive(Debug, Deserialize)]
struct FrameRecord {
    #[serde(default)]
    camera: Option<String>,
    /// Frame reference time; wall clock or the latest input override if absent
    #[serde(default)]
    timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    observations: Vec<PersonFrameObservation>,
    /// Bypasses transition inference for this frame
    #[serde(default)]
    transitions: Option<Vec<RegionTransition>>,
}

#[derive(Debug, Default)]
struct Summary {
    frames: u64,
    first_frame: Option<NaiveDateTime>,
    last_frame: Option<NaiveDateTime>,
    counts: BTreeMap<EventKind, u64>,
    short_dwells: Vec<f64>,
}

impl Summary {
    fn record_frame(&mut self, timestamp: Option<NaiveDateTime>) {
        self.frames += 1;
        if let Some(ts) = timestamp {
            self.first_frame = Some(self.first_frame.map_or(ts, |first| first.min(ts)));
            self.last_frame = Some(self.last_frame.map_or(ts, |last| last.max(ts)));
        }
    }

    fn total_events(&self) -> u64 {
        self.counts.values().sum()
    }

    fn render(&self, european: bool) -> String {
        let total = self.total_events();
        let mut out = String::new();

        out.push_str(&format!("Frames:  {}\n", format_count(self.frames, european)));
        if let (Some(first), Some(last)) = (self.first_frame, self.last_frame) {
            let span = last.signed_duration_since(first).num_seconds();
            out.push_str(&format!("Span:    {}\n", format_duration(span)));
        }
        out.push_str(&format!("Events:  {}\n", format_count(total, european)));

        for kind in EventKind::ALL {
            let count = self.counts.get(&kind).copied().unwrap_or(0);
            out.push_str(&format!(
                "  {:<24} {:>8} {:>7}\n",
                kind.as_str(),
                format_count(count, european),
                format_pct_ratio(count, total, european)
            ));
        }

        if !self.short_dwells.is_empty() {
            let n = self.short_dwells.len() as f64;
            let min = self.short_dwells.iter().copied().fold(f64::INFINITY, f64::min);
            let max = self.short_dwells.iter().copied().fold(0.0, f64::max);
            let mean = self.short_dwells.iter().sum::<f64>() / n;
            out.push_str(&format!(
                "Short dwells: min {}, mean {}, max {}\n",
                format_dwell(min, european),
                format_dwell(mean, european),
                format_dwell(max, european)
            ));
        }
        out
    }
}

impl EventSink for Summary {
    fn handle_event(&mut self, event: &ComplianceEvent) {
        *self.counts.entry(event.kind).or_default() += 1;
        if event.kind == EventKind::InsufficientDwellTime
            && let Some(dwell) = event.dwell_seconds()
        {
            self.short_dwells.push(dwell);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    // If HYGIENE_LOG_PATH is set, append to that file
    if let Ok(path) = std::env::var("HYGIENE_LOG_PATH")
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(file)
            .init();
        return;
    }

    // Events own stdout, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(summary) => {
            if cli.summary {
                eprint!("{}", summary.render(cli.european));
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Replay failed");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<Summary, String> {
    let rules = config::load_or_default(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let mut registry = EngineRegistry::new(rules).map_err(|e| e.to_string())?;

    let input = File::open(&cli.input)
        .map_err(|e| format!("failed to open {}: {e}", cli.input.display()))?;
    let output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).map_err(|e| format!("failed to create {}: {e}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let mut events_out = JsonLinesSink::new(output);
    let mut summary = Summary::default();
    replay(
        BufReader::new(input),
        &mut registry,
        &mut events_out,
        &mut summary,
    )?;

    tracing::info!(
        frames = summary.frames,
        events = events_out.written(),
        cameras = registry.len(),
        "Replay finished"
    );
    Ok(summary)
}

/// Feed every record through the registry. Stops at the first malformed line.
fn replay<R: BufRead, W: Write>(
    reader: R,
    registry: &mut EngineRegistry,
    events_out: &mut JsonLinesSink<W>,
    summary: &mut Summary,
) -> Result<(), String> {
    let mut log = LogSink::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| format!("line {line_no}: {e}"))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: FrameRecord =
            serde_json::from_str(line).map_err(|e| format!("line {line_no}: {e}"))?;
        let camera = record.camera.as_deref().unwrap_or(DEFAULT_CAMERA);
        let engine = registry.engine_mut(camera);
        let explicit = record.transitions.as_deref();

        let events = match record.timestamp {
            Some(ts) => engine.step_at(&record.observations, explicit, ts),
            None => engine.step(&record.observations, explicit),
        };
        summary.record_frame(record.timestamp);

        events_out.set_camera(Some(camera.to_string()));
        log.set_camera(Some(camera.to_string()));
        let sinks: &mut [&mut dyn EventSink] = &mut [&mut *events_out, &mut log, &mut *summary];
        dispatch(&events, sinks);
    }

    events_out.flush().map_err(|e| format!("failed to flush events: {e}"))?;
    if events_out.failed() > 0 {
        return Err(format!("{} events could not be written", events_out.failed()));
    }
    Ok(())
}

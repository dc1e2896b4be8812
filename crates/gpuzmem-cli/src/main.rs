use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gpuzmem_core::{DEFAULT_REGION_NAME, DecodeError, FileRegion, Stat, decode_region};
use log::{debug, info, warn};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("GPUZMEM_BUILD_COMMIT"),
    ", built ",
    env!("GPUZMEM_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "gpuzmem")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decode GPU-Z shared-memory snapshots into records and sensor readings.",
    long_about = None,
    after_help = "Examples:\n  gpuzmem decode /dev/shm/GPUZShMem --stdout --pretty\n  gpuzmem query region.bin --sensor \"GPU Temperature\"\n  gpuzmem watch region.bin --interval-ms 500 --count 10"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct RegionArg {
    /// Region dump or shared-memory file; a directory selects its GPUZShMem entry
    #[arg(env = "GPUZMEM_REGION")]
    region: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a region once and write the result as JSON.
    Decode {
        #[command(flatten)]
        region: RegionArg,

        /// Output path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write JSON to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Pretty-print JSON output (compact by default)
        #[arg(long)]
        pretty: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Print a single record or sensor value.
    Query {
        #[command(flatten)]
        region: RegionArg,

        /// Record key to print
        #[arg(long, required_unless_present = "sensor", conflicts_with = "sensor")]
        record: Option<String>,

        /// Sensor name to print, formatted with its unit
        #[arg(long)]
        sensor: Option<String>,
    },
    /// Decode a region repeatedly and print one JSON line per sample.
    Watch {
        #[command(flatten)]
        region: RegionArg,

        /// Delay between samples in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        /// Stop after this many samples (runs until interrupted when omitted)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        count: Option<u64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Decode {
            region,
            output,
            stdout,
            pretty,
            quiet,
        } => cmd_decode(&region.region, output, stdout, pretty, quiet),
        Commands::Query {
            region,
            record,
            sensor,
        } => cmd_query(&region.region, record, sensor),
        Commands::Watch {
            region,
            interval_ms,
            count,
        } => cmd_watch(&region.region, interval_ms, count),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

impl From<DecodeError> for CliError {
    fn from(err: DecodeError) -> Self {
        let hint = match &err {
            DecodeError::SourceUnavailable(_) => {
                Some("check the region path and that GPU-Z shared memory is enabled".to_string())
            }
            DecodeError::ShortRead { .. } => {
                Some("the snapshot is truncated or from an incompatible producer".to_string())
            }
            DecodeError::NoData => Some("start GPU-Z and let it publish sensor data".to_string()),
        };
        CliError::new(err.to_string(), hint)
    }
}

fn cmd_decode(
    path: &Path,
    output: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let region = locate_region(path)?;
    let output = match (stdout, output) {
        (true, _) => None,
        (false, Some(output)) => Some(output),
        (false, None) => {
            return Err(CliError::new(
                "missing output path",
                Some("use -o/--output or --stdout".to_string()),
            ));
        }
    };
    if let Some(output) = output.as_deref() {
        refuse_overwriting_region(&region, output)?;
    }

    let stat = decode_snapshot(&region)?;
    let encoded = if pretty {
        serde_json::to_string_pretty(&stat)
    } else {
        serde_json::to_string(&stat)
    };
    let json = encoded.context("JSON serialization failed")?;

    let Some(output) = output else {
        print!("{}", json);
        return Ok(());
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(&output, json)
        .with_context(|| format!("Failed to write stat: {}", output.display()))?;

    if !quiet {
        eprintln!("OK: stat written -> {}", output.display());
    }
    Ok(())
}

fn cmd_query(path: &Path, record: Option<String>, sensor: Option<String>) -> Result<(), CliError> {
    let stat = decode_snapshot(&locate_region(path)?)?;

    if let Some(key) = record {
        let value = stat.get_record(&key).ok_or_else(|| {
            CliError::new(
                format!("record not found: '{}'", key),
                Some(format!(
                    "{} records available; run `gpuzmem decode --stdout` to list them",
                    stat.available_records().len()
                )),
            )
        })?;
        println!("{}", value);
        return Ok(());
    }

    let name = sensor.ok_or_else(|| {
        CliError::new(
            "nothing to query",
            Some("use --record <KEY> or --sensor <NAME>".to_string()),
        )
    })?;
    let reading = stat.get_sensor(&name).ok_or_else(|| {
        CliError::new(
            format!("sensor not found: '{}'", name),
            Some(format!(
                "{} sensors available; run `gpuzmem decode --stdout` to list them",
                stat.available_sensors().len()
            )),
        )
    })?;
    println!("{}", reading.display_value());
    Ok(())
}

#[derive(Serialize)]
struct Sample<'a> {
    sampled_at: String,
    stat: &'a Stat,
}

fn cmd_watch(path: &Path, interval_ms: u64, count: Option<u64>) -> Result<(), CliError> {
    let region = locate_region(path)?;
    let interval = Duration::from_millis(interval_ms);
    info!("watching {} every {} ms", region.path().display(), interval_ms);

    let mut taken = 0u64;
    loop {
        match decode_region(&region) {
            Ok(stat) => {
                if stat.is_busy() {
                    warn!("sample taken while producer was busy; values may be torn");
                }
                let sample = Sample {
                    sampled_at: now_rfc3339()?,
                    stat: &stat,
                };
                let line = serde_json::to_string(&sample).context("JSON serialization failed")?;
                println!("{}", line);
            }
            Err(err) if err.is_no_data() => {
                warn!("{}", err);
            }
            Err(err) => return Err(err.into()),
        }

        taken += 1;
        if count.is_some_and(|limit| taken >= limit) {
            debug!("sample limit reached after {} samples", taken);
            return Ok(());
        }
        thread::sleep(interval);
    }
}

/// Map the command-line path onto a region file. A directory stands for the
/// region GPU-Z publishes inside it, so `/dev/shm` selects `/dev/shm/GPUZShMem`.
fn locate_region(path: &Path) -> Result<FileRegion, CliError> {
    let region = if path.is_dir() {
        FileRegion::in_dir(path)
    } else {
        FileRegion::new(path)
    };
    if !region.path().is_file() {
        return Err(CliError::new(
            format!("region not found: {}", region.path().display()),
            Some(format!(
                "pass a region dump, or a directory holding {}",
                DEFAULT_REGION_NAME
            )),
        ));
    }
    debug!("region file: {}", region.path().display());
    Ok(region)
}

fn refuse_overwriting_region(region: &FileRegion, output: &Path) -> Result<(), CliError> {
    // A missing output cannot alias the region.
    let Ok(target) = fs::canonicalize(output) else {
        return Ok(());
    };
    let source = fs::canonicalize(region.path())
        .with_context(|| format!("Failed to resolve region path: {}", region.path().display()))?;
    if target == source {
        return Err(CliError::new(
            format!("output would overwrite the region: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn decode_snapshot(region: &FileRegion) -> Result<Stat, CliError> {
    let stat = decode_region(region)?;
    if stat.is_busy() {
        warn!("snapshot taken while producer was busy; values may be torn");
    }
    debug!(
        "decoded {} records and {} sensors (version {})",
        stat.available_records().len(),
        stat.available_sensors().len(),
        stat.version
    );
    Ok(stat)
}

fn now_rfc3339() -> Result<String, CliError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("Failed to format sample timestamp")
        .map_err(Into::into)
}

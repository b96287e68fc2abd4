//! Digest CLI - Command-line interface for Training Digest
//!
//! Commands:
//! - combine: Build the digest for the latest (or a given) export folder
//! - analyze: Derived metrics for one activity's streams
//! - zones: Heart rate zone distribution for one activity's streams
//! - doctor: Check configuration and export folder health

use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use training_digest::analytics::streams;
use training_digest::export::{self, read_json, REQUIRED_FILES, STREAMS_FILE};
use training_digest::types::RawStream;
use training_digest::{
    ActivityAnalyzer, DigestConfig, DigestError, DigestProcessor, DigestReport, StreamIndex,
    ZoneDistributor, DIGEST_VERSION, PRODUCER_NAME,
};

/// Digest - Compact LLM-ready digests of training platform exports
#[derive(Parser)]
#[command(name = "digest")]
#[command(version = DIGEST_VERSION)]
#[command(about = "Combine training exports into one LLM-ready JSON file", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the digest for an export folder
    Combine {
        /// Export folder (default: latest folder in the data directory)
        folder: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Compute splits, peak efforts and zones for one activity's streams
    Analyze {
        /// Streams JSON file (use - or omit for stdin)
        input: Option<PathBuf>,

        /// Activity type, decides whether splits are computed
        #[arg(long = "type", default_value = "Run")]
        activity_type: String,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Heart rate zone distribution for one activity's streams
    Zones {
        /// Streams JSON file (use - or omit for stdin)
        input: Option<PathBuf>,

        /// Ascending zone upper bounds, e.g. 130,150,165,180
        #[arg(long, value_delimiter = ',')]
        bounds: Vec<f64>,
    },

    /// Check configuration and export folder health
    Doctor {
        /// Export folder to check (default: latest folder in the data directory)
        folder: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ConfigOverrides {
    /// Directory holding one sub-folder per export download
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Output file prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Ascending heart rate zone upper bounds, e.g. 130,150,165,180
    #[arg(long, value_delimiter = ',')]
    hr_zones: Vec<f64>,
}

impl ConfigOverrides {
    fn apply(self, mut config: DigestConfig) -> Result<DigestConfig, DigestCliError> {
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(prefix) = self.prefix {
            config.output_prefix = prefix;
        }
        if !self.hr_zones.is_empty() {
            config.hr_zone_bounds = self.hr_zones;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), DigestCliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Combine { folder, overrides } => {
            cmd_combine(overrides.apply(config)?, folder.as_deref())
        }
        Commands::Analyze {
            input,
            activity_type,
            overrides,
        } => cmd_analyze(overrides.apply(config)?, input.as_deref(), &activity_type),
        Commands::Zones { input, bounds } => cmd_zones(config, input.as_deref(), bounds),
        Commands::Doctor { folder, json } => cmd_doctor(&config, folder.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<DigestConfig, DigestCliError> {
    match path {
        Some(path) => Ok(DigestConfig::load(path)?),
        None => Ok(DigestConfig::default()),
    }
}

fn cmd_combine(config: DigestConfig, folder: Option<&Path>) -> Result<(), DigestCliError> {
    let processor = DigestProcessor::new(config);
    let report = processor.combine_folder(folder)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &DigestReport) {
    let rule = "=".repeat(60);
    let summary = &report.summary;

    println!("\n{rule}");
    println!("OUTPUT SUMMARY - Export ID: {}", report.export_id);
    println!("{rule}");
    println!("File: {}", report.output_path.display());
    println!("Size: {:.1} KB", report.size_kb());
    println!("Export ID: {}", report.export_id);
    println!("\nContains:");
    println!("  - {} activities with detailed metrics", report.activities);
    println!("  - {} wellness records", report.wellness);
    println!("  - {} planned workouts", report.planned_workouts);
    println!("  - Per-km splits for {} runs", report.runs_with_splits);
    println!("  - Peak efforts for {} activities", report.activities_with_peaks);
    println!("\nSummary stats:");
    println!(
        "  - Period: {} to {}",
        summary.period.start.as_deref().unwrap_or("-"),
        summary.period.end.as_deref().unwrap_or("-")
    );
    println!("  - Total distance: {} km", summary.totals.total_distance_km);
    println!(
        "  - CTL change: {} → {}",
        display_opt(summary.fitness_trend.ctl_start),
        display_opt(summary.fitness_trend.ctl_end)
    );
    println!("{rule}");
}

fn display_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn cmd_analyze(
    config: DigestConfig,
    input: Option<&Path>,
    activity_type: &str,
) -> Result<(), DigestCliError> {
    let streams = read_streams(input)?;
    let metrics = ActivityAnalyzer::from_config(&config).analyze(Some(activity_type), &streams);
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

fn cmd_zones(
    mut config: DigestConfig,
    input: Option<&Path>,
    bounds: Vec<f64>,
) -> Result<(), DigestCliError> {
    if !bounds.is_empty() {
        config.hr_zone_bounds = bounds;
    }
    config.validate()?;
    if config.hr_zone_bounds.is_empty() {
        return Err(DigestCliError::NoZoneBounds);
    }

    let stream_set = read_streams(input)?;
    let index = StreamIndex::new(&stream_set);
    if !index.contains(streams::HEARTRATE) {
        log::warn!("No heartrate stream in input");
    }
    let distribution = ZoneDistributor::distribute(index.heartrate(), &config.hr_zone_bounds);
    println!("{}", serde_json::to_string_pretty(&distribution)?);
    Ok(())
}

/// Read a JSON array of streams from a file or piped stdin
fn read_streams(input: Option<&Path>) -> Result<Vec<RawStream>, DigestCliError> {
    let json = match input {
        Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(path)?,
        _ => {
            if atty::is(atty::Stream::Stdin) {
                return Err(DigestCliError::NoInput);
            }
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(serde_json::from_str(&json)?)
}

fn cmd_doctor(config: &DigestConfig, folder: Option<&Path>, json: bool) -> Result<(), DigestCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "digest_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Digest version {}", DIGEST_VERSION),
    });

    checks.push(match config.validate() {
        Ok(()) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Output prefix '{}', {} heart rate zones",
                config.output_prefix,
                config.hr_zone_bounds.len()
            ),
        },
        Err(e) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    match export::find_latest_download(&config.data_dir, folder) {
        Ok(folder) => {
            checks.push(DoctorCheck {
                name: "export_folder".to_string(),
                status: CheckStatus::Ok,
                message: folder.display().to_string(),
            });
            check_export_files(&folder, &mut checks);
        }
        Err(e) => checks.push(DoctorCheck {
            name: "export_folder".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (analyze and zones need an input file)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (analyze and zones can read streams)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: DIGEST_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Digest Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(DigestCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_export_files(folder: &Path, checks: &mut Vec<DoctorCheck>) {
    for file in REQUIRED_FILES {
        checks.push(match read_json::<serde_json::Value>(&folder.join(file)) {
            Ok(value) => DoctorCheck {
                name: file.to_string(),
                status: CheckStatus::Ok,
                message: match value.as_array() {
                    Some(records) => format!("{} records", records.len()),
                    None => "valid".to_string(),
                },
            },
            Err(e) => DoctorCheck {
                name: file.to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        });
    }

    let streams_path = folder.join(STREAMS_FILE);
    checks.push(if !streams_path.exists() {
        DoctorCheck {
            name: STREAMS_FILE.to_string(),
            status: CheckStatus::Warning,
            message: "Not present, splits and peak efforts will be skipped".to_string(),
        }
    } else {
        match read_json::<HashMap<String, Vec<RawStream>>>(&streams_path) {
            Ok(streams) => DoctorCheck {
                name: STREAMS_FILE.to_string(),
                status: CheckStatus::Ok,
                message: format!("Streams for {} activities", streams.len()),
            },
            Err(e) => DoctorCheck {
                name: STREAMS_FILE.to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        }
    });
}

// Error types

#[derive(Debug)]
enum DigestCliError {
    Io(io::Error),
    Digest(DigestError),
    Json(serde_json::Error),
    NoInput,
    NoZoneBounds,
    DoctorFailed,
}

impl From<io::Error> for DigestCliError {
    fn from(e: io::Error) -> Self {
        DigestCliError::Io(e)
    }
}

impl From<DigestError> for DigestCliError {
    fn from(e: DigestError) -> Self {
        DigestCliError::Digest(e)
    }
}

impl From<serde_json::Error> for DigestCliError {
    fn from(e: serde_json::Error) -> Self {
        DigestCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DigestCliError> for CliError {
    fn from(e: DigestCliError) -> Self {
        match e {
            DigestCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            DigestCliError::Digest(e) => digest_error(e),
            DigestCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Input must be a JSON array of {\"type\", \"data\"} streams".to_string()),
            },
            DigestCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No input file given and stdin is a terminal".to_string(),
                hint: Some("Pass a streams file or pipe one into stdin".to_string()),
            },
            DigestCliError::NoZoneBounds => CliError {
                code: "NO_ZONE_BOUNDS".to_string(),
                message: "No heart rate zone bounds configured".to_string(),
                hint: Some("Pass --bounds or set hr_zone_bounds in the config".to_string()),
            },
            DigestCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn digest_error(e: DigestError) -> CliError {
    let (code, hint) = match &e {
        DigestError::NoDownloadFolders(_) => (
            "NO_DOWNLOADS",
            "Download an export first or pass the folder explicitly",
        ),
        DigestError::MissingFile(_) => ("MISSING_FILE", "Re-download the export"),
        DigestError::ParseError { .. } | DigestError::Json(_) => {
            ("PARSE_ERROR", "Check that the export files are complete JSON")
        }
        DigestError::ConfigError(_) => ("CONFIG_ERROR", "Fix the config file or flags"),
        DigestError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
    };
    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use region_profiler::log::{error, set_log_level, LevelFilter};
use region_profiler::{func_region, global, region, ProfilerConfig, ReportFormat};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    Console,
    Csv,
    Json,
    None,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Console => ReportFormat::Console,
            Format::Csv => ReportFormat::Csv,
            Format::Json => ReportFormat::Json,
            Format::None => ReportFormat::Disabled,
        }
    }
}

/// Runs a small instrumented workload under the process-wide profiler.
#[derive(Parser, Debug)]
struct Args {
    /// Directory for report files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Prefix for report file names
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Overwrite existing report files
    #[arg(short, long)]
    force_overwrite: bool,

    #[arg(long, value_enum, default_value = "console")]
    format: Format,

    /// Write a Chrome trace to this file
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Print every region transition to stderr
    #[arg(long)]
    debug: bool,

    /// Load the profiler configuration from a JSON file; the other report flags are ignored
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level of the profiler's diagnostics, e.g. `warn`
    #[arg(long)]
    log_level: Option<String>,

    /// How many times the workload runs
    #[arg(long, default_value_t = 2)]
    repeat: usize,

    /// Stop pulling records after this many
    #[arg(long)]
    break_after: Option<usize>,
}

fn load_records(count: usize) -> Vec<u64> {
    let _region = func_region!();
    (0..count as u64).collect()
}

fn checksum(value: u64) -> u64 {
    let _region = region!("checksum", global);
    value.wrapping_mul(0x9e37_79b9_7f4a_7c15).rotate_left(17)
}

fn process(args: &Args) -> u64 {
    let _region = func_region!();
    let records = load_records(3);
    let mut total = 0;
    for (index, record) in global::iter_proxy(&records, Some("next record"), false).enumerate() {
        if args.break_after == Some(index) {
            break;
        }
        let _step = region!("step");
        total += checksum(*record);
    }
    total
}

fn build_config(args: &Args) -> Result<ProfilerConfig, region_profiler::ProfilerError> {
    if let Some(path) = &args.config {
        return ProfilerConfig::from_json_file(path);
    }
    let mut config = ProfilerConfig::new();
    config
        .directory(args.output.clone())
        .file_prefix(&args.prefix)
        .overwrite(args.force_overwrite)
        .report_format(args.format.into())
        .debug(args.debug);
    if let Some(trace) = &args.trace {
        config.chrome_trace_file(trace);
    }
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Some(level) = &args.log_level {
        match level.parse::<LevelFilter>() {
            Ok(level) => set_log_level(level),
            Err(e) => {
                eprintln!("invalid log level `{level}`: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid profiler configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    global::install(&config);
    // A second install keeps the first instance.
    global::install(&ProfilerConfig::default());

    let mut total = 0u64;
    for _ in 0..args.repeat {
        total = total.wrapping_add(process(&args));
    }
    println!("checksum: {total:x}");

    match global::finalize() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("could not finalize the profiler: {e}");
            ExitCode::FAILURE
        }
    }
}

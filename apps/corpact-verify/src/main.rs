use clap::{Parser, ValueEnum};
use corpact_application::config::to_toml_pretty;
use corpact_application::reporting::render_transcript;
use corpact_infrastructure::control::CancellationFlag;
use corpact_verify::runner::{self, Overrides, EXIT_PASSED, EXIT_USAGE};
use corpact_verify::{logging, signal};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "corpact-verify")]
#[command(
    about = "Verifies that a corporate-action submission is accepted (202) and then processed asynchronously.",
    version
)]
#[command(
    after_help = "Examples:\n  corpact-verify --config apps/corpact-verify/configs/local.toml\n  corpact-verify --port 3000 --record-source web-ui/server.log --json\n  corpact-verify --mode validate --config configs/local.toml\n"
)]
struct Cli {
    /// run | validate | print-config
    #[arg(long, value_enum, default_value_t = Mode::Run)]
    mode: Mode,

    /// Config file path (TOML). If omitted, uses env CORPACT_CONFIG, then built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full JSON report instead of the transcript.
    #[arg(long)]
    json: bool,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    submission_path: Option<String>,

    #[arg(long)]
    readiness_timeout_ms: Option<u64>,

    #[arg(long)]
    completion_timeout_ms: Option<u64>,

    /// Completion poll interval.
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Event record (log file) to watch for markers.
    #[arg(long)]
    record_source: Option<PathBuf>,

    /// JSON payload file to submit instead of the built-in sample.
    #[arg(long)]
    payload: Option<PathBuf>,

    #[arg(long)]
    event_id: Option<String>,

    /// Expected marker; repeat to list several. Replaces the configured set.
    #[arg(long = "marker")]
    markers: Vec<String>,

    /// Default log filter when CORPACT_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// text | json
    #[arg(long, default_value = "text")]
    log_format: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Validate,
    PrintConfig,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = logging::init_tracing(&cli.log_level, &cli.log_format) {
        eprintln!("error: {err}");
        std::process::exit(EXIT_USAGE);
    }

    let config_path = cli.config.clone().or_else(|| {
        std::env::var("CORPACT_CONFIG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    });
    let overrides = Overrides {
        host: cli.host.clone(),
        port: cli.port,
        submission_path: cli.submission_path.clone(),
        readiness_timeout_ms: cli.readiness_timeout_ms,
        completion_timeout_ms: cli.completion_timeout_ms,
        poll_interval_ms: cli.poll_interval_ms,
        record_source: cli.record_source.as_ref().map(|p| p.display().to_string()),
        payload: cli.payload.as_ref().map(|p| p.display().to_string()),
        event_id: cli.event_id.clone(),
        markers: cli.markers.clone(),
    };

    let config = match runner::resolve_config(config_path.as_deref(), &overrides) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(EXIT_USAGE);
        }
    };

    let code = match cli.mode {
        Mode::PrintConfig => match to_toml_pretty(&config) {
            Ok(toml) => {
                print!("{toml}");
                EXIT_PASSED
            }
            Err(err) => {
                eprintln!("error: {err}");
                EXIT_USAGE
            }
        },
        Mode::Validate => match runner::preflight(&config) {
            Ok(issues) if issues.is_empty() => {
                println!("configuration and payload OK");
                EXIT_PASSED
            }
            Ok(issues) => {
                for issue in &issues {
                    println!("payload issue: {issue}");
                }
                EXIT_USAGE
            }
            Err(err) => {
                eprintln!("error: {err}");
                EXIT_USAGE
            }
        },
        Mode::Run => run(&config, cli.json),
    };
    std::process::exit(code);
}

fn run(config: &corpact_application::config::Config, json: bool) -> i32 {
    let flag = CancellationFlag::new();
    if let Err(err) = signal::cancel_on_ctrl_c(flag.clone()) {
        tracing::warn!(error = %err, "running without Ctrl-C cancellation");
    }

    let report = match runner::run_verification(config, &flag) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {err}");
            return EXIT_USAGE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(out) => println!("{out}"),
            Err(err) => eprintln!("error: failed to serialize report: {err}"),
        }
    } else {
        print!("{}", render_transcript(&report));
    }
    runner::exit_code(&report)
}

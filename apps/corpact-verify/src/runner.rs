use corpact_application::config::{load_config, load_payload, validate_config, Config};
use corpact_application::harness::{run_harness, HarnessDeps, HarnessPlan, HarnessReport};
use corpact_domain::repositories::control::RunControl;
use corpact_infrastructure::http::HttpSubmissionClient;
use corpact_infrastructure::network::TcpConnectionProbe;
use corpact_infrastructure::records::FileRecordSource;
use std::path::Path;

pub const EXIT_PASSED: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_CANCELLED: i32 = 130;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub submission_path: Option<String>,
    pub readiness_timeout_ms: Option<u64>,
    pub completion_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub record_source: Option<String>,
    pub payload: Option<String>,
    pub event_id: Option<String>,
    pub markers: Vec<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &Overrides) {
    if let Some(host) = &overrides.host {
        config.target.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.target.port = port;
    }
    if let Some(path) = &overrides.submission_path {
        config.target.submission_path = path.clone();
    }
    if let Some(ms) = overrides.readiness_timeout_ms {
        config.readiness.timeout_ms = ms;
    }
    if let Some(ms) = overrides.completion_timeout_ms {
        config.completion.timeout_ms = ms;
    }
    if let Some(ms) = overrides.poll_interval_ms {
        config.completion.poll_interval_ms = ms;
    }
    if let Some(path) = &overrides.record_source {
        config.completion.record_source_path = path.clone();
    }
    if let Some(path) = &overrides.payload {
        config.submission.payload_path = Some(path.clone());
    }
    if let Some(event_id) = &overrides.event_id {
        config.submission.event_id = event_id.clone();
    }
    if !overrides.markers.is_empty() {
        config.completion.expected_markers = Some(overrides.markers.clone());
    }
}

/// File config (or built-in defaults) with overrides applied, validated.
pub fn resolve_config(config_path: Option<&Path>, overrides: &Overrides) -> Result<Config, String> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, overrides);
    validate_config(&config)
        .map_err(|errors| format!("invalid configuration:\n  {}", errors.join("\n  ")))?;
    Ok(config)
}

/// Checks config and payload without contacting the service. Returns the
/// payload issues; an empty list means the run is ready to go.
pub fn preflight(config: &Config) -> Result<Vec<String>, String> {
    let payload = load_payload(config)?;
    Ok(payload.preflight())
}

/// `Err` only when the run cannot be set up; every runtime failure is inside
/// the report's verdict.
pub fn run_verification(
    config: &Config,
    control: &dyn RunControl,
) -> Result<HarnessReport, String> {
    let payload = load_payload(config)?;
    let plan = HarnessPlan::from_config(config, payload);

    let probe = TcpConnectionProbe::new();
    let gateway = HttpSubmissionClient::new(config.submission.request_timeout_ms)?;
    let record_source = FileRecordSource::new(config.record_source_path());

    Ok(run_harness(
        &plan,
        &HarnessDeps {
            probe: &probe,
            gateway: &gateway,
            record_source: &record_source,
            control,
        },
    ))
}

pub fn exit_code(report: &HarnessReport) -> i32 {
    if report.passed() {
        EXIT_PASSED
    } else if report.verdict.is_cancelled() {
        EXIT_CANCELLED
    } else {
        EXIT_FAILED
    }
}

use corpact_domain::value_objects::endpoint::Endpoint;
use corpact_domain::value_objects::markers::ExpectedMarkers;
use corpact_domain::value_objects::payload::{SubmissionDocument, SubmissionPayload};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_EVENT_ID: &str = "CA-TEST-001";

/// Lines the services log when they give up on a submission.
pub const DEFAULT_FAILURE_MARKERS: [&str; 4] = [
    "DMZ Service: Validation failed",
    "Internal Service: Duplicate submission detected",
    "Internal Service: Encryption failed",
    "[EventBus] Error processing event",
];

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
    pub submission_path: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            submission_path: "/api/submit".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct ReadinessConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            poll_interval_ms: 1_000,
            connect_timeout_ms: 1_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct SubmissionConfig {
    pub request_timeout_ms: u64,
    pub event_id: String,
    /// JSON document to submit instead of the built-in sample.
    pub payload_path: Option<String>,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            event_id: DEFAULT_EVENT_ID.to_string(),
            payload_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct CompletionConfig {
    /// Fixed wait before the first read. Kept for compatibility with the old
    /// sleep-then-check flow; polling makes it unnecessary.
    pub post_delay_before_verify_ms: u64,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub record_source_path: String,
    pub expected_markers: Option<Vec<String>>,
    /// Reported when present in the record; an empty list turns this off.
    pub failure_markers: Vec<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            post_delay_before_verify_ms: 0,
            timeout_ms: 30_000,
            poll_interval_ms: 500,
            record_source_path: "web-ui/server.log".to_string(),
            expected_markers: None,
            failure_markers: DEFAULT_FAILURE_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.target.host.trim(), self.target.port)
    }

    pub fn expected_markers(&self, event_id: &str) -> ExpectedMarkers {
        match &self.completion.expected_markers {
            Some(markers) => ExpectedMarkers::new(markers.iter().cloned()),
            None => ExpectedMarkers::default_for_event(event_id),
        }
    }

    pub fn failure_markers(&self) -> ExpectedMarkers {
        ExpectedMarkers::new(self.completion.failure_markers.iter().cloned())
    }

    pub fn record_source_path(&self) -> PathBuf {
        PathBuf::from(&self.completion.record_source_path)
    }

    /// Resolved harness timings.
    pub fn timings(&self) -> HarnessTimings {
        HarnessTimings {
            readiness_timeout: Duration::from_millis(self.readiness.timeout_ms),
            readiness_poll_interval: Duration::from_millis(self.readiness.poll_interval_ms),
            connect_timeout: Duration::from_millis(self.readiness.connect_timeout_ms),
            post_delay_before_verify: Duration::from_millis(
                self.completion.post_delay_before_verify_ms,
            ),
            completion_timeout: Duration::from_millis(self.completion.timeout_ms),
            completion_poll_interval: Duration::from_millis(self.completion.poll_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessTimings {
    pub readiness_timeout: Duration,
    pub readiness_poll_interval: Duration,
    pub connect_timeout: Duration,
    pub post_delay_before_verify: Duration,
    pub completion_timeout: Duration,
    pub completion_poll_interval: Duration,
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}

/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.target.host.trim().is_empty() {
        errors.push("target.host must not be empty".to_string());
    }
    if config.target.port == 0 {
        errors.push("target.port must be in 1..=65535".to_string());
    }
    if !config.target.submission_path.starts_with('/') {
        errors.push(format!(
            "target.submission_path must start with '/': {}",
            config.target.submission_path
        ));
    }
    if config.readiness.poll_interval_ms == 0 {
        errors.push("readiness.poll_interval_ms must be > 0".to_string());
    }
    if config.readiness.connect_timeout_ms == 0 {
        errors.push("readiness.connect_timeout_ms must be > 0".to_string());
    }
    if config.submission.request_timeout_ms == 0 {
        errors.push("submission.request_timeout_ms must be > 0".to_string());
    }
    if config.submission.payload_path.is_none() && config.submission.event_id.trim().is_empty() {
        errors.push("submission.event_id must not be empty".to_string());
    }
    if config.completion.poll_interval_ms == 0 {
        errors.push("completion.poll_interval_ms must be > 0".to_string());
    }
    if config.completion.record_source_path.trim().is_empty() {
        errors.push("completion.record_source_path must not be empty".to_string());
    }
    if let Some(markers) = &config.completion.expected_markers {
        for (idx, marker) in markers.iter().enumerate() {
            if marker.is_empty() {
                errors.push(format!("completion.expected_markers[{idx}] is empty"));
            } else if markers[..idx].contains(marker) {
                errors.push(format!(
                    "completion.expected_markers[{idx}] duplicates an earlier marker: {marker}"
                ));
            }
        }
    }

    for (idx, marker) in config.completion.failure_markers.iter().enumerate() {
        if marker.is_empty() {
            errors.push(format!("completion.failure_markers[{idx}] is empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Document from `submission.payload_path`, or the built-in sample. A file
/// only has to be JSON; schema problems surface through `preflight`.
pub fn load_payload(config: &Config) -> Result<SubmissionDocument, String> {
    match config.submission.payload_path.as_deref() {
        Some(path) if !path.trim().is_empty() => {
            let raw = fs::read_to_string(path)
                .map_err(|err| format!("failed to read payload {path}: {err}"))?;
            SubmissionDocument::from_json(&raw).map_err(|err| format!("{path}: {err}"))
        }
        _ => Ok(SubmissionPayload::sample(config.submission.event_id.trim()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::{load_payload, validate_config, Config};

    fn parse_config(toml_str: &str) -> Config {
        toml::from_str(toml_str).expect("config should parse")
    }

    #[test]
    fn empty_config_uses_legacy_defaults() {
        let config = parse_config("");
        assert_eq!(config.target.port, 3000);
        assert_eq!(config.target.submission_path, "/api/submit");
        assert_eq!(config.completion.record_source_path, "web-ui/server.log");
        assert_eq!(config.expected_markers("CA-TEST-001").len(), 4);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn parse_config_rejects_malformed_toml() {
        let err = toml::from_str::<Config>("[target\nport = 1").expect_err("malformed");
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn parse_config_rejects_unknown_fields() {
        let toml_str = r#"
[target]
port = 3000
unknown_field = 123
"#;
        let err = toml::from_str::<Config>(toml_str).expect_err("unknown field should fail");
        assert!(err.to_string().to_lowercase().contains("unknown field"));
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[target]
host = "127.0.0.1"
port = 8080
submission_path = "/v2/submit"

[readiness]
timeout_ms = 3000
poll_interval_ms = 250
connect_timeout_ms = 500

[submission]
request_timeout_ms = 2000
event_id = "CA-42"

[completion]
post_delay_before_verify_ms = 0
timeout_ms = 5000
poll_interval_ms = 200
record_source_path = "/var/log/ca.log"
expected_markers = ["received", "persisted"]
"#;
        let config = parse_config(toml_str);
        assert_eq!(config.endpoint().to_string(), "127.0.0.1:8080");
        assert_eq!(config.timings().completion_poll_interval.as_millis(), 200);
        assert_eq!(
            config.expected_markers("ignored").as_slice(),
            ["received".to_string(), "persisted".to_string()]
        );
    }

    #[test]
    fn validate_collects_all_problems() {
        let toml_str = r#"
[target]
port = 0
submission_path = "api"

[completion]
poll_interval_ms = 0
expected_markers = ["a", "", "a"]
"#;
        let errors = validate_config(&parse_config(toml_str)).expect_err("invalid");
        assert_eq!(errors.len(), 5, "{errors:?}");
    }

    #[test]
    fn config_toml_round_trips() {
        let config = Config::default();
        let rendered = super::to_toml_pretty(&config).expect("toml");
        let parsed = parse_config(&rendered);
        assert_eq!(parsed.target.port, config.target.port);
        assert_eq!(parsed.completion.timeout_ms, config.completion.timeout_ms);
    }

    #[test]
    fn default_failure_markers_cover_service_error_lines() {
        let config = Config::default();
        let markers = config.failure_markers();
        assert_eq!(markers.len(), 4);
        assert!(markers
            .iter()
            .any(|m| m.starts_with("Internal Service: Duplicate submission")));

        let config = parse_config("[completion]\nfailure_markers = []\n");
        assert!(config.failure_markers().is_empty());
    }

    #[test]
    fn payload_file_with_text_amount_loads_for_submission() {
        let dir = std::env::temp_dir().join(format!(
            "corpact_payload_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock before UNIX_EPOCH")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("payload.json");
        let raw = r#"{"corporateActionGeneralInformation":{"officialCorporateActionEventID":"CA-77","eventType":"DVCA","mandatoryVoluntaryEventType":"MAND"},"corporateActionDetails":{"dates":{"announcementDate":"2023-10-01","recordDate":"2023-10-15","paymentDate":"2023-10-20"},"rateAndPrice":{"grossDividendRate":{"amount":"0.50","currency":"USD"}}},"underlyingSecurity":{"isin":"US0000000001"},"options":[{"optionNumber":"001","optionType":"CASH","defaultOption":true}],"submittedBy":"ops"}"#;
        std::fs::write(&path, raw).expect("write payload");

        let mut config = Config::default();
        config.submission.payload_path = Some(path.display().to_string());
        let document = load_payload(&config).expect("payload loads");

        assert_eq!(document.event_id(), "CA-77");
        assert!(document.preflight().is_empty(), "{:?}", document.preflight());
        assert_eq!(document.to_json().expect("body"), raw);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn payload_file_must_be_json() {
        let dir = std::env::temp_dir().join(format!("corpact_payload_bad_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("payload.json");
        std::fs::write(&path, "not json").expect("write payload");

        let mut config = Config::default();
        config.submission.payload_path = Some(path.display().to_string());
        let err = load_payload(&config).expect_err("not json");
        assert!(err.contains("not valid JSON"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}

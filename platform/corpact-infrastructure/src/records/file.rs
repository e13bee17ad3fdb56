use corpact_domain::repositories::record_source::{RecordSource, RecordSourceError};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Instant;

/// Log file written by the system under test. Opened fresh on every read and
/// closed before returning; never written.
#[derive(Debug, Clone)]
pub struct FileRecordSource {
    path: PathBuf,
}

impl FileRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn record_read_metrics<T>(start: Instant, result: &Result<Option<T>, RecordSourceError>) {
    let result_label = match result {
        Ok(Some(_)) => "ok",
        Ok(None) => "absent",
        Err(_) => "err",
    };
    metrics::counter!("corpact.infra.record_source.read.calls_total", "result" => result_label)
        .increment(1);
    metrics::histogram!("corpact.infra.record_source.read_ms", "result" => result_label)
        .record(start.elapsed().as_millis() as f64);
}

impl RecordSource for FileRecordSource {
    fn read_all(&self) -> Result<Option<String>, RecordSourceError> {
        let start = Instant::now();
        let result = match fs::read(&self.path) {
            // Lossy: a half-written multi-byte sequence at the tail must not
            // hide the markers before it.
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(RecordSourceError::Unavailable(format!(
                "failed to read {}: {}",
                self.path.display(),
                err
            ))),
        };
        record_read_metrics(start, &result);
        result
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

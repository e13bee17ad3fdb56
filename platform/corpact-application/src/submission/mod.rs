use corpact_domain::repositories::submission::{SubmissionGateway, TransportError};
use corpact_domain::value_objects::acceptance::AcceptanceResponse;
use corpact_domain::value_objects::endpoint::Endpoint;
use corpact_domain::value_objects::payload::SubmissionDocument;
use std::time::Instant;
use tracing::{info, info_span, warn};

/// Sends the document once. A non-202 answer comes back as `Ok`; only a failed
/// exchange is an `Err`. Never retries: resubmitting would create a second
/// corporate action on the service side.
pub fn submit(
    gateway: &dyn SubmissionGateway,
    endpoint: &Endpoint,
    path: &str,
    document: &SubmissionDocument,
) -> Result<AcceptanceResponse, TransportError> {
    let _span = info_span!(
        "submit",
        url = %endpoint.http_url(path),
        event_id = %document.event_id()
    )
    .entered();

    let start = Instant::now();
    let result = gateway.submit(endpoint, path, document);
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let label = match &result {
        Ok(response) if response.is_accepted() => "accepted",
        Ok(_) => "rejected",
        Err(_) => "transport_error",
    };
    metrics::counter!("corpact.submission.calls_total", "result" => label).increment(1);
    metrics::histogram!("corpact.submission.elapsed_ms").record(elapsed_ms as f64);

    match &result {
        Ok(response) if response.is_accepted() => {
            info!(status = response.status_code, elapsed_ms, "submission accepted")
        }
        Ok(response) => warn!(
            status = response.status_code,
            body = %response.body,
            elapsed_ms,
            "submission rejected"
        ),
        Err(err) => warn!(error = %err, elapsed_ms, "submission exchange failed"),
    }

    result
}

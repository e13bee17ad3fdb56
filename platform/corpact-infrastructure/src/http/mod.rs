use corpact_domain::repositories::submission::{SubmissionGateway, TransportError};
use corpact_domain::value_objects::acceptance::AcceptanceResponse;
use corpact_domain::value_objects::endpoint::Endpoint;
use corpact_domain::value_objects::payload::SubmissionDocument;
use reqwest::blocking::Client;
use std::time::{Duration, Instant};

/// Blocking JSON POST against the submission endpoint. One request per call,
/// no retries.
pub struct HttpSubmissionClient {
    client: Client,
}

impl HttpSubmissionClient {
    pub fn new(timeout_ms: u64) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .connect_timeout(Duration::from_millis(timeout_ms))
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self { client })
    }

    fn post(&self, url: &str, body: String) -> Result<AcceptanceResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(classify)?;
        let status_code = response.status().as_u16();
        let body = response.text().map_err(classify)?;
        Ok(AcceptanceResponse { status_code, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_builder() {
        TransportError::Encode(err.to_string())
    } else {
        TransportError::Io(err.to_string())
    }
}

impl SubmissionGateway for HttpSubmissionClient {
    fn submit(
        &self,
        endpoint: &Endpoint,
        path: &str,
        document: &SubmissionDocument,
    ) -> Result<AcceptanceResponse, TransportError> {
        let url = endpoint.http_url(path);
        let body = document.to_json().map_err(TransportError::Encode)?;

        let start = Instant::now();
        let result = self.post(&url, body);
        let label = if result.is_ok() { "ok" } else { "err" };
        metrics::counter!("corpact.infra.http.submit.calls_total", "result" => label).increment(1);
        metrics::histogram!("corpact.infra.http.submit_ms", "result" => label)
            .record(start.elapsed().as_millis() as f64);
        tracing::debug!(url = %url, result = label, "submission request finished");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::HttpSubmissionClient;
    use corpact_domain::repositories::submission::{SubmissionGateway, TransportError};
    use corpact_domain::value_objects::endpoint::Endpoint;
    use corpact_domain::value_objects::payload::{SubmissionDocument, SubmissionPayload};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    fn http_response(status: u16, reason: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Reads one full request; returns (request line, body).
    fn read_request(stream: &mut TcpStream) -> (String, String) {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("header");
            if line == "\r\n" || line.is_empty() {
                break;
            }
            let lower = line.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("body");
        (
            request_line.trim().to_string(),
            String::from_utf8(body).expect("utf8 body"),
        )
    }

    fn try_spawn_server(response: String) -> Option<(u16, mpsc::Receiver<(String, String)>)> {
        let listener = TcpListener::bind("127.0.0.1:0").ok()?;
        let port = listener.local_addr().ok()?.port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let request = read_request(&mut stream);
            stream
                .write_all(response.as_bytes())
                .expect("write response");
            let _ = tx.send(request);
        });

        Some((port, rx))
    }

    #[test]
    fn posts_payload_json_to_path() {
        let Some((port, requests)) = try_spawn_server(http_response(
            202,
            "Accepted",
            r#"{"message":"Submission received and queued for processing."}"#,
        )) else {
            eprintln!("skipping: cannot bind local test server");
            return;
        };

        let client = HttpSubmissionClient::new(2_000).expect("http client");
        let payload = SubmissionPayload::sample("CA-TEST-001");
        let document = SubmissionDocument::from(payload.clone());
        let response = client
            .submit(&Endpoint::new("127.0.0.1", port), "/api/submit", &document)
            .expect("exchange");

        assert_eq!(response.status_code, 202);
        assert!(response.body.contains("queued for processing"));

        let (request_line, body) = requests.recv().expect("request captured");
        assert_eq!(request_line, "POST /api/submit HTTP/1.1");
        assert_eq!(
            serde_json::from_str::<SubmissionPayload>(&body).expect("payload json"),
            payload
        );
    }

    #[test]
    fn loaded_document_body_is_posted_as_written() {
        let Some((port, requests)) = try_spawn_server(http_response(202, "Accepted", "{}")) else {
            eprintln!("skipping: cannot bind local test server");
            return;
        };

        let raw = r#"{"corporateActionGeneralInformation":{"officialCorporateActionEventID":"CA-9"},"extra":{"amount":"0.50"}}"#;
        let document = SubmissionDocument::from_json(raw).expect("document");
        let client = HttpSubmissionClient::new(2_000).expect("http client");
        client
            .submit(&Endpoint::new("127.0.0.1", port), "/api/submit", &document)
            .expect("exchange");

        let (_, body) = requests.recv().expect("request captured");
        assert_eq!(body, raw);
    }

    #[test]
    fn non_202_is_a_response_not_an_error() {
        let Some((port, _requests)) =
            try_spawn_server(http_response(500, "Internal Server Error", "{}"))
        else {
            eprintln!("skipping: cannot bind local test server");
            return;
        };

        let client = HttpSubmissionClient::new(2_000).expect("http client");
        let response = client
            .submit(
                &Endpoint::new("127.0.0.1", port),
                "/api/submit",
                &SubmissionDocument::from(SubmissionPayload::sample("CA-1")),
            )
            .expect("exchange");
        assert_eq!(response.status_code, 500);
        assert!(!response.is_accepted());
    }

    #[test]
    fn closed_port_is_a_transport_error() {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0") else {
            eprintln!("skipping: cannot bind local test listener");
            return;
        };
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let client = HttpSubmissionClient::new(1_000).expect("http client");
        let err = client
            .submit(
                &Endpoint::new("127.0.0.1", port),
                "/api/submit",
                &SubmissionDocument::from(SubmissionPayload::sample("CA-1")),
            )
            .expect_err("transport error");
        assert!(matches!(err, TransportError::Connect(_)), "{err:?}");
    }
}

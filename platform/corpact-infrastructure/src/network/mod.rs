use corpact_domain::repositories::connection::ConnectionProbe;
use corpact_domain::value_objects::endpoint::Endpoint;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Readiness means "a TCP connection is accepted"; no bytes are exchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnectionProbe;

impl TcpConnectionProbe {
    pub fn new() -> Self {
        Self
    }
}

fn resolve(endpoint: &Endpoint) -> Result<Vec<SocketAddr>, String> {
    let addrs: Vec<SocketAddr> = (endpoint.host.as_str(), endpoint.port)
        .to_socket_addrs()
        .map_err(|err| format!("failed to resolve {endpoint}: {err}"))?
        .collect();
    if addrs.is_empty() {
        return Err(format!("{endpoint} resolved to no addresses"));
    }
    Ok(addrs)
}

impl ConnectionProbe for TcpConnectionProbe {
    fn probe(&self, endpoint: &Endpoint, connect_timeout: Duration) -> Result<(), String> {
        let addrs = resolve(endpoint)?;
        let timeout = connect_timeout.max(Duration::from_millis(1));
        let mut last_error = String::new();
        // `localhost` usually yields both ::1 and 127.0.0.1; either may host
        // the listener.
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    drop(stream);
                    metrics::counter!("corpact.infra.tcp_probe.calls_total", "result" => "ok")
                        .increment(1);
                    return Ok(());
                }
                Err(err) => last_error = format!("{addr}: {err}"),
            }
        }
        metrics::counter!("corpact.infra.tcp_probe.calls_total", "result" => "err").increment(1);
        Err(last_error)
    }
}

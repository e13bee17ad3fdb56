use crate::value_objects::endpoint::Endpoint;
use std::time::Duration;

/// Single connection attempt against the listener of the system under test.
///
/// `Err` carries the reason the attempt did not connect (refused, timed out,
/// unresolvable). Any connection opened is released before returning.
pub trait ConnectionProbe {
    fn probe(&self, endpoint: &Endpoint, connect_timeout: Duration) -> Result<(), String>;
}

use serde::{Deserialize, Serialize};

pub const ACCEPTED_STATUS: u16 = 202;

/// Immediate answer of the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceResponse {
    pub status_code: u16,
    pub body: String,
}

impl AcceptanceResponse {
    /// Only 202 counts; 200 and 201 are rejections for this scenario.
    pub fn is_accepted(&self) -> bool {
        self.status_code == ACCEPTED_STATUS
    }
}

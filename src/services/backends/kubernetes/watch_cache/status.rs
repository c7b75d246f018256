use super::CacheState;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors reported by the watch cache lifecycle operations.
#[derive(Debug)]
pub enum Status {
    /// The initial listing did not finish in time. The cache keeps synchronizing in the background.
    Timeout(String),
    InvalidState(CacheState),
    Stopped,
}

impl Status {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Status::Timeout(_))
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Timeout(message) => write!(f, "Operation timed out: {}", message),
            Status::InvalidState(state) => write!(f, "Operation is not allowed in state {:?}", state),
            Status::Stopped => write!(f, "The cache was stopped"),
        }
    }
}

impl Error for Status {}

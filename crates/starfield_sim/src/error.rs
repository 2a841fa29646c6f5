use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors surfaced by the stepping engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Configuration rejected at construction
    InvalidConfig(String),
    /// Particle storage could not be reserved
    AllocationFailed { bodies: usize },
    /// The in-flight dispatch did not complete within the stall timeout
    Stalled { waited: Duration },
    /// Scenario index outside the catalog
    UnknownModel(usize),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            EngineError::AllocationFailed { bodies } => {
                write!(f, "Could not allocate particle storage for {} bodies", bodies)
            }
            EngineError::Stalled { waited } => {
                write!(f, "Dispatch still running after {:?}", waited)
            }
            EngineError::UnknownModel(model) => write!(f, "Unknown scenario {}", model),
        }
    }
}

impl Error for EngineError {}

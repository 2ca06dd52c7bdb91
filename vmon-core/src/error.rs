#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error("device stream source disconnected")]
    SourceDisconnected,
    #[error("invalid {field}: {value} (must be a positive, finite number)")]
    InvalidConfig { field: &'static str, value: f64 },
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    /// True for failures the operator can recover from without restarting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MonitorError::SourceDisconnected
                | MonitorError::InvalidConfig { .. }
                | MonitorError::InvalidFrame(_)
        )
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;

// Error types for pitdelta

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum PitdeltaError {
    // Errors raised while deriving a comparison view
    #[snafu(display("Driver {driver} has no valid timed lap in this session"))]
    NoValidLap { driver: String },
    #[snafu(display("Lap {lap_number} of {driver} is missing the sector {sector} time"))]
    IncompleteSectorData {
        driver: String,
        lap_number: u32,
        sector: usize,
    },
    #[snafu(display("Lap {lap_number} of {driver} has no car data samples"))]
    EmptyTelemetry { driver: String, lap_number: u32 },
    #[snafu(display("No weather data recorded for {event}"))]
    NoWeatherData { event: String },

    // Session repository errors
    #[snafu(display("Session {key} is not available in the repository"))]
    SessionNotFound { key: String },
    #[snafu(display("Error loading session file"))]
    SessionLoaderError { source: io::Error },
    #[snafu(display("Error writing session file"))]
    SessionWriterError { source: io::Error },
    #[snafu(display("Invalid session data: {reason}"))]
    InvalidSessionData { reason: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
}

impl PitdeltaError {
    /// Whether the error only invalidates a single comparison view. The
    /// other views computed from the same sessions are still usable.
    pub fn is_view_failure(&self) -> bool {
        matches!(
            self,
            PitdeltaError::NoValidLap { .. }
                | PitdeltaError::IncompleteSectorData { .. }
                | PitdeltaError::EmptyTelemetry { .. }
                | PitdeltaError::NoWeatherData { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_errors_are_view_failures() {
        let err = PitdeltaError::NoValidLap {
            driver: "VER".to_string(),
        };
        assert!(err.is_view_failure());
        assert_eq!(
            err.to_string(),
            "Driver VER has no valid timed lap in this session"
        );

        let err = PitdeltaError::IncompleteSectorData {
            driver: "VER".to_string(),
            lap_number: 12,
            sector: 2,
        };
        assert!(err.is_view_failure());
        assert_eq!(err.to_string(), "Lap 12 of VER is missing the sector 2 time");
    }

    #[test]
    fn test_io_errors_are_not_view_failures() {
        let err = PitdeltaError::SessionNotFound {
            key: "2025 Bahrain R VER".to_string(),
        };
        assert!(!err.is_view_failure());

        let err = PitdeltaError::SessionLoaderError {
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(!err.is_view_failure());
    }
}

// Library interface for pitdelta
// The binary is a thin shell over these modules

pub mod analysis;
pub mod config;
pub mod errors;
pub mod report;
pub mod session;

// Re-export commonly used types
pub use analysis::{ComparisonPair, ComparisonSubject, SessionComparison, ThrottleTraceMode};
pub use config::AnalysisConfig;
pub use errors::PitdeltaError;
pub use report::{ComparisonReport, OutputFormat};
pub use session::{
    Compound, FileSessionRepository, Lap, Session, SessionKey, SessionRef, SessionRepository,
    SessionType,
};

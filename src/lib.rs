pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod session;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::AppConfig;

pub use adapters::HttpApiClient;
pub use core::{
    ArmVolumeEstimator, ArmVolumeReport, EvaluationService, MeasurementSet, ResultCollector,
    RiskBand,
};
pub use session::{FileTokenStore, Session, SessionManager};
pub use utils::error::{AppError, Result};

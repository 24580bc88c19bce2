pub mod arm_volume;
pub mod collector;
pub mod completed;
pub mod input;
pub mod listing;
pub mod risk;
pub mod submission;
pub mod timer;

pub use crate::domain::model::{EvaluationResults, Phase};
pub use crate::domain::ports::{AuthApi, ConfigProvider, EvaluationApi, TokenStore};
pub use crate::utils::error::Result;
pub use arm_volume::{ArmVolumeEstimator, ArmVolumeReport, MeasurementSet};
pub use collector::ResultCollector;
pub use completed::{completed_view, CompletedView};
pub use risk::RiskBand;
pub use submission::EvaluationService;

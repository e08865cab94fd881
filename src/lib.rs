pub mod config;
pub mod error;
pub mod models;
pub mod taxonomy;
pub mod dataset;
pub mod analysis;
pub mod storage;
pub mod server;
pub mod progress;

pub use config::{Config, PipelineConfig};
pub use error::{Error, Result};
pub use dataset::{Dataset, DatasetLoader};
pub use taxonomy::{SkillMatcher, SkillVocabulary};
pub use analysis::{RunReport, TrendPipeline};
pub use storage::{ResultStore, SqliteStore};

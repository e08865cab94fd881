pub mod normalizer;
pub mod skill_extractor;
pub mod aggregator;
pub mod forecaster;
pub mod pipeline;

pub use pipeline::{RunReport, TrendAnalysis, TrendPipeline};
pub use skill_extractor::SkillExtractor;
pub use aggregator::YearlyAggregator;
pub use forecaster::{TrendForecaster, FORECAST_HORIZON};

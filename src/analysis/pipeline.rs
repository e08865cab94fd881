use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::aggregator::YearlyAggregator;
use crate::analysis::forecaster::TrendForecaster;
use crate::analysis::normalizer::normalize_opt;
use crate::analysis::skill_extractor::SkillExtractor;
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::models::{JobPosting, SkillForecast, SkillHistory};
use crate::progress::progress_bar;
use crate::storage::{save_bulk, ResultStore, FORECASTS, TRENDS};
use crate::taxonomy::SkillMatcher;

/// In-memory result of one run, before persistence.
#[derive(Debug, Default)]
pub struct TrendAnalysis {
    pub histories: BTreeMap<String, SkillHistory>,
    pub forecasts: Vec<SkillForecast>,
    pub postings_total: usize,
    pub postings_dropped: usize,
    pub warnings: Vec<Error>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub postings_total: usize,
    pub postings_dropped: usize,
    pub skills_tracked: usize,
    pub forecasts_produced: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_warnings")]
    pub warnings: Vec<Error>,
}

fn serialize_warnings<S: serde::Serializer>(
    warnings: &[Error],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(warnings.iter().map(|w| w.to_string()))
}

pub struct TrendPipeline<S: ResultStore> {
    matcher: SkillMatcher,
    extractor: SkillExtractor,
    aggregator: YearlyAggregator,
    forecaster: TrendForecaster,
    store: S,
    config: PipelineConfig,
}

impl<S: ResultStore> TrendPipeline<S> {
    pub fn new(matcher: SkillMatcher, store: S, config: PipelineConfig) -> Self {
        Self {
            matcher,
            extractor: SkillExtractor::new(config.batch_size),
            aggregator: YearlyAggregator::new(),
            forecaster: TrendForecaster::new(),
            store,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Full run: analyze, then persist. Only a failure to build the worker
    /// pool is returned as an error; everything else ends up in the report.
    pub fn run(&self, dataset: Dataset) -> Result<RunReport> {
        let started_at = Utc::now();

        let mut analysis = self.analyze(dataset.postings)?;
        let mut warnings = dataset.warnings;
        warnings.append(&mut analysis.warnings);
        warnings.extend(self.persist(&analysis));

        let report = RunReport {
            postings_total: analysis.postings_total,
            postings_dropped: analysis.postings_dropped,
            skills_tracked: analysis.histories.len(),
            forecasts_produced: analysis.forecasts.len(),
            started_at,
            finished_at: Utc::now(),
            warnings,
        };

        if report.warnings.is_empty() {
            tracing::info!("Run complete");
        } else {
            tracing::warn!("Run complete with {} warnings", report.warnings.len());
        }

        Ok(report)
    }

    /// normalize → extract (parallel) → barrier → aggregate → forecast.
    pub fn analyze(&self, postings: Vec<JobPosting>) -> Result<TrendAnalysis> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .build()
            .map_err(|e| Error::Config(format!("failed to build worker pool: {}", e)))?;

        let postings_total = postings.len();
        let (years, texts): (Vec<i32>, Vec<String>) = postings
            .into_iter()
            .filter_map(|p| normalize_opt(p.description.as_deref()).map(|text| (p.year, text)))
            .unzip();
        let postings_dropped = postings_total - texts.len();

        if postings_dropped > 0 {
            tracing::info!("Dropped {} postings without a description", postings_dropped);
        }

        tracing::info!(
            "Extracting skills from {} postings ({} workers, batch size {})",
            texts.len(),
            self.config.workers,
            self.extractor.batch_size()
        );
        let pb = progress_bar(texts.len() as u64, "postings", self.config.show_progress);
        let (extractor, matcher) = (&self.extractor, &self.matcher);
        let skills: Vec<BTreeSet<String>> =
            pool.install(|| extractor.extract_all(matcher, &texts, &pb));
        pb.finish_and_clear();
        tracing::info!("Skill extraction complete");

        let histories = self
            .aggregator
            .aggregate(years.iter().copied().zip(skills.iter()));
        tracing::info!("Aggregated demand for {} skills", histories.len());

        let pb = progress_bar(histories.len() as u64, "skills", self.config.show_progress);
        let forecaster = &self.forecaster;
        let (forecasts, warnings) = pool.install(|| forecaster.forecast_all(&histories, &pb));
        pb.finish_and_clear();
        tracing::info!("Forecast {} of {} skills", forecasts.len(), histories.len());

        Ok(TrendAnalysis {
            histories,
            forecasts,
            postings_total,
            postings_dropped,
            warnings,
        })
    }

    /// Writes trends, then forecasts. Failed chunks come back as warnings.
    pub fn persist(&self, analysis: &TrendAnalysis) -> Vec<Error> {
        let histories: Vec<&SkillHistory> = analysis.histories.values().collect();

        let mut errors = save_bulk(
            &self.store,
            TRENDS,
            &histories,
            self.config.chunk_size,
            self.config.show_progress,
        )
        .errors;

        errors.extend(
            save_bulk(
                &self.store,
                FORECASTS,
                &analysis.forecasts,
                self.config.chunk_size,
                self.config.show_progress,
            )
            .errors,
        );

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DemandPoint;
    use crate::storage::SqliteStore;
    use crate::taxonomy::SkillVocabulary;

    fn pipeline() -> TrendPipeline<SqliteStore> {
        let matcher = SkillMatcher::new(SkillVocabulary::default()).unwrap();
        let config = PipelineConfig {
            batch_size: 2,
            chunk_size: 2,
            workers: 2,
            show_progress: false,
        };
        TrendPipeline::new(matcher, SqliteStore::in_memory().unwrap(), config)
    }

    fn postings() -> Vec<JobPosting> {
        vec![
            JobPosting::new(2018, "<p>Python</p> developer"),
            JobPosting::new(2019, "PYTHON and SQL"),
            JobPosting::new(2019, "python, python"),
            JobPosting::new(2020, "Python with Docker"),
            JobPosting::new(2020, "python\tsql"),
            JobPosting::new(2020, "python"),
            JobPosting::without_description(2020),
            JobPosting::new(2021, "Tableau dashboards"),
        ]
    }

    #[test]
    fn test_analyze_counts_and_forecasts() {
        let analysis = pipeline().analyze(postings()).unwrap();

        assert_eq!(analysis.postings_total, 8);
        assert_eq!(analysis.postings_dropped, 1);

        assert_eq!(
            analysis.histories["python"].history,
            vec![
                DemandPoint { year: 2018, demand_score: 1 },
                DemandPoint { year: 2019, demand_score: 2 },
                DemandPoint { year: 2020, demand_score: 3 },
            ]
        );

        let python = analysis
            .forecasts
            .iter()
            .find(|f| f.skill == "python")
            .unwrap();
        let predicted: Vec<(i32, u32)> = python
            .forecast
            .iter()
            .map(|p| (p.year, p.demand_score))
            .collect();
        assert_eq!(predicted, vec![(2021, 4), (2022, 5), (2023, 6)]);
    }

    #[test]
    fn test_singleton_skills_keep_history_without_forecast() {
        let analysis = pipeline().analyze(postings()).unwrap();

        for skill in ["docker", "tableau"] {
            assert!(analysis.histories.contains_key(skill));
            assert!(analysis.forecasts.iter().all(|f| f.skill != skill));
        }
        assert!(analysis.forecasts.iter().any(|f| f.skill == "sql"));
    }

    #[test]
    fn test_analysis_ignores_posting_order() {
        let p = pipeline();
        let mut reversed = postings();
        reversed.reverse();

        let forward = p.analyze(postings()).unwrap();
        let backward = p.analyze(reversed).unwrap();
        assert_eq!(forward.histories, backward.histories);
        assert_eq!(forward.forecasts, backward.forecasts);
    }

    #[test]
    fn test_run_persists_both_collections() {
        let p = pipeline();
        let dataset = Dataset {
            postings: postings(),
            warnings: Vec::new(),
            files_loaded: 1,
        };

        let report = p.run(dataset).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(report.skills_tracked, 4);
        assert_eq!(report.forecasts_produced, 2);

        let trends = p.store().load(TRENDS).unwrap();
        let forecasts = p.store().load(FORECASTS).unwrap();
        assert_eq!(trends.len(), 4);
        assert_eq!(forecasts.len(), 2);
        assert_eq!(trends[0]["skill"], "docker");
        assert_eq!(forecasts[0]["forecast"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_run_carries_loader_warnings() {
        let dataset = Dataset {
            postings: postings(),
            warnings: vec![Error::Extraction {
                source_name: "jobs_2020.csv row 3".to_string(),
                reason: "bad row".to_string(),
            }],
            files_loaded: 1,
        };

        let report = pipeline().run(dataset).unwrap();
        assert_eq!(report.warnings.len(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
    }
}

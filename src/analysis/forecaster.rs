use std::collections::BTreeMap;

use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::models::{ForecastPoint, SkillForecast, SkillHistory};

/// Number of future years predicted past the last observed year.
pub const FORECAST_HORIZON: i32 = 3;

/// Least-squares line through one skill's history, kept in mean-centred form
/// to avoid a huge intercept at year 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    mean_year: f64,
    mean_score: f64,
    slope: f64,
}

impl LinearTrend {
    pub fn fit(history: &SkillHistory) -> Result<Self> {
        let points = &history.history;
        let fail = |reason: String| Error::ForecastComputation {
            skill: history.skill.clone(),
            reason,
        };

        if points.len() < 2 {
            return Err(fail(format!("need at least 2 points, got {}", points.len())));
        }

        let n = points.len() as f64;
        let mean_year = points.iter().map(|p| p.year as f64).sum::<f64>() / n;
        let mean_score = points.iter().map(|p| p.demand_score as f64).sum::<f64>() / n;

        let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), p| {
            let dx = p.year as f64 - mean_year;
            let dy = p.demand_score as f64 - mean_score;
            (sxx + dx * dx, sxy + dx * dy)
        });

        if sxx.abs() < 1e-10 {
            return Err(fail(
                "all observations share one year (zero variance)".to_string(),
            ));
        }

        Ok(Self {
            mean_year,
            mean_score,
            slope: sxy / sxx,
        })
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn predict_at(&self, year: i32) -> f64 {
        self.mean_score + self.slope * (year as f64 - self.mean_year)
    }
}

/// Clamps at zero, then rounds half away from zero.
pub fn to_demand_score(predicted: f64) -> u32 {
    // `as` saturates and maps NaN to 0.
    predicted.max(0.0).round() as u32
}

pub struct TrendForecaster;

impl TrendForecaster {
    pub fn new() -> Self {
        Self
    }

    /// `Ok(None)` for histories too short to fit. Zero-variance years are an
    /// error for this skill only.
    pub fn forecast(&self, history: &SkillHistory) -> Result<Option<SkillForecast>> {
        if history.history.len() < 2 {
            return Ok(None);
        }

        let trend = LinearTrend::fit(history)?;
        tracing::debug!("{}: slope {:.3} per year", history.skill, trend.slope());

        let Some(last_year) = history.last_year() else {
            return Ok(None);
        };

        let forecast = (1..=FORECAST_HORIZON)
            .map(|offset| {
                let year = last_year + offset;
                ForecastPoint {
                    year,
                    demand_score: to_demand_score(trend.predict_at(year)),
                }
            })
            .collect();

        Ok(Some(SkillForecast {
            skill: history.skill.clone(),
            forecast,
        }))
    }

    /// Forecasts every skill in parallel on the current rayon pool.
    /// Returns forecasts in skill order together with per-skill failures.
    pub fn forecast_all(
        &self,
        histories: &BTreeMap<String, SkillHistory>,
        progress: &ProgressBar,
    ) -> (Vec<SkillForecast>, Vec<Error>) {
        let histories: Vec<&SkillHistory> = histories.values().collect();

        let results: Vec<Result<Option<SkillForecast>>> = histories
            .par_iter()
            .map(|history| {
                let result = self.forecast(history);
                progress.inc(1);
                result
            })
            .collect();

        let mut forecasts = Vec::new();
        let mut failures = Vec::new();

        for result in results {
            match result {
                Ok(Some(forecast)) => forecasts.push(forecast),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping forecast: {}", e);
                    failures.push(e);
                }
            }
        }

        (forecasts, failures)
    }
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self::new()
    }
}

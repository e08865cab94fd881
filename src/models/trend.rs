use serde::{Deserialize, Serialize};

/// One aggregated row: how many postings in `year` mention `skill`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyDemand {
    pub skill: String,
    pub year: i32,
    pub demand_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandPoint {
    pub year: i32,
    pub demand_score: u32,
}

pub type ForecastPoint = DemandPoint;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillHistory {
    pub skill: String,
    pub history: Vec<DemandPoint>,
}

impl SkillHistory {
    pub fn new(skill: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            history: Vec::new(),
        }
    }

    pub fn last_year(&self) -> Option<i32> {
        self.history.iter().map(|p| p.year).max()
    }

    pub fn total_mentions(&self) -> u64 {
        self.history.iter().map(|p| p.demand_score as u64).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillForecast {
    pub skill: String,
    pub forecast: Vec<ForecastPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_serializes_to_output_schema() {
        let history = SkillHistory {
            skill: "python".to_string(),
            history: vec![DemandPoint {
                year: 2020,
                demand_score: 7,
            }],
        };

        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "skill": "python",
                "history": [{"year": 2020, "demand_score": 7}]
            })
        );
    }

    #[test]
    fn test_last_year_and_total_mentions() {
        let mut history = SkillHistory::new("sql");
        assert_eq!(history.last_year(), None);

        history.history.push(DemandPoint { year: 2019, demand_score: 3 });
        history.history.push(DemandPoint { year: 2021, demand_score: 4 });
        assert_eq!(history.last_year(), Some(2021));
        assert_eq!(history.total_mentions(), 7);
    }
}

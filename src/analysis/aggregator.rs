use std::collections::{BTreeMap, BTreeSet};

use crate::models::{DemandPoint, SkillHistory, YearlyDemand};

pub struct YearlyAggregator;

impl YearlyAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Counts, for every (skill, year), the documents that mention the skill.
    /// Rows come back sorted by skill, then year.
    pub fn count_yearly_demand<'a, I>(&self, documents: I) -> Vec<YearlyDemand>
    where
        I: IntoIterator<Item = (i32, &'a BTreeSet<String>)>,
    {
        let mut counts: BTreeMap<(&'a str, i32), u32> = BTreeMap::new();

        for (year, skills) in documents {
            for skill in skills {
                *counts.entry((skill.as_str(), year)).or_insert(0) += 1;
            }
        }

        counts
            .into_iter()
            .map(|((skill, year), demand_score)| YearlyDemand {
                skill: skill.to_string(),
                year,
                demand_score,
            })
            .collect()
    }

    /// Groups counted rows into per-skill histories, ascending by year.
    pub fn aggregate<'a, I>(&self, documents: I) -> BTreeMap<String, SkillHistory>
    where
        I: IntoIterator<Item = (i32, &'a BTreeSet<String>)>,
    {
        let mut histories: BTreeMap<String, SkillHistory> = BTreeMap::new();

        for row in self.count_yearly_demand(documents) {
            histories
                .entry(row.skill.clone())
                .or_insert_with(|| SkillHistory::new(row.skill))
                .history
                .push(DemandPoint {
                    year: row.year,
                    demand_score: row.demand_score,
                });
        }

        histories
    }
}

impl Default for YearlyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

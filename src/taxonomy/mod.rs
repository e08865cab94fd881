pub mod matcher;

use std::collections::HashSet;

use crate::analysis::normalizer::normalize;
use crate::error::{Error, Result};

pub use matcher::SkillMatcher;

pub const DEFAULT_SKILLS: &[&str] = &[
    // Languages
    "python",
    "r",
    "sql",
    "java",
    "scala",
    "javascript",
    "typescript",
    "html",
    "css",
    // Analytics
    "tableau",
    "power bi",
    "sas",
    "excel",
    // Data platforms
    "hadoop",
    "spark",
    "mongodb",
    // Cloud
    "aws",
    "azure",
    "gcp",
    // Machine learning
    "tensorflow",
    "pytorch",
    "scikit-learn",
    // Containers
    "docker",
    "kubernetes",
    // Frontend
    "react",
    "vue",
    "angular",
];

/// The closed set of skill phrases. Entries are stored in canonical form:
/// lowercase, trimmed, inner whitespace collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillVocabulary {
    skills: Vec<String>,
}

impl SkillVocabulary {
    pub fn new<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut skills = Vec::new();

        for phrase in phrases {
            let canonical = normalize(phrase.as_ref());
            if canonical.is_empty() {
                return Err(Error::Config(format!(
                    "skill vocabulary entry {:?} is empty after normalization",
                    phrase.as_ref()
                )));
            }
            if seen.insert(canonical.clone()) {
                skills.push(canonical);
            }
        }

        if skills.is_empty() {
            return Err(Error::Config("skill vocabulary is empty".to_string()));
        }

        Ok(Self { skills })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.skills.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self {
            skills: DEFAULT_SKILLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

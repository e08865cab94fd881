use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub year: i32,
    pub description: Option<String>,
}

impl JobPosting {
    pub fn new(year: i32, description: impl Into<String>) -> Self {
        Self {
            year,
            description: Some(description.into()),
        }
    }

    pub fn without_description(year: i32) -> Self {
        Self {
            year,
            description: None,
        }
    }
}

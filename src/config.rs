use crate::taxonomy::DEFAULT_SKILLS;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub data_dir: PathBuf,
    pub port: u16,
    pub batch_size: usize,
    pub chunk_size: usize,
    pub workers: usize,
    pub default_year: Option<i32>,
    pub skills: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let database_path = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "skilltrend.db".to_string());

        let data_dir = env::var("HISTORICAL_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data").join("historical"));

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5001);

        let batch_size = env::var("BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(512);

        let chunk_size = env::var("CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);

        let workers = env::var("WORKERS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_workers);

        let default_year = env::var("DEFAULT_YEAR")
            .ok()
            .and_then(|v| v.parse().ok());

        let skills = env::var("SKILLS")
            .ok()
            .map(|v| parse_skill_list(&v))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_SKILLS.iter().map(|s| s.to_string()).collect());

        Self {
            database_path,
            data_dir,
            port,
            batch_size,
            chunk_size,
            workers,
            default_year,
            skills,
        }
    }
}

/// Leaves one core free for the main thread, like the original worker count.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

fn parse_skill_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub chunk_size: usize,
    pub workers: usize,
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 512,
            chunk_size: 1000,
            workers: default_workers(),
            show_progress: true,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
            chunk_size: config.chunk_size,
            workers: config.workers,
            show_progress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skill_list() {
        assert_eq!(
            parse_skill_list(" python, power bi ,,sql "),
            vec!["python", "power bi", "sql"]
        );
        assert!(parse_skill_list(" , ").is_empty());
    }

    #[test]
    fn test_default_workers_is_positive() {
        assert!(default_workers() >= 1);
    }
}

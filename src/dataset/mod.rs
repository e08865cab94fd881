pub mod format;

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::models::JobPosting;

pub use format::SourceFormat;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d{4})\.csv$").expect("valid regex"));

/// Postings gathered from every usable source file.
#[derive(Debug, Default)]
pub struct Dataset {
    pub postings: Vec<JobPosting>,
    pub warnings: Vec<Error>,
    pub files_loaded: usize,
}

pub struct DatasetLoader {
    data_dir: PathBuf,
    default_year: Option<i32>,
}

impl DatasetLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            default_year: None,
        }
    }

    /// Year assigned to files whose name carries none. Without it such files
    /// are skipped rather than merged into an arbitrary year.
    pub fn with_default_year(mut self, year: Option<i32>) -> Self {
        self.default_year = year;
        self
    }

    pub fn load(&self) -> Result<Dataset> {
        if !self.data_dir.is_dir() {
            return Err(Error::Config(format!(
                "historical data directory not found: {}",
                self.data_dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        files.sort();

        let mut dataset = Dataset::default();

        for path in &files {
            let name = file_name(path);
            let Some(year) = year_from_file_name(&name).or(self.default_year) else {
                tracing::warn!("Skipping {}: no year in file name and no default year", name);
                continue;
            };

            tracing::info!("Processing {} for year {}", name, year);
            match load_file(path, year, &mut dataset) {
                Ok(true) => dataset.files_loaded += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("Skipping {}: {}", name, e),
            }
        }

        if dataset.files_loaded == 0 {
            return Err(Error::Config(format!(
                "no usable CSV files in {}",
                self.data_dir.display()
            )));
        }

        tracing::info!(
            "Loaded {} postings from {} files",
            dataset.postings.len(),
            dataset.files_loaded
        );

        Ok(dataset)
    }
}

pub fn year_from_file_name(name: &str) -> Option<i32> {
    YEAR_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Appends one file's rows. Returns `false` when its layout is unknown.
fn load_file(path: &Path, year: i32, dataset: &mut Dataset) -> Result<bool> {
    let name = file_name(path);
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let Some(format) = SourceFormat::detect(&headers) else {
        tracing::warn!("Skipping {}: no valid description/skills column found", name);
        return Ok(false);
    };
    tracing::debug!("{} resolved as {} format", name, format.name());

    for (row, record) in reader.records().enumerate() {
        match record {
            Ok(record) => dataset.postings.push(JobPosting {
                year,
                description: format.description(&record),
            }),
            Err(e) => {
                let warning = Error::Extraction {
                    source_name: format!("{} row {}", name, row + 1),
                    reason: e.to_string(),
                };
                tracing::warn!("{}", warning);
                dataset.warnings.push(warning);
            }
        }
    }

    Ok(true)
}

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use skilltrend::models::{SkillForecast, SkillHistory};
use skilltrend::storage::{FORECASTS, TRENDS};
use skilltrend::{
    server, Config, DatasetLoader, PipelineConfig, ResultStore, RunReport, SkillMatcher,
    SkillVocabulary, SqliteStore, TrendPipeline,
};

#[derive(Parser, Debug)]
#[command(name = "skilltrend")]
#[command(version)]
#[command(about = "Track and forecast skill demand in historical job postings")]
struct Args {
    /// Directory holding the historical CSV files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Database path for storing trends and forecasts
    #[arg(long)]
    database: Option<String>,

    /// Port for the health endpoint
    #[arg(short, long)]
    port: Option<u16>,

    /// Postings per extraction batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Records per database write
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Worker threads for extraction and forecasting
    #[arg(long)]
    workers: Option<usize>,

    /// Year for files whose name has none (they are skipped otherwise)
    #[arg(long)]
    default_year: Option<i32>,

    /// Run the pipeline once and exit instead of serving
    #[arg(long)]
    once: bool,

    /// Print the stored forecasts without running the pipeline
    #[arg(long)]
    cached: bool,

    /// Output format (json, text)
    #[arg(short, long, default_value = "text")]
    format: String,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(ref dir) = self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(ref db) = self.database {
            config.database_path = db.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.default_year.is_some() {
            config.default_year = self.default_year;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("skilltrend=info".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = Config::from_env();
    args.apply(&mut config);

    if args.cached {
        let store = SqliteStore::new(&config.database_path)?;
        let histories: Vec<SkillHistory> = load_records(&store, TRENDS)?;
        let forecasts: Vec<SkillForecast> = load_records(&store, FORECASTS)?;
        if let Some(updated) = store.last_updated(FORECASTS)? {
            tracing::info!("Using stored forecasts from {}", updated);
        }
        print_output(&args.format, None, &histories, &forecasts)?;
        return Ok(());
    }

    if args.once {
        let run_config = config.clone();
        let report = tokio::task::spawn_blocking(move || run_pipeline(&run_config)).await??;

        let store = SqliteStore::new(&config.database_path)?;
        let histories: Vec<SkillHistory> = load_records(&store, TRENDS)?;
        let forecasts: Vec<SkillForecast> = load_records(&store, FORECASTS)?;
        print_output(&args.format, Some(&report), &histories, &forecasts)?;
        return Ok(());
    }

    // Serve liveness right away; the run proceeds in the background.
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("Health endpoint listening on {}", listener.local_addr()?);

    let run_config = config.clone();
    tokio::task::spawn_blocking(move || match run_pipeline(&run_config) {
        Ok(report) => tracing::info!(
            "Pipeline finished: {} skills, {} forecasts, {} warnings",
            report.skills_tracked,
            report.forecasts_produced,
            report.warnings.len()
        ),
        Err(e) => tracing::error!("Pipeline run failed: {:#}", e),
    });

    axum::serve(listener, server::build_router()).await?;

    Ok(())
}

fn run_pipeline(config: &Config) -> anyhow::Result<RunReport> {
    let matcher = SkillMatcher::new(SkillVocabulary::new(&config.skills)?)?;
    tracing::info!("Matching {} skills", matcher.vocabulary().len());

    // Fatal problems surface here, before the store is opened.
    let dataset = DatasetLoader::new(&config.data_dir)
        .with_default_year(config.default_year)
        .load()?;

    let store = SqliteStore::new(&config.database_path)?;
    let pipeline = TrendPipeline::new(matcher, store, PipelineConfig::from(config));

    Ok(pipeline.run(dataset)?)
}

fn load_records<T: serde::de::DeserializeOwned>(
    store: &SqliteStore,
    target: skilltrend::storage::CollectionTarget,
) -> anyhow::Result<Vec<T>> {
    store
        .load(target)?
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(Into::into))
        .collect()
}

fn print_output(
    format: &str,
    report: Option<&RunReport>,
    histories: &[SkillHistory],
    forecasts: &[SkillForecast],
) -> anyhow::Result<()> {
    let output = match format {
        "json" => serde_json::to_string_pretty(&serde_json::json!({
            "report": report,
            "trends": histories,
            "forecasts": forecasts,
        }))?,
        _ => format_text(report, histories, forecasts),
    };

    println!("{}", output);
    Ok(())
}

fn format_text(
    report: Option<&RunReport>,
    histories: &[SkillHistory],
    forecasts: &[SkillForecast],
) -> String {
    let mut output = String::new();

    output.push_str("\n=== Skill Demand Trends ===\n\n");

    if let Some(report) = report {
        output.push_str(&format!("Postings read: {}\n", report.postings_total));
        output.push_str(&format!(
            "Postings without description: {}\n",
            report.postings_dropped
        ));
        output.push_str(&format!("Skills tracked: {}\n", report.skills_tracked));
        output.push_str(&format!("Forecasts: {}\n", report.forecasts_produced));
        output.push_str(&format!(
            "Duration: {:.1}s\n",
            (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
        ));

        if !report.warnings.is_empty() {
            output.push_str(&format!("\nWarnings ({}):\n", report.warnings.len()));
            for warning in report.warnings.iter().take(20) {
                output.push_str(&format!("  ! {}\n", warning));
            }
        }
        output.push('\n');
    }

    let mut ranked: Vec<&SkillHistory> = histories.iter().collect();
    ranked.sort_by(|a, b| b.total_mentions().cmp(&a.total_mentions()));

    output.push_str("Top Skills:\n");
    for history in ranked.iter().take(15) {
        let latest = history
            .history
            .last()
            .map(|p| format!("{} in {}", p.demand_score, p.year))
            .unwrap_or_default();

        let projection = forecasts
            .iter()
            .find(|f| f.skill == history.skill)
            .map(|f| {
                f.forecast
                    .iter()
                    .map(|p| format!("{}: {}", p.year, p.demand_score))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_else(|| "no forecast".to_string());

        output.push_str(&format!(
            "  - {} ({} mentions, latest {}) -> {}\n",
            history.skill,
            history.total_mentions(),
            latest,
            projection
        ));
    }

    output
}

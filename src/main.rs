use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use feedback_pulse::models::{FeedbackRecord, FilterSpec};
use feedback_pulse::{db, metrics, report, source};
use feedback_pulse::{FeedbackAnalyzer, FeedbackRepository, FilterMode, Period};

#[derive(Parser)]
#[command(name = "feedback-pulse")]
#[command(about = "Customer feedback metrics and filtering", long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .args(["csv", "json"])
        .multiple(false)
))]
struct Cli {
    /// Read feedback from a CSV file instead of Postgres
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Read feedback from a JSON array file instead of Postgres
    #[arg(long)]
    json: Option<PathBuf>,
    /// Only consider feedback for this company
    #[arg(long)]
    company: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// all, today, week, month, quarter, year or custom
    #[arg(long, default_value = "all")]
    period: String,
    #[arg(long = "role")]
    roles: Vec<String>,
    #[arg(long = "score")]
    scores: Vec<i32>,
    /// First day of a custom period (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of a custom period (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Reject unknown periods, incomplete ranges and unparseable dates
    #[arg(long)]
    strict: bool,
}

impl FilterArgs {
    fn spec(&self) -> FilterSpec {
        FilterSpec::all()
            .with_period(Period::from(self.period.as_str()))
            .with_roles(self.roles.iter().cloned())
            .with_scores(self.scores.iter().copied())
            .with_range(self.start, self.end)
    }

    fn analyzer(&self) -> FeedbackAnalyzer {
        let mode = if self.strict {
            FilterMode::Strict
        } else {
            FilterMode::Permissive
        };
        FeedbackAnalyzer::new().with_mode(mode)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print total responses and satisfaction score
    Summary,
    /// List the responses matching a filter
    Filter {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Weekly response counts and satisfaction for a filter
    Trends {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "feedback-report.md")]
        out: PathBuf,
    },
}

async fn load_records(cli: &Cli) -> anyhow::Result<Vec<FeedbackRecord>> {
    let mut records = if let Some(path) = &cli.csv {
        source::read_csv(path).with_context(|| format!("failed to read {}", path.display()))?
    } else if let Some(path) = &cli.json {
        source::read_json(path).with_context(|| format!("failed to read {}", path.display()))?
    } else {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set when no --csv or --json file is given")?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .context("failed to connect to Postgres")?;
        return db::fetch_feedback(&pool, cli.company.as_deref())
            .await
            .context("failed to fetch feedback");
    };

    if let Some(company) = cli.company.as_deref() {
        records.retain(|record| record.company_id == company);
    }

    Ok(records)
}

fn print_record(record: &FeedbackRecord) {
    println!(
        "- [{}] {} ({}, {}) {}: {}",
        record.score,
        record.user_id,
        record.role,
        record.company_id,
        record.created_at,
        record.reason
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut repository = FeedbackRepository::new();
    repository.load(load_records(&cli).await?);

    match &cli.command {
        Commands::Summary => {
            let breakdown = metrics::satisfaction_breakdown(repository.records());
            println!("Total responses: {}", repository.total_responses());
            println!("Satisfaction score: {}", repository.satisfaction_score());
            println!(
                "Promoters {} / passives {} / detractors {}",
                breakdown.promoters, breakdown.passives, breakdown.detractors
            );
        }
        Commands::Filter { filter, format } => {
            let matched = repository.filter(&filter.analyzer(), &filter.spec())?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(matched)?);
                }
                OutputFormat::Text => {
                    if matched.is_empty() {
                        println!("No responses match this filter.");
                        return Ok(());
                    }
                    println!("{} matching responses:", matched.len());
                    for record in matched {
                        print_record(record);
                    }
                }
            }
        }
        Commands::Trends { filter } => {
            let matched = repository.filter(&filter.analyzer(), &filter.spec())?;
            let series = metrics::weekly_trends(matched);

            if series.weeks.is_empty() {
                println!("No dated responses match this filter.");
            } else {
                println!("Weekly feedback:");
                for week in series.weeks.iter() {
                    println!(
                        "- week of {}: {} responses, avg score {:.1}, satisfaction {}",
                        week.week_start, week.count, week.avg_score, week.satisfaction
                    );
                }
            }
            if series.skipped > 0 {
                println!("{} responses skipped for unparseable dates.", series.skipped);
            }
        }
        Commands::Report { filter, out } => {
            let spec = filter.spec();
            repository.filter(&filter.analyzer(), &spec)?;
            let report = report::build_report(
                cli.company.as_deref(),
                &spec,
                repository.records(),
                repository.filtered(),
            );
            std::fs::write(out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

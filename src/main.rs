use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workforce_planner::aggregation::WorkerOutput;
use workforce_planner::analysis::Complexity;
use workforce_planner::catalog::WorkerCategory;
use workforce_planner::config::Config;
use workforce_planner::{PlanRequest, WorkflowPlanner};

#[derive(Parser)]
#[command(name = "workforce-planner")]
#[command(about = "Plan and sequence work for a pool of specialized workers", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a task
    Plan {
        /// Free-text task description
        task: String,
        /// Force a complexity tier (simple, standard, complex)
        #[arg(long)]
        complexity: Option<Complexity>,
        /// Worker that must be part of the plan (repeatable)
        #[arg(long = "require", value_name = "WORKER")]
        require: Vec<String>,
        /// Execution history entry (repeatable)
        #[arg(long = "history", value_name = "ENTRY")]
        history: Vec<String>,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Aggregate a stage's worker outputs from a JSON file
    Aggregate {
        /// JSON array of worker outputs
        file: PathBuf,
        /// Stage the outputs belong to
        #[arg(long)]
        stage: WorkerCategory,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the worker catalog
    Catalog,
    /// Show or change configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
        /// Require an explicit severity on every issue
        #[arg(long)]
        strict_severity: Option<bool>,
        /// Enable or disable background cache warm-up
        #[arg(long)]
        warmup: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workforce_planner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        Commands::Plan {
            task,
            complexity,
            require,
            history,
            json,
        } => {
            let config = Config::load_from(&config_path)?;
            run_plan(&config, task, complexity, require, history, json).await?;
        }
        Commands::Aggregate { file, stage, json } => {
            let config = Config::load_from(&config_path)?;
            run_aggregate(&config, &file, stage, json)?;
        }
        Commands::Catalog => {
            let config = Config::load_from(&config_path)?;
            list_catalog(&config)?;
        }
        Commands::Config {
            show,
            strict_severity,
            warmup,
        } => {
            handle_config(&config_path, show, strict_severity, warmup)?;
        }
    }

    Ok(())
}

async fn run_plan(
    config: &Config,
    task: String,
    complexity: Option<Complexity>,
    require: Vec<String>,
    history: Vec<String>,
    json: bool,
) -> Result<()> {
    let planner = WorkflowPlanner::new(config)?;

    let request = PlanRequest {
        task_text: task,
        complexity_override: complexity,
        required_workers: require,
        execution_history: history,
    };
    let response = planner.plan(request).await;
    planner.shutdown().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    print!("{}", response.plan.summary());
    println!("\nRationale:\n{}", response.rationale);
    println!(
        "\nSelected in {} ms{}",
        response.selection_time_ms,
        if response.cache_hit { " (cached)" } else { "" }
    );
    println!("Duration is an estimate, not a commitment.");

    Ok(())
}

fn run_aggregate(config: &Config, file: &Path, stage: WorkerCategory, json: bool) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let outputs: Vec<WorkerOutput> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse worker outputs in {}", file.display()))?;

    let planner = WorkflowPlanner::new(config)?;
    let aggregate = planner.aggregate(stage, &outputs)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&aggregate)?);
        return Ok(());
    }

    let summary = &aggregate.summary;
    println!("{} stage: {} output(s)", stage, outputs.len());
    for finding in &summary.findings {
        println!("  finding [{}] {}", finding.worker, finding.finding);
    }
    for entry in &summary.consensus {
        println!("  consensus {} = {} ({})", entry.key, entry.value, entry.workers.join(", "));
    }
    for entry in &summary.divergence {
        println!("  divergence on {}:", entry.key);
        for value in &entry.values {
            println!("    {} ({})", value.value, value.workers.join(", "));
        }
    }
    for issue in &summary.critical_issues {
        println!("  {:>8} [{}] {}", issue.severity, issue.worker, issue.text);
    }

    println!("\nNext stage:");
    for todo in &aggregate.todos {
        println!(
            "  - [{:?}/{:?}] {} -> {}",
            todo.kind, todo.priority, todo.task, todo.assigned_worker
        );
    }

    Ok(())
}

fn list_catalog(config: &Config) -> Result<()> {
    let planner = WorkflowPlanner::new(config)?;
    let catalog = planner.catalog();

    for category in WorkerCategory::ORDERED {
        let workers = catalog.in_category(category);
        if workers.is_empty() {
            continue;
        }
        println!("{}:", category);
        for worker in workers {
            let tags: Vec<&str> = worker.tags.iter().map(String::as_str).collect();
            println!("  {:<22} p{}  {}", worker.name, worker.priority, tags.join(", "));
        }
    }
    println!("\n{} workers, {} synergy pairs", catalog.len(), catalog.synergy().len());

    Ok(())
}

fn handle_config(
    path: &Path,
    show: bool,
    strict_severity: Option<bool>,
    warmup: Option<bool>,
) -> Result<()> {
    let mut config = Config::load_from(path)?;

    if show {
        println!("Current configuration ({}):", path.display());
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut changed = false;

    if let Some(strict) = strict_severity {
        config.aggregation.strict_severity = strict;
        changed = true;
        println!("Strict severity {}", if strict { "enabled" } else { "disabled" });
    }

    if let Some(enabled) = warmup {
        config.planner.warmup_enabled = enabled;
        changed = true;
        println!("Cache warm-up {}", if enabled { "enabled" } else { "disabled" });
    }

    if changed {
        config.save_to(path)?;
        println!("Configuration saved to: {}", path.display());
    } else {
        println!("No changes made. Use --show to view current configuration.");
    }

    Ok(())
}

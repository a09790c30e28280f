// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use scout_rs::scout::research::depth::DepthConfig;
use scout_rs::scout::research::runner::{Runner, RunSummary};
use scout_rs::scout::research::{report, Collaborators};
use scout_rs::scout::retrieval::MemoryVectorStore;
use scout_rs::scout::search::SearchRouter;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a research query
    Research {
        /// The research question
        query: String,

        /// Workflow to use (auto-selected when omitted)
        #[arg(short, long)]
        workflow: Option<String>,

        /// Research depth: quick, standard, deep, comprehensive
        #[arg(short, long, default_value = "standard")]
        depth: String,

        /// Thread id for resumable runs
        #[arg(short, long, default_value = "cli")]
        thread_id: String,

        /// Save the report under this directory
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
    /// List the available workflows
    Workflows,
    /// List saved reports, newest first
    Reports {
        /// Directory the reports were saved under
        #[arg(short, long, default_value = "reports")]
        dir: PathBuf,

        /// Maximum number of reports to list
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Only list reports whose query contains this term
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn build_runner(depth: DepthConfig) -> Result<Arc<Runner>, Box<dyn std::error::Error + Send + Sync>> {
    let model_name =
        std::env::var("MODEL_NAME").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
    let model = scout_rs::llm::from_env(None, &model_name)?;

    let web = Arc::new(SearchRouter::from_env());
    let kb_dir =
        PathBuf::from(std::env::var("KNOWLEDGE_BASE_DIR").unwrap_or_else(|_| "kb".to_string()));
    let store = Arc::new(MemoryVectorStore::from_dir(&kb_dir)?);

    let collab = Arc::new(Collaborators::new(model, web, store));
    Ok(Arc::new(Runner::new(collab, depth)?))
}

fn print_summary(summary: &RunSummary) {
    println!("Workflow: {} ({})", summary.workflow, summary.selection_reason);
    match &summary.report {
        Some(report) => println!("\n{}", report),
        None => println!("\nNo report produced."),
    }
}

/// Drive a run through ceiling interruptions, asking on each one whether
/// to extend and continue or accept the partial result.
async fn run_with_resume(
    runner: &Runner,
    query: &str,
    workflow: Option<&str>,
    thread_id: &str,
) -> Result<RunSummary, Box<dyn std::error::Error + Send + Sync>> {
    let mut summary = runner.run(query, workflow, thread_id).await?;

    while let Some(notice) = &summary.ceiling {
        println!(
            "Step ceiling {} reached after {} steps (next: {}).",
            notice.current_ceiling, notice.steps_taken, notice.next_nodes
        );
        print!(
            "Extend to {} and continue? [y/N] ",
            notice.suggested_extension
        );
        std::io::stdout().flush()?;

        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Accepting partial result.");
            break;
        }
        summary = runner
            .resume(thread_id, Some(notice.suggested_extension))
            .await?;
    }

    Ok(summary)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Research {
            query,
            workflow,
            depth,
            thread_id,
            save,
        } => {
            let depth: DepthConfig = depth.parse()?;
            let runner = build_runner(depth)?;

            let summary =
                run_with_resume(&runner, &query, workflow.as_deref(), &thread_id).await?;
            print_summary(&summary);

            if let (Some(dir), Some(report_text)) = (save, &summary.report) {
                let path = report::save(&dir, &query, &summary.workflow, report_text)?;
                println!("\nSaved to {}", path.display());
            }
        }
        Commands::Workflows => {
            let runner = build_runner(DepthConfig::standard())?;
            for info in runner.list_workflows() {
                println!("{:24} {}", info.name, info.description);
            }
        }
        Commands::Reports { dir, limit, filter } => {
            let paths = report::list_recent(&dir, limit, filter.as_deref())?;
            if paths.is_empty() {
                println!("No reports found under {}", dir.display());
            }
            for path in paths {
                println!("{}", path.display());
            }
        }
        Commands::Serve { port } => {
            let runner = build_runner(DepthConfig::standard())?;
            scout_rs::scout::server::serve(runner, port).await?;
        }
    }

    Ok(())
}

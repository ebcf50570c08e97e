mod cli;
mod display;
mod log;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use quill_app::{EvalSuite, Evaluator, Orchestrator, RunLogEntry, RunLogger};
use quill_domain::DocumentSearch;
use quill_env::Environment;
use quill_indexer::{AnyEmbedder, FileLoader, LoadReport, MemoryIndex, ParagraphChunker, Retriever};
use quill_provider::Client;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

type SharedRetriever = Arc<Retriever<AnyEmbedder, MemoryIndex>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut env = Environment::from_env().context("Invalid configuration")?;
    if let Some(data_dir) = cli.data_dir {
        env = env.data_dir(data_dir);
    }
    let _guard = log::init_tracing(&env.app_log_path())?;

    match cli.command {
        Command::Run { task, multi_output, max_revisions } => {
            let multi_output = multi_output || env.multi_output;
            let env = env.multi_output(multi_output);
            let env = match max_revisions {
                Some(max_revisions) => env.max_revisions(max_revisions),
                None => env,
            };
            run(&env, task).await
        }
        Command::Index => {
            let (retriever, report) = load_retriever(&env).await?;
            println!("{}", display::load_report(&report, &retriever.stats().await));
            Ok(())
        }
        Command::Search { query, k } => {
            let (retriever, _) = load_retriever(&env).await?;
            let results = retriever.search(&query, k.unwrap_or(env.top_k)).await?;
            println!("{}", display::search_results(&query, &results));
            Ok(())
        }
        Command::Eval { suite } => eval(&env, suite).await,
        Command::Logs => {
            let summary = RunLogger::new(env.run_log_path()).summarize().await?;
            println!("{}", display::run_summary(&summary));
            Ok(())
        }
    }
}

async fn run(env: &Environment, task: Option<String>) -> anyhow::Result<()> {
    let task = match task {
        Some(task) => task,
        None => match read_task().await? {
            Some(task) => task,
            None => {
                println!("No task provided. Exiting.");
                return Ok(());
            }
        },
    };

    let model = Arc::new(Client::from_config(&env.model, env.retry_config.clone())?);
    let (retriever, _) = load_retriever(env).await?;
    let orchestrator = Orchestrator::from_env(model, retriever, env);
    let logger = RunLogger::new(env.run_log_path());

    let started = Instant::now();
    let outcome = orchestrator.run(task.as_str()).await;
    let entry = match &outcome {
        Ok(state) => RunLogEntry::from_state(state, started.elapsed()),
        Err(error) => RunLogEntry::failed(task.as_str(), started.elapsed(), error),
    };
    match logger.write(&entry).await {
        Ok(path) => info!(path = %path.display(), "Run logged"),
        Err(error) => warn!(error = %format!("{error:#}"), "Failed to write run log"),
    }

    let state = outcome?;
    println!("{}", display::trace(&state.agent_trace));
    println!("{}", display::deliverable(&state));
    if let Some(verification) = display::verification(&state) {
        println!("{verification}");
    }
    Ok(())
}

async fn eval(env: &Environment, suite: Option<PathBuf>) -> anyhow::Result<()> {
    let suite = match suite {
        Some(path) => EvalSuite::load(&path).await?,
        None => EvalSuite::builtin()?,
    };

    let model = Arc::new(Client::from_config(&env.model, env.retry_config.clone())?);
    let (retriever, _) = load_retriever(env).await?;
    let orchestrator = Orchestrator::from_env(model, retriever, env);

    println!("Running {} evaluation cases...", suite.cases.len());
    let evaluation = Evaluator::new(&orchestrator).run(&suite).await;
    let path = evaluation.write(&env.eval_path()).await?;

    println!("{}", display::eval_summary(&evaluation.summary));
    println!("Results saved to: {}", path.display());
    Ok(())
}

async fn load_retriever(env: &Environment) -> anyhow::Result<(SharedRetriever, LoadReport)> {
    let retriever = Retriever::new(
        FileLoader::new(env.extensions.clone()),
        ParagraphChunker::new(env.chunk_size),
        AnyEmbedder::from_config(&env.embedding)?,
        MemoryIndex::new(env.distance),
    );
    let report = retriever.load(&env.data_dir).await?;
    Ok((Arc::new(retriever), report))
}

async fn read_task() -> anyhow::Result<Option<String>> {
    println!("{}", display::examples());
    print!("Enter task number (1-{}) or type your own task: ", display::EXAMPLE_TASKS.len());
    std::io::stdout().flush()?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut answer).await?;
    Ok(display::pick_task(&answer))
}

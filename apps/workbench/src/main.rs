use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{AddOutcome, HttpJudgeClient, Workbench, WorkbenchError, WorkbenchEvent};
use shared::domain::{Language, Submission};
use storage::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::info;

mod config;

use config::{load_settings, normalize_database_url, validate_judge_url};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "workbench.toml")]
    config: String,
    #[arg(long)]
    judge_url: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(v) = args.judge_url {
        settings.judge_url = v;
    }
    if let Some(v) = args.database_url {
        settings.database_url = v;
    }
    if let Some(v) = args.user {
        settings.user = v;
    }

    let judge_url = validate_judge_url(&settings.judge_url)?;
    let database_url = normalize_database_url(&settings.database_url);

    let storage = Storage::new(&database_url).await?;
    let workbench = Workbench::new(
        settings.user,
        Arc::new(storage.clone()),
        Arc::new(HttpJudgeClient::new(judge_url.clone())),
    );
    workbench.load().await?;
    info!(user = workbench.user(), judge_url = %judge_url, "workbench ready");

    // Judge notifications arrive asynchronously; print them as they land.
    {
        let mut events = BroadcastStream::new(workbench.subscribe());
        tokio::spawn(async move {
            while let Some(Ok(event)) = events.next().await {
                match event {
                    WorkbenchEvent::SubmissionQueued { problem, .. } => {
                        println!("submission for '{problem}' queued; grading pending");
                    }
                    WorkbenchEvent::SubmitFailed { detail, .. } => {
                        println!("submit failed ({detail}); please try again");
                    }
                    WorkbenchEvent::StateChanged(_) => {}
                }
            }
        });
    }

    println!(
        "commands: new <name> <problem> <lang-code> | replace ... | ls | open <i> | close | edit <text> | submit | result <i> | rm <i> | quit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.as_str(), ""),
        };
        match run_command(&workbench, &storage, command, rest).await {
            Ok(true) => break,
            Ok(false) => {}
            Err(err) => println!("error: {err:#}"),
        }
    }

    Ok(())
}

async fn run_command(
    workbench: &Workbench,
    storage: &Storage,
    command: &str,
    rest: &str,
) -> Result<bool> {
    match command {
        "" => {}
        "quit" | "exit" => return Ok(true),
        "ls" => render(workbench, storage).await?,
        "new" | "replace" => {
            let mut parts = rest.split_whitespace();
            let (Some(name), Some(problem), Some(code)) =
                (parts.next(), parts.next(), parts.next())
            else {
                println!("usage: {command} <name> <problem> <language-code>");
                return Ok(false);
            };
            let Some(language) = code.parse().ok().and_then(Language::from_code) else {
                println!("unknown language code '{code}'");
                return Ok(false);
            };
            let overwrite = command == "replace";
            let outcome = workbench
                .add(Submission::new(name, problem, language, ""), move |_, _| {
                    overwrite
                })
                .await?;
            if outcome == AddOutcome::KeptExisting {
                println!("'{name}' already exists; use 'replace' to overwrite it");
            } else {
                render(workbench, storage).await?;
            }
        }
        "open" => {
            let Ok(index) = rest.parse::<usize>() else {
                println!("usage: open <index>");
                return Ok(false);
            };
            if index >= workbench.snapshot().await.submissions.len() {
                println!("no submission at index {index}");
                return Ok(false);
            }
            workbench.select(Some(index)).await?;
        }
        "close" => workbench.select(None).await?,
        "edit" => {
            if rest.is_empty() {
                println!("usage: edit <content>");
                return Ok(false);
            }
            match workbench.edit(rest).await {
                Ok(()) => {}
                Err(err @ WorkbenchError::NoSelection) => println!("{err}"),
                Err(err) => return Err(err.into()),
            }
        }
        "submit" => {
            match workbench
                .submit(|| println!("submit controls re-enabled"))
                .await
            {
                Ok(()) => {}
                Err(err @ (WorkbenchError::NoSelection | WorkbenchError::SubmitInFlight)) => {
                    println!("{err}")
                }
                // Judge failures were already surfaced through the event stream.
                Err(WorkbenchError::Judge(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        "result" => {
            let Ok(index) = rest.parse::<usize>() else {
                println!("usage: result <index>");
                return Ok(false);
            };
            let snapshot = workbench.snapshot().await;
            match snapshot.submissions.get(index) {
                None => println!("no submission at index {index}"),
                Some(submission) => match &submission.result {
                    None => println!("'{}' has not been submitted", submission.name),
                    Some(report) if report.is_pending() => println!("grading pending"),
                    Some(report) => {
                        println!("verdict: {}", report.verdict.as_deref().unwrap_or("unknown"));
                        for case in &report.details {
                            let time = case
                                .time_ms
                                .map(|ms| format!(" ({ms:.0} ms)"))
                                .unwrap_or_default();
                            println!("  {}: {}{}", case.name, case.verdict, time);
                        }
                    }
                },
            }
        }
        "rm" => {
            let Ok(index) = rest.parse::<usize>() else {
                println!("usage: rm <index>");
                return Ok(false);
            };
            if index >= workbench.snapshot().await.submissions.len() {
                println!("no submission at index {index}");
                return Ok(false);
            }
            workbench.remove(index).await?;
            render(workbench, storage).await?;
        }
        other => println!("unknown command '{other}'"),
    }
    Ok(false)
}

async fn render(workbench: &Workbench, storage: &Storage) -> Result<()> {
    let snapshot = workbench.snapshot().await;
    if snapshot.submissions.is_empty() {
        println!("(no submissions)");
    }
    for (index, submission) in snapshot.submissions.iter().enumerate() {
        let marker = if snapshot.selected == Some(index) {
            '*'
        } else {
            ' '
        };
        let verdict = submission
            .result
            .as_ref()
            .map(|report| {
                report
                    .verdict
                    .clone()
                    .unwrap_or_else(|| "pending".to_string())
            })
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{marker} [{index}] {} ({}, .{}) {:?} verdict={verdict}",
            submission.name,
            submission.problem,
            submission.language.extension(),
            submission.save_status
        );
    }
    if let Some(saved_at) = storage.last_saved_at(workbench.user()).await? {
        println!("last saved {saved_at}");
    }
    Ok(())
}

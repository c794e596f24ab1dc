use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use facedex_core::{
    AssumeYes, Confirm, Coordinator, Lifecycle, LocalCache, LocalMirror, Outcome, Reconciler,
    RemoteMirror, RemoteStore, SharedReconciler,
};
use facedex_http::HttpRemote;
use facedex_store::SqliteCache;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod prompt;
mod render;

use config::Config;
use prompt::TerminalConfirm;

#[derive(Parser)]
#[command(name = "facedex", about = "Face recognition history and gallery manager")]
struct Cli {
    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a photo (JPEG or PNG) for recognition
    Upload { path: PathBuf },
    /// List upload history, newest first
    History,
    /// List recognized persons and their faces
    Persons,
    /// List faces waiting to be identified
    Unrecognized,
    /// Create a person from an unrecognized face
    Create { face_id: String, name: String },
    /// Add an unrecognized face to an existing person
    Assign { face_id: String, person: String },
    /// Delete one face from a person's gallery
    DeleteFace { person: String, face_id: String },
    /// Delete a person and all their faces
    DeletePerson { person: String },
    /// Discard an unrecognized face
    Discard { face_id: String },
    /// Delete one upload history item
    DeleteHistory { id: i64 },
    /// Delete a whole collection
    Clear { target: ClearTarget },
    /// Stay attached and refresh from the service periodically
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
enum ClearTarget {
    History,
    Persons,
    Unrecognized,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let cache: Arc<dyn LocalCache> = Arc::new(
        SqliteCache::open(&config.cache_path)
            .with_context(|| format!("opening cache at {}", config.cache_path.display()))?,
    );
    let remote: Arc<dyn RemoteStore> =
        Arc::new(HttpRemote::new(&config.api_url, config.http_timeout)?);
    let confirm: Arc<dyn Confirm> = if cli.yes || config.assume_yes {
        Arc::new(AssumeYes)
    } else {
        Arc::new(TerminalConfirm)
    };

    let (remote_mirror, push_task) = RemoteMirror::spawn(remote.clone());
    let engine = Reconciler::new()
        .with_mirror(LocalMirror::new(cache.clone()))
        .with_mirror(remote_mirror)
        .into_shared();
    let lifecycle = Lifecycle::new(engine.clone(), cache, remote.clone());
    let coordinator = Coordinator::new(engine.clone(), remote, confirm);

    tracing::info!(api = %config.api_url, cache = %config.cache_path.display(), "facedex starting");
    lifecycle.boot().await;

    let result = run(cli.command, &engine, &lifecycle, &coordinator, config.refresh_interval).await;

    lifecycle.teardown().await;

    // Dropping the last engine handle closes the push queue; queued pushes still go out.
    drop(coordinator);
    drop(lifecycle);
    drop(engine);
    if let Err(e) = push_task.await {
        tracing::warn!(error = %e, "remote mirror task failed");
    }

    result
}

async fn run(
    command: Commands,
    engine: &SharedReconciler,
    lifecycle: &Lifecycle,
    coordinator: &Coordinator,
    refresh_interval: Duration,
) -> Result<()> {
    match command {
        Commands::Upload { path } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());

            let report = coordinator.upload(&file_name, bytes).await?;
            if let Some(message) = &report.message {
                println!("{message}");
            }
            print!("{}", render::results(&report.results));
        }
        Commands::History => print!("{}", render::history(engine.lock().await.history())),
        Commands::Persons => {
            let engine = engine.lock().await;
            print!("{}", render::persons(engine.persons(), engine.all_persons()));
        }
        Commands::Unrecognized => {
            print!("{}", render::unrecognized(engine.lock().await.unrecognized()));
        }
        Commands::Create { face_id, name } => {
            let outcome = coordinator.create_person(&face_id, &name).await?;
            println!("{}", render::assignment(outcome, name.trim()));
        }
        Commands::Assign { face_id, person } => {
            let outcome = coordinator.add_face_to_person(&face_id, &person).await?;
            println!("{}", render::assignment(outcome, &person));
        }
        Commands::DeleteFace { person, face_id } => {
            let outcome = coordinator.delete_face(&person, &face_id).await?;
            report(outcome, "The face has been deleted.");
        }
        Commands::DeletePerson { person } => {
            let outcome = coordinator.delete_person(&person).await?;
            report(outcome, &format!("{person} has been deleted."));
        }
        Commands::Discard { face_id } => {
            let outcome = coordinator.delete_unrecognized_face(&face_id).await?;
            report(outcome, "The face has been discarded.");
        }
        Commands::DeleteHistory { id } => {
            let outcome = coordinator.delete_history_item(id).await;
            report(outcome, "The image has been deleted.");
        }
        Commands::Clear { target } => {
            let (outcome, done) = match target {
                ClearTarget::History => (
                    coordinator.clear_all_history().await?,
                    "All history has been deleted.",
                ),
                ClearTarget::Persons => (
                    coordinator.clear_all_persons().await?,
                    "All recognized persons have been deleted.",
                ),
                ClearTarget::Unrecognized => (
                    coordinator.clear_all_unrecognized().await?,
                    "All unrecognized faces have been deleted.",
                ),
            };
            report(outcome, done);
        }
        Commands::Watch => watch(engine, lifecycle, refresh_interval).await?,
    }

    Ok(())
}

fn report(outcome: Outcome, done: &str) {
    match outcome {
        Outcome::Done => println!("{done}"),
        Outcome::Cancelled => println!("Cancelled."),
    }
}

/// Each tick stands in for the session becoming visible again.
async fn watch(
    engine: &SharedReconciler,
    lifecycle: &Lifecycle,
    refresh_interval: Duration,
) -> Result<()> {
    let mut ticker = tokio::time::interval(refresh_interval);
    // The first tick fires immediately and boot has just fetched.
    ticker.tick().await;
    println!("{}", render::summary(engine.lock().await.collections()));

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("watch interrupted");
                break;
            }
            _ = ticker.tick() => {
                lifecycle.regain_visibility().await;
                println!("{}", render::summary(engine.lock().await.collections()));
            }
        }
    }

    Ok(())
}

//! Client binary entry point

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use client::{
    ClientError, ClientResult, HttpStoryApi, ImageState, ProgressView, SessionConfig,
    SessionController, SessionOutcome, ViewPhase,
};
use shared::StoryRequest;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Runs one story generation session against the backend")]
struct Args {
    /// Path to a JSON file with the story request (characters, universe,
    /// description)
    request: PathBuf,

    /// Base URL of the story generation API
    #[arg(long, default_value = "http://localhost:8000")]
    api_base: Url,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit progress as JSON lines instead of human-readable text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ClientResult<()> {
    let args = Args::parse();
    shared::logging::init_tracing(args.log_level.as_deref());

    let raw = std::fs::read_to_string(&args.request)?;
    let request: StoryRequest = serde_json::from_str(&raw)?;
    request
        .validate()
        .map_err(|err| ClientError::request(err.to_string()))?;

    let api = HttpStoryApi::new(args.api_base.clone());
    let controller = SessionController::new(api, request, SessionConfig::new(args.api_base))?;

    let cancel = controller.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel().await;
        }
    });

    let mut view_rx = controller.subscribe();
    let json = args.json;
    let printer = tokio::spawn(async move {
        while view_rx.changed().await.is_ok() {
            let view = view_rx.borrow_and_update().clone();
            render(&view, json);
        }
    });

    let outcome = controller.run().await;
    printer.abort();

    match outcome {
        SessionOutcome::Completed(story) => {
            println!("\n✨ \"{}\" is ready ({} images)", story.title, story.images.len());
            for (id, url) in &story.images {
                println!("  {} {url}", id.display_label());
            }
            Ok(())
        }
        SessionOutcome::Failed(failure) => {
            eprintln!("\n❌ Generation failed: {failure}");
            std::process::exit(1);
        }
        SessionOutcome::Cancelled => {
            println!("\n🛑 Generation cancelled");
            Ok(())
        }
    }
}

fn render(view: &ProgressView, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(view) {
            println!("{line}");
        }
        return;
    }

    match &view.phase {
        ViewPhase::Running => {
            println!(
                "[{}] {} — {} ({:.0}%)",
                view.elapsed_label, view.stage_title, view.message, view.progress
            );
            for image in &view.images {
                match &image.state {
                    ImageState::Pending => {}
                    ImageState::InProgress {
                        attempt,
                        max_attempts,
                        elapsed_seconds,
                    } => println!(
                        "    ⏳ {} attempt {attempt}/{max_attempts} ({elapsed_seconds}s)",
                        image.label
                    ),
                    ImageState::Done { .. } => println!("    ✅ {}", image.label),
                    ImageState::Errored { message } => {
                        println!("    ❌ {}: {message}", image.label)
                    }
                }
            }
        }
        ViewPhase::Completed { total_label } => {
            println!("[{}] ✨ Completed in {total_label}", view.elapsed_label);
        }
        ViewPhase::Failed { message } => {
            println!("[{}] ❌ {message}", view.elapsed_label);
        }
    }
}

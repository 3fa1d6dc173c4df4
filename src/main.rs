use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_scribe::cli::Cli;
use video_scribe::progress::{ConsoleProgress, NullProgress, ProgressSink};
use video_scribe::{Config, PipelineController};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "video_scribe=debug"
    } else {
        "video_scribe=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().await?;

    // Check for required external tools (non-fatal, they may still resolve at runtime)
    if !cli.quiet {
        let missing = video_scribe::utils::check_dependencies(&config.tools).await;
        if !missing.is_empty() {
            eprintln!("Dependency check warnings:");
            for tool in missing {
                eprintln!("  - {}", tool);
            }
        }
    }

    let sink: Arc<dyn ProgressSink> = if cli.quiet {
        Arc::new(NullProgress)
    } else {
        Arc::new(ConsoleProgress::new())
    };

    let controller = PipelineController::from_config(&config).with_sink(sink);
    let result = controller.run_json(&cli.request).await?;

    println!("{}", result.message);
    println!("{}", serde_json::to_string_pretty(&result.transcripts)?);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

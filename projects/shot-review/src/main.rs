use anyhow::{Context, Result};
use shot_review::analysis::AnalysisPayload;
use shot_review::cli::{Args, Command, ReplayArgs, ShotsArgs};
use shot_review::overlay::types::ContainerLayout;
use shot_review::replay::{replay_to_csv, ReplayConfig};
use shot_review::shots::ShotList;
use shot_review::web::server::run_server;
use std::fs::File;
use std::io::{self, BufWriter};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so CSV and JSON output stay clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse_args();
    match args.command {
        Command::Serve(serve) => run_server(serve).await?,
        Command::Replay(replay) => run_replay(replay)?,
        Command::Shots(shots) => run_shots(shots)?,
    }

    Ok(())
}

fn load_payload(path: &std::path::Path) -> Result<AnalysisPayload> {
    let payload = AnalysisPayload::from_path(path)
        .with_context(|| format!("Failed to load payload {:?}", path))?;
    info!(
        "Loaded {:?}: {} shots, {} tracking samples, video {}x{}",
        path,
        payload.shots().len(),
        payload.tracking.len(),
        payload.metadata.width,
        payload.metadata.height
    );
    Ok(payload)
}

fn run_replay(args: ReplayArgs) -> Result<()> {
    let payload = load_payload(&args.payload)?;

    let mut config = ReplayConfig::new(ContainerLayout::new(args.width, args.height));
    config.tick = Duration::from_millis(args.tick_ms.max(1));
    config.start = args.start;
    config.end = args.end;
    config.show_progress = args.output.is_some();

    let stats = match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
            replay_to_csv(&payload, &config, BufWriter::new(file))?
        }
        None => replay_to_csv(&payload, &config, io::stdout().lock())?,
    };

    info!(
        "Replayed {} ticks ({} with a visible marker) in {:.1?}",
        stats.ticks, stats.visible, stats.duration
    );
    Ok(())
}

fn run_shots(args: ShotsArgs) -> Result<()> {
    let payload = load_payload(&args.payload)?;
    let mut list = ShotList::new(payload.shots().to_vec());
    if !list.shots().is_empty() && args.select > 0 && !list.select(args.select - 1) {
        anyhow::bail!(
            "Shot {} out of range (payload has {} shots)",
            args.select,
            list.shots().len()
        );
    }

    if args.json {
        let out = serde_json::json!({
            "active": list.active(),
            "shots": list.cards(),
            "summary": list.summary(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", list.render_text());
    }
    Ok(())
}

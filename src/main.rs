use anyhow::Result;
use clap::Parser;
use interview_recorder::{create_router, AppState, Config};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "interview-recorder", about = "Interview recording and transcription service")]
struct Args {
    /// Configuration file (without extension), resolved by the config crate
    #[arg(long, default_value = "config/interview-recorder")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Uploads root: {}", cfg.storage.uploads_root.display());
    info!(
        "Transcoder: {} / Recognizer: {}",
        cfg.transcription.transcoder_path.display(),
        cfg.transcription.recognizer_path.display()
    );

    let bind = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(cfg)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("HTTP server listening on {}", bind);
    axum::serve(listener, router).await?;

    Ok(())
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use meeting_minutes::{
    create_router, AppState, AudioBackendConfig, AudioSource, CaptureRecorder, Collaborators,
    Config, DocumentExtractor, ExportArtifact, FileStore, KeyValueStore, MeetingId,
    MeetingRepository, OpenAiSummarizer, SessionEngine,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "meeting-minutes")]
#[command(about = "Meeting notes, recordings and AI minutes")]
struct Args {
    /// Config file (without extension)
    #[arg(short, long, default_value = "config/meeting-minutes")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API for the presentation layer
    Serve,

    /// List saved meetings, newest first
    List {
        /// Only meetings whose title, notes or summary contain this text
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Delete a saved meeting
    Delete { id: String },

    /// Write a meeting's summary as markdown
    Export {
        id: String,

        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let store_path = cfg.storage.store_path();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&store_path).await?);
    info!("Store: {}", store_path.display());

    match args.command {
        Command::Serve => serve(cfg, store).await,
        Command::List { query } => {
            let meetings = MeetingRepository::new(store);
            let records = meetings.search(query.as_deref().unwrap_or("")).await?;
            if records.is_empty() {
                println!("No meetings found");
            }
            for record in records {
                println!("{}  {:<20}  {}", record.id, record.date, record.title);
                println!("    {}", record.preview(100));
            }
            Ok(())
        }
        Command::Delete { id } => {
            let meetings = MeetingRepository::new(store);
            if meetings.delete(&MeetingId::new(id.clone())).await? {
                println!("Deleted {}", id);
            } else {
                println!("Meeting {} not found", id);
            }
            Ok(())
        }
        Command::Export { id, out_dir } => {
            let meetings = MeetingRepository::new(store);
            let record = meetings
                .find(&MeetingId::new(id.clone()))
                .await?
                .with_context(|| format!("Meeting {} not found", id))?;
            if record.summary.is_empty() {
                anyhow::bail!("Meeting {} has no summary to export", id);
            }

            let path = ExportArtifact::markdown(&record.title, &record.summary)
                .write_to(&out_dir)
                .await?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

async fn serve(cfg: Config, store: Arc<dyn KeyValueStore>) -> Result<()> {
    info!("{} starting", cfg.service.name);

    let source = match &cfg.recorder.source {
        Some(path) => AudioSource::File(path.clone()),
        None => AudioSource::Microphone,
    };
    info!("Recorder source: {:?}", source);

    let summarizer_config = cfg.summarizer.client_config();
    if summarizer_config.api_key.is_none() {
        info!(
            "No API key in ${}, summaries will report a configuration error",
            cfg.summarizer.api_key_env
        );
    }

    let engine = SessionEngine::new(
        cfg.session.clone(),
        Collaborators {
            store,
            recorder: Box::new(CaptureRecorder::new(source, AudioBackendConfig::default())),
            extractor: Arc::new(DocumentExtractor::new()),
            summarizer: Arc::new(OpenAiSummarizer::new(summarizer_config)),
        },
    )
    .await;

    let app = create_router(AppState::new(engine));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP API listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

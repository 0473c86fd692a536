use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use letterflow::application::ports::{RecordStore, Summarizer};
use letterflow::application::services::{EnrichmentWorker, IngestService, UploadValidator};
use letterflow::infrastructure::observability::{init_tracing, TracingConfig};
use letterflow::infrastructure::persistence::InMemoryRecordStore;
use letterflow::infrastructure::storage::LocalBlobStore;
use letterflow::infrastructure::summarize::{MockSummarizer, OpenAiSummarizer};
use letterflow::infrastructure::text_processing::PdfTextExtractor;
use letterflow::presentation::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();

    init_tracing(
        TracingConfig::new(
            settings.environment.default_log_filter(),
            settings.environment.is_prod(),
        ),
        settings.server.port,
    );

    let blob_store = Arc::new(LocalBlobStore::new(settings.storage.blob_path.clone())?);
    let record_store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    let text_extractor = Arc::new(PdfTextExtractor::new());

    // Built once for the life of the process; the worker holds it so the
    // HTTP client and its connection pool are reused across invocations.
    let summarizer: Arc<dyn Summarizer> = if settings.summarizer.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY not set, using mock summarizer");
        Arc::new(MockSummarizer)
    } else {
        Arc::new(OpenAiSummarizer::new(
            settings.summarizer.api_key.clone(),
            settings.summarizer.model.clone(),
        ))
    };

    let (enrichment_sender, enrichment_receiver) = mpsc::channel(settings.queue.capacity);

    let worker = EnrichmentWorker::new(
        enrichment_receiver,
        enrichment_sender.clone(),
        Arc::clone(&record_store),
        summarizer,
    );
    tokio::spawn(worker.run());

    let ingest_service = Arc::new(IngestService::new(
        UploadValidator::new(settings.upload.max_file_size_bytes()),
        text_extractor,
        blob_store,
        record_store,
        enrichment_sender.clone(),
    ));

    let state = AppState {
        ingest_service,
        enrichment_sender,
    };

    let router = create_router(state, settings.upload.max_file_size_bytes() as usize);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
    tracing::info!(environment = %settings.environment, "Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::{EnrichmentBatch, IngestService};

#[derive(Clone)]
pub struct AppState {
    pub ingest_service: Arc<IngestService>,
    pub enrichment_sender: mpsc::Sender<EnrichmentBatch>,
}

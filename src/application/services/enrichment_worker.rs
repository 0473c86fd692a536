use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::Instrument;

use crate::application::ports::{RecordStore, RecordStoreError, Summarizer, SummarizerError};
use crate::domain::{BlobKey, EnrichmentUpdate};

/// Deliveries of one batch before it is dropped as dead-lettered.
pub const MAX_DELIVERIES: u32 = 3;

/// One blob-creation event, as delivered by the ingest path or an external
/// storage notification.
#[derive(Debug, Clone)]
pub struct BlobCreated {
    pub key: BlobKey,
}

/// Unit of work on the enrichment queue. Events in a batch are handled
/// strictly in order; a failure aborts the remainder and redelivers the
/// whole batch, so handling of already-completed events must be idempotent.
#[derive(Debug, Clone)]
pub struct EnrichmentBatch {
    pub events: Vec<BlobCreated>,
    pub attempt: u32,
}

impl EnrichmentBatch {
    pub fn first_delivery(events: Vec<BlobCreated>) -> Self {
        Self { events, attempt: 1 }
    }

    fn next_delivery(self) -> Option<Self> {
        if self.attempt >= MAX_DELIVERIES {
            return None;
        }
        Some(Self {
            events: self.events,
            attempt: self.attempt + 1,
        })
    }
}

/// Asynchronous second phase of the pipeline: finds the record behind each
/// stored blob, asks the summarizer for a summary and flips the record to
/// processed. Safe to run more than once per blob.
pub struct EnrichmentWorker {
    receiver: mpsc::Receiver<EnrichmentBatch>,
    redelivery: mpsc::Sender<EnrichmentBatch>,
    record_store: Arc<dyn RecordStore>,
    summarizer: Arc<dyn Summarizer>,
}

impl EnrichmentWorker {
    pub fn new(
        receiver: mpsc::Receiver<EnrichmentBatch>,
        redelivery: mpsc::Sender<EnrichmentBatch>,
        record_store: Arc<dyn RecordStore>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            receiver,
            redelivery,
            record_store,
            summarizer,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Enrichment worker started");
        while let Some(batch) = self.receiver.recv().await {
            let span = tracing::info_span!(
                "enrichment_batch",
                events = batch.events.len(),
                attempt = batch.attempt,
            );
            if let Err(e) = self.process_batch(&batch).instrument(span).await {
                tracing::error!(error = %e, attempt = batch.attempt, "Enrichment batch failed");
                self.redeliver(batch);
            }
        }
        tracing::info!("Enrichment worker stopped: channel closed");
    }

    /// Handles every event of one delivery. Public so tests can drive single
    /// deliveries without the channel loop.
    pub async fn process_batch(&self, batch: &EnrichmentBatch) -> Result<(), EnrichmentError> {
        for event in &batch.events {
            self.process_event(event).await?;
        }
        Ok(())
    }

    async fn process_event(&self, event: &BlobCreated) -> Result<(), EnrichmentError> {
        if !event.key.is_pdf() {
            tracing::debug!(blob_key = %event.key, "Not a letter document, skipping");
            return Ok(());
        }

        let record = self
            .record_store
            .find_by_blob_key(&event.key)
            .await
            .map_err(EnrichmentError::RecordStore)?;

        let Some(record) = record else {
            // The record write may not be visible yet, or the record was
            // removed externally. Redelivery covers the former.
            tracing::warn!(blob_key = %event.key, "No record for blob, skipping");
            return Ok(());
        };

        if record.is_processed() {
            tracing::debug!(
                identifier = %record.identifier,
                blob_key = %event.key,
                "Record already processed, skipping"
            );
            return Ok(());
        }

        let summary = match record.letter_body.as_deref() {
            Some(body) => Some(
                self.summarizer
                    .summarize(body)
                    .await
                    .map_err(EnrichmentError::Summarizer)?,
            ),
            // Nothing to summarize; the record still completes.
            None => None,
        };

        self.record_store
            .apply_enrichment(
                &record.identifier,
                record.uploaded_at,
                EnrichmentUpdate {
                    summary,
                    processed_at: Utc::now(),
                },
            )
            .await
            .map_err(EnrichmentError::RecordStore)?;

        tracing::info!(
            identifier = %record.identifier,
            blob_key = %event.key,
            "Letter enriched"
        );
        Ok(())
    }

    /// Re-enqueues a failed batch. The worker is the sole consumer of the
    /// queue it sends to, so this must never await capacity; a full queue
    /// dead-letters the batch instead of wedging the loop.
    fn redeliver(&self, batch: EnrichmentBatch) {
        let Some(next) = batch.next_delivery() else {
            tracing::error!(
                max_deliveries = MAX_DELIVERIES,
                "Dropping enrichment batch after final delivery"
            );
            return;
        };
        match self.redelivery.try_send(next) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::error!(
                    attempt = dropped.attempt,
                    "Enrichment queue full, dropping batch instead of blocking the worker"
                );
            }
            Err(TrySendError::Closed(_)) => {
                tracing::error!("Enrichment queue closed, dropping batch");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("record store: {0}")]
    RecordStore(RecordStoreError),
    #[error("summarizer: {0}")]
    Summarizer(SummarizerError),
}

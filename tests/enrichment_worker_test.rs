use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Semaphore};

use letterflow::application::ports::{RecordStore, Summarizer, SummarizerError};
use letterflow::application::services::{
    BlobCreated, EnrichmentBatch, EnrichmentWorker, MAX_DELIVERIES,
};
use letterflow::domain::{BlobKey, LetterRecord, RecordStatus};
use letterflow::infrastructure::persistence::InMemoryRecordStore;

struct CountingSummarizer {
    calls: AtomicUsize,
}

impl CountingSummarizer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Summarizer for CountingSummarizer {
    async fn summarize(&self, _text: &str) -> Result<String, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("A short clinic summary.".to_string())
    }
}

struct FailingSummarizer;

#[async_trait::async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(&self, _text: &str) -> Result<String, SummarizerError> {
        Err(SummarizerError::RateLimited)
    }
}

struct CountingFailingSummarizer {
    calls: AtomicUsize,
}

impl CountingFailingSummarizer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Summarizer for CountingFailingSummarizer {
    async fn summarize(&self, _text: &str) -> Result<String, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SummarizerError::RateLimited)
    }
}

/// Signals when a call starts, then holds until the test releases the gate,
/// then fails. Lets a test fill the queue while the worker is mid-batch.
struct GatedFailingSummarizer {
    entered: mpsc::Sender<()>,
    gate: Semaphore,
}

#[async_trait::async_trait]
impl Summarizer for GatedFailingSummarizer {
    async fn summarize(&self, _text: &str) -> Result<String, SummarizerError> {
        let _ = self.entered.send(()).await;
        let _permit = self.gate.acquire().await;
        Err(SummarizerError::RateLimited)
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn pending_record(identifier: &str, blob_key: &str, body: Option<&str>) -> LetterRecord {
    let uploaded_at = Utc::now();
    LetterRecord {
        identifier: identifier.to_string(),
        uploaded_at,
        file_name: blob_key.to_string(),
        blob_key: BlobKey::from_raw(blob_key),
        letter_date: Some("2024-03-05".to_string()),
        letter_body: body.map(str::to_string),
        file_size: 128,
        num_pages: 1,
        upload_date_partition: uploaded_at.to_rfc3339()[..7].to_string(),
        letter_date_partition: Some("2024-03".to_string()),
        content_hash: format!("hash-{blob_key}"),
        status: RecordStatus::Pending,
        summary: None,
        processed_at: None,
    }
}

fn worker(
    record_store: Arc<InMemoryRecordStore>,
    summarizer: Arc<dyn Summarizer>,
) -> EnrichmentWorker {
    let (sender, receiver) = mpsc::channel(8);
    EnrichmentWorker::new(receiver, sender, record_store, summarizer)
}

fn batch_for(keys: &[&str]) -> EnrichmentBatch {
    EnrichmentBatch::first_delivery(
        keys.iter()
            .map(|k| BlobCreated {
                key: BlobKey::from_raw(*k),
            })
            .collect(),
    )
}

#[tokio::test]
async fn given_pending_record_with_body_when_enriching_then_record_is_processed() {
    let store = Arc::new(InMemoryRecordStore::new());
    store
        .put(&pending_record("111", "a.pdf", Some("Dear patient, all clear.")))
        .await
        .unwrap();
    let summarizer = CountingSummarizer::new();
    let w = worker(Arc::clone(&store), summarizer.clone());

    w.process_batch(&batch_for(&["a.pdf"])).await.unwrap();

    let record = store
        .find_by_blob_key(&BlobKey::from_raw("a.pdf"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RecordStatus::Processed);
    assert_eq!(record.summary.as_deref(), Some("A short clinic summary."));
    assert!(record.processed_at.is_some());
    assert_eq!(summarizer.calls(), 1);
}

#[tokio::test]
async fn given_processed_record_when_redelivered_then_summarizer_is_not_billed_again() {
    let store = Arc::new(InMemoryRecordStore::new());
    store
        .put(&pending_record("111", "a.pdf", Some("Dear patient, all clear.")))
        .await
        .unwrap();
    let summarizer = CountingSummarizer::new();
    let w = worker(Arc::clone(&store), summarizer.clone());

    w.process_batch(&batch_for(&["a.pdf"])).await.unwrap();
    let first = store
        .find_by_blob_key(&BlobKey::from_raw("a.pdf"))
        .await
        .unwrap()
        .unwrap();

    // Second delivery of the same event must be a no-op.
    w.process_batch(&batch_for(&["a.pdf"])).await.unwrap();
    let second = store
        .find_by_blob_key(&BlobKey::from_raw("a.pdf"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summarizer.calls(), 1);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.processed_at, second.processed_at);
}

#[tokio::test]
async fn given_record_without_body_when_enriching_then_processed_with_null_summary() {
    let store = Arc::new(InMemoryRecordStore::new());
    store.put(&pending_record("222", "b.pdf", None)).await.unwrap();
    let summarizer = CountingSummarizer::new();
    let w = worker(Arc::clone(&store), summarizer.clone());

    w.process_batch(&batch_for(&["b.pdf"])).await.unwrap();

    let record = store
        .find_by_blob_key(&BlobKey::from_raw("b.pdf"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RecordStatus::Processed);
    assert_eq!(record.summary, None);
    assert!(record.processed_at.is_some());
    assert_eq!(summarizer.calls(), 0);
}

#[tokio::test]
async fn given_no_matching_record_when_enriching_then_event_is_skipped() {
    let store = Arc::new(InMemoryRecordStore::new());
    let w = worker(Arc::clone(&store), CountingSummarizer::new());

    let result = w.process_batch(&batch_for(&["missing.pdf"])).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn given_non_letter_key_when_enriching_then_summarizer_is_not_called() {
    let store = Arc::new(InMemoryRecordStore::new());
    let summarizer = CountingSummarizer::new();
    let w = worker(Arc::clone(&store), summarizer.clone());

    w.process_batch(&batch_for(&["thumbnail.png"])).await.unwrap();

    assert_eq!(summarizer.calls(), 0);
}

#[tokio::test]
async fn given_summarizer_failure_when_enriching_then_batch_fails_and_record_stays_pending() {
    let store = Arc::new(InMemoryRecordStore::new());
    store
        .put(&pending_record("333", "c.pdf", Some("Dear patient.")))
        .await
        .unwrap();
    let w = worker(Arc::clone(&store), Arc::new(FailingSummarizer));

    let result = w.process_batch(&batch_for(&["c.pdf"])).await;

    assert!(result.is_err());
    let record = store
        .find_by_blob_key(&BlobKey::from_raw("c.pdf"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RecordStatus::Pending);
    assert_eq!(record.processed_at, None);
}

#[tokio::test]
async fn given_failure_mid_batch_when_enriching_then_later_events_are_not_processed() {
    let store = Arc::new(InMemoryRecordStore::new());
    store
        .put(&pending_record("444", "first.pdf", Some("Dear one.")))
        .await
        .unwrap();
    store
        .put(&pending_record("555", "second.pdf", Some("Dear two.")))
        .await
        .unwrap();
    let w = worker(Arc::clone(&store), Arc::new(FailingSummarizer));

    let result = w.process_batch(&batch_for(&["first.pdf", "second.pdf"])).await;

    assert!(result.is_err());
    // The abort leaves both pending; redelivery retries the whole batch.
    for key in ["first.pdf", "second.pdf"] {
        let record = store
            .find_by_blob_key(&BlobKey::from_raw(key))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, RecordStatus::Pending);
    }
}

#[tokio::test]
async fn given_persistent_failure_when_running_then_batch_is_dropped_after_max_deliveries() {
    let store = Arc::new(InMemoryRecordStore::new());
    store
        .put(&pending_record("666", "d.pdf", Some("Dear patient.")))
        .await
        .unwrap();
    let summarizer = CountingFailingSummarizer::new();
    let (sender, receiver) = mpsc::channel(8);
    let w = EnrichmentWorker::new(receiver, sender.clone(), store.clone(), summarizer.clone());
    tokio::spawn(w.run());

    sender.send(batch_for(&["d.pdf"])).await.unwrap();

    wait_until(|| summarizer.calls() >= MAX_DELIVERIES as usize).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Dead-lettered after the final delivery, not retried forever.
    assert_eq!(summarizer.calls(), MAX_DELIVERIES as usize);
    let record = store
        .find_by_blob_key(&BlobKey::from_raw("d.pdf"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RecordStatus::Pending);
}

#[tokio::test]
async fn given_full_queue_when_redelivering_then_batch_is_dropped_and_worker_continues() {
    let store = Arc::new(InMemoryRecordStore::new());
    store
        .put(&pending_record("777", "stuck.pdf", Some("Dear patient.")))
        .await
        .unwrap();
    store.put(&pending_record("888", "queued.pdf", None)).await.unwrap();

    let (entered_tx, mut entered_rx) = mpsc::channel(1);
    let summarizer = Arc::new(GatedFailingSummarizer {
        entered: entered_tx,
        gate: Semaphore::new(0),
    });
    let (sender, receiver) = mpsc::channel(1);
    let w = EnrichmentWorker::new(receiver, sender.clone(), store.clone(), summarizer.clone());
    tokio::spawn(w.run());

    sender.send(batch_for(&["stuck.pdf"])).await.unwrap();
    entered_rx.recv().await.expect("summarizer should be called");
    // The worker is mid-batch, so this send fills the queue to capacity.
    sender.send(batch_for(&["queued.pdf"])).await.unwrap();
    summarizer.gate.add_permits(1);

    // The failed batch finds no capacity to return to and must be dropped;
    // the worker has to move on to the queued batch rather than wait for
    // room only it can free.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let record = store
            .find_by_blob_key(&BlobKey::from_raw("queued.pdf"))
            .await
            .unwrap()
            .unwrap();
        if record.is_processed() {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "worker stalled behind a full queue"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let stuck = store
        .find_by_blob_key(&BlobKey::from_raw("stuck.pdf"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stuck.status, RecordStatus::Pending);
}

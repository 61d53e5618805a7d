//! Background dispatch of whole batches.
//!
//! [`BatchDispatcher::submit`] records the upload, hands the rows to a
//! blocking task and returns at once with the upload ID. The task ingests the
//! rows into the shared store and closes the upload ledger entry.

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::message::ParsedMessage;
use crate::storage::SharedStorage;

use super::{ColumnLayout, IngestReport, Ingestor, MessageSink, PersistError};

/// Starts batch ingestion tasks against one shared store.
#[derive(Debug, Clone)]
pub struct BatchDispatcher {
    storage: SharedStorage,
    layout: ColumnLayout,
}

/// Sink tagging every message with the upload it came from.
#[derive(Debug)]
struct UploadSink {
    storage: SharedStorage,
    upload_id: i64,
}

impl MessageSink for UploadSink {
    fn save_message(&mut self, message: ParsedMessage) -> std::result::Result<(), PersistError> {
        self.storage
            .lock()?
            .insert_message(&message, Some(self.upload_id))?;
        Ok(())
    }
}

impl BatchDispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(storage: SharedStorage, layout: ColumnLayout) -> Self {
        Self { storage, layout }
    }

    /// Record an upload and start ingesting `rows` in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload cannot be recorded; no task is started
    /// in that case.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn submit<R>(
        &self,
        filename: &str,
        author: Option<&str>,
        rows: Vec<R>,
    ) -> Result<BatchHandle>
    where
        R: AsRef<[String]> + Send + 'static,
    {
        let upload_id = self.storage.lock()?.create_upload(filename, author)?;
        let storage = self.storage.clone();
        let layout = self.layout;
        let span = tracing::info_span!("batch", upload_id);

        let handle = tokio::task::spawn_blocking(move || -> Result<IngestReport> {
            let _entered = span.enter();
            info!(rows = rows.len(), "ingesting batch");

            let sink = UploadSink {
                storage: storage.clone(),
                upload_id,
            };
            let report = Ingestor::new(sink, layout).ingest(rows);

            let (valid, errors) = report.counts();
            storage
                .lock()?
                .finish_upload(upload_id, valid, errors)?;
            Ok(report)
        });

        Ok(BatchHandle {
            upload_id,
            storage: self.storage.clone(),
            handle,
        })
    }
}

/// Awaitable result of a dispatched batch.
#[derive(Debug)]
pub struct BatchHandle {
    upload_id: i64,
    storage: SharedStorage,
    handle: JoinHandle<Result<IngestReport>>,
}

impl BatchHandle {
    /// Upload the batch belongs to.
    #[must_use]
    pub fn upload_id(&self) -> i64 {
        self.upload_id
    }

    /// Wait for the batch to finish.
    ///
    /// If the task died before closing its upload, the upload is marked
    /// `failed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchJoin`] if the task panicked or was cancelled, or
    /// the storage error that stopped the upload from being closed.
    pub async fn wait(self) -> Result<IngestReport> {
        let upload_id = self.upload_id;
        let outcome = match self.handle.await {
            Ok(result) => result,
            Err(join) => Err(Error::BatchJoin {
                upload_id,
                message: join.to_string(),
            }),
        };

        if let Err(e) = &outcome {
            error!(upload_id, error = %e, "batch failed");
            if let Err(mark) = self.storage.lock().and_then(|s| s.fail_upload(upload_id)) {
                error!(upload_id, error = %mark, "could not mark upload failed");
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Storage, UploadStatus};

    const SHR: &str =
        "SHR-RA1234-ZZZZ0800-M0100-DOF/240615 DEP/5530N03730E DEST/5540N03800E SID/12345";

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    fn dispatcher() -> (BatchDispatcher, SharedStorage) {
        let storage = SharedStorage::new(Storage::open_in_memory().unwrap());
        (
            BatchDispatcher::new(storage.clone(), ColumnLayout::default()),
            storage,
        )
    }

    #[tokio::test]
    async fn test_submit_records_upload_before_completion() {
        let (dispatcher, storage) = dispatcher();
        let handle = dispatcher
            .submit("june.csv", Some("ops"), vec![row(&["Moscow", SHR])])
            .unwrap();

        let upload = storage.lock().unwrap().get_upload(handle.upload_id()).unwrap();
        assert!(upload.is_some());

        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_marks_upload_parsed_with_counts() {
        let (dispatcher, storage) = dispatcher();
        let rows = vec![
            row(&["Moscow", SHR, "", "IARR-ATA 0900-X"]),
            row(&["Moscow", SHR, "", "IARR-ATA 0900-X"]),
            row(&["Moscow"]),
        ];

        let handle = dispatcher.submit("june.csv", None, rows).unwrap();
        let upload_id = handle.upload_id();
        let report = handle.wait().await.unwrap();
        assert_eq!(report.counts(), (1, 2));

        let guard = storage.lock().unwrap();
        let upload = guard.get_upload(upload_id).unwrap().unwrap();
        assert_eq!(upload.status, UploadStatus::Parsed);
        assert_eq!((upload.valid_count, upload.error_count), (1, 2));

        let stored = guard.find_by_sid("12345").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].upload_id, Some(upload_id));
    }

    #[tokio::test]
    async fn test_concurrent_batches_have_independent_dedup() {
        let (dispatcher, storage) = dispatcher();
        let rows = || vec![row(&["Moscow", SHR, "", "ATA 0900"])];

        let first = dispatcher.submit("a.csv", None, rows()).unwrap();
        let second = dispatcher.submit("b.csv", None, rows()).unwrap();
        assert_ne!(first.upload_id(), second.upload_id());

        let a = first.wait().await.unwrap();
        let b = second.wait().await.unwrap();

        assert_eq!(a.duplicates, 0);
        assert_eq!(b.duplicates, 0);
        assert_eq!(a.valid + b.valid, 2);
        assert_eq!(storage.lock().unwrap().count_messages().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (dispatcher, _storage) = dispatcher();
        let handle = dispatcher
            .submit("empty.csv", None, Vec::<Vec<String>>::new())
            .unwrap();
        assert_eq!(handle.wait().await.unwrap(), IngestReport::default());
    }
}

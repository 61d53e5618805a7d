//! Persistence collaborator interface.

use thiserror::Error;
use tracing::trace;

use crate::message::ParsedMessage;
use crate::storage::{SharedStorage, Storage};

/// A valid message could not be saved.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The store reported an error.
    #[error("storage rejected message: {0}")]
    Storage(#[from] crate::Error),

    /// The sink cannot take messages at all.
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Receives every valid message of a batch, one call per message.
///
/// Each call is its own unit of atomicity; the orchestrator never groups
/// writes. A message already stored is not an error.
pub trait MessageSink {
    /// Persist one message.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistError`] if the message was not saved.
    fn save_message(&mut self, message: ParsedMessage) -> Result<(), PersistError>;
}

impl<S: MessageSink + ?Sized> MessageSink for &mut S {
    fn save_message(&mut self, message: ParsedMessage) -> Result<(), PersistError> {
        (**self).save_message(message)
    }
}

impl MessageSink for Storage {
    fn save_message(&mut self, message: ParsedMessage) -> Result<(), PersistError> {
        if self.insert_message(&message, None)?.is_none() {
            trace!(sid = %message.sid, "message already stored");
        }
        Ok(())
    }
}

impl MessageSink for SharedStorage {
    fn save_message(&mut self, message: ParsedMessage) -> Result<(), PersistError> {
        self.lock()?.save_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::LonLat;

    fn valid_message(sid: &str) -> ParsedMessage {
        ParsedMessage {
            sid: sid.to_string(),
            dof: "2024-06-15".to_string(),
            atd: "08:00".to_string(),
            ata: "09:00".to_string(),
            dep_coords: "553000N0373000E".to_string(),
            dep_latlon: LonLat::new(37.5, 55.5),
            ..ParsedMessage::new("Moscow")
        }
    }

    #[test]
    fn test_storage_sink_saves() {
        let mut storage = Storage::open_in_memory().unwrap();
        storage.save_message(valid_message("1")).unwrap();
        storage.save_message(valid_message("2")).unwrap();
        assert_eq!(storage.count_messages().unwrap(), 2);
    }

    #[test]
    fn test_storage_sink_accepts_already_stored() {
        let mut storage = Storage::open_in_memory().unwrap();
        storage.save_message(valid_message("1")).unwrap();
        assert!(storage.save_message(valid_message("1")).is_ok());
        assert_eq!(storage.count_messages().unwrap(), 1);
    }

    #[test]
    fn test_shared_storage_sink() {
        let shared = SharedStorage::new(Storage::open_in_memory().unwrap());
        let mut sink = shared.clone();
        sink.save_message(valid_message("1")).unwrap();
        assert_eq!(shared.lock().unwrap().count_messages().unwrap(), 1);
    }

    #[test]
    fn test_mut_ref_sink() {
        fn save_via<S: MessageSink>(mut sink: S) {
            sink.save_message(valid_message("1")).unwrap();
        }

        let mut storage = Storage::open_in_memory().unwrap();
        save_via(&mut storage);
        assert_eq!(storage.count_messages().unwrap(), 1);
    }

    #[test]
    fn test_persist_error_display() {
        let err = PersistError::Unavailable("read-only".to_string());
        assert_eq!(err.to_string(), "sink unavailable: read-only");

        let err = PersistError::from(crate::Error::internal("boom"));
        assert_eq!(err.to_string(), "storage rejected message: internal error: boom");
    }
}

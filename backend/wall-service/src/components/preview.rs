//! Preview references for selected attachments.
//!
//! A preview is acquired when a file is selected and must be released when
//! the selection is replaced, cleared, or its owner goes away. `PreviewHandle`
//! ties the release to `Drop` so every exit path gives the reference back.

use crate::models::MediaFile;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of preview references
pub trait PreviewStore: Send + Sync {
    /// Register a preview for `file` and return its reference
    fn acquire(&self, file: &MediaFile) -> String;

    /// Give a reference back; unknown references are ignored
    fn release(&self, reference: &str);
}

/// Owned preview reference, released on drop
pub struct PreviewHandle {
    store: Arc<dyn PreviewStore>,
    reference: String,
}

impl PreviewHandle {
    pub fn acquire(store: Arc<dyn PreviewStore>, file: &MediaFile) -> Self {
        let reference = store.acquire(file);
        Self { store, reference }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("reference", &self.reference)
            .finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.release(&self.reference);
    }
}

#[derive(Debug, Clone)]
pub struct PreviewEntry {
    pub content_type: String,
    pub data: Bytes,
}

/// In-process preview store keyed by `blob:wall/<uuid>` references
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    entries: Mutex<HashMap<String, PreviewEntry>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &str) -> Option<PreviewEntry> {
        self.entries.lock().get(reference).cloned()
    }

    /// Number of previews not yet released
    pub fn live_count(&self) -> usize {
        self.entries.lock().len()
    }
}

impl PreviewStore for PreviewRegistry {
    fn acquire(&self, file: &MediaFile) -> String {
        let reference = format!("blob:wall/{}", uuid::Uuid::new_v4());
        self.entries.lock().insert(
            reference.clone(),
            PreviewEntry {
                content_type: file.content_type.clone(),
                data: file.data.clone(),
            },
        );
        tracing::trace!(reference = %reference, "preview acquired");
        reference
    }

    fn release(&self, reference: &str) {
        if self.entries.lock().remove(reference).is_some() {
            tracing::trace!(reference = %reference, "preview released");
        }
    }
}

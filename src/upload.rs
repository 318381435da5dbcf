//! Document upload pipeline
//!
//! [`UploadPipeline`] queues files by name and uploads them one at a time.
//! A failed file is marked and the batch moves on; files that already made it
//! are never sent twice, so running the batch again only retries what is
//! left.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use crate::api::Transport;
use crate::error::{AgentDeskError, Result};

/// A named file held in memory, ready to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    name: String,
    bytes: Bytes,
}

impl FileBlob {
    /// Wrap raw bytes under a file name
    ///
    /// # Examples
    ///
    /// ```
    /// use agentdesk::upload::FileBlob;
    ///
    /// let blob = FileBlob::new("notes.txt", "hello".as_bytes().to_vec());
    /// assert_eq!(blob.name(), "notes.txt");
    /// assert_eq!(blob.size(), 5);
    /// ```
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keyed by its file name
    ///
    /// # Errors
    ///
    /// Returns error if the path has no file name, cannot be read, or is
    /// larger than `max_size` bytes
    pub async fn from_path(path: &Path, max_size: u64) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                AgentDeskError::Upload(format!("Not a file path: {}", path.display()))
            })?
            .to_string();

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(AgentDeskError::Upload(format!("Not a regular file: {}", path.display())).into());
        }
        if metadata.len() > max_size {
            return Err(AgentDeskError::Upload(format!(
                "{} is {} bytes, larger than the {} byte limit",
                name,
                metadata.len(),
                max_size
            ))
            .into());
        }

        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(name, bytes))
    }

    /// File name sent with the upload
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw file contents
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Upload state of one queued file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    /// Not uploaded yet, or re-added
    #[default]
    Pending,
    /// Accepted by the server
    Success,
    /// The last attempt failed
    Error,
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A queued file and its status
#[derive(Debug, Clone)]
pub struct UploadItem {
    file: FileBlob,
    status: UploadStatus,
    generation: u64,
}

impl UploadItem {
    /// File name (the queue key)
    pub fn name(&self) -> &str {
        self.file.name()
    }

    /// Queued file
    pub fn file(&self) -> &FileBlob {
        &self.file
    }

    /// Current status
    pub fn status(&self) -> UploadStatus {
        self.status
    }
}

/// Outcome of one [`UploadPipeline::run_all`] batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Files uploaded in this batch
    pub succeeded: Vec<String>,
    /// Files whose upload failed in this batch
    pub failed: Vec<String>,
    /// Files skipped because an earlier batch already uploaded them
    pub skipped: Vec<String>,
}

impl UploadReport {
    /// Number of upload requests issued
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether every attempted upload succeeded
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Callback invoked once at the end of every batch
pub type CompletionCallback = Arc<dyn Fn(&UploadReport) + Send + Sync>;

#[derive(Debug, Default)]
struct PipelineState {
    items: Vec<UploadItem>,
    uploading: bool,
    next_generation: u64,
}

impl PipelineState {
    fn find(&self, name: &str) -> Option<&UploadItem> {
        self.items.iter().find(|item| item.name() == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut UploadItem> {
        self.items.iter_mut().find(|item| item.name() == name)
    }
}

/// Sequential, partial-failure-tolerant upload queue
#[derive(Clone)]
pub struct UploadPipeline {
    transport: Arc<dyn Transport>,
    state: Arc<Mutex<PipelineState>>,
    on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for UploadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPipeline")
            .field("transport", &self.transport)
            .field("state", &self.state)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Clears the `uploading` flag however the batch ends
struct UploadingGuard<'a> {
    state: &'a Mutex<PipelineState>,
}

impl Drop for UploadingGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).uploading = false;
    }
}

fn lock(state: &Mutex<PipelineState>) -> MutexGuard<'_, PipelineState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl UploadPipeline {
    /// Create an empty pipeline
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(PipelineState::default())),
            on_complete: None,
        }
    }

    /// Register the end-of-batch callback
    pub fn with_on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&UploadReport) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        lock(&self.state)
    }

    /// Queue files; a file whose name is already queued replaces that entry
    /// in place with its status reset to pending
    pub fn add(&self, files: impl IntoIterator<Item = FileBlob>) {
        let mut state = self.lock();
        for file in files {
            state.next_generation += 1;
            let generation = state.next_generation;
            match state.find_mut(file.name()) {
                Some(existing) => {
                    tracing::debug!(file = %file.name(), "Replacing queued file");
                    existing.file = file;
                    existing.status = UploadStatus::Pending;
                    existing.generation = generation;
                }
                None => state.items.push(UploadItem {
                    file,
                    status: UploadStatus::Pending,
                    generation,
                }),
            }
        }
    }

    /// Drop a queued file; returns whether it was present
    pub fn remove(&self, name: &str) -> bool {
        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|item| item.name() != name);
        state.items.len() != before
    }

    /// Drop every queued file
    pub fn clear(&self) {
        self.lock().items.clear();
    }

    /// Upload every queued file that has not succeeded yet, one at a time
    ///
    /// Returns `None` without doing anything if a batch is already running.
    /// Otherwise walks the names queued when the batch started, in order:
    /// entries removed in the meantime are skipped, and a failure marks that
    /// entry and moves on. The completion callback runs exactly once at the
    /// end with the same report that is returned.
    pub async fn run_all(&self) -> Option<UploadReport> {
        let names: Vec<String> = {
            let mut state = self.lock();
            if state.uploading {
                tracing::debug!("Upload batch already running; ignoring");
                return None;
            }
            state.uploading = true;
            state.items.iter().map(|item| item.name().to_string()).collect()
        };
        let guard = UploadingGuard { state: &self.state };

        let mut report = UploadReport::default();
        for name in names {
            let (file, generation) = {
                let state = self.lock();
                match state.find(&name) {
                    None => {
                        tracing::debug!(file = %name, "Skipping file removed from the queue");
                        continue;
                    }
                    Some(item) if item.status == UploadStatus::Success => {
                        report.skipped.push(name);
                        continue;
                    }
                    Some(item) => (item.file.clone(), item.generation),
                }
            };

            tracing::debug!(file = %name, size = file.size(), "Uploading document");
            let result = self.transport.upload_document(&file).await;

            let status = match &result {
                Ok(()) => {
                    tracing::info!(file = %name, "Uploaded document");
                    report.succeeded.push(name.clone());
                    UploadStatus::Success
                }
                Err(e) => {
                    tracing::warn!(file = %name, "Upload failed: {:#}", e);
                    report.failed.push(name.clone());
                    UploadStatus::Error
                }
            };

            let mut state = self.lock();
            match state.find_mut(&name) {
                Some(item) if item.generation == generation => item.status = status,
                _ => tracing::debug!(file = %name, "Queue entry changed during upload; result dropped"),
            }
        }

        drop(guard);

        if let Some(callback) = &self.on_complete {
            callback(&report);
        }
        Some(report)
    }

    /// Snapshot of the queue in insertion order
    pub fn items(&self) -> Vec<UploadItem> {
        self.lock().items.clone()
    }

    /// Status of a queued file
    pub fn status(&self, name: &str) -> Option<UploadStatus> {
        self.lock().find(name).map(|item| item.status)
    }

    /// Whether a batch is running
    pub fn is_uploading(&self) -> bool {
        self.lock().uploading
    }

    /// Number of queued files
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}

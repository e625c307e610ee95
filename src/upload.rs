//! Upload orchestration: admission rules, the drag indicator and the
//! single-flight batch upload.

use crate::api::RagBackend;
use crate::flight::InFlight;
use crate::types::UploadedDocument;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shown when the service rejects a batch without saying why.
pub const UPLOAD_FALLBACK_ERROR: &str = "Failed to upload files";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Text => "text/plain",
        }
    }
}

/// A file picked by the user, read into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn read(path: &Path) -> Result<Self, UploadError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { name, bytes })
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_name(&self.name)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Reasons a batch never reaches the network.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("an upload is already in progress")]
    Busy,

    #[error("no files selected")]
    EmptyBatch,

    #[error("{0}: only PDF and TXT files are supported")]
    UnsupportedType(String),

    #[error("{name} is {size} bytes, the limit is {limit} bytes")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Checks every file of the batch; one bad file rejects the whole batch.
pub fn admit(files: &[LocalFile], max_file_bytes: u64) -> Result<(), UploadError> {
    if files.is_empty() {
        return Err(UploadError::EmptyBatch);
    }
    for file in files {
        if file.kind().is_none() {
            return Err(UploadError::UnsupportedType(file.name.clone()));
        }
        if file.size() > max_file_bytes {
            return Err(UploadError::TooLarge {
                name: file.name.clone(),
                size: file.size(),
                limit: max_file_bytes,
            });
        }
    }
    Ok(())
}

/// Dismissable result of the last upload attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadBanner {
    Success(String),
    Error(String),
}

/// How an admitted batch ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted { message: String, documents: usize },
    Failed { detail: String },
}

pub struct UploadOrchestrator {
    backend: Arc<dyn RagBackend>,
    max_file_bytes: u64,
    uploading: Cell<bool>,
    dragging: Cell<bool>,
    documents: RefCell<Vec<UploadedDocument>>,
    banner: RefCell<Option<UploadBanner>>,
}

impl UploadOrchestrator {
    pub fn new(backend: Arc<dyn RagBackend>, max_file_bytes: u64) -> Self {
        Self {
            backend,
            max_file_bytes,
            uploading: Cell::new(false),
            dragging: Cell::new(false),
            documents: RefCell::new(Vec::new()),
            banner: RefCell::new(None),
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.get()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.get()
    }

    pub fn documents(&self) -> Vec<UploadedDocument> {
        self.documents.borrow().clone()
    }

    pub fn banner(&self) -> Option<UploadBanner> {
        self.banner.borrow().clone()
    }

    pub fn dismiss_banner(&self) {
        *self.banner.borrow_mut() = None;
    }

    pub fn drag_enter(&self) {
        self.dragging.set(true);
    }

    pub fn drag_leave(&self) {
        self.dragging.set(false);
    }

    /// Ends a drag gesture and uploads what was dropped.
    pub async fn drop_files(&self, files: Vec<LocalFile>) -> Result<UploadOutcome, UploadError> {
        self.dragging.set(false);
        self.upload(files).await
    }

    /// Uploads the batch as one request.
    ///
    /// Admission failures are returned without touching `uploading`. Once the
    /// request is sent its result only shows up as state: the document list is
    /// replaced on success and left alone on failure.
    pub async fn upload(&self, files: Vec<LocalFile>) -> Result<UploadOutcome, UploadError> {
        if self.uploading.get() {
            return Err(UploadError::Busy);
        }
        if let Err(err) = admit(&files, self.max_file_bytes) {
            if !matches!(err, UploadError::EmptyBatch) {
                *self.banner.borrow_mut() = Some(UploadBanner::Error(err.to_string()));
            }
            return Err(err);
        }

        let Some(_flight) = InFlight::begin(&self.uploading) else {
            return Err(UploadError::Busy);
        };
        *self.banner.borrow_mut() = None;
        tracing::debug!("uploading batch of {} file(s)", files.len());

        let result = self.backend.upload(&files).await;
        self.dragging.set(false);

        let outcome = match result {
            Ok(receipt) => {
                let documents = receipt.files.len();
                tracing::info!(
                    "upload accepted: {} ({} document(s) indexed)",
                    receipt.message,
                    documents
                );
                *self.documents.borrow_mut() = receipt.files;
                *self.banner.borrow_mut() =
                    Some(UploadBanner::Success(receipt.message.clone()));
                UploadOutcome::Accepted {
                    message: receipt.message,
                    documents,
                }
            }
            Err(err) => {
                tracing::warn!("upload failed: {}", err);
                let detail = err
                    .user_detail()
                    .unwrap_or(UPLOAD_FALLBACK_ERROR)
                    .to_string();
                *self.banner.borrow_mut() = Some(UploadBanner::Error(detail.clone()));
                UploadOutcome::Failed { detail }
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_kind_from_name() {
        assert_eq!(DocumentKind::from_name("policy.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_name("notes.txt"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_name("report.docx"), None);
        assert_eq!(DocumentKind::from_name("README"), None);
        assert_eq!(DocumentKind::from_name("archive.txt.zip"), None);
    }

    #[test]
    fn test_admit_rejects_whole_batch_on_one_bad_file() {
        let files = vec![
            LocalFile::new("a.pdf", b"%PDF".to_vec()),
            LocalFile::new("b.docx", b"PK".to_vec()),
        ];
        match admit(&files, 1024) {
            Err(UploadError::UnsupportedType(name)) => assert_eq!(name, "b.docx"),
            other => panic!("expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_admit_size_limit_is_inclusive() {
        let exact = vec![LocalFile::new("a.txt", vec![b'x'; 10])];
        assert!(admit(&exact, 10).is_ok());

        let over = vec![LocalFile::new("a.txt", vec![b'x'; 11])];
        assert!(matches!(
            admit(&over, 10),
            Err(UploadError::TooLarge { size: 11, limit: 10, .. })
        ));
    }

    #[test]
    fn test_admit_empty_batch() {
        assert!(matches!(admit(&[], 10), Err(UploadError::EmptyBatch)));
    }
}

//! Turns selected files into [`EncodedImage`]s.
//!
//! A batch is processed as one join over per-file futures. Each file either
//! encodes or is rejected on its own, and the batch settles only once every
//! file has done one or the other.

use crate::error::Result;
use crate::models::EncodedImage;
use async_trait::async_trait;
use futures::future::join_all;
use std::fmt;
use std::path::{Path, PathBuf};

/// A user-selected file, sized up front and read on demand.
#[async_trait]
pub trait FileHandle: Send + Sync {
    fn name(&self) -> &str;
    fn size(&self) -> u64;

    fn mime_type(&self) -> &str {
        mime_from_name(self.name())
    }

    async fn read(&self) -> std::io::Result<Vec<u8>>;
}

pub fn mime_from_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_from_name(&name).to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }
}

#[async_trait]
impl FileHandle for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    size: u64,
}

impl DiskFile {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            path,
            name,
            size: metadata.len(),
        })
    }
}

#[async_trait]
impl FileHandle for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    TooLarge { size: u64, max_bytes: u64 },
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRejection {
    pub file_name: String,
    pub reason: RejectReason,
}

impl fmt::Display for FileRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RejectReason::TooLarge { max_bytes, .. } => write!(
                f,
                "{} is too large (max {})",
                self.file_name,
                format_megabytes(*max_bytes)
            ),
            RejectReason::Unreadable(err) => {
                write!(f, "{} could not be read: {}", self.file_name, err)
            }
        }
    }
}

fn format_megabytes(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    }
}

/// Outcome of one batch. `settled` always equals the batch size.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub accepted: Vec<EncodedImage>,
    pub rejections: Vec<FileRejection>,
    pub settled: usize,
}

impl IngestReport {
    /// One line per rejected file, or `None` when nothing was rejected.
    pub fn notice(&self) -> Option<String> {
        if self.rejections.is_empty() {
            return None;
        }
        Some(
            self.rejections
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

#[derive(Debug, Clone)]
pub struct MediaIngestor {
    max_file_bytes: u64,
}

impl MediaIngestor {
    pub fn new(max_file_bytes: u64) -> Self {
        Self { max_file_bytes }
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    pub async fn ingest(&self, files: Vec<Box<dyn FileHandle>>) -> IngestReport {
        let batch = files.len();
        let outcomes = join_all(files.iter().map(|file| self.encode(file.as_ref()))).await;

        let mut report = IngestReport {
            settled: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(image) => report.accepted.push(image),
                Err(rejection) => {
                    log::warn!("Rejected upload: {}", rejection);
                    report.rejections.push(rejection);
                }
            }
        }

        log::debug!(
            "Ingested batch of {}: {} accepted, {} rejected",
            batch,
            report.accepted.len(),
            report.rejections.len()
        );
        report
    }

    async fn encode(&self, file: &dyn FileHandle) -> std::result::Result<EncodedImage, FileRejection> {
        let too_large = |size: u64| FileRejection {
            file_name: file.name().to_string(),
            reason: RejectReason::TooLarge {
                size,
                max_bytes: self.max_file_bytes,
            },
        };

        if file.size() > self.max_file_bytes {
            return Err(too_large(file.size()));
        }

        let bytes = file.read().await.map_err(|e| FileRejection {
            file_name: file.name().to_string(),
            reason: RejectReason::Unreadable(e.to_string()),
        })?;
        // The file may have grown since it was sized.
        if bytes.len() as u64 > self.max_file_bytes {
            return Err(too_large(bytes.len() as u64));
        }

        Ok(EncodedImage::from_bytes(&bytes, file.mime_type()))
    }
}

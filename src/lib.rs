//! Generation orchestration for a product-photo studio.
//!
//! Uploads go through [`ingest`], the selected model's legal parameters come
//! from [`resolver`], and [`Orchestrator`] drives a single generation run
//! against a [`GenerationBackend`]. Presentation reads [`StudioSnapshot`]s.

pub mod backend;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod resolver;
pub mod session;
pub mod surface;

pub use backend::{GenerationBackend, HttpBackend};
pub use config::{BackendConfig, StudioConfig};
pub use error::{Result, StudioError};
pub use ingest::{DiskFile, FileHandle, FileRejection, InMemoryFile, IngestReport, MediaIngestor};
pub use models::*;
pub use orchestrator::Orchestrator;
pub use resolver::{OptionSet, ValidationIssue};
pub use session::{Session, SharedSession};
pub use surface::{ConfigurationView, RunView, StudioSnapshot};

use super::media::{EncodedImage, ResultArtifact};
use super::registry::{GenerationMode, ModelDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User-editable inputs for the next submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfiguration {
    pub mode: GenerationMode,
    pub model_id: String,
    pub prompt: String,
    pub aspect_ratio: String,
    pub resolution: String,
    pub quantity: u8,
    /// Upload order; index 0 is the primary image.
    images: Vec<EncodedImage>,
}

impl GenerationConfiguration {
    pub fn new(
        mode: GenerationMode,
        model: &ModelDescriptor,
        prompt: impl Into<String>,
        aspect_ratio: impl Into<String>,
        resolution: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            model_id: model.id.clone(),
            prompt: prompt.into(),
            aspect_ratio: aspect_ratio.into(),
            resolution: resolution.into(),
            quantity: 1,
            images: Vec::new(),
        }
    }

    pub fn images(&self) -> &[EncodedImage] {
        &self.images
    }

    pub fn primary_image(&self) -> Option<&EncodedImage> {
        self.images.first()
    }

    pub fn append_images(&mut self, images: impl IntoIterator<Item = EncodedImage>) {
        self.images.extend(images);
    }

    /// Removes one image and keeps the rest in order. Out of range is a no-op.
    pub fn remove_image(&mut self, index: usize) -> Option<EncodedImage> {
        if index < self.images.len() {
            Some(self.images.remove(index))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Idle,
    Validating,
    InFlight,
    Succeeded,
    Failed,
}

/// The single live run. `result` and `error` are never set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRun {
    id: Option<Uuid>,
    status: RunStatus,
    progress_message: String,
    result: Option<ResultArtifact>,
    error: Option<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Default for GenerationRun {
    fn default() -> Self {
        Self::idle()
    }
}

impl GenerationRun {
    pub fn idle() -> Self {
        Self {
            id: None,
            status: RunStatus::Idle,
            progress_message: String::new(),
            result: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Fresh run in `Validating`; whatever the previous run held is gone.
    pub fn start() -> Self {
        Self {
            id: Some(Uuid::new_v4()),
            status: RunStatus::Validating,
            started_at: Some(Utc::now()),
            ..Self::idle()
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn progress_message(&self) -> &str {
        &self.progress_message
    }

    pub fn result(&self) -> Option<&ResultArtifact> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_in_flight(&self) -> bool {
        self.status == RunStatus::InFlight
    }

    pub fn dispatch(&mut self, progress: impl Into<String>) {
        self.status = RunStatus::InFlight;
        self.error = None;
        self.progress_message = progress.into();
    }

    pub fn set_progress(&mut self, progress: impl Into<String>) {
        self.progress_message = progress.into();
    }

    pub fn succeed(&mut self, artifact: ResultArtifact) {
        self.status = RunStatus::Succeeded;
        self.result = Some(artifact);
        self.error = None;
        self.progress_message.clear();
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.result = None;
        self.error = Some(message.into());
        self.progress_message.clear();
        self.finished_at = Some(Utc::now());
    }

    /// The inputs changed: drop the stale artifact and report the ingest
    /// notice (if any) through the error slot. Status is untouched; only a
    /// new submission leaves a terminal state.
    ///
    /// An in-flight run is left alone, so its notice is dropped here and
    /// only reaches the caller through the ingest report.
    pub fn inputs_changed(&mut self, notice: Option<String>) {
        if self.is_in_flight() {
            return;
        }
        self.result = None;
        self.error = notice;
    }
}

/// Everything one backend call receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub image: Option<EncodedImage>,
    pub prompt: String,
    pub model_id: String,
    pub aspect_ratio: String,
    pub resolution: String,
    /// Carried for backends that batch; the orchestrator sends one request.
    pub quantity: u8,
}

//! Read-only projection of session state for the display layer.

use crate::models::{
    GenerationMode, ModelDescriptor, ModelRegistry, ResultArtifact, RunStatus,
};
use crate::resolver::{self, OptionSet};
use crate::session::Session;
use serde::Serialize;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunView {
    pub status: RunStatus,
    pub progress_message: String,
    pub result: Option<ResultArtifact>,
    pub error: Option<String>,
    /// The submit control is disabled while this is set.
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationView {
    pub mode: GenerationMode,
    pub model: ModelDescriptor,
    /// Selector entries: the models of the active mode.
    pub selectable_models: Vec<ModelDescriptor>,
    pub prompt: String,
    pub aspect_ratio: String,
    pub resolution: String,
    pub quantity: u8,
    pub image_count: usize,
    pub options: OptionSet,
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioSnapshot {
    pub configuration: ConfigurationView,
    pub run: RunView,
}

impl StudioSnapshot {
    pub fn project(session: &Session, registry: &ModelRegistry) -> Self {
        let config = &session.configuration;
        let model = registry
            .get(&config.model_id)
            .unwrap_or_else(|| registry.default_for(config.mode))
            .clone();
        let run = &session.run;

        Self {
            configuration: ConfigurationView {
                mode: config.mode,
                selectable_models: registry.for_mode(config.mode).cloned().collect(),
                prompt: config.prompt.clone(),
                aspect_ratio: config.aspect_ratio.clone(),
                resolution: config.resolution.clone(),
                quantity: config.quantity,
                image_count: config.images().len(),
                options: resolver::options_for(&model, config.mode),
                ready: resolver::validate(config, &model).is_ok(),
                model,
            },
            run: RunView {
                status: run.status(),
                progress_message: run.progress_message().to_string(),
                result: run.result().cloned(),
                error: run.error().map(String::from),
                busy: run.is_in_flight(),
            },
        }
    }

    /// Welcome state: nothing generated, nothing running.
    pub fn is_empty(&self) -> bool {
        self.run.result.is_none() && !self.run.busy
    }
}

/// Broadcasts the latest snapshot to any number of subscribers.
pub struct SurfaceFeed {
    sender: watch::Sender<StudioSnapshot>,
}

impl SurfaceFeed {
    pub fn new(initial: StudioSnapshot) -> Self {
        let (sender, _receiver) = watch::channel(initial);
        Self { sender }
    }

    pub fn publish(&self, snapshot: StudioSnapshot) {
        // send_replace stores the value even with no live receivers.
        self.sender.send_replace(snapshot);
    }

    pub fn current(&self) -> StudioSnapshot {
        self.sender.borrow().clone()
    }

    /// Yields the current snapshot first, then every later one.
    pub fn subscribe(&self) -> WatchStream<StudioSnapshot> {
        WatchStream::new(self.sender.subscribe())
    }
}

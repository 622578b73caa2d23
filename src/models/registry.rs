use crate::error::{Result, StudioError};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    Image,
    Video,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Image => "image",
            GenerationMode::Video => "video",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(GenerationMode::Image),
            "video" => Ok(GenerationMode::Video),
            other => Err(StudioError::Config(format!(
                "Unknown generation mode '{}' (expected image or video)",
                other
            ))),
        }
    }
}

/// Independent switches for the parameters a model accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub supports_input_image: bool,
    pub supports_resolution: bool,
    pub supports_aspect_ratio: bool,
    pub supports_quantity: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub label: String,
    pub description: String,
    pub mode: GenerationMode,
    pub capabilities: Capabilities,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        mode: GenerationMode,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            mode,
            capabilities,
        }
    }

    pub fn requires_image(&self) -> bool {
        self.capabilities.supports_input_image
    }
}

static BUILTIN: Lazy<ModelRegistry> = Lazy::new(|| ModelRegistry {
    models: vec![
        ModelDescriptor::new(
            "gemini-2.5-flash-image",
            "Nano Banana",
            "Fast product compositing. Places your product into a new scene.",
            GenerationMode::Image,
            Capabilities {
                supports_input_image: true,
                supports_resolution: false,
                supports_aspect_ratio: true,
                supports_quantity: false,
            },
        ),
        ModelDescriptor::new(
            "gemini-3-pro-image-preview",
            "Nano Banana Pro",
            "Studio-grade compositing with up to 4K output.",
            GenerationMode::Image,
            Capabilities {
                supports_input_image: true,
                supports_resolution: true,
                supports_aspect_ratio: true,
                supports_quantity: true,
            },
        ),
        ModelDescriptor::new(
            "imagen-4.0-generate-001",
            "Imagen 4",
            "Text-to-image. Generates scenes from the description alone.",
            GenerationMode::Image,
            Capabilities {
                supports_input_image: false,
                supports_resolution: true,
                supports_aspect_ratio: true,
                supports_quantity: true,
            },
        ),
        ModelDescriptor::new(
            "veo-3.1-fast-generate-preview",
            "Veo 3.1 Fast",
            "Short product clips animated from a start image.",
            GenerationMode::Video,
            Capabilities {
                supports_input_image: true,
                supports_resolution: true,
                supports_aspect_ratio: true,
                supports_quantity: false,
            },
        ),
        ModelDescriptor::new(
            "veo-3.1-generate-preview",
            "Veo 3.1",
            "Highest quality product video with cinematic motion.",
            GenerationMode::Video,
            Capabilities {
                supports_input_image: true,
                supports_resolution: true,
                supports_aspect_ratio: true,
                supports_quantity: false,
            },
        ),
    ],
});

/// Read-only catalog of selectable models. Never empty.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelDescriptor>) -> Result<Self> {
        if models.is_empty() {
            return Err(StudioError::Config(
                "Model registry needs at least one model".into(),
            ));
        }
        Ok(Self { models })
    }

    pub fn builtin() -> &'static ModelRegistry {
        &BUILTIN
    }

    pub fn find<P>(&self, predicate: P) -> Option<&ModelDescriptor>
    where
        P: Fn(&ModelDescriptor) -> bool,
    {
        self.models.iter().find(|model| predicate(model))
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.find(|model| model.id == id)
    }

    pub fn for_mode(&self, mode: GenerationMode) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter().filter(move |model| model.mode == mode)
    }

    /// First model of `mode`. When no entry matches, this returns the first
    /// registry entry even though its mode differs.
    pub fn default_for(&self, mode: GenerationMode) -> &ModelDescriptor {
        match self.find(|model| model.mode == mode) {
            Some(model) => model,
            None => {
                log::warn!(
                    "No {} model registered, falling back to {}",
                    mode,
                    self.models[0].id
                );
                &self.models[0]
            }
        }
    }
}

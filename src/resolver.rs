//! Legal and default output parameters for a model, and the pre-submit checks.

use crate::models::{GenerationConfiguration, GenerationMode, ModelDescriptor};
use serde::Serialize;
use std::fmt;

pub const IMAGE_RESOLUTIONS: &[&str] = &["1K", "2K", "4K"];
pub const VIDEO_RESOLUTIONS: &[&str] = &["720p", "1080p"];
pub const ASPECT_RATIOS: &[&str] = &["2:3", "1:1", "9:16", "4:3", "16:9"];
pub const MIN_QUANTITY: u8 = 1;
pub const MAX_QUANTITY: u8 = 4;

/// Mode-dependent starting values, re-applied on every mode switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDefaults {
    pub aspect_ratio: &'static str,
    pub resolution: &'static str,
}

/// Which controls to offer. `None` hides the control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSet {
    pub resolutions: Option<&'static [&'static str]>,
    pub aspect_ratios: Option<&'static [&'static str]>,
    pub quantity: Option<(u8, u8)>,
    pub image_required: bool,
}

impl OptionSet {
    pub fn allows_resolution(&self, value: &str) -> bool {
        self.resolutions.map_or(false, |opts| opts.contains(&value))
    }

    pub fn allows_aspect_ratio(&self, value: &str) -> bool {
        self.aspect_ratios.map_or(false, |opts| opts.contains(&value))
    }

    pub fn allows_quantity(&self, value: u8) -> bool {
        self.quantity
            .map_or(false, |(min, max)| (min..=max).contains(&value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationIssue {
    MissingImage,
    EmptyPrompt,
}

impl ValidationIssue {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationIssue::MissingImage => "Please upload at least one product image.",
            ValidationIssue::EmptyPrompt => "Please enter a description for the scene.",
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Defaults depend on the active mode only; the model does not change them.
pub fn resolve(_model: &ModelDescriptor, mode: GenerationMode) -> ResolvedDefaults {
    match mode {
        GenerationMode::Image => ResolvedDefaults {
            aspect_ratio: "1:1",
            resolution: "1K",
        },
        GenerationMode::Video => ResolvedDefaults {
            aspect_ratio: "9:16",
            resolution: "720p",
        },
    }
}

pub fn options_for(model: &ModelDescriptor, mode: GenerationMode) -> OptionSet {
    let caps = &model.capabilities;
    let resolutions = match mode {
        GenerationMode::Image => IMAGE_RESOLUTIONS,
        GenerationMode::Video => VIDEO_RESOLUTIONS,
    };

    OptionSet {
        resolutions: caps.supports_resolution.then_some(resolutions),
        aspect_ratios: caps.supports_aspect_ratio.then_some(ASPECT_RATIOS),
        quantity: caps
            .supports_quantity
            .then_some((MIN_QUANTITY, MAX_QUANTITY)),
        image_required: caps.supports_input_image,
    }
}

/// Every unmet precondition, in reporting order.
pub fn issues(config: &GenerationConfiguration, model: &ModelDescriptor) -> Vec<ValidationIssue> {
    let mut found = Vec::new();
    if model.requires_image() && config.images().is_empty() {
        found.push(ValidationIssue::MissingImage);
    }
    if config.prompt.trim().is_empty() {
        found.push(ValidationIssue::EmptyPrompt);
    }
    found
}

pub fn validate(
    config: &GenerationConfiguration,
    model: &ModelDescriptor,
) -> Result<(), ValidationIssue> {
    match issues(config, model).first() {
        Some(issue) => Err(*issue),
        None => Ok(()),
    }
}

pub mod http;

use crate::{
    error::Result,
    models::{EncodedImage, GenerationRequest, VideoRef},
};
use async_trait::async_trait;

pub use http::HttpBackend;

/// The remote model service. Both calls fail with a descriptive
/// [`crate::StudioError::Backend`] when the service rejects a request.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<EncodedImage>;

    async fn generate_video(&self, request: &GenerationRequest) -> Result<VideoRef>;
}

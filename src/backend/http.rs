use crate::{
    backend::GenerationBackend,
    config::BackendConfig,
    error::{Result, StudioError},
    models::{EncodedImage, GenerationRequest, VideoRef},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// JSON gateway in front of the image and video models.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    image: EncodedImage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResponse {
    video_uri: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| StudioError::Config("Backend endpoint is not configured".into()))?
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()
            .map_err(|e| StudioError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_payload(request: &GenerationRequest) -> Value {
        json!({
            "image": request.image.as_ref().map(|image| image.to_data_url()),
            "prompt": request.prompt,
            "model": request.model_id,
            "aspectRatio": request.aspect_ratio,
            "resolution": request.resolution,
            "quantity": request.quantity,
        })
    }

    async fn post(&self, path: &str, request: &GenerationRequest) -> Result<Value> {
        let url = format!("{}{}", self.endpoint, path);
        log::info!("Invoking {} at {}", request.model_id, url);

        let mut builder = self.client.post(&url).json(&Self::build_payload(request));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            log::error!("Gateway request failed: {:?}", e);
            StudioError::Backend(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StudioError::Backend(e.to_string()))?;

        if !status.is_success() {
            log::error!("Gateway returned {}: {}", status, body);
            return Err(StudioError::Backend(error_message(&body)));
        }

        serde_json::from_str(&body).map_err(|e| StudioError::Serialization(e.to_string()))
    }
}

/// Pulls `error.message` (or a string `error`) out of a gateway error body,
/// falling back to the raw text.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| match v.get("error") {
        Some(Value::String(msg)) => Some(msg.clone()),
        Some(err) => err.get("message").and_then(Value::as_str).map(String::from),
        None => None,
    });
    from_json.unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<EncodedImage> {
        let value = self.post("/v1/images:generate", request).await?;
        let response: ImageResponse =
            serde_json::from_value(value).map_err(|e| StudioError::Serialization(e.to_string()))?;
        Ok(response.image)
    }

    async fn generate_video(&self, request: &GenerationRequest) -> Result<VideoRef> {
        let value = self.post("/v1/videos:generate", request).await?;
        let response: VideoResponse =
            serde_json::from_value(value).map_err(|e| StudioError::Serialization(e.to_string()))?;
        Ok(VideoRef::new(response.video_uri))
    }
}

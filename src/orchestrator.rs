//! The generation state machine and the write triggers the presentation
//! layer calls.
//!
//! A run moves `Idle -> Validating -> InFlight -> Succeeded | Failed`.
//! Validation failures skip the backend and go straight to `Failed`. Only
//! one run is in flight at a time: a second `submit` while one is pending
//! returns [`StudioError::AlreadyInFlight`] and leaves state untouched.
//! A `submit` future dropped before it commits fails its run.

use crate::backend::GenerationBackend;
use crate::config::StudioConfig;
use crate::error::{Result, StudioError};
use crate::ingest::{FileHandle, IngestReport, MediaIngestor};
use crate::logger;
use crate::models::{
    EncodedImage, GenerationConfiguration, GenerationMode, GenerationRequest, GenerationRun,
    ModelDescriptor, ModelRegistry, ResultArtifact,
};
use crate::resolver::{self, OptionSet};
use crate::session::{Session, SharedSession};
use crate::surface::{StudioSnapshot, SurfaceFeed};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

pub const GENERIC_FAILURE: &str = "Generation failed. Please try again.";
pub const ABANDONED: &str = "Generation was cancelled before it finished.";

pub struct Orchestrator<B: GenerationBackend + ?Sized> {
    registry: Arc<ModelRegistry>,
    ingestor: MediaIngestor,
    backend: Arc<B>,
    session: SharedSession,
    feed: Arc<SurfaceFeed>,
}

impl<B: GenerationBackend + ?Sized> Clone for Orchestrator<B> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            ingestor: self.ingestor.clone(),
            backend: Arc::clone(&self.backend),
            session: self.session.clone(),
            feed: Arc::clone(&self.feed),
        }
    }
}

impl<B: GenerationBackend + ?Sized> Orchestrator<B> {
    pub fn new(registry: Arc<ModelRegistry>, backend: Arc<B>, config: &StudioConfig) -> Self {
        let session = SharedSession::new(Session::new(&registry, config));
        Self::with_session(registry, backend, session, config)
    }

    pub fn with_session(
        registry: Arc<ModelRegistry>,
        backend: Arc<B>,
        session: SharedSession,
        config: &StudioConfig,
    ) -> Self {
        let feed = SurfaceFeed::new(StudioSnapshot::project(&session.lock(), &registry));
        Self {
            registry,
            ingestor: MediaIngestor::new(config.max_file_bytes),
            backend,
            session,
            feed: Arc::new(feed),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn configuration(&self) -> GenerationConfiguration {
        self.session.lock().configuration.clone()
    }

    pub fn run(&self) -> GenerationRun {
        self.session.lock().run.clone()
    }

    pub fn snapshot(&self) -> StudioSnapshot {
        self.feed.current()
    }

    pub fn subscribe(&self) -> WatchStream<StudioSnapshot> {
        self.feed.subscribe()
    }

    pub fn selected_model(&self) -> ModelDescriptor {
        self.model_for(&self.session.lock().configuration)
    }

    pub fn options(&self) -> OptionSet {
        let session = self.session.lock();
        let model = self.model_for(&session.configuration);
        resolver::options_for(&model, session.configuration.mode)
    }

    fn model_for(&self, config: &GenerationConfiguration) -> ModelDescriptor {
        self.registry
            .get(&config.model_id)
            .unwrap_or_else(|| self.registry.default_for(config.mode))
            .clone()
    }

    /// Apply `f` under the session lock, then publish the new snapshot.
    fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let (out, snapshot) = {
            let mut session = self.session.lock();
            let out = f(&mut session);
            (out, StudioSnapshot::project(&session, &self.registry))
        };
        self.feed.publish(snapshot);
        out
    }

    /// Encodes a batch and appends the accepted images after any already
    /// uploaded. Resolves once every file in the batch has settled. An
    /// empty batch leaves the session as it was.
    pub async fn add_images(&self, files: Vec<Box<dyn FileHandle>>) -> IngestReport {
        if files.is_empty() {
            return IngestReport::default();
        }
        let report = self.ingestor.ingest(files).await;

        let total = self.update(|session| {
            session
                .configuration
                .append_images(report.accepted.iter().cloned());
            session.run.inputs_changed(report.notice());
            session.configuration.images().len()
        });

        log::info!(
            "📥 Added {} image(s), rejected {} ({} total)",
            report.accepted.len(),
            report.rejections.len(),
            total
        );
        report
    }

    pub fn remove_image(&self, index: usize) -> Option<EncodedImage> {
        self.update(|session| session.configuration.remove_image(index))
    }

    pub fn set_prompt(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|session| session.configuration.prompt = text);
    }

    /// Only models of the active mode are selectable.
    pub fn set_model(&self, id: &str) -> Result<()> {
        let model = self
            .registry
            .get(id)
            .ok_or_else(|| StudioError::UnknownModel(id.to_string()))?;

        self.update(|session| {
            let mode = session.configuration.mode;
            if model.mode != mode {
                return Err(StudioError::ModelModeMismatch {
                    model_id: model.id.clone(),
                    mode,
                });
            }
            session.configuration.model_id = model.id.clone();
            Ok(())
        })
    }

    pub fn set_aspect_ratio(&self, value: &str) -> Result<()> {
        self.set_option(
            "aspect ratio",
            value,
            |options, v| options.allows_aspect_ratio(v),
            |config, v| config.aspect_ratio = v,
        )
    }

    pub fn set_resolution(&self, value: &str) -> Result<()> {
        self.set_option(
            "resolution",
            value,
            |options, v| options.allows_resolution(v),
            |config, v| config.resolution = v,
        )
    }

    pub fn set_quantity(&self, quantity: u8) -> Result<()> {
        self.update(|session| {
            let model = self.model_for(&session.configuration);
            let options = resolver::options_for(&model, session.configuration.mode);
            if !options.allows_quantity(quantity) {
                return Err(StudioError::InvalidOption {
                    field: "quantity",
                    value: quantity.to_string(),
                });
            }
            session.configuration.quantity = quantity;
            Ok(())
        })
    }

    fn set_option(
        &self,
        field: &'static str,
        value: &str,
        allowed: impl FnOnce(&OptionSet, &str) -> bool,
        apply: impl FnOnce(&mut GenerationConfiguration, String),
    ) -> Result<()> {
        self.update(|session| {
            let model = self.model_for(&session.configuration);
            let options = resolver::options_for(&model, session.configuration.mode);
            if !allowed(&options, value) {
                return Err(StudioError::InvalidOption {
                    field,
                    value: value.to_string(),
                });
            }
            apply(&mut session.configuration, value.to_string());
            Ok(())
        })
    }

    /// Switching mode reselects the mode's default model and snaps aspect
    /// ratio, resolution and quantity back to their defaults. Selecting the
    /// active mode again changes nothing.
    pub fn set_mode(&self, mode: GenerationMode) {
        self.update(|session| {
            let config = &mut session.configuration;
            if config.mode == mode {
                return;
            }
            let model = self.registry.default_for(mode);
            let defaults = resolver::resolve(model, mode);

            config.mode = mode;
            config.model_id = model.id.clone();
            config.aspect_ratio = defaults.aspect_ratio.to_string();
            config.resolution = defaults.resolution.to_string();
            config.quantity = resolver::MIN_QUANTITY;
            log::debug!("Switched to {} mode with {}", mode, model.id);
        });
    }

    /// Runs one generation to completion and commits the outcome to the
    /// session. The returned error is the one the run now displays, except
    /// for [`StudioError::AlreadyInFlight`], which leaves the session alone.
    pub async fn submit(&self) -> Result<ResultArtifact> {
        let (request, mode, model) = self.update(|session| self.begin(session))?;
        let run_id = self.session.lock().run.id();
        log::info!(
            "🚀 Run {} started with {} ({})",
            run_id.map(|id| id.to_string()).unwrap_or_default(),
            model.id,
            mode
        );

        let pending = PendingRun {
            studio: self,
            run_id,
        };
        let outcome = self.dispatch(&request, mode, &model).await;

        self.update(|session| match &outcome {
            Ok(artifact) => session.run.succeed(artifact.clone()),
            Err(err) => session.run.fail(failure_message(err)),
        });
        drop(pending);

        match &outcome {
            Ok(_) => log::info!("✅ Run finished with {}", model.id),
            Err(err) => log::error!("❌ Run failed with {}: {}", model.id, err),
        }
        outcome
    }

    fn begin(
        &self,
        session: &mut Session,
    ) -> Result<(GenerationRequest, GenerationMode, ModelDescriptor)> {
        if session.run.is_in_flight() {
            log::warn!("Submit ignored: a generation is already in progress");
            return Err(StudioError::AlreadyInFlight);
        }

        session.run = GenerationRun::start();
        let config = &session.configuration;
        let model = self.model_for(config);

        if let Err(issue) = resolver::validate(config, &model) {
            log::warn!("Submit blocked: {}", issue);
            session.run.fail(issue.message());
            return Err(issue.into());
        }

        session
            .run
            .dispatch(format!("Initializing {}...", model.label));

        let request = GenerationRequest {
            image: config.primary_image().cloned(),
            prompt: config.prompt.clone(),
            model_id: model.id.clone(),
            aspect_ratio: config.aspect_ratio.clone(),
            resolution: config.resolution.clone(),
            quantity: config.quantity,
        };
        Ok((request, config.mode, model))
    }

    async fn dispatch(
        &self,
        request: &GenerationRequest,
        mode: GenerationMode,
        model: &ModelDescriptor,
    ) -> Result<ResultArtifact> {
        match mode {
            GenerationMode::Image => {
                self.update(|session| session.run.set_progress("Processing image details..."));
                let _timer = logger::timer("image generation");
                let image = self.backend.generate_image(request).await?;
                Ok(ResultArtifact::Image(image))
            }
            GenerationMode::Video => {
                self.update(|session| {
                    session
                        .run
                        .set_progress(format!("Connecting to {}...", model.label))
                });
                // Registry data says every video model takes an image, so
                // reaching this without one is a catalog bug.
                if request.image.is_none() {
                    return Err(StudioError::ContractViolation);
                }
                let _timer = logger::timer("video generation");
                let video = self.backend.generate_video(request).await?;
                Ok(ResultArtifact::Video(video))
            }
        }
    }
}

/// Fails its run on drop if that run is still in flight.
struct PendingRun<'a, B: GenerationBackend + ?Sized> {
    studio: &'a Orchestrator<B>,
    run_id: Option<Uuid>,
}

impl<B: GenerationBackend + ?Sized> Drop for PendingRun<'_, B> {
    fn drop(&mut self) {
        let abandoned = self.studio.update(|session| {
            let run = &mut session.run;
            if run.is_in_flight() && run.id() == self.run_id {
                run.fail(ABANDONED);
                true
            } else {
                false
            }
        });
        if abandoned {
            log::warn!("Run dropped before the backend answered");
        }
    }
}

fn failure_message(err: &StudioError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::InMemoryFile;
    use crate::models::{Capabilities, RunStatus, VideoRef};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use tokio_stream::StreamExt;

    const MB: usize = 1024 * 1024;

    enum Reply {
        Image(EncodedImage),
        Video(VideoRef),
        Fail(String),
    }

    struct Gate {
        started: Notify,
        release: Notify,
    }

    struct FakeBackend {
        reply: Reply,
        gate: Option<Gate>,
        image_calls: AtomicUsize,
        video_calls: AtomicUsize,
        last_request: Mutex<Option<GenerationRequest>>,
    }

    impl FakeBackend {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self::build(reply, None))
        }

        fn gated(reply: Reply) -> Arc<Self> {
            Arc::new(Self::build(
                reply,
                Some(Gate {
                    started: Notify::new(),
                    release: Notify::new(),
                }),
            ))
        }

        fn build(reply: Reply, gate: Option<Gate>) -> Self {
            Self {
                reply,
                gate,
                image_calls: AtomicUsize::new(0),
                video_calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.image_calls.load(Ordering::SeqCst) + self.video_calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> GenerationRequest {
            self.last_request.lock().unwrap().clone().unwrap()
        }

        async fn record(&self, request: &GenerationRequest) {
            *self.last_request.lock().unwrap() = Some(request.clone());
            if let Some(gate) = &self.gate {
                gate.started.notify_one();
                gate.release.notified().await;
            }
        }
    }

    #[async_trait]
    impl GenerationBackend for FakeBackend {
        async fn generate_image(&self, request: &GenerationRequest) -> Result<EncodedImage> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            self.record(request).await;
            match &self.reply {
                Reply::Image(image) => Ok(image.clone()),
                Reply::Fail(msg) => Err(StudioError::Backend(msg.clone())),
                Reply::Video(_) => Err(StudioError::Backend("expected a video call".into())),
            }
        }

        async fn generate_video(&self, request: &GenerationRequest) -> Result<VideoRef> {
            self.video_calls.fetch_add(1, Ordering::SeqCst);
            self.record(request).await;
            match &self.reply {
                Reply::Video(video) => Ok(video.clone()),
                Reply::Fail(msg) => Err(StudioError::Backend(msg.clone())),
                Reply::Image(_) => Err(StudioError::Backend("expected an image call".into())),
            }
        }
    }

    fn generated() -> EncodedImage {
        EncodedImage::new("image/png", "R0VORVJBVEVE")
    }

    fn studio(backend: &Arc<FakeBackend>) -> Orchestrator<FakeBackend> {
        Orchestrator::new(
            Arc::new(ModelRegistry::builtin().clone()),
            Arc::clone(backend),
            &StudioConfig::new(),
        )
    }

    fn file(name: &str, bytes: usize) -> Box<dyn FileHandle> {
        Box::new(InMemoryFile::new(name, vec![7u8; bytes]))
    }

    #[tokio::test]
    async fn missing_image_fails_without_backend_call() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.set_prompt("blue bottle on sand");

        let err = studio.submit().await.unwrap_err();

        assert!(matches!(err, StudioError::Validation(_)));
        let run = studio.run();
        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(run.error(), Some("Please upload at least one product image."));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn blank_prompt_fails_without_backend_call() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.add_images(vec![file("bottle.png", 10)]).await;
        studio.set_prompt("   ");

        studio.submit().await.unwrap_err();

        assert_eq!(
            studio.run().error(),
            Some("Please enter a description for the scene.")
        );
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn image_success_forwards_only_the_primary_image() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio
            .add_images(vec![file("main.png", 3), file("second.png", 5)])
            .await;
        studio.set_prompt("perfume bottle on a mossy rock");
        studio.set_aspect_ratio("16:9").unwrap();

        let artifact = studio.submit().await.unwrap();

        assert_eq!(artifact.as_image(), Some(&generated()));
        let run = studio.run();
        assert_eq!(run.status(), RunStatus::Succeeded);
        assert_eq!(run.result().and_then(|r| r.as_image()), Some(&generated()));
        assert!(run.error().is_none());
        assert!(run.progress_message().is_empty());

        let request = backend.last_request();
        assert_eq!(request.image.unwrap().decode().unwrap(), vec![7u8; 3]);
        assert_eq!(request.model_id, "gemini-2.5-flash-image");
        assert_eq!(request.aspect_ratio, "16:9");
        assert_eq!(request.resolution, "1K");
        assert_eq!(request.quantity, 1);
        assert_eq!(backend.image_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn text_only_model_submits_without_image() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.set_model("imagen-4.0-generate-001").unwrap();
        studio.set_prompt("a misty forest at dawn");

        studio.submit().await.unwrap();

        assert!(backend.last_request().image.is_none());
    }

    #[tokio::test]
    async fn video_backend_error_is_surfaced_verbatim() {
        let backend = FakeBackend::new(Reply::Fail("quota exceeded".into()));
        let studio = studio(&backend);
        studio.set_mode(GenerationMode::Video);
        studio.add_images(vec![file("start.png", 8)]).await;
        studio.set_prompt("slow pan across the watch face");

        studio.submit().await.unwrap_err();

        let run = studio.run();
        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(run.error(), Some("quota exceeded"));
        assert!(run.result().is_none());
        assert!(run.progress_message().is_empty());
        assert_eq!(backend.video_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.last_request().resolution, "720p");
    }

    #[tokio::test]
    async fn empty_backend_message_falls_back_to_generic_text() {
        let backend = FakeBackend::new(Reply::Fail(String::new()));
        let studio = studio(&backend);
        studio.set_model("imagen-4.0-generate-001").unwrap();
        studio.set_prompt("sneakers on concrete");

        studio.submit().await.unwrap_err();

        assert_eq!(studio.run().error(), Some(GENERIC_FAILURE));
    }

    #[tokio::test]
    async fn video_model_without_image_capability_trips_contract_check() {
        let registry = ModelRegistry::new(vec![ModelDescriptor::new(
            "broken-video",
            "Broken",
            "",
            GenerationMode::Video,
            Capabilities::default(),
        )])
        .unwrap();
        let backend = FakeBackend::new(Reply::Video(VideoRef::new("uri")));
        let studio = Orchestrator::new(
            Arc::new(registry),
            Arc::clone(&backend),
            &StudioConfig::new().with_initial_mode(GenerationMode::Video),
        );
        studio.set_prompt("orbiting camera");

        let err = studio.submit().await.unwrap_err();

        assert!(matches!(err, StudioError::ContractViolation));
        assert_eq!(
            studio.run().error(),
            Some("Video generation currently requires a start image.")
        );
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_rejected() {
        let backend = FakeBackend::gated(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.set_model("imagen-4.0-generate-001").unwrap();
        studio.set_prompt("lipstick on marble");

        let gate = backend.gate.as_ref().unwrap();
        let (first, second) = tokio::join!(studio.submit(), async {
            gate.started.notified().await;
            assert!(studio.run().is_in_flight());
            assert_eq!(studio.snapshot().run.progress_message, "Processing image details...");
            let second = studio.submit().await;
            gate.release.notify_one();
            second
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(StudioError::AlreadyInFlight)));
        assert_eq!(backend.calls(), 1);
        assert_eq!(studio.run().status(), RunStatus::Succeeded);
    }

    #[tokio::test]
    async fn new_submission_replaces_previous_outcome() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.set_model("imagen-4.0-generate-001").unwrap();
        studio.set_prompt("candle in snow");
        studio.submit().await.unwrap();
        assert!(studio.run().result().is_some());

        studio.set_prompt("");
        studio.submit().await.unwrap_err();

        let run = studio.run();
        assert_eq!(run.status(), RunStatus::Failed);
        assert!(run.result().is_none());
    }

    #[tokio::test]
    async fn oversized_upload_is_reported_and_small_one_kept() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);

        let report = studio
            .add_images(vec![file("huge.png", 6 * MB), file("ok.png", 2 * MB)])
            .await;

        assert_eq!(report.settled, 2);
        let config = studio.configuration();
        assert_eq!(config.images().len(), 1);
        assert_eq!(config.images()[0].decode().unwrap().len(), 2 * MB);
        assert_eq!(
            studio.run().error(),
            Some("huge.png is too large (max 5MB)")
        );
    }

    #[tokio::test]
    async fn adding_images_appends_and_clears_the_result() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.add_images(vec![file("a.png", 1)]).await;
        studio.set_prompt("watch on driftwood");
        studio.submit().await.unwrap();

        studio.add_images(vec![file("b.png", 2), file("c.png", 3)]).await;

        let lengths: Vec<usize> = studio
            .configuration()
            .images()
            .iter()
            .map(|i| i.decode().unwrap().len())
            .collect();
        assert_eq!(lengths, vec![1, 2, 3]);
        let run = studio.run();
        assert_eq!(run.status(), RunStatus::Succeeded);
        assert!(run.result().is_none());
        assert!(run.error().is_none());
    }

    #[tokio::test]
    async fn rejection_after_failed_run_keeps_failed_status() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.set_prompt("teapot on linen");
        studio.submit().await.unwrap_err();

        studio
            .add_images(vec![file("huge.png", 6 * MB), file("ok.png", 1)])
            .await;

        let run = studio.run();
        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(run.error(), Some("huge.png is too large (max 5MB)"));
    }

    #[tokio::test]
    async fn empty_batch_leaves_previous_outcome() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.add_images(vec![file("a.png", 1)]).await;
        studio.set_prompt("ring in a velvet box");
        studio.submit().await.unwrap();

        let report = studio.add_images(Vec::new()).await;

        assert_eq!(report.settled, 0);
        let run = studio.run();
        assert_eq!(run.status(), RunStatus::Succeeded);
        assert_eq!(run.result().and_then(|r| r.as_image()), Some(&generated()));
        assert_eq!(studio.configuration().images().len(), 1);
    }

    #[tokio::test]
    async fn images_added_mid_run_report_rejections_only_to_the_caller() {
        let backend = FakeBackend::gated(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.set_model("imagen-4.0-generate-001").unwrap();
        studio.set_prompt("scarf on a hanger");

        let gate = backend.gate.as_ref().unwrap();
        let (outcome, report) = tokio::join!(studio.submit(), async {
            gate.started.notified().await;
            let report = studio
                .add_images(vec![file("huge.png", 6 * MB), file("ok.png", 2)])
                .await;
            assert!(studio.run().is_in_flight());
            assert!(studio.run().error().is_none());
            gate.release.notify_one();
            report
        });

        outcome.unwrap();
        assert_eq!(report.rejections.len(), 1);
        assert_eq!(studio.configuration().images().len(), 1);
        let run = studio.run();
        assert_eq!(run.status(), RunStatus::Succeeded);
        assert!(run.error().is_none());
    }

    #[tokio::test]
    async fn dropped_submit_fails_the_run_and_allows_another() {
        let backend = FakeBackend::gated(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.set_model("imagen-4.0-generate-001").unwrap();
        studio.set_prompt("boots in the rain");

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), studio.submit()).await;
        assert!(timed_out.is_err());

        let run = studio.run();
        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(run.error(), Some(ABANDONED));
        assert!(!studio.snapshot().run.busy);

        backend.gate.as_ref().unwrap().release.notify_one();
        let artifact = studio.submit().await.unwrap();
        assert_eq!(artifact.as_image(), Some(&generated()));
        assert_eq!(studio.run().status(), RunStatus::Succeeded);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn remove_image_guards_the_index() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio
            .add_images(vec![file("a.png", 1), file("b.png", 2)])
            .await;

        assert!(studio.remove_image(5).is_none());
        assert_eq!(studio.remove_image(0).unwrap().decode().unwrap(), vec![7u8; 1]);
        assert_eq!(studio.configuration().images().len(), 1);
    }

    #[test]
    fn mode_switch_resets_customized_parameters() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.set_model("gemini-3-pro-image-preview").unwrap();
        studio.set_aspect_ratio("4:3").unwrap();
        studio.set_resolution("4K").unwrap();
        studio.set_quantity(3).unwrap();

        studio.set_mode(GenerationMode::Video);
        let config = studio.configuration();
        assert_eq!(config.model_id, "veo-3.1-fast-generate-preview");
        assert_eq!(config.aspect_ratio, "9:16");
        assert_eq!(config.resolution, "720p");

        studio.set_aspect_ratio("16:9").unwrap();
        studio.set_mode(GenerationMode::Image);
        let config = studio.configuration();
        assert_eq!(config.model_id, "gemini-2.5-flash-image");
        assert_eq!(config.aspect_ratio, "1:1");
        assert_eq!(config.resolution, "1K");
        assert_eq!(config.quantity, 1);
    }

    #[test]
    fn reselecting_active_mode_keeps_choices() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);
        studio.set_aspect_ratio("2:3").unwrap();
        studio.set_mode(GenerationMode::Image);
        assert_eq!(studio.configuration().aspect_ratio, "2:3");
    }

    #[test]
    fn setters_reject_options_the_model_does_not_offer() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);

        // Default image model has no resolution or quantity control.
        assert!(matches!(
            studio.set_resolution("2K"),
            Err(StudioError::InvalidOption { field: "resolution", .. })
        ));
        assert!(studio.set_quantity(2).is_err());
        assert!(studio.set_aspect_ratio("21:9").is_err());

        studio.set_model("gemini-3-pro-image-preview").unwrap();
        assert!(studio.set_resolution("720p").is_err());
        assert!(studio.set_quantity(5).is_err());
        assert_eq!(studio.configuration().resolution, "1K");
    }

    #[test]
    fn set_model_checks_registry_and_mode() {
        let backend = FakeBackend::new(Reply::Image(generated()));
        let studio = studio(&backend);

        assert!(matches!(
            studio.set_model("dall-e"),
            Err(StudioError::UnknownModel(_))
        ));
        assert!(matches!(
            studio.set_model("veo-3.1-generate-preview"),
            Err(StudioError::ModelModeMismatch { .. })
        ));
        assert_eq!(studio.selected_model().id, "gemini-2.5-flash-image");
    }

    #[tokio::test]
    async fn result_kind_follows_the_latest_run() {
        let video = FakeBackend::new(Reply::Video(VideoRef::new("https://cdn/clip.mp4")));
        let session = {
            let studio = studio(&video);
            studio.set_mode(GenerationMode::Video);
            studio.add_images(vec![file("s.png", 4)]).await;
            studio.set_prompt("rotating bottle");
            studio.submit().await.unwrap();
            assert!(studio.run().result().unwrap().as_video().is_some());
            studio.session().clone()
        };

        let image = FakeBackend::new(Reply::Image(generated()));
        let studio = Orchestrator::with_session(
            Arc::new(ModelRegistry::builtin().clone()),
            Arc::clone(&image),
            session,
            &StudioConfig::new(),
        );
        studio.set_mode(GenerationMode::Image);
        studio.submit().await.unwrap();

        let run = studio.run();
        let result = run.result().unwrap();
        assert!(result.as_image().is_some());
        assert!(result.as_video().is_none());
    }

    #[tokio::test]
    async fn subscribers_observe_terminal_state() {
        let backend = FakeBackend::new(Reply::Fail("safety filter".into()));
        let studio = studio(&backend);
        let mut updates = studio.subscribe();
        assert_eq!(updates.next().await.unwrap().run.status, RunStatus::Idle);

        studio.set_model("imagen-4.0-generate-001").unwrap();
        studio.set_prompt("headphones on a desk");
        studio.submit().await.unwrap_err();

        let latest = updates.next().await.unwrap();
        assert_eq!(latest.run.status, RunStatus::Failed);
        assert_eq!(latest.run.error.as_deref(), Some("safety filter"));
        assert!(!latest.run.busy);
    }
}

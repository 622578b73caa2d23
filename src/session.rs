use crate::config::StudioConfig;
use crate::models::{GenerationConfiguration, GenerationRun, ModelRegistry};
use crate::resolver;
use std::sync::{Arc, Mutex, MutexGuard};

/// Everything one studio session owns: what the user set up and the live run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub configuration: GenerationConfiguration,
    pub run: GenerationRun,
}

impl Session {
    pub fn new(registry: &ModelRegistry, config: &StudioConfig) -> Self {
        let mode = config.initial_mode;
        let model = registry.default_for(mode);
        let defaults = resolver::resolve(model, mode);

        Self {
            configuration: GenerationConfiguration::new(
                mode,
                model,
                config.initial_prompt.clone(),
                defaults.aspect_ratio,
                defaults.resolution,
            ),
            run: GenerationRun::idle(),
        }
    }
}

/// Cloneable handle onto one [`Session`]. Locks are short and never span an await.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Session> {
        // Every mutation is a single assignment, so a poisoned guard is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }
}

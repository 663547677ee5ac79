//! Process-wide registry of loaded models.
//!
//! Loading a checkpoint is the most expensive thing the service does, so
//! every handle is built on first use and then shared. The map is guarded by
//! an async mutex that stays locked for the duration of a load: two requests
//! racing for the same cold model share a single load instead of both paying
//! for it.
//!
//! Failed loads are not cached: the next [`get_or_load`] tries again. The
//! last failure per choice is remembered so that [`status`] can report it
//! without retrying; the page view uses `status`, while selecting a model or
//! submitting text goes through `get_or_load`.
//!
//! [`get_or_load`]: ModelRegistry::get_or_load
//! [`status`]: ModelRegistry::status

use crate::error::LoadError;
use crate::pipeline::model::{Device, ModelChoice, ModelHandle, PipelineLoader};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// What the registry knows about one choice, without loading anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    /// The most recent load attempt failed.
    Failed(LoadError),
    NotLoaded,
}

/// Maps each [`ModelChoice`] to its loaded [`ModelHandle`].
pub struct ModelRegistry {
    loader: Arc<dyn PipelineLoader>,
    device: Device,
    handles: Mutex<HashMap<ModelChoice, Arc<ModelHandle>>>,
    failures: parking_lot::Mutex<HashMap<ModelChoice, LoadError>>,
}

impl ModelRegistry {
    /// Create an empty registry. Every handle it builds is bound to `device`.
    pub fn new(loader: Arc<dyn PipelineLoader>, device: Device) -> Self {
        Self {
            loader,
            device,
            handles: Mutex::new(HashMap::new()),
            failures: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Return the cached handle for `choice`, loading it on first use.
    pub async fn get_or_load(&self, choice: ModelChoice) -> Result<Arc<ModelHandle>, LoadError> {
        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(&choice) {
            return Ok(Arc::clone(handle));
        }

        let start = Instant::now();
        let pipeline = match self.loader.load(choice, self.device).await {
            Ok(pipeline) => pipeline,
            Err(e) => {
                warn!("Loading {} failed: {}", choice.label(), e);
                self.failures.lock().insert(choice, e.clone());
                return Err(e);
            }
        };
        self.failures.lock().remove(&choice);
        info!(
            "Loaded {} on {} in {}ms",
            choice.label(),
            self.device,
            start.elapsed().as_millis()
        );

        let handle = Arc::new(ModelHandle::new(choice, self.device, pipeline));
        handles.insert(choice, Arc::clone(&handle));
        Ok(handle)
    }

    pub async fn is_loaded(&self, choice: ModelChoice) -> bool {
        self.handles.lock().await.contains_key(&choice)
    }

    /// Report the state of `choice` without starting a load.
    pub async fn status(&self, choice: ModelChoice) -> LoadStatus {
        if self.is_loaded(choice).await {
            return LoadStatus::Loaded;
        }
        match self.failures.lock().get(&choice) {
            Some(e) => LoadStatus::Failed(e.clone()),
            None => LoadStatus::NotLoaded,
        }
    }

    /// Drop the cached handle for `choice`. Returns whether one was cached.
    ///
    /// Requests already holding the handle keep using it; the next
    /// [`get_or_load`](Self::get_or_load) loads a fresh one.
    pub async fn invalidate(&self, choice: ModelChoice) -> bool {
        self.failures.lock().remove(&choice);
        let removed = self.handles.lock().await.remove(&choice).is_some();
        if removed {
            info!("Invalidated {}", choice.label());
        }
        removed
    }

    /// Drop every cached handle, returning how many were dropped.
    pub async fn invalidate_all(&self) -> usize {
        let mut handles = self.handles.lock().await;
        let n = handles.len();
        handles.clear();
        self.failures.lock().clear();
        n
    }
}

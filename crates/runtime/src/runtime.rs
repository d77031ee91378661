//! High-level runtime orchestrator.
//!
//! The runtime owns the scheduler task, wires the controller to its
//! collaborators and exposes a builder-based API for clients.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use encounter_core::{EncounterConfig, RandomSource, SeededRandom};

use crate::api::{ControllerHandle, Result, RuntimeError};
use crate::controller::{EncounterController, EncounterSummary};
use crate::env::EncounterEnv;
use crate::events::{Event, EventBus, Topic};
use crate::workers::Scheduler;

/// Running encounter.
///
/// [`ControllerHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: ControllerHandle,
    scheduler: JoinHandle<Result<EncounterSummary>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Waits for the scheduler to finish on its own (fatal error or a
    /// shutdown requested through a handle).
    pub async fn join(self) -> Result<EncounterSummary> {
        self.scheduler.await.map_err(RuntimeError::WorkerJoin)?
    }

    /// Requests shutdown and waits for the in-flight pass to finish.
    pub async fn shutdown(self) -> Result<EncounterSummary> {
        self.handle.shutdown();
        self.join().await
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: EncounterConfig,
    env: Option<EncounterEnv>,
    rng: Option<Box<dyn RandomSource>>,
    event_capacity: usize,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: EncounterConfig::default(),
            env: None,
            rng: None,
            event_capacity: 100,
        }
    }

    /// Override encounter configuration
    pub fn config(mut self, config: EncounterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set required collaborators
    pub fn env(mut self, env: EncounterEnv) -> Self {
        self.env = Some(env);
        self
    }

    /// Replace the tie-break random source.
    ///
    /// Defaults to a ChaCha8 source seeded from `config.rng_seed`.
    pub fn random_source(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Build a controller without spawning the scheduler.
    ///
    /// Useful for driving passes by hand.
    pub fn build_controller(self) -> Result<EncounterController> {
        let env = self.env.ok_or(RuntimeError::MissingEnvironment)?;
        self.config.validate()?;

        let seed = self.config.rng_seed;
        let rng: Box<dyn RandomSource> = match self.rng {
            Some(rng) => rng,
            None => Box::new(SeededRandom::from_optional_seed(seed)),
        };
        let events = EventBus::with_capacity(self.event_capacity);
        Ok(EncounterController::new(self.config, env, rng, events))
    }

    /// Build the runtime and start scheduling passes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let controller = self.build_controller()?;
        let handle = controller.handle();
        let scheduler = tokio::spawn(Scheduler::new(controller).run());
        Ok(Runtime { handle, scheduler })
    }
}

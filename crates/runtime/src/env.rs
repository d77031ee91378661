//! Bundle of collaborator implementations the controller runs against.
use std::sync::Arc;

use encounter_core::{AgentQuery, TelegraphFeed, WorldQuery};

use crate::api::{ActionDispatch, LoadoutProvider};

/// Shared handles to every collaborator.
///
/// Cloning is cheap; all collaborators are reference counted.
#[derive(Clone)]
pub struct EncounterEnv {
    pub(crate) world: Arc<dyn WorldQuery>,
    pub(crate) agent: Arc<dyn AgentQuery>,
    pub(crate) actions: Arc<dyn ActionDispatch>,
    pub(crate) loadouts: Arc<dyn LoadoutProvider>,
    pub(crate) telegraphs: Arc<dyn TelegraphFeed>,
}

impl EncounterEnv {
    pub fn new(
        world: Arc<dyn WorldQuery>,
        agent: Arc<dyn AgentQuery>,
        actions: Arc<dyn ActionDispatch>,
        loadouts: Arc<dyn LoadoutProvider>,
        telegraphs: Arc<dyn TelegraphFeed>,
    ) -> Self {
        Self {
            world,
            agent,
            actions,
            loadouts,
            telegraphs,
        }
    }

    /// Uses one object for every collaborator role.
    pub fn from_shared<T>(collaborator: Arc<T>) -> Self
    where
        T: WorldQuery + AgentQuery + ActionDispatch + LoadoutProvider + TelegraphFeed + 'static,
    {
        Self {
            world: collaborator.clone(),
            agent: collaborator.clone(),
            actions: collaborator.clone(),
            loadouts: collaborator.clone(),
            telegraphs: collaborator,
        }
    }

    pub fn world(&self) -> &dyn WorldQuery {
        self.world.as_ref()
    }

    pub fn agent(&self) -> &dyn AgentQuery {
        self.agent.as_ref()
    }
}

//! Ordered TX pipeline
//!
//! Every outbound message passes a list of named stages before it is
//! written to a transport. Stages are ordered by ascending priority; a
//! stage therefore sees the message after every stage with a lower
//! priority has finished with it.
//!
//! ```text
//!   transaction layer (16) ──► sanitizer (17) ──► ... ──► application (64) ──► wire
//! ```
//!
//! The transaction layer stamps `Call-ID` and the `Via` branch, so any stage
//! registered above [`PRIORITY_TSX_LAYER`] observes fully-formed messages.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::message::TxData;

/// Identifier handed out by [`TxPipeline::register`]
pub type ModuleId = usize;

/// Transport layer
pub const PRIORITY_TRANSPORT_LAYER: u32 = 8;
/// Transaction layer
pub const PRIORITY_TSX_LAYER: u32 = 16;
/// User agent and proxy layer
pub const PRIORITY_UA_PROXY_LAYER: u32 = 32;
/// Dialog usages
pub const PRIORITY_DIALOG_USAGE: u32 = 48;
/// Application modules
pub const PRIORITY_APPLICATION: u32 = 64;

/// A named stage of the TX pipeline
///
/// Both hooks default to passing the message through untouched.
pub trait TxModule: Send + Sync {
    /// Unique name of the stage
    fn name(&self) -> &str;

    /// Position in the pipeline, lower runs first
    fn priority(&self) -> u32;

    /// Called for every outbound request
    fn on_tx_request(&self, _tdata: &mut TxData) -> Result<()> {
        Ok(())
    }

    /// Called for every outbound response
    fn on_tx_response(&self, _tdata: &mut TxData) -> Result<()> {
        Ok(())
    }
}

struct Stage {
    id: ModuleId,
    module: Arc<dyn TxModule>,
}

/// The ordered list of stages
#[derive(Default)]
pub struct TxPipeline {
    stages: Vec<Stage>,
    next_id: ModuleId,
}

impl TxPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stage after every stage of lower or equal priority
    ///
    /// Names must be unique within the pipeline.
    pub fn register(&mut self, module: Arc<dyn TxModule>) -> Result<ModuleId> {
        if self.contains(module.name()) {
            return Err(Error::DuplicateModule(module.name().to_string()));
        }

        let id = self.next_id;
        self.next_id += 1;

        let position = self
            .stages
            .iter()
            .position(|s| s.module.priority() > module.priority())
            .unwrap_or(self.stages.len());

        trace!(stage = module.name(), priority = module.priority(), id, "registering TX stage");
        self.stages.insert(position, Stage { id, module });
        Ok(id)
    }

    /// Remove a stage
    pub fn unregister(&mut self, id: ModuleId) -> Result<()> {
        let position = self
            .stages
            .iter()
            .position(|s| s.id == id)
            .ok_or(Error::UnknownModule(id))?;
        self.stages.remove(position);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.module.name() == name)
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.module.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage over `tdata`
    ///
    /// Stops at the first stage that returns an error; the message must then
    /// not be sent.
    pub fn process(&self, tdata: &mut TxData) -> Result<()> {
        let response = tdata.is_response();
        for stage in &self.stages {
            if response {
                stage.module.on_tx_response(tdata)?;
            } else {
                stage.module.on_tx_request(tdata)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TxPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxPipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

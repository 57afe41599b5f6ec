use std::{
    process::ExitStatus,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::process::Child;
use tracing::{debug, info};

use super::{EngineCommand, ReadinessProbe};
use crate::error::AdapterError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Spawned, port not accepting traffic yet.
    #[default]
    Starting,
    Ready,
}

/// Shared view of the engine state, cloned into the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct EngineStatus(Arc<RwLock<EngineState>>);

impl EngineStatus {
    pub fn get(&self) -> EngineState {
        *self.0.read()
    }

    pub fn is_ready(&self) -> bool {
        self.get() == EngineState::Ready
    }

    pub fn mark_ready(&self) {
        *self.0.write() = EngineState::Ready;
    }
}

/// Handle to the spawned engine. Dropping it kills the child.
#[derive(Debug)]
pub struct EngineProcess {
    child: Child,
    program: String,
    port: u16,
    status: EngineStatus,
}

impl EngineProcess {
    /// Spawns the engine and returns without waiting for it.
    pub fn spawn(command: &EngineCommand) -> Result<Self, AdapterError> {
        let child = command
            .to_command()
            .spawn()
            .map_err(|source| AdapterError::Spawn {
                program: command.program().to_string(),
                source,
            })?;

        info!(
            program = command.program(),
            pid = child.id(),
            port = command.port(),
            "inference engine spawned"
        );

        Ok(Self {
            child,
            program: command.program().to_string(),
            port: command.port(),
            status: EngineStatus::default(),
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn state(&self) -> EngineState {
        self.status.get()
    }

    pub fn status(&self) -> EngineStatus {
        self.status.clone()
    }

    /// Polls `probe` every `interval` until it reports ready, the child
    /// exits, or `timeout` elapses.
    pub async fn wait_until_ready<P>(
        &mut self,
        probe: &P,
        timeout: Duration,
        interval: Duration,
    ) -> Result<(), AdapterError>
    where
        P: ReadinessProbe + ?Sized,
    {
        let started = Instant::now();
        loop {
            if let Some(exit) = self.child.try_wait()? {
                return Err(AdapterError::EngineExited(exit));
            }
            if probe.is_ready().await {
                self.status.mark_ready();
                info!(
                    program = %self.program,
                    port = self.port,
                    elapsed = ?started.elapsed(),
                    "inference engine ready"
                );
                return Ok(());
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(AdapterError::StartupTimeout {
                    port: self.port,
                    waited,
                });
            }
            debug!(port = self.port, ?waited, "engine not ready yet");
            tokio::time::sleep(interval.min(timeout - waited)).await;
        }
    }

    /// Waits for the child to exit.
    pub async fn wait(&mut self) -> Result<ExitStatus, AdapterError> {
        Ok(self.child.wait().await?)
    }
}

//! Single-flight execution of a link switch.
//!
//! [`Orchestrator::switch_link`] takes the controller gate, builds the plan
//! and runs it step by step. The first failing step ends the sequence;
//! nothing is rolled back, and the error lists the stages that already ran
//! so the operator knows the controller may be half-switched.

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use tokio::sync::Mutex;

use super::executor::CommandExecutor;
use super::plan;
use super::request::ValidatedRequest;
use super::Mode;
use crate::config::model::ControllerConfig;
use crate::directory::DirectoryStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
    pub message: String,
    pub completed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwitchError {
    #[error("another link switch is already in progress")]
    Busy,

    #[error("{mode} talkgroup {talkgroup} not found")]
    NotFound { mode: Mode, talkgroup: u32 },

    #[error("reflector directory has not been loaded yet")]
    DirectoryUnavailable,

    #[error("no step table configured for {0}")]
    NotConfigured(Mode),

    #[error("step '{stage}' failed: {detail} (completed before failure: {})", completed_list(.completed))]
    Step {
        stage: String,
        detail: String,
        completed: Vec<String>,
    },
}

fn completed_list(completed: &[String]) -> String {
    if completed.is_empty() {
        "none".to_string()
    } else {
        completed.join(", ")
    }
}

impl SwitchError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Busy => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::DirectoryUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotConfigured(_) | Self::Step { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether controller state may have changed before this error.
    #[must_use]
    pub fn left_partial_state(&self) -> bool {
        matches!(self, Self::Step { completed, .. } if !completed.is_empty())
    }
}

pub type SwitchOutcome = Result<Connected, SwitchError>;

pub struct Orchestrator {
    executor: Arc<dyn CommandExecutor>,
    directory: Arc<DirectoryStore>,
    gate: Mutex<()>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(executor: Arc<dyn CommandExecutor>, directory: Arc<DirectoryStore>) -> Self {
        Self {
            executor,
            directory,
            gate: Mutex::new(()),
        }
    }

    /// Run the switch sequence for `request`. Rejects with
    /// [`SwitchError::Busy`] instead of queueing when another switch holds
    /// the controller.
    pub async fn switch_link(
        &self,
        controller: &ControllerConfig,
        request: &ValidatedRequest,
    ) -> SwitchOutcome {
        let Ok(_guard) = self.gate.try_lock() else {
            tracing::warn!(mode = %request.mode(), "switch rejected, controller busy");
            return Err(SwitchError::Busy);
        };

        let plan = plan::build(controller, request, &self.directory)?;
        let mut completed = Vec::with_capacity(plan.steps.len());

        for step in &plan.steps {
            let start = Instant::now();
            tracing::debug!(stage = %step.stage, command = %step.command, "running step");

            match self.executor.execute(&step.command, step.timeout).await {
                Ok(output) => {
                    tracing::info!(
                        stage = %step.stage,
                        elapsed_ms = elapsed_ms(start),
                        output = %output,
                        "step completed"
                    );
                    completed.push(step.stage.clone());
                }
                Err(e) => {
                    tracing::error!(
                        stage = %step.stage,
                        command = %step.command,
                        elapsed_ms = elapsed_ms(start),
                        completed = completed.len(),
                        error = %e,
                        "step failed, aborting switch"
                    );
                    return Err(SwitchError::Step {
                        stage: step.stage.clone(),
                        detail: e.diagnostic(),
                        completed,
                    });
                }
            }
        }

        Ok(Connected {
            message: plan.confirmation,
            completed,
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

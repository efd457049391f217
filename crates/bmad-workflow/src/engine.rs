// crates/bmad-workflow/src/engine.rs
// ============================================================================
// Module: BMAD Workflow Engine
// Description: Executes an InstructionStep sequence with guards, YOLO mode,
// and crash-safe resume over a state store.
// Purpose: The single canonical execution path every orchestrator drives
// through, mirroring the control-plane-as-one-entry-point discipline this
// workspace already follows for its state machines.
// Dependencies: bmad-core, bmad-store, thiserror
// ============================================================================

//! ## Overview
//! [`WorkflowEngine::execute`] walks steps from `state.current_step + 1`,
//! persisting after every step so a crash or suspension leaves the run
//! resumable at the step in progress. `ask`/`elicit-required`/`template-output`
//! body items suspend the run (status becomes `paused`) in interactive mode;
//! [`ExecutionMode::Yolo`] skips prompts and auto-approves writes instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bmad_core::Timestamp;
use bmad_core::WorkflowState;
use bmad_core::WorkflowStatus;
use bmad_store::StateStore;
use bmad_store::StoreError;
use thiserror::Error;

use crate::definition::InstructionStep;
use crate::definition::StepAction;
use crate::executor::ExecutorError;
use crate::executor::StepExecutor;
use crate::guard;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while executing a workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Persisting workflow state failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A step's `<action>` or `<template-output>` body item failed.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    /// `resume_from_state` was called on a workflow already in a terminal status.
    #[error("cannot resume a workflow in terminal status")]
    AlreadyTerminal,
}

// ============================================================================
// SECTION: Execution Mode
// ============================================================================

/// Whether prompting body items suspend for input or are skipped automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// `ask`/`elicit-required`/`template-output` suspend the run for external input.
    Interactive,
    /// Prompting items are skipped; template outputs are auto-approved and written.
    Yolo,
}

// ============================================================================
// SECTION: Workflow Engine
// ============================================================================

/// Executes a parsed instruction sequence against a persisted [`WorkflowState`].
pub struct WorkflowEngine<'a> {
    /// The step sequence to execute, in order.
    steps: &'a [InstructionStep],
    /// Where state is persisted after every completed or suspended step.
    store: &'a StateStore,
    /// What an `<action>`/`<template-output>` item actually does.
    executor: &'a dyn StepExecutor,
    /// Interactive vs. YOLO prompting behavior.
    mode: ExecutionMode,
}

impl<'a> WorkflowEngine<'a> {
    /// Creates an engine over an already-parsed step sequence.
    #[must_use]
    pub fn new(steps: &'a [InstructionStep], store: &'a StateStore, executor: &'a dyn StepExecutor, mode: ExecutionMode) -> Self {
        Self { steps, store, executor, mode }
    }

    /// Executes steps from `state.current_step + 1` through the end of the
    /// sequence, persisting after every step. Stops early (status `paused`)
    /// if an interactive-mode prompt is reached.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] if a step's action fails or persistence fails.
    /// On any such error, `state.status` is set to `failed` and persisted
    /// before the error is returned; the state remains resumable at that step.
    pub fn execute(&self, mut state: WorkflowState, now: Timestamp) -> Result<WorkflowState, WorkflowError> {
        let start_step = state.current_step;
        let remaining = self.steps.iter().filter(|step| step.n > start_step);

        for step in remaining {
            match self.run_step(step, &mut state) {
                Ok(StepOutcome::Completed) => {
                    state.current_step = step.n;
                    state.updated_at = now;
                    self.store.save_state(&state)?;
                }
                Ok(StepOutcome::Suspended) => {
                    state.status = WorkflowStatus::Paused;
                    state.updated_at = now;
                    self.store.save_state(&state)?;
                    return Ok(state);
                }
                Err(err) => {
                    state.status = WorkflowStatus::Failed;
                    state.updated_at = now;
                    let _ = self.store.save_state(&state);
                    return Err(err);
                }
            }
        }

        state.status = WorkflowStatus::Completed;
        state.updated_at = now;
        self.store.save_state(&state)?;
        Ok(state)
    }

    /// Resumes a paused or failed workflow from `state.current_step + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::AlreadyTerminal`] if `state.status` is
    /// already `completed`. Propagates [`WorkflowError`] from [`Self::execute`].
    pub fn resume_from_state(&self, mut state: WorkflowState, now: Timestamp) -> Result<WorkflowState, WorkflowError> {
        if state.status == WorkflowStatus::Completed {
            return Err(WorkflowError::AlreadyTerminal);
        }
        state.status = WorkflowStatus::Running;
        self.execute(state, now)
    }

    /// Runs one step: evaluates its guard, then its body items in order.
    fn run_step(&self, step: &InstructionStep, state: &mut WorkflowState) -> Result<StepOutcome, WorkflowError> {
        if let Some(guard_expr) = &step.guard {
            if !guard::evaluate(guard_expr, &state.variables) {
                return Ok(StepOutcome::Completed);
            }
        }
        self.run_body(&step.body, state)
    }

    /// Runs a step or check block's body items in textual order.
    fn run_body(&self, body: &[StepAction], state: &mut WorkflowState) -> Result<StepOutcome, WorkflowError> {
        for action in body {
            match action {
                StepAction::Action(description) => {
                    self.executor.execute_action(description, state)?;
                }
                StepAction::Check { guard: guard_expr, actions } => {
                    if guard::evaluate(guard_expr, &state.variables) {
                        if let StepOutcome::Suspended = self.run_body(actions, state)? {
                            return Ok(StepOutcome::Suspended);
                        }
                    }
                }
                StepAction::Ask | StepAction::ElicitRequired => {
                    if self.mode == ExecutionMode::Interactive {
                        return Ok(StepOutcome::Suspended);
                    }
                }
                StepAction::TemplateOutput { file } => {
                    if self.mode == ExecutionMode::Interactive {
                        return Ok(StepOutcome::Suspended);
                    }
                    self.executor.write_template_output(file, state)?;
                }
                StepAction::Output => {}
            }
        }
        Ok(StepOutcome::Completed)
    }
}

/// The result of running one step or body block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    /// Every body item ran (or was skipped by guard/YOLO rules).
    Completed,
    /// Execution stopped at a prompting item awaiting external input or approval.
    Suspended,
}

#[cfg(test)]
mod tests {
    use super::ExecutionMode;
    use super::WorkflowEngine;
    use crate::definition::parse_instructions;
    use crate::executor::RecordingStepExecutor;
    use bmad_core::ProjectId;
    use bmad_core::Timestamp;
    use bmad_core::WorkflowId;
    use bmad_core::WorkflowState;
    use bmad_core::WorkflowStatus;
    use bmad_store::StateStore;
    use cap_std::ambient_authority;
    use cap_std::fs::Dir;

    fn open_temp_store() -> (tempfile::TempDir, StateStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let cap = Dir::open_ambient_dir(dir.path(), ambient_authority()).expect("open ambient dir");
        (dir, StateStore::new(cap))
    }

    const YOLO_INSTRUCTIONS: &str = r#"
<step n="1" goal="Gather context">
  <action>Summarize onboarding docs</action>
</step>
<step n="2" goal="Clarify scope">
  <ask/>
  <elicit-required/>
</step>
<step n="3" goal="Write output">
  <template-output file="output.md"/>
</step>
"#;

    #[test]
    fn interactive_mode_suspends_at_the_first_prompt() {
        let (_guard, store) = open_temp_store();
        let steps = parse_instructions(YOLO_INSTRUCTIONS).expect("parses");
        let executor = RecordingStepExecutor::default();
        let engine = WorkflowEngine::new(&steps, &store, &executor, ExecutionMode::Interactive);

        let state = WorkflowState::new(ProjectId::from("proj"), WorkflowId::from("prd"), Timestamp::Logical(1));
        let result = engine.execute(state, Timestamp::Logical(2)).expect("execution succeeds");

        assert_eq!(result.status, WorkflowStatus::Paused);
        assert_eq!(result.current_step, 1);
    }

    #[test]
    fn resume_from_paused_state_reaches_completed() {
        let (_guard, store) = open_temp_store();
        let steps = parse_instructions(YOLO_INSTRUCTIONS).expect("parses");
        let executor = RecordingStepExecutor::default();
        let engine = WorkflowEngine::new(&steps, &store, &executor, ExecutionMode::Interactive);

        let state = WorkflowState::new(ProjectId::from("proj"), WorkflowId::from("prd"), Timestamp::Logical(1));
        let paused = engine.execute(state, Timestamp::Logical(2)).expect("first run suspends");
        assert_eq!(paused.status, WorkflowStatus::Paused);

        let yolo_engine = WorkflowEngine::new(&steps, &store, &executor, ExecutionMode::Yolo);
        let resumed = yolo_engine.resume_from_state(paused, Timestamp::Logical(3)).expect("resume succeeds");
        assert_eq!(resumed.status, WorkflowStatus::Completed);
        assert_eq!(resumed.current_step, 3);
    }

    #[test]
    fn step_guard_false_skips_step_but_advances_current_step() {
        let (_guard, store) = open_temp_store();
        let instructions = r#"
<step n="1" goal="Maybe run" if="enabled">
  <action>Should not run</action>
</step>
<step n="2" goal="Always run">
  <action>Always runs</action>
</step>
"#;
        let steps = parse_instructions(instructions).expect("parses");
        let executor = RecordingStepExecutor::default();
        let engine = WorkflowEngine::new(&steps, &store, &executor, ExecutionMode::Yolo);

        let state = WorkflowState::new(ProjectId::from("proj"), WorkflowId::from("prd"), Timestamp::Logical(1));
        let result = engine.execute(state, Timestamp::Logical(2)).expect("execution succeeds");

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.current_step, 2);
        assert_eq!(executor.actions_run.lock().unwrap().as_slice(), ["Always runs"]);
    }
}

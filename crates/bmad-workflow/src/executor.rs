// crates/bmad-workflow/src/executor.rs
// ============================================================================
// Module: BMAD Step Executor
// Description: Capability trait for running an `<action>` body item and
// writing a `<template-output>` file.
// Purpose: Keep the workflow engine's control flow independent of what an
// action actually does or how a document is assembled.
// Dependencies: bmad-core
// ============================================================================

//! ## Overview
//! The engine drives step ordering, guards, and YOLO-mode skipping; it never
//! interprets what an `<action>` means. Orchestrators inject a
//! [`StepExecutor`] that knows how to run a persona agent or assemble a
//! document with `bmad-template`.

use bmad_core::WorkflowState;
use thiserror::Error;

/// Errors a [`StepExecutor`] implementation may raise.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The action or template write failed for an implementation-specific reason.
    #[error("step execution failed: {0}")]
    Failed(String),
}

/// A capability for running the effectful parts of a workflow step.
pub trait StepExecutor: Send + Sync {
    /// Runs one `<action>` body item's free-text description, optionally
    /// mutating `state.variables`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the action cannot be completed.
    fn execute_action(&self, description: &str, state: &mut WorkflowState) -> Result<(), ExecutorError>;

    /// Writes the current document content to `file`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the write cannot be completed.
    fn write_template_output(&self, file: &str, state: &WorkflowState) -> Result<(), ExecutorError>;
}

/// An in-memory [`StepExecutor`] that records every call instead of doing
/// real work, for engine-level tests that do not exercise orchestration.
#[derive(Debug, Default)]
pub struct RecordingStepExecutor {
    /// Every action description passed to [`StepExecutor::execute_action`], in call order.
    pub actions_run: std::sync::Mutex<Vec<String>>,
    /// Every file path passed to [`StepExecutor::write_template_output`], in call order.
    pub outputs_written: std::sync::Mutex<Vec<String>>,
}

impl StepExecutor for RecordingStepExecutor {
    fn execute_action(&self, description: &str, _state: &mut WorkflowState) -> Result<(), ExecutorError> {
        self.actions_run.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(description.to_string());
        Ok(())
    }

    fn write_template_output(&self, file: &str, _state: &WorkflowState) -> Result<(), ExecutorError> {
        self.outputs_written.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(file.to_string());
        Ok(())
    }
}

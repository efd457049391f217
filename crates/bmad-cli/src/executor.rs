// crates/bmad-cli/src/executor.rs
// ============================================================================
// Module: BMAD CLI Filesystem Step Executor
// Description: A StepExecutor that logs actions to stdout and writes
// template output to the project's docs directory.
// Purpose: Give `bmad run` a real effectful executor without pulling
// persona-agent orchestration into the CLI crate.
// Dependencies: bmad-core, bmad-workflow, cap-std, serde_json
// ============================================================================

//! ## Overview
//! [`FilesystemStepExecutor`] treats every `<action>` description as a line
//! to print; real persona-agent dispatch is an orchestrator concern this
//! thin CLI does not own. `<template-output file="...">` writes the
//! `document` variable (if set as a string) or a pretty-printed JSON dump of
//! every variable, to `file` under the capability-scoped docs directory.

use std::io::Write;
use std::sync::Mutex;

use bmad_core::WorkflowState;
use bmad_workflow::ExecutorError;
use bmad_workflow::StepExecutor;
use cap_std::fs::Dir;

/// Writes template output under a capability-scoped docs directory and
/// records every action and output file for the CLI to report back.
pub struct FilesystemStepExecutor {
    docs_root: Dir,
    outputs_written: Mutex<Vec<String>>,
}

impl FilesystemStepExecutor {
    /// Creates an executor rooted at `docs_root`.
    #[must_use]
    pub const fn new(docs_root: Dir) -> Self {
        Self { docs_root, outputs_written: Mutex::new(Vec::new()) }
    }

    /// Returns every output file written, in call order.
    #[must_use]
    pub fn outputs_written(&self) -> Vec<String> {
        self.outputs_written.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl StepExecutor for FilesystemStepExecutor {
    fn execute_action(&self, description: &str, _state: &mut WorkflowState) -> Result<(), ExecutorError> {
        let mut stdout = std::io::stdout();
        writeln!(&mut stdout, "action: {description}").map_err(|err| ExecutorError::Failed(err.to_string()))
    }

    fn write_template_output(&self, file: &str, state: &WorkflowState) -> Result<(), ExecutorError> {
        let content = match state.variables.get("document") {
            Some(serde_json::Value::String(text)) => text.clone(),
            _ => serde_json::to_string_pretty(&state.variables).map_err(|err| ExecutorError::Failed(err.to_string()))?,
        };
        self.docs_root.write(file, content.as_bytes()).map_err(|err| ExecutorError::Failed(err.to_string()))?;
        self.outputs_written.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(file.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FilesystemStepExecutor;
    use bmad_core::ProjectId;
    use bmad_core::Timestamp;
    use bmad_core::WorkflowId;
    use bmad_core::WorkflowState;
    use bmad_workflow::StepExecutor;
    use cap_std::ambient_authority;
    use cap_std::fs::Dir;
    use serde_json::json;

    fn open_temp_root() -> (tempfile::TempDir, Dir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let cap = Dir::open_ambient_dir(dir.path(), ambient_authority()).expect("open ambient dir");
        (dir, cap)
    }

    #[test]
    fn writes_the_document_variable_verbatim() {
        let (_guard, root) = open_temp_root();
        let executor = FilesystemStepExecutor::new(root);
        let mut state = WorkflowState::new(ProjectId::from("proj"), WorkflowId::from("prd"), Timestamp::Logical(1));
        state.variables.insert("document".to_string(), json!("# Hello\n"));

        executor.write_template_output("output.md", &state).expect("write succeeds");
        assert_eq!(executor.outputs_written(), vec!["output.md".to_string()]);
    }

    #[test]
    fn falls_back_to_a_json_dump_without_a_document_variable() {
        let (_guard, root) = open_temp_root();
        let executor = FilesystemStepExecutor::new(root);
        let mut state = WorkflowState::new(ProjectId::from("proj"), WorkflowId::from("prd"), Timestamp::Logical(1));
        state.variables.insert("confidence".to_string(), json!(0.9));

        executor.write_template_output("output.md", &state).expect("write succeeds");
        assert_eq!(executor.outputs_written(), vec!["output.md".to_string()]);
    }

    #[test]
    fn execute_action_never_fails() {
        let (_guard, root) = open_temp_root();
        let executor = FilesystemStepExecutor::new(root);
        let mut state = WorkflowState::new(ProjectId::from("proj"), WorkflowId::from("prd"), Timestamp::Logical(1));
        executor.execute_action("do the thing", &mut state).expect("action always succeeds");
    }
}

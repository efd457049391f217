// crates/bmad-cli/src/main.rs
// ============================================================================
// Module: BMAD CLI Entry Point
// Description: Command dispatcher for workflow execution, escalation
// administration, and document validation.
// Purpose: Give the BMAD pipeline a thin command-line surface over its
// library crates, mapping the typed error taxonomy to process exit codes.
// Dependencies: bmad-core, bmad-escalation, bmad-store, bmad-validators,
// bmad-workflow, cap-std, clap, thiserror, tokio.
// ============================================================================

//! ## Overview
//! `bmad` has three top-level subcommands: `run` drives a workflow's
//! instructions to completion or a suspend point, `escalations` lists and
//! resolves pending human-input requests, and `validate` scores a document
//! against one of the validator family's gates. Every project operated on is
//! a plain directory; there is no client/server boundary here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use bmad_core::EscalationId;
use bmad_core::EscalationResponse;
use bmad_core::EscalationStatus;
use bmad_core::ProjectId;
use bmad_core::Timestamp;
use bmad_core::WorkflowId;
use bmad_core::WorkflowState;
use bmad_core::WorkflowStatus;
use bmad_escalation::EscalationError;
use bmad_escalation::EscalationQueue;
use bmad_escalation::ListFilter;
use bmad_store::StateStore;
use bmad_store::StoreError;
use bmad_validators::ArchitectureValidator;
use bmad_validators::PrdValidator;
use bmad_validators::SecurityGateValidator;
use bmad_workflow::DefinitionError;
use bmad_workflow::ExecutionMode;
use bmad_workflow::WorkflowDefinition;
use bmad_workflow::WorkflowEngine;
use bmad_workflow::WorkflowError;
use bmad_workflow::parse_instructions;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use thiserror::Error;

/// The filesystem-backed [`bmad_workflow::StepExecutor`] `run` drives the engine with.
mod executor;

use executor::FilesystemStepExecutor;

// ============================================================================
// SECTION: CLI Surface
// ============================================================================

/// BMAD pipeline orchestration command-line interface.
#[derive(Parser, Debug)]
#[command(name = "bmad", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a workflow's instructions to completion or a suspend point.
    Run(RunArgs),
    /// Escalation queue administration.
    Escalations {
        /// Selected escalations subcommand.
        #[command(subcommand)]
        command: EscalationsCommand,
    },
    /// Scores a document against a validator gate.
    Validate(ValidateArgs),
}

/// Arguments for the `run` command.
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Project root directory; state persists under `<project>/.bmad`.
    #[arg(long, value_name = "DIR")]
    project: PathBuf,
    /// Path to the workflow's YAML manifest.
    #[arg(long, value_name = "PATH")]
    workflow: PathBuf,
    /// Run in YOLO mode: auto-skip prompts and auto-approve template output
    /// instead of suspending on the first one encountered.
    #[arg(long)]
    yolo: bool,
}

/// Escalation queue subcommands.
#[derive(Subcommand, Debug)]
enum EscalationsCommand {
    /// Lists escalations, optionally filtered by status or workflow.
    List(EscalationsListArgs),
    /// Records a human response and resolves an escalation.
    Respond(EscalationsRespondArgs),
}

/// Arguments for `escalations list`.
#[derive(clap::Args, Debug)]
struct EscalationsListArgs {
    /// Project root directory.
    #[arg(long, value_name = "DIR")]
    project: PathBuf,
    /// Restrict to escalations with this status.
    #[arg(long, value_enum)]
    status: Option<StatusArg>,
    /// Restrict to escalations from this workflow.
    #[arg(long, value_name = "WORKFLOW_ID")]
    workflow: Option<String>,
}

/// Arguments for `escalations respond`.
#[derive(clap::Args, Debug)]
struct EscalationsRespondArgs {
    /// Project root directory.
    #[arg(long, value_name = "DIR")]
    project: PathBuf,
    /// Escalation id to resolve.
    #[arg(long, value_name = "ID")]
    id: String,
    /// The human's decision text.
    #[arg(long, value_name = "TEXT")]
    decision: String,
    /// The human's stated rationale.
    #[arg(long, value_name = "TEXT")]
    rationale: String,
}

/// Escalation status accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    /// Awaiting a human response.
    Pending,
    /// Already resolved.
    Resolved,
    /// Withdrawn without a response.
    Cancelled,
}

impl From<StatusArg> for EscalationStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => Self::Pending,
            StatusArg::Resolved => Self::Resolved,
            StatusArg::Cancelled => Self::Cancelled,
        }
    }
}

/// Arguments for the `validate` command.
#[derive(clap::Args, Debug)]
struct ValidateArgs {
    /// Path to the document to score.
    path: PathBuf,
    /// Which validator gate to run.
    #[arg(long, value_enum)]
    kind: ValidateKind,
    /// Path to the PRD, for architecture traceability scoring. Required
    /// only when `--kind architecture` is used.
    #[arg(long, value_name = "PATH")]
    prd: Option<PathBuf>,
}

/// Which validator family member to run.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ValidateKind {
    /// Architecture document validator.
    Architecture,
    /// PRD validator.
    Prd,
    /// Security gate validator.
    Security,
}

impl std::fmt::Display for ValidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Architecture => "architecture",
            Self::Prd => "prd",
            Self::Security => "security",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Typed CLI errors, each mapped to a distinct process exit code.
#[derive(Debug, Error)]
enum CliError {
    /// A required file or directory could not be found or opened.
    #[error("not found: {0}")]
    NotFound(String),
    /// The workflow manifest, instructions markup, or a document failed validation.
    #[error("validation error: {0}")]
    Validation(String),
    /// The requested operation's precondition does not hold.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// An unrecoverable filesystem or state-store failure occurred.
    #[error("fatal error: {0}")]
    Fatal(String),
}

impl CliError {
    /// Maps this error to the process exit code `main` returns.
    const fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound(_) => 3,
            Self::Validation(_) => 4,
            Self::Precondition(_) => 5,
            Self::Fatal(_) => 7,
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::Fatal(err.to_string())
    }
}

impl From<WorkflowError> for CliError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::AlreadyTerminal => Self::Precondition(err.to_string()),
            WorkflowError::Store(_) | WorkflowError::Executor(_) => Self::Fatal(err.to_string()),
        }
    }
}

impl From<DefinitionError> for CliError {
    fn from(err: DefinitionError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EscalationError> for CliError {
    fn from(err: EscalationError) -> Self {
        match err {
            EscalationError::NotFound(_) => Self::NotFound(err.to_string()),
            EscalationError::NotPending(_) => Self::Precondition(err.to_string()),
            EscalationError::Io(_) | EscalationError::Serialization(_) => Self::Fatal(err.to_string()),
        }
    }
}

type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes a line to stdout, ignoring a broken pipe the way a killed `| head` leaves one.
fn write_stdout_line(message: &str) {
    let mut stdout = std::io::stdout();
    let _ = writeln!(&mut stdout, "{message}");
}

/// Writes a line to stderr, ignoring a broken pipe the way a killed `| head` leaves one.
fn write_stderr_line(message: &str) {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning a process exit code.
fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            write_stderr_line(&format!("error: {err}"));
            ExitCode::from(err.exit_code())
        }
    }
}

/// Parses arguments and dispatches to the selected subcommand.
fn run() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => command_run(&args),
        Commands::Escalations { command } => command_escalations(command),
        Commands::Validate(args) => command_validate(&args),
    }
}

// ============================================================================
// SECTION: run
// ============================================================================

/// Loads a workflow's manifest and instructions, then executes or resumes it
/// against the project's persisted state.
fn command_run(args: &RunArgs) -> CliResult<()> {
    let manifest_text = fs::read_to_string(&args.workflow).map_err(|err| CliError::NotFound(format!("{}: {err}", args.workflow.display())))?;
    let definition = WorkflowDefinition::from_yaml(&manifest_text)?;

    let instructions_path = args.workflow.with_file_name(&definition.instructions);
    let instructions_text =
        fs::read_to_string(&instructions_path).map_err(|err| CliError::NotFound(format!("{}: {err}", instructions_path.display())))?;
    let steps = parse_instructions(&instructions_text)?;

    fs::create_dir_all(args.project.join(".bmad/projects")).map_err(|err| CliError::Fatal(err.to_string()))?;
    let projects_root =
        Dir::open_ambient_dir(args.project.join(".bmad/projects"), ambient_authority()).map_err(|err| CliError::Fatal(err.to_string()))?;
    let store = StateStore::new(projects_root);

    let project_id = ProjectId::from(definition.name.as_str());
    let workflow_id = WorkflowId::from(definition.name.as_str());
    let now = Timestamp::UnixMillis(unix_millis_now());

    let existing = store.load_state(&project_id)?;
    let mode = if args.yolo { ExecutionMode::Yolo } else { ExecutionMode::Interactive };

    let output_root = ensure_output_dir(&args.project)?;
    let executor = FilesystemStepExecutor::new(output_root);

    let engine = WorkflowEngine::new(&steps, &store, &executor, mode);
    let state = match existing {
        Some(state) if state.status == WorkflowStatus::Paused => engine.resume_from_state(state, now)?,
        Some(state) if state.status == WorkflowStatus::Completed => {
            return Err(CliError::Precondition(format!("workflow '{}' already completed", definition.name)));
        }
        Some(state) => engine.execute(state, now)?,
        None => engine.execute(WorkflowState::new(project_id, workflow_id, now), now)?,
    };

    write_stdout_line(&format!("workflow '{}' is now {} at step {}", definition.name, state.status, state.current_step));
    for output in executor.outputs_written() {
        write_stdout_line(&format!("wrote {output}"));
    }
    Ok(())
}

/// Opens (creating if absent) `<project>/docs` as a capability-scoped directory.
fn ensure_output_dir(project: &Path) -> CliResult<Dir> {
    let path = project.join("docs");
    fs::create_dir_all(&path).map_err(|err| CliError::Fatal(err.to_string()))?;
    Dir::open_ambient_dir(path, ambient_authority()).map_err(|err| CliError::Fatal(err.to_string()))
}

/// The current wall-clock time as unix milliseconds.
fn unix_millis_now() -> i64 {
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

// ============================================================================
// SECTION: escalations
// ============================================================================

/// Dispatches to the selected escalations subcommand.
fn command_escalations(command: EscalationsCommand) -> CliResult<()> {
    match command {
        EscalationsCommand::List(args) => command_escalations_list(&args),
        EscalationsCommand::Respond(args) => command_escalations_respond(&args),
    }
}

/// Opens (creating if absent) `<project>/.bmad/escalations` as an escalation queue.
fn open_escalation_queue(project: &Path) -> CliResult<EscalationQueue> {
    let path = project.join(".bmad/escalations");
    fs::create_dir_all(&path).map_err(|err| CliError::Fatal(err.to_string()))?;
    let root = Dir::open_ambient_dir(path, ambient_authority()).map_err(|err| CliError::Fatal(err.to_string()))?;
    Ok(EscalationQueue::new(root, Vec::new()))
}

/// Lists escalations matching the given status and workflow filters.
fn command_escalations_list(args: &EscalationsListArgs) -> CliResult<()> {
    let queue = open_escalation_queue(&args.project)?;
    let filter = ListFilter { status: args.status.map(Into::into), workflow_id: args.workflow.as_deref().map(WorkflowId::from) };
    let escalations = queue.list(&filter)?;
    if escalations.is_empty() {
        write_stdout_line("no escalations match the given filter");
        return Ok(());
    }
    for escalation in escalations {
        write_stdout_line(&format!("{}\t{}\t{}\t{}", escalation.id, escalation.status, escalation.workflow_id, escalation.question));
    }
    Ok(())
}

/// Records a human response and resolves the named escalation.
fn command_escalations_respond(args: &EscalationsRespondArgs) -> CliResult<()> {
    let queue = open_escalation_queue(&args.project)?;
    let id = EscalationId::from(args.id.as_str());
    let response = EscalationResponse { decision: args.decision.clone(), rationale: args.rationale.clone() };
    let resolved = queue.respond(&id, response, Timestamp::UnixMillis(unix_millis_now()))?;
    write_stdout_line(&format!("resolved {} ({})", resolved.id, resolved.status));
    Ok(())
}

// ============================================================================
// SECTION: validate
// ============================================================================

/// Scores the document at `args.path` against the selected validator gate.
fn command_validate(args: &ValidateArgs) -> CliResult<()> {
    let text = fs::read_to_string(&args.path).map_err(|err| CliError::NotFound(format!("{}: {err}", args.path.display())))?;
    let now = Timestamp::UnixMillis(unix_millis_now());

    let report = match args.kind {
        ValidateKind::Architecture => {
            let prd_text = match &args.prd {
                Some(path) => fs::read_to_string(path).map_err(|err| CliError::NotFound(format!("{}: {err}", path.display())))?,
                None => String::new(),
            };
            ArchitectureValidator::new().validate(&text, &prd_text, now)
        }
        ValidateKind::Prd => PrdValidator::new().validate(&text, now),
        ValidateKind::Security => SecurityGateValidator::new().validate(&text, now),
    };

    write_stdout_line(&format!("overall score: {:.1} ({})", report.overall_score, if report.passed { "PASS" } else { "FAIL" }));
    for dimension in &report.dimensions {
        write_stdout_line(&format!("  {}: {:.1}", dimension.name, dimension.score));
        for gap in &dimension.gaps {
            write_stdout_line(&format!("    gap[{}]: {}", gap.category, gap.message));
        }
        for recommendation in &dimension.recommendations {
            write_stdout_line(&format!("    recommend[{}]: {}", recommendation.category, recommendation.message));
        }
    }

    if report.passed {
        Ok(())
    } else {
        Err(CliError::Validation(format!("{} gate not met: {:.1}", args.kind, report.overall_score)))
    }
}

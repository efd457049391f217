// crates/bmad-store/src/store.rs
// ============================================================================
// Module: BMAD State Store
// Description: Atomic, per-project persistence for workflow state.
// Purpose: Give the workflow engine crash-safe saveState/loadState/purge with
// an invalidatable in-memory cache.
// Dependencies: bmad-core, cap-std, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`StateStore`] persists one [`WorkflowState`] per project under a
//! `cap_std::fs::Dir` capability rooted at the workspace's projects
//! directory. Writes go to a temp file and are renamed into place, so a
//! reader never observes a torn file and a crash mid-write leaves the prior
//! good state on disk.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use bmad_core::ProjectId;
use bmad_core::WorkflowState;
use cap_std::fs::Dir;
use thiserror::Error;

const STATE_FILE_NAME: &str = "state.json";
const STATE_TMP_FILE_NAME: &str = "state.json.tmp";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("state store io error: {0}")]
    Io(String),
    /// The persisted state could not be deserialized.
    #[error("state store deserialization error: {0}")]
    Deserialization(String),
    /// The state could not be serialized before writing.
    #[error("state store serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// ============================================================================
// SECTION: State Store
// ============================================================================

/// Persists [`WorkflowState`] atomically, one project directory per project id.
pub struct StateStore {
    /// Capability rooted at the directory that contains one subdirectory per project.
    projects_root: Dir,
    /// In-memory cache keyed by project id, invalidatable via [`StateStore::clear_cache`].
    cache: Mutex<HashMap<ProjectId, WorkflowState>>,
}

impl StateStore {
    /// Creates a state store rooted at `projects_root`.
    #[must_use]
    pub fn new(projects_root: Dir) -> Self {
        Self {
            projects_root,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Opens (creating if absent) the per-project subdirectory.
    fn open_project_dir(&self, project_id: &ProjectId) -> Result<Dir, StoreError> {
        self.projects_root.create_dir_all(project_id.as_str())?;
        Ok(self.projects_root.open_dir(project_id.as_str())?)
    }

    /// Persists `state`, replacing any previously saved state for the same project.
    ///
    /// Writes to a temp file in the project directory, then renames it into
    /// place; a crash between the write and the rename leaves the previous
    /// file untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on serialization or filesystem failure.
    pub fn save_state(&self, state: &WorkflowState) -> Result<(), StoreError> {
        let project_dir = self.open_project_dir(&state.project_id)?;
        let bytes = serde_json::to_vec_pretty(state).map_err(|err| StoreError::Serialization(err.to_string()))?;

        {
            let mut tmp = project_dir.create(STATE_TMP_FILE_NAME)?;
            use std::io::Write;
            tmp.write_all(&bytes)?;
            tmp.sync_all()?;
        }
        project_dir.rename(STATE_TMP_FILE_NAME, &project_dir, STATE_FILE_NAME)?;

        let mut cache = self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.insert(state.project_id.clone(), state.clone());
        Ok(())
    }

    /// Loads the state for `project_id`, preferring the in-memory cache.
    ///
    /// Returns `Ok(None)` when no state has ever been saved for this project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filesystem failure or a corrupted file.
    pub fn load_state(&self, project_id: &ProjectId) -> Result<Option<WorkflowState>, StoreError> {
        {
            let cache = self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(state) = cache.get(project_id) {
                return Ok(Some(state.clone()));
            }
        }

        let project_dir = self.open_project_dir(project_id)?;
        let bytes = match project_dir.read(STATE_FILE_NAME) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let state: WorkflowState =
            serde_json::from_slice(&bytes).map_err(|err| StoreError::Deserialization(err.to_string()))?;

        let mut cache = self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.insert(project_id.clone(), state.clone());
        Ok(Some(state))
    }

    /// Drops every cached state, forcing the next [`StateStore::load_state`]
    /// call to re-read from disk. Used by tests and to pick up an
    /// externally-edited state file.
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.clear();
    }

    /// Removes all persisted state for `project_id`, including the cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filesystem failure. Purging a project with
    /// no saved state is not an error.
    pub fn purge(&self, project_id: &ProjectId) -> Result<(), StoreError> {
        let project_dir = self.open_project_dir(project_id)?;
        match project_dir.remove_file(STATE_FILE_NAME) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        let mut cache = self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.remove(project_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StateStore;
    use bmad_core::ProjectId;
    use bmad_core::Timestamp;
    use bmad_core::WorkflowId;
    use bmad_core::WorkflowState;
    use bmad_core::WorkflowStatus;
    use cap_std::ambient_authority;
    use cap_std::fs::Dir;

    fn open_temp_root() -> (tempfile::TempDir, Dir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let cap = Dir::open_ambient_dir(dir.path(), ambient_authority()).expect("open ambient dir");
        (dir, cap)
    }

    #[test]
    fn round_trips_saved_state() {
        let (_guard, root) = open_temp_root();
        let store = StateStore::new(root);
        let state = WorkflowState::new(ProjectId::from("proj-1"), WorkflowId::from("prd"), Timestamp::Logical(1));

        store.save_state(&state).expect("save succeeds");
        let loaded = store.load_state(&state.project_id).expect("load succeeds");
        assert_eq!(loaded, Some(state));
    }

    #[test]
    fn missing_project_loads_none() {
        let (_guard, root) = open_temp_root();
        let store = StateStore::new(root);
        let loaded = store.load_state(&ProjectId::from("missing")).expect("load succeeds");
        assert_eq!(loaded, None);
    }

    #[test]
    fn clear_cache_forces_a_re_read() {
        let (_guard, root) = open_temp_root();
        let store = StateStore::new(root);
        let mut state = WorkflowState::new(ProjectId::from("proj-1"), WorkflowId::from("prd"), Timestamp::Logical(1));
        store.save_state(&state).expect("save succeeds");

        state.status = WorkflowStatus::Completed;
        state.current_step = 5;
        // Simulate an external edit bypassing the cache.
        store.clear_cache();
        store.save_state(&state).expect("save succeeds");
        let loaded = store.load_state(&state.project_id).expect("load succeeds");
        assert_eq!(loaded.as_ref().map(|s| s.status), Some(WorkflowStatus::Completed));
    }

    #[test]
    fn purge_removes_state() {
        let (_guard, root) = open_temp_root();
        let store = StateStore::new(root);
        let state = WorkflowState::new(ProjectId::from("proj-1"), WorkflowId::from("prd"), Timestamp::Logical(1));
        store.save_state(&state).expect("save succeeds");
        store.purge(&state.project_id).expect("purge succeeds");
        let loaded = store.load_state(&state.project_id).expect("load succeeds");
        assert_eq!(loaded, None);
    }

    proptest::proptest! {
        /// Saving a state with an arbitrary set of string-valued variables and
        /// a step count, then reloading past a cleared cache (forcing a disk
        /// read), always returns exactly what was saved.
        #[test]
        fn save_then_clear_cache_then_load_round_trips_arbitrary_variables(
            current_step in 0u32..500,
            variables in proptest::collection::btree_map("[a-z][a-z0-9_]{0,12}", "[a-zA-Z0-9 _.-]{0,40}", 0..10),
        ) {
            let (_guard, root) = open_temp_root();
            let store = StateStore::new(root);
            let mut state = WorkflowState::new(ProjectId::from("proj-roundtrip"), WorkflowId::from("prd"), Timestamp::Logical(1));
            state.current_step = current_step;
            state.variables = variables.into_iter().map(|(k, v)| (k, serde_json::Value::String(v))).collect();

            store.save_state(&state).expect("save succeeds");
            store.clear_cache();
            let loaded = store.load_state(&state.project_id).expect("load succeeds");
            assert_eq!(loaded, Some(state));
        }
    }
}

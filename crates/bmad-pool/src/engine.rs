// crates/bmad-pool/src/engine.rs
// ============================================================================
// Module: BMAD Agent Pool
// Description: Capacity-limited agent registry with FIFO queueing, lifecycle
// events, and per-agent/global cost accounting.
// Purpose: Implement createAgent/invokeAgent/destroyAgent/shutdown per the
// Started -> Invoked -> {Completed, Failed} state machine.
// Dependencies: bmad-core, bmad-events, thiserror, tokio
// ============================================================================

//! ## Overview
//! [`AgentPool`] admits agents up to `max_concurrent_agents`; once capacity
//! is exhausted, further `create_agent` calls queue FIFO and resolve when a
//! slot frees via `destroy_agent`. Lifecycle events for a single agent are
//! always observed `Started -> Invoked -> Completed` in that order; ordering
//! across agents is not guaranteed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use bmad_core::Agent;
use bmad_core::AgentContext;
use bmad_core::AgentId;
use bmad_core::AgentLifecycle;
use bmad_core::LlmClient;
use bmad_core::LlmError;
use bmad_core::Timestamp;
use bmad_events::AgentEvent;
use bmad_events::EventKind;
use bmad_events::Sink;
use thiserror::Error;
use tokio::sync::oneshot;

/// Default heartbeat interval for hung-agent detection (§9 open question).
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Whether an agent last active at `last_active` is idle past `timeout`
/// measured against `now_millis`. Always `false` for a logical `last_active`.
fn is_hung(last_active: Timestamp, now_millis: i64, timeout: Duration) -> bool {
    let Some(last_millis) = last_active.as_unix_millis() else {
        return false;
    };
    match now_millis.checked_sub(last_millis) {
        Some(elapsed_millis) if elapsed_millis >= 0 => u128::from(elapsed_millis.unsigned_abs()) >= timeout.as_millis(),
        _ => false,
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for an [`AgentPool`].
#[derive(Debug, Clone, Copy)]
pub struct AgentPoolConfig {
    /// Maximum number of agents admitted concurrently.
    pub max_concurrent_agents: usize,
    /// Whether agents idle past `heartbeat_timeout` are auto-cleaned.
    pub auto_cleanup_hung_agents: bool,
    /// Heartbeat timeout used when `auto_cleanup_hung_agents` is set.
    pub heartbeat_timeout: Duration,
}

impl Default for AgentPoolConfig {
    fn default() -> Self {
        Self {
            max_concurrent_agents: 4,
            auto_cleanup_hung_agents: false,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the agent pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No agent exists with the given id.
    #[error("agent not found: {0}")]
    NotFound(AgentId),
    /// The underlying LLM invocation failed.
    #[error(transparent)]
    Invocation(#[from] LlmError),
    /// The pool was shut down while this request was queued.
    #[error("cancelled by pool shutdown")]
    Cancelled,
}

// ============================================================================
// SECTION: Pool State
// ============================================================================

/// A `create_agent` call parked until a slot frees.
struct QueuedRequest {
    /// Persona name for the agent once admitted.
    name: String,
    /// Persona prompt text for the agent once admitted.
    persona: String,
    /// Context the agent will be created with once admitted.
    context: AgentContext,
    /// Resolved with the new agent's id, or [`PoolError::Cancelled`] on shutdown.
    responder: oneshot::Sender<Result<AgentId, PoolError>>,
}

/// Mutable pool state guarded by a single mutex.
struct PoolState {
    /// Currently admitted agents, keyed by id.
    active: HashMap<AgentId, Agent>,
    /// Requests waiting for a free slot, in admission order.
    queue: VecDeque<QueuedRequest>,
    /// Total accrued cost per persona name, across all agents with that name.
    by_agent_cost: BTreeMap<String, f64>,
    /// Counter used to allocate the next agent id.
    next_id: u64,
}

impl PoolState {
    /// Allocates the next sequential agent id.
    fn allocate_id(&mut self) -> AgentId {
        self.next_id += 1;
        AgentId::from(format!("agent-{}", self.next_id))
    }
}

// ============================================================================
// SECTION: Agent Pool
// ============================================================================

/// A bounded, event-emitting registry of running agents.
pub struct AgentPool {
    /// Capacity and heartbeat configuration.
    config: AgentPoolConfig,
    /// Shared LLM client every invocation is issued against.
    llm_client: Arc<dyn LlmClient>,
    /// Lifecycle event destinations, invoked in order on every event.
    sinks: Vec<Box<dyn Sink>>,
    /// Mutex-guarded active/queued/cost state.
    state: Mutex<PoolState>,
}

impl AgentPool {
    /// Creates a pool with the given configuration, LLM client, and event sinks.
    #[must_use]
    pub fn new(config: AgentPoolConfig, llm_client: Arc<dyn LlmClient>, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self {
            config,
            llm_client,
            sinks,
            state: Mutex::new(PoolState {
                active: HashMap::new(),
                queue: VecDeque::new(),
                by_agent_cost: BTreeMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Delivers `event` to every configured sink, ignoring individual sink failures.
    fn emit(&self, event: AgentEvent) {
        let kind = EventKind::Agent(event);
        for sink in &self.sinks {
            let _ = sink.emit(&kind);
        }
    }

    /// Allocates an id and inserts a `Started` agent into `state.active`.
    fn admit(state: &mut PoolState, name: String, persona: String, context: AgentContext, at: Timestamp) -> AgentId {
        let id = state.allocate_id();
        let agent = Agent {
            id: id.clone(),
            name,
            persona,
            context,
            estimated_cost: 0.0,
            lifecycle: AgentLifecycle::Started,
            last_active: at,
        };
        state.active.insert(id.clone(), agent);
        id
    }

    /// Admits an agent immediately if capacity allows, otherwise queues the
    /// request FIFO and resolves once a slot frees via [`AgentPool::destroy_agent`].
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Cancelled`] if the pool is shut down while queued.
    pub async fn create_agent(&self, name: impl Into<String>, persona: impl Into<String>, context: AgentContext, at: Timestamp) -> Result<AgentId, PoolError> {
        let name = name.into();
        let persona = persona.into();

        let immediate = {
            let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if state.active.len() < self.config.max_concurrent_agents {
                Some(Self::admit(&mut state, name.clone(), persona.clone(), context.clone(), at))
            } else {
                None
            }
        };

        let id = if let Some(id) = immediate {
            id
        } else {
            let (tx, rx) = oneshot::channel();
            {
                let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                state.queue.push_back(QueuedRequest { name: name.clone(), persona, context, responder: tx });
            }
            rx.await.map_err(|_| PoolError::Cancelled)??
        };

        self.emit(AgentEvent::Started { agent_id: id.clone(), name, at });
        Ok(id)
    }

    /// Returns the number of requests currently queued awaiting a free slot.
    #[must_use]
    pub fn queued_tasks(&self) -> usize {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).queue.len()
    }

    /// Returns the ids of all currently active agents.
    #[must_use]
    pub fn active_agents(&self) -> Vec<AgentId> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).active.keys().cloned().collect()
    }

    /// Invokes the agent's LLM client with `prompt`, accruing cost on success.
    ///
    /// On failure, the agent remains in `Invoked` state so the caller may retry.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] if the agent is unknown, or
    /// [`PoolError::Invocation`] if the underlying call fails.
    pub async fn invoke_agent(&self, id: &AgentId, prompt: &str, at: Timestamp) -> Result<String, PoolError> {
        let name = {
            let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let agent = state.active.get_mut(id).ok_or_else(|| PoolError::NotFound(id.clone()))?;
            agent.lifecycle = AgentLifecycle::Invoked;
            agent.name.clone()
        };
        self.emit(AgentEvent::Invoked { agent_id: id.clone(), at });

        match self.llm_client.invoke(prompt, 0.3).await {
            Ok(text) => {
                let cost = self.llm_client.estimate_cost(self.llm_client.last_token_usage());
                let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                if let Some(agent) = state.active.get_mut(id) {
                    agent.accrue_cost(cost);
                    agent.lifecycle = AgentLifecycle::Invoked;
                    agent.last_active = at;
                }
                *state.by_agent_cost.entry(name).or_insert(0.0) += cost;
                Ok(text)
            }
            Err(err) => {
                {
                    let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    if let Some(agent) = state.active.get_mut(id) {
                        agent.last_active = at;
                    }
                }
                self.emit(AgentEvent::Failed { agent_id: id.clone(), reason: err.to_string(), at });
                Err(err.into())
            }
        }
    }

    /// Destroys every active agent idle past `heartbeat_timeout`, as measured
    /// against `at`. A no-op when `auto_cleanup_hung_agents` is unset, or for
    /// agents whose `last_active` was recorded with a [`Timestamp::Logical`]
    /// value (heartbeat sweeping is a wall-clock concept; logical time is a
    /// test-determinism aid, not a duration).
    ///
    /// Returns the ids of every agent swept, in no particular order.
    pub fn sweep_hung_agents(&self, at: Timestamp) -> Vec<AgentId> {
        if !self.config.auto_cleanup_hung_agents {
            return Vec::new();
        }
        let Some(now_millis) = at.as_unix_millis() else {
            return Vec::new();
        };

        let hung: Vec<AgentId> = {
            let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let hung_ids: Vec<AgentId> = state
                .active
                .values()
                .filter(|agent| is_hung(agent.last_active, now_millis, self.config.heartbeat_timeout))
                .map(|agent| agent.id.clone())
                .collect();
            for id in &hung_ids {
                state.active.remove(id);
                if let Some(next) = state.queue.pop_front() {
                    let new_id = Self::admit(&mut state, next.name, next.persona, next.context, at);
                    let _ = next.responder.send(Ok(new_id));
                }
            }
            hung_ids
        };

        for id in &hung {
            self.emit(AgentEvent::Cancelled { agent_id: id.clone(), at });
        }
        hung
    }

    /// Destroys the agent, marks it completed, emits a completion event, and
    /// services the head of the queue if one is waiting.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] if the agent is unknown.
    pub fn destroy_agent(&self, id: &AgentId, at: Timestamp) -> Result<(), PoolError> {
        let total_cost = {
            let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let agent = state.active.remove(id).ok_or_else(|| PoolError::NotFound(id.clone()))?;
            let total_cost = agent.estimated_cost;

            if let Some(next) = state.queue.pop_front() {
                let new_id = Self::admit(&mut state, next.name, next.persona, next.context, at);
                let _ = next.responder.send(Ok(new_id));
            }
            total_cost
        };
        self.emit(AgentEvent::Completed { agent_id: id.clone(), total_cost, at });
        Ok(())
    }

    /// Returns accumulated cost for `agent_name` across all invocations.
    #[must_use]
    pub fn cost_for_agent(&self, agent_name: &str) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .by_agent_cost
            .get(agent_name)
            .copied()
            .unwrap_or(0.0)
    }

    /// Destroys every active agent and cancels every queued request.
    pub fn shutdown(&self, at: Timestamp) {
        let (active_ids, queued): (Vec<AgentId>, VecDeque<QueuedRequest>) = {
            let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let ids: Vec<AgentId> = state.active.keys().cloned().collect();
            state.active.clear();
            let queued = std::mem::take(&mut state.queue);
            (ids, queued)
        };
        for id in active_ids {
            self.emit(AgentEvent::Cancelled { agent_id: id, at });
        }
        for request in queued {
            let _ = request.responder.send(Err(PoolError::Cancelled));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AgentPool;
    use super::AgentPoolConfig;
    use std::time::Duration;
    use bmad_core::AgentContext;
    use bmad_core::ProjectId;
    use bmad_core::StubLlmClient;
    use bmad_core::Timestamp;
    use bmad_core::WorkflowId;
    use bmad_core::WorkflowState;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn context() -> AgentContext {
        AgentContext {
            onboarding_docs: vec![],
            workflow_state: WorkflowState::new(ProjectId::from("p"), WorkflowId::from("prd"), Timestamp::Logical(0)),
            task_description: "draft the PRD".to_string(),
            overlay: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn cost_accrues_per_agent_name() {
        let mut llm = StubLlmClient::new("ok");
        llm.fixed_cost = 0.02;
        let pool = AgentPool::new(AgentPoolConfig::default(), Arc::new(llm), vec![]);
        let id = pool.create_agent("mary", "persona", context(), Timestamp::Logical(1)).await.expect("admit");
        pool.invoke_agent(&id, "draft section 1", Timestamp::Logical(2)).await.expect("invoke succeeds");
        assert!((pool.cost_for_agent("mary") - 0.02).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn sweep_hung_agents_is_a_no_op_when_disabled() {
        let pool = AgentPool::new(AgentPoolConfig::default(), Arc::new(StubLlmClient::new("ok")), vec![]);
        let _id = pool.create_agent("mary", "persona", context(), Timestamp::UnixMillis(0)).await.expect("admit");
        let swept = pool.sweep_hung_agents(Timestamp::UnixMillis(10 * 60 * 1000 + 1));
        assert!(swept.is_empty());
        assert_eq!(pool.active_agents().len(), 1);
    }

    #[tokio::test]
    async fn sweep_hung_agents_removes_idle_agents_past_the_heartbeat_timeout() {
        let pool = AgentPool::new(
            AgentPoolConfig { auto_cleanup_hung_agents: true, heartbeat_timeout: Duration::from_secs(600), ..Default::default() },
            Arc::new(StubLlmClient::new("ok")),
            vec![],
        );
        let id = pool.create_agent("mary", "persona", context(), Timestamp::UnixMillis(0)).await.expect("admit");

        let still_fresh = pool.sweep_hung_agents(Timestamp::UnixMillis(599_000));
        assert!(still_fresh.is_empty());

        let swept = pool.sweep_hung_agents(Timestamp::UnixMillis(600_000));
        assert_eq!(swept, vec![id]);
        assert!(pool.active_agents().is_empty());
    }

    #[tokio::test]
    async fn sweep_hung_agents_ignores_logical_timestamps() {
        let pool = AgentPool::new(
            AgentPoolConfig { auto_cleanup_hung_agents: true, heartbeat_timeout: Duration::from_secs(600), ..Default::default() },
            Arc::new(StubLlmClient::new("ok")),
            vec![],
        );
        let _id = pool.create_agent("mary", "persona", context(), Timestamp::Logical(1)).await.expect("admit");
        let swept = pool.sweep_hung_agents(Timestamp::Logical(999_999));
        assert!(swept.is_empty());
    }

    #[tokio::test]
    async fn shutdown_cancels_queued_requests() {
        let pool = Arc::new(AgentPool::new(
            AgentPoolConfig { max_concurrent_agents: 1, ..Default::default() },
            Arc::new(StubLlmClient::new("ok")),
            vec![],
        ));
        let _first = pool.create_agent("mary", "persona", context(), Timestamp::Logical(1)).await.expect("admit 1");

        let pool_clone = Arc::clone(&pool);
        let queued = tokio::spawn(async move { pool_clone.create_agent("john", "persona", context(), Timestamp::Logical(2)).await });
        tokio::task::yield_now().await;

        pool.shutdown(Timestamp::Logical(3));
        let result = queued.await.expect("join");
        assert!(result.is_err());
    }
}

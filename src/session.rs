//! Per-client working state and the in-memory session store.
//!
//! A session collects containers and stones, runs the distribution on demand
//! and keeps the last result until the next mutation. Sessions live until they
//! are dropped explicitly; nothing is persisted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::distributor::{DistributionConfig, DistributionOutcome, distribute_with_config};
use crate::generator::Fixture;
use crate::model::{Container, Stone, ValidationError};

/// Errors raised by session operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("Session {0} does not exist")]
    NotFound(u64),
    #[error("Container {0} does not exist")]
    ContainerNotFound(usize),
    #[error("Stone {0} does not exist")]
    StoneNotFound(usize),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Copy of the data a sorting run works on.
///
/// `revision` identifies the session state the copy was taken from.
#[derive(Clone, Debug)]
pub struct SortInput {
    pub stones: Vec<Stone>,
    pub containers: Vec<Container>,
    pub revision: u64,
}

impl SortInput {
    /// Runs the distribution on this copy.
    pub fn run(&self, config: DistributionConfig) -> DistributionOutcome {
        distribute_with_config(&self.stones, &self.containers, config)
    }
}

/// Containers, stones and the last sorting result of one client.
///
/// Container ids and stone numbers come from counters that never go back,
/// so removing an entry never leads to a reused identity.
#[derive(Clone, Debug, Default)]
pub struct SortingSession {
    containers: Vec<Container>,
    stones: Vec<Stone>,
    result: Option<DistributionOutcome>,
    last_container_id: usize,
    last_stone_number: usize,
    revision: u64,
}

impl SortingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn stones(&self) -> &[Stone] {
        &self.stones
    }

    /// Result of the last sort, cleared by every mutation.
    pub fn result(&self) -> Option<&DistributionOutcome> {
        self.result.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Adds a container; the name defaults to `Container {id}`.
    pub fn add_container(
        &mut self,
        name: Option<String>,
        target_mass: f64,
        tolerance: f64,
    ) -> Result<&Container, SessionError> {
        let container = Container::new(self.last_container_id + 1, name, target_mass, tolerance)?;
        self.last_container_id = container.id;
        self.touch();
        self.containers.push(container);
        Ok(&self.containers[self.containers.len() - 1])
    }

    /// Adds a stone with the next free number and its matching color.
    pub fn add_stone(&mut self, mass: f64) -> Result<&Stone, SessionError> {
        let stone = Stone::new(self.last_stone_number + 1, mass)?;
        self.last_stone_number = stone.id;
        self.touch();
        self.stones.push(stone);
        Ok(&self.stones[self.stones.len() - 1])
    }

    pub fn remove_container(&mut self, id: usize) -> Result<Container, SessionError> {
        let index = self
            .containers
            .iter()
            .position(|c| c.id == id)
            .ok_or(SessionError::ContainerNotFound(id))?;
        self.touch();
        Ok(self.containers.remove(index))
    }

    pub fn remove_stone(&mut self, number: usize) -> Result<Stone, SessionError> {
        let index = self
            .stones
            .iter()
            .position(|s| s.id == number)
            .ok_or(SessionError::StoneNotFound(number))?;
        self.touch();
        Ok(self.stones.remove(index))
    }

    /// Removes all containers, stones and the stored result.
    pub fn clear(&mut self) {
        self.containers.clear();
        self.stones.clear();
        self.touch();
    }

    /// Replaces the session data with a generated fixture.
    pub fn load_fixture(&mut self, fixture: Fixture) {
        self.last_container_id = fixture.containers.iter().map(|c| c.id).max().unwrap_or(0);
        self.last_stone_number = fixture.stones.iter().map(|s| s.id).max().unwrap_or(0);
        self.containers = fixture.containers;
        self.stones = fixture.stones;
        self.touch();
    }

    /// Copies the current data for a sorting run outside the session lock.
    pub fn snapshot(&self) -> SortInput {
        SortInput {
            stones: self.stones.clone(),
            containers: self.containers.clone(),
            revision: self.revision,
        }
    }

    /// Stores a result computed from `snapshot()`.
    ///
    /// Returns `false` and drops the result when the session changed meanwhile.
    pub fn store_result(&mut self, revision: u64, outcome: DistributionOutcome) -> bool {
        if revision != self.revision {
            debug!(
                expected = revision,
                current = self.revision,
                "discarding stale result"
            );
            return false;
        }
        self.result = Some(outcome);
        true
    }

    /// Sorts in place and stores the result.
    pub fn sort(&mut self, config: DistributionConfig) -> &DistributionOutcome {
        let outcome = distribute_with_config(&self.stones, &self.containers, config);
        self.result.insert(outcome)
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.result = None;
    }
}

/// Bounds on the number and lifetime of stored sessions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionLimits {
    /// Live sessions kept at once; creating one more evicts the least recently used
    pub max_sessions: usize,
    /// Sessions untouched for longer than this are dropped
    pub idle_timeout: Duration,
}

impl SessionLimits {
    pub const DEFAULT_MAX_SESSIONS: usize = 1_000;
    /// Two weeks, the usual lifetime of a browser session cookie.
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(14 * 24 * 60 * 60);
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: Self::DEFAULT_MAX_SESSIONS,
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
        }
    }
}

#[derive(Debug)]
struct StoredSession {
    session: SortingSession,
    last_access: Instant,
}

#[derive(Debug, Default)]
struct StoreInner {
    sessions: HashMap<u64, StoredSession>,
    last_id: u64,
    limits: SessionLimits,
}

impl StoreInner {
    fn is_expired(&self, entry: &StoredSession, now: Instant) -> bool {
        now.saturating_duration_since(entry.last_access) > self.limits.idle_timeout
    }

    fn purge_expired(&mut self, now: Instant) {
        let timeout = self.limits.idle_timeout;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.saturating_duration_since(entry.last_access) <= timeout);
        let dropped = before - self.sessions.len();
        if dropped > 0 {
            debug!(dropped, "expired idle sessions");
        }
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|(id, entry)| (entry.last_access, **id))
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            self.sessions.remove(&id);
            debug!(session = id, "evicted least recently used session");
        }
    }
}

/// Thread-safe map of live sessions.
///
/// Cloning the store shares the same sessions. Idle sessions expire and the
/// number of live sessions is capped, see `SessionLimits`.
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: SessionLimits) -> Self {
        let inner = StoreInner {
            limits,
            ..StoreInner::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates an empty session and returns its id.
    pub fn create(&self) -> u64 {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.purge_expired(now);
        while !inner.sessions.is_empty() && inner.sessions.len() >= inner.limits.max_sessions {
            inner.evict_least_recent();
        }

        inner.last_id += 1;
        let id = inner.last_id;
        inner.sessions.insert(
            id,
            StoredSession {
                session: SortingSession::new(),
                last_access: now,
            },
        );
        debug!(session = id, "session created");
        id
    }

    /// Drops a session.
    pub fn remove(&self, id: u64) -> Result<(), SessionError> {
        match self.lock().sessions.remove(&id) {
            Some(_) => {
                debug!(session = id, "session dropped");
                Ok(())
            }
            None => Err(SessionError::NotFound(id)),
        }
    }

    /// Runs `f` on a session while holding the store lock.
    ///
    /// Counts as activity for the idle timeout. An expired session is dropped
    /// and reported as not found.
    pub fn with_session<T>(
        &self,
        id: u64,
        f: impl FnOnce(&mut SortingSession) -> T,
    ) -> Result<T, SessionError> {
        let now = Instant::now();
        let mut inner = self.lock();
        let expired = match inner.sessions.get(&id) {
            Some(entry) => inner.is_expired(entry, now),
            None => return Err(SessionError::NotFound(id)),
        };
        if expired {
            inner.sessions.remove(&id);
            debug!(session = id, "session expired");
            return Err(SessionError::NotFound(id));
        }

        let entry = inner.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        entry.last_access = now;
        Ok(f(&mut entry.session))
    }

    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Assignment search across all containers.
//!
//! Containers are processed by descending target mass. For every container the
//! enumerator proposes a ranked shortlist of stone subsets from the stones still
//! available; the search commits to the best one, continues with the next
//! container and backtracks to the next proposal when a later container cannot
//! be filled. The first complete assignment wins.
//!
//! The backtracking runs on an explicit frame stack, so the depth of the search
//! is bounded by the heap rather than the call stack.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::combinations::{Candidate, enumerate_within};
use crate::model::{Container, Stone};
use crate::types::EPSILON_MASS;

/// Configuration for the distribution engine.
///
/// The caps trade completeness for runtime: a full assignment that needs a
/// subset larger than `max_combination_size`, or a subset ranked below
/// `max_candidates` for its container, is not found.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DistributionConfig {
    /// Largest subset size tried per container
    pub max_combination_size: usize,
    /// Number of ranked subsets kept per container
    pub max_candidates: usize,
    /// Slack for window comparisons
    pub mass_epsilon: f64,
    /// Work budget before the search gives up (`None` = unbounded).
    ///
    /// Every subset evaluated during enumeration and every committed
    /// candidate costs one unit.
    pub node_limit: Option<u64>,
}

impl DistributionConfig {
    pub const DEFAULT_MAX_COMBINATION_SIZE: usize = 5;
    pub const DEFAULT_MAX_CANDIDATES: usize = 20;
    pub const DEFAULT_MASS_EPSILON: f64 = EPSILON_MASS;
    pub const DEFAULT_NODE_LIMIT: Option<u64> = Some(50_000_000);

    /// Creates a builder for a custom configuration.
    pub fn builder() -> DistributionConfigBuilder {
        DistributionConfigBuilder::default()
    }
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            max_combination_size: Self::DEFAULT_MAX_COMBINATION_SIZE,
            max_candidates: Self::DEFAULT_MAX_CANDIDATES,
            mass_epsilon: Self::DEFAULT_MASS_EPSILON,
            node_limit: Self::DEFAULT_NODE_LIMIT,
        }
    }
}

/// Builder for `DistributionConfig`.
#[derive(Clone, Debug, Default)]
pub struct DistributionConfigBuilder {
    config: DistributionConfig,
}

impl DistributionConfigBuilder {
    /// Sets the largest subset size per container.
    pub fn max_combination_size(mut self, size: usize) -> Self {
        self.config.max_combination_size = size;
        self
    }

    /// Sets the number of candidates kept per container.
    pub fn max_candidates(mut self, count: usize) -> Self {
        self.config.max_candidates = count;
        self
    }

    /// Sets the comparison slack.
    pub fn mass_epsilon(mut self, epsilon: f64) -> Self {
        self.config.mass_epsilon = epsilon;
        self
    }

    /// Sets the search-node budget.
    pub fn node_limit(mut self, limit: Option<u64>) -> Self {
        self.config.node_limit = limit;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> DistributionConfig {
        self.config
    }
}

/// The stones chosen for one container.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignedContainer {
    pub container: Container,
    pub stones: Vec<Stone>,
    pub total_mass: f64,
    pub deviation: f64,
}

impl AssignedContainer {
    fn from_candidate(container: &Container, candidate: &Candidate) -> Self {
        Self {
            container: container.clone(),
            stones: candidate.stones.clone(),
            total_mass: candidate.total_mass,
            deviation: candidate.deviation,
        }
    }
}

/// A complete assignment: one entry per input container, in search order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignment {
    entries: Vec<AssignedContainer>,
}

impl Assignment {
    pub fn entries(&self) -> &[AssignedContainer] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<AssignedContainer> {
        self.entries
    }

    /// Looks up the entry of a container.
    pub fn get(&self, container_id: usize) -> Option<&AssignedContainer> {
        self.entries.iter().find(|e| e.container.id == container_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of all assigned stones.
    pub fn stone_ids(&self) -> Vec<usize> {
        self.entries
            .iter()
            .flat_map(|e| e.stones.iter().map(|s| s.id))
            .collect()
    }

    /// Sum of all per-container deviations.
    pub fn total_deviation(&self) -> f64 {
        self.entries.iter().map(|e| e.deviation).sum()
    }
}

/// Reasons why no assignment is returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// No stones or no containers were supplied.
    NothingToDo,
    /// Every branch was explored without filling all containers.
    Infeasible,
    /// The work budget ran out before the search finished.
    SearchLimitReached { work: u64 },
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::NothingToDo => "nothing_to_do",
            FailureReason::Infeasible => "infeasible",
            FailureReason::SearchLimitReached { .. } => "search_limit_reached",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::NothingToDo => {
                write!(f, "Add containers and stones before sorting")
            }
            FailureReason::Infeasible => {
                write!(
                    f,
                    "No distribution of the stones across the containers was found"
                )
            }
            FailureReason::SearchLimitReached { work } => {
                write!(f, "Search stopped after {} steps without a result", work)
            }
        }
    }
}

/// Tagged result of a distribution run.
#[derive(Clone, Debug, PartialEq)]
pub enum DistributionResult {
    Success(Assignment),
    Failure(FailureReason),
}

/// Counters collected during one search.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchStatistics {
    /// Committed candidates
    pub nodes_explored: u64,
    /// Subsets evaluated while enumerating candidates
    pub subsets_examined: u64,
    /// Commits that were undone
    pub backtracks: u64,
    /// Deepest frame stack seen
    pub max_depth: usize,
    pub elapsed: Duration,
}

impl SearchStatistics {
    /// Units charged against `node_limit`.
    pub fn work(&self) -> u64 {
        self.nodes_explored + self.subsets_examined
    }
}

/// Result of a distribution run together with its statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionOutcome {
    pub result: DistributionResult,
    pub statistics: SearchStatistics,
}

impl DistributionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.result, DistributionResult::Success(_))
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match &self.result {
            DistributionResult::Success(assignment) => Some(assignment),
            DistributionResult::Failure(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match &self.result {
            DistributionResult::Success(_) => None,
            DistributionResult::Failure(reason) => Some(reason),
        }
    }
}

/// Distributes stones across containers with the default configuration.
///
/// # Examples
/// ```
/// use stone_sorter::distributor::distribute;
/// use stone_sorter::model::{Container, Stone};
///
/// let containers = vec![Container::new(1, None, 10.0, 1.0).unwrap()];
/// let stones = vec![Stone::new(1, 5.0).unwrap(), Stone::new(2, 5.5).unwrap()];
///
/// let outcome = distribute(&stones, &containers);
/// let assignment = outcome.assignment().expect("feasible");
/// assert_eq!(assignment.get(1).unwrap().stones.len(), 2);
/// ```
pub fn distribute(stones: &[Stone], containers: &[Container]) -> DistributionOutcome {
    distribute_with_config(stones, containers, DistributionConfig::default())
}

/// Distribution with a custom configuration.
///
/// # Parameters
/// * `stones` - Available stones; each is used at most once
/// * `containers` - Containers that must all be filled
/// * `config` - Enumeration caps, comparison slack and node budget
///
/// # Returns
/// `DistributionOutcome` with either a complete assignment or the failure reason
#[instrument(skip_all, fields(stones = stones.len(), containers = containers.len()))]
pub fn distribute_with_config(
    stones: &[Stone],
    containers: &[Container],
    config: DistributionConfig,
) -> DistributionOutcome {
    let started = Instant::now();
    let mut statistics = SearchStatistics::default();

    if stones.is_empty() || containers.is_empty() {
        debug!("nothing to distribute");
        return DistributionOutcome {
            result: DistributionResult::Failure(FailureReason::NothingToDo),
            statistics,
        };
    }

    let mut ordered = containers.to_vec();
    ordered.sort_by(|a, b| b.target_mass.total_cmp(&a.target_mass));

    let result = search(stones.to_vec(), &ordered, &config, &mut statistics);
    statistics.elapsed = started.elapsed();

    match &result {
        DistributionResult::Success(assignment) => info!(
            nodes = statistics.nodes_explored,
            subsets = statistics.subsets_examined,
            backtracks = statistics.backtracks,
            total_deviation = assignment.total_deviation(),
            "distribution found"
        ),
        DistributionResult::Failure(reason) => info!(
            nodes = statistics.nodes_explored,
            subsets = statistics.subsets_examined,
            backtracks = statistics.backtracks,
            reason = reason.code(),
            "no distribution"
        ),
    }

    DistributionOutcome { result, statistics }
}

/// One level of the backtracking search.
///
/// The frame at stack depth `d` serves `containers[d]`.
struct Frame {
    remaining: Vec<Stone>,
    candidates: Vec<Candidate>,
    cursor: usize,
}

impl Frame {
    /// Enumerates the candidates for `container`; `None` when the budget ran out.
    fn open(
        remaining: Vec<Stone>,
        container: &Container,
        config: &DistributionConfig,
        statistics: &mut SearchStatistics,
    ) -> Option<Self> {
        let budget = config
            .node_limit
            .map(|limit| limit.saturating_sub(statistics.work()));
        let enumeration = enumerate_within(&remaining, container, config, budget);
        statistics.subsets_examined += enumeration.examined;
        if enumeration.budget_exhausted {
            return None;
        }

        debug!(
            container = container.id,
            pool = remaining.len(),
            examined = enumeration.examined,
            candidates = enumeration.candidates.len(),
            "opened frame"
        );
        Some(Self {
            remaining,
            candidates: enumeration.candidates,
            cursor: 0,
        })
    }
}

fn limit_reached(statistics: &SearchStatistics) -> DistributionResult {
    DistributionResult::Failure(FailureReason::SearchLimitReached {
        work: statistics.work(),
    })
}

/// Depth-first search over the ordered containers.
///
/// Invariant at the top of the loop: `records.len() + 1 == stack.len()`,
/// i.e. every frame except the deepest has committed exactly one record.
fn search(
    stones: Vec<Stone>,
    containers: &[Container],
    config: &DistributionConfig,
    statistics: &mut SearchStatistics,
) -> DistributionResult {
    let mut records: Vec<AssignedContainer> = Vec::with_capacity(containers.len());
    let Some(first) = Frame::open(stones, &containers[0], config, statistics) else {
        return limit_reached(statistics);
    };
    let mut stack = vec![first];
    statistics.max_depth = 1;

    while let Some(depth) = stack.len().checked_sub(1) {
        let frame = &mut stack[depth];
        let index = frame.cursor;
        if index >= frame.candidates.len() {
            stack.pop();
            if records.pop().is_some() {
                statistics.backtracks += 1;
            }
            continue;
        }
        frame.cursor += 1;

        if config
            .node_limit
            .is_some_and(|limit| statistics.work() >= limit)
        {
            return limit_reached(statistics);
        }
        statistics.nodes_explored += 1;

        let candidate = &frame.candidates[index];
        records.push(AssignedContainer::from_candidate(
            &containers[depth],
            candidate,
        ));

        if depth + 1 == containers.len() {
            return DistributionResult::Success(Assignment { entries: records });
        }

        let remaining: Vec<Stone> = frame
            .remaining
            .iter()
            .filter(|s| !candidate.contains(s.id))
            .cloned()
            .collect();
        let Some(next) = Frame::open(remaining, &containers[depth + 1], config, statistics) else {
            return limit_reached(statistics);
        };
        stack.push(next);
        statistics.max_depth = statistics.max_depth.max(stack.len());
    }

    DistributionResult::Failure(FailureReason::Infeasible)
}

//! Candidate enumeration for a single container.
//!
//! Enumerates every subset of up to `max_combination_size` stones from a pool,
//! keeps those whose total mass lies inside the container window and returns
//! the best `max_candidates` of them ordered by deviation from the target.

use crate::distributor::DistributionConfig;
use crate::model::{Container, Stone};

/// A subset of stones considered for one container.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Members in pool order.
    pub stones: Vec<Stone>,
    pub total_mass: f64,
    pub deviation: f64,
}

impl Candidate {
    /// Checks whether the candidate uses the stone with the given id.
    #[inline]
    pub fn contains(&self, stone_id: usize) -> bool {
        self.stones.iter().any(|s| s.id == stone_id)
    }

    /// Ids of the member stones in pool order.
    pub fn stone_ids(&self) -> Vec<usize> {
        self.stones.iter().map(|s| s.id).collect()
    }
}

/// Walks all `size`-element index combinations of `0..len` in lexicographic order.
///
/// # Examples
/// ```
/// use stone_sorter::combinations::Combinations;
///
/// let mut combos = Combinations::new(4, 2);
/// let mut seen = Vec::new();
/// while let Some(indices) = combos.next_indices() {
///     seen.push(indices.to_vec());
/// }
/// assert_eq!(seen.len(), 6);
/// assert_eq!(seen[0], vec![0, 1]);
/// assert_eq!(seen[5], vec![2, 3]);
/// ```
#[derive(Clone, Debug)]
pub struct Combinations {
    len: usize,
    indices: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl Combinations {
    pub fn new(len: usize, size: usize) -> Self {
        Self {
            len,
            indices: (0..size).collect(),
            started: false,
            exhausted: size == 0 || size > len,
        }
    }

    /// Advances to the next combination and returns its indices.
    pub fn next_indices(&mut self) -> Option<&[usize]> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.indices);
        }

        let size = self.indices.len();
        let mut pivot = size;
        loop {
            if pivot == 0 {
                self.exhausted = true;
                return None;
            }
            pivot -= 1;
            if self.indices[pivot] < self.len - size + pivot {
                break;
            }
        }

        self.indices[pivot] += 1;
        for next in pivot + 1..size {
            self.indices[next] = self.indices[next - 1] + 1;
        }
        Some(&self.indices)
    }
}

/// Result of a budgeted enumeration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Enumeration {
    /// Best candidates first
    pub candidates: Vec<Candidate>,
    /// Subsets whose mass was evaluated
    pub examined: u64,
    /// Set when the walk stopped early; `candidates` is then incomplete
    pub budget_exhausted: bool,
}

/// Finds the best-ranked stone subsets for a container.
///
/// Subsets are visited by size (1 first) and lexicographically by pool position
/// within one size. Ties in deviation keep that visiting order, so the ranking
/// is fully reproducible.
///
/// # Parameters
/// * `stones` - The pool to draw from
/// * `container` - Container whose window must be met
/// * `config` - Size and result caps plus comparison slack
///
/// # Returns
/// At most `config.max_candidates` candidates, best first. Empty when no subset fits.
pub fn enumerate_candidates(
    stones: &[Stone],
    container: &Container,
    config: &DistributionConfig,
) -> Vec<Candidate> {
    enumerate_within(stones, container, config, None).candidates
}

/// Like `enumerate_candidates`, but evaluates at most `budget` subsets.
///
/// Only the current top `max_candidates` are held while walking, so memory
/// stays bounded by the result cap rather than by the number of fitting subsets.
pub fn enumerate_within(
    stones: &[Stone],
    container: &Container,
    config: &DistributionConfig,
    budget: Option<u64>,
) -> Enumeration {
    let window = container.window();
    let max_size = config.max_combination_size.min(stones.len());
    let mut result = Enumeration::default();

    for size in 1..=max_size {
        let mut combos = Combinations::new(stones.len(), size);
        while let Some(indices) = combos.next_indices() {
            if budget.is_some_and(|limit| result.examined >= limit) {
                result.budget_exhausted = true;
                return result;
            }
            result.examined += 1;

            let total_mass: f64 = indices.iter().map(|&i| stones[i].mass).sum();
            if !window.contains(total_mass, config.mass_epsilon) {
                continue;
            }
            let deviation = window.deviation(total_mass);
            let kept = &mut result.candidates;
            // Later visits lose ties, so they go after every equal deviation.
            let position = kept.partition_point(|c| c.deviation <= deviation);
            if position >= config.max_candidates {
                continue;
            }
            kept.insert(
                position,
                Candidate {
                    stones: indices.iter().map(|&i| stones[i].clone()).collect(),
                    total_mass,
                    deviation,
                },
            );
            kept.truncate(config.max_candidates);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_MASS;

    fn stones(masses: &[f64]) -> Vec<Stone> {
        masses
            .iter()
            .enumerate()
            .map(|(i, &m)| Stone::new(i + 1, m).unwrap())
            .collect()
    }

    fn container(target: f64, tolerance: f64) -> Container {
        Container::new(1, None, target, tolerance).unwrap()
    }

    fn collect(len: usize, size: usize) -> Vec<Vec<usize>> {
        let mut combos = Combinations::new(len, size);
        let mut out = Vec::new();
        while let Some(indices) = combos.next_indices() {
            out.push(indices.to_vec());
        }
        out
    }

    #[test]
    fn combinations_follow_lexicographic_order() {
        assert_eq!(
            collect(4, 3),
            vec![vec![0, 1, 2], vec![0, 1, 3], vec![0, 2, 3], vec![1, 2, 3]]
        );
        assert_eq!(collect(3, 3), vec![vec![0, 1, 2]]);
        assert_eq!(collect(5, 1).len(), 5);
        assert_eq!(collect(7, 3).len(), 35);
    }

    #[test]
    fn combinations_handle_degenerate_sizes() {
        assert!(collect(3, 0).is_empty());
        assert!(collect(2, 3).is_empty());
        assert!(collect(0, 1).is_empty());
    }

    #[test]
    fn keeps_only_subsets_inside_window() {
        let pool = stones(&[5.0, 5.5, 3.0, 9.0]);
        let cont = container(10.0, 1.0);
        let candidates = enumerate_candidates(&pool, &cont, &DistributionConfig::default());

        assert!(!candidates.is_empty());
        for candidate in &candidates {
            assert!(candidate.total_mass >= cont.min_mass - EPSILON_MASS);
            assert!(candidate.total_mass <= cont.max_mass + EPSILON_MASS);
        }
        let ids: Vec<_> = candidates.iter().map(Candidate::stone_ids).collect();
        assert!(ids.contains(&vec![4]));
        assert!(ids.contains(&vec![1, 2]));
    }

    #[test]
    fn ranks_by_deviation_then_enumeration_order() {
        let pool = stones(&[3.0, 3.0, 3.0, 6.25]);
        let cont = container(6.0, 0.5);
        let candidates = enumerate_candidates(&pool, &cont, &DistributionConfig::default());

        let ids: Vec<_> = candidates.iter().map(Candidate::stone_ids).collect();
        assert_eq!(ids, vec![vec![1, 2], vec![1, 3], vec![2, 3], vec![4]]);
        assert_eq!(candidates[0].deviation, 0.0);
        assert!((candidates[3].deviation - 0.25).abs() < EPSILON_MASS);
    }

    #[test]
    fn result_count_is_capped() {
        let pool = stones(&[1.0; 10]);
        let cont = container(3.0, 0.1);
        let config = DistributionConfig::builder().max_candidates(7).build();
        let candidates = enumerate_candidates(&pool, &cont, &config);
        assert_eq!(candidates.len(), 7);

        let unbounded = DistributionConfig::builder()
            .max_candidates(usize::MAX)
            .build();
        assert_eq!(enumerate_candidates(&pool, &cont, &unbounded).len(), 120);
    }

    #[test]
    fn subset_size_is_capped() {
        let pool = stones(&[1.0; 6]);
        let cont = container(6.0, 0.1);
        assert!(enumerate_candidates(&pool, &cont, &DistributionConfig::default()).is_empty());

        let config = DistributionConfig::builder().max_combination_size(6).build();
        let candidates = enumerate_candidates(&pool, &cont, &config);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].stones.len(), 6);
    }

    #[test]
    fn empty_pool_or_unreachable_window_yields_nothing() {
        let cont = container(10.0, 0.1);
        assert!(enumerate_candidates(&[], &cont, &DistributionConfig::default()).is_empty());
        assert!(
            enumerate_candidates(&stones(&[3.0]), &cont, &DistributionConfig::default())
                .is_empty()
        );
    }

    #[test]
    fn decimal_sums_hit_exact_bounds() {
        let pool = stones(&[1.1, 2.2]);
        let cont = container(3.2, 0.1);
        let candidates = enumerate_candidates(&pool, &cont, &DistributionConfig::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].stone_ids(), vec![1, 2]);
    }

    #[test]
    fn budget_stops_enumeration_early() {
        let pool = stones(&[1.0; 10]);
        let cont = container(3.0, 0.1);
        let config = DistributionConfig::default();

        let full = enumerate_within(&pool, &cont, &config, None);
        // 10 + 45 + 120 + 210 + 252 subsets of size 1 to 5
        assert_eq!(full.examined, 637);
        assert!(!full.budget_exhausted);

        let cut = enumerate_within(&pool, &cont, &config, Some(20));
        assert!(cut.budget_exhausted);
        assert_eq!(cut.examined, 20);
        assert!(cut.candidates.is_empty());

        let exact = enumerate_within(&pool, &cont, &config, Some(637));
        assert!(!exact.budget_exhausted);
        assert_eq!(exact.candidates, full.candidates);
    }

    #[test]
    fn bounded_ranking_matches_full_sort() {
        let pool = stones(&[1.2, 0.8, 2.0, 1.0, 0.5, 1.5, 0.7, 1.3, 0.9]);
        let cont = container(3.0, 0.4);
        let everything = DistributionConfig::builder()
            .max_candidates(usize::MAX)
            .build();
        let mut all = enumerate_candidates(&pool, &cont, &everything);
        all.sort_by(|a, b| a.deviation.total_cmp(&b.deviation));
        all.truncate(5);

        let capped = DistributionConfig::builder().max_candidates(5).build();
        assert_eq!(enumerate_candidates(&pool, &cont, &capped), all);
    }

    #[test]
    fn ranking_is_deterministic() {
        let pool = stones(&[1.2, 0.8, 2.0, 1.0, 0.5, 1.5, 0.7, 1.3]);
        let cont = container(3.0, 0.3);
        let config = DistributionConfig::default();
        let first = enumerate_candidates(&pool, &cont, &config);
        let second = enumerate_candidates(&pool, &cont, &config);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].deviation <= w[1].deviation));
    }
}

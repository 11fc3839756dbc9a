//! Test fixture generation.
//!
//! Produces containers with random targets and, for each container, a group of
//! stones whose masses add up exactly to that target. All stones are shuffled
//! into one pool and renumbered, so the pool is known to admit a full
//! assignment. Masses are drawn in whole hundredths of a carat.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

use crate::model::{Container, Stone, ValidationError};
use crate::types::total_mass;

/// Tolerance given to every generated container, in carats.
pub const FIXTURE_TOLERANCE: f64 = 0.01;

/// Largest number of containers per fixture.
pub const MAX_CONTAINERS: usize = 50;
/// Largest number of stones drawn for one container.
pub const MAX_STONES_PER_CONTAINER: usize = 20;
/// Largest container target in carats.
pub const MAX_TARGET_MASS: f64 = 10_000.0;

const HUNDREDTHS: f64 = 100.0;

/// Errors for invalid generator parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    #[error("At least one container must be generated")]
    NoContainers,
    #[error("At most {max} containers can be generated, got {0}", max = MAX_CONTAINERS)]
    TooManyContainers(usize),
    #[error("Mass range must be positive, finite and ordered, got {0}..{1}")]
    InvalidMassRange(f64, f64),
    #[error("Container targets may not exceed {max} ct, got {0}", max = MAX_TARGET_MASS)]
    TargetTooLarge(f64),
    #[error("Containers need room for at least 2 stones, got {0}")]
    TooFewStones(usize),
    #[error("At most {max} stones per container, got {0}", max = MAX_STONES_PER_CONTAINER)]
    TooManyStones(usize),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Parameters for `generate_fixture`.
#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(default)]
pub struct FixtureParams {
    pub num_containers: usize,
    /// Range for container targets in carats
    #[schema(value_type = Vec<f64>)]
    pub mass_range: (f64, f64),
    pub max_stones_per_container: usize,
}

impl Default for FixtureParams {
    fn default() -> Self {
        Self {
            num_containers: 3,
            mass_range: (1.0, 5.0),
            max_stones_per_container: 5,
        }
    }
}

impl FixtureParams {
    fn validate(&self) -> Result<(), GeneratorError> {
        match self.num_containers {
            0 => return Err(GeneratorError::NoContainers),
            n if n > MAX_CONTAINERS => return Err(GeneratorError::TooManyContainers(n)),
            _ => {}
        }
        let (min, max) = self.mass_range;
        if !min.is_finite() || !max.is_finite() || min < 1.0 / HUNDREDTHS || min > max {
            return Err(GeneratorError::InvalidMassRange(min, max));
        }
        if max > MAX_TARGET_MASS {
            return Err(GeneratorError::TargetTooLarge(max));
        }
        match self.max_stones_per_container {
            n if n < 2 => Err(GeneratorError::TooFewStones(n)),
            n if n > MAX_STONES_PER_CONTAINER => Err(GeneratorError::TooManyStones(n)),
            _ => Ok(()),
        }
    }
}

/// A generated data set.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub containers: Vec<Container>,
    /// Shuffled pool numbered from 1
    pub stones: Vec<Stone>,
    /// Stone ids each container was built from
    pub original_distribution: BTreeMap<usize, Vec<usize>>,
}

impl Fixture {
    pub fn total_stone_mass(&self) -> f64 {
        total_mass(&self.stones)
    }

    /// Sum of the containers' upper bounds.
    pub fn total_capacity(&self) -> f64 {
        self.containers.iter().map(|c| c.max_mass).sum()
    }
}

/// Generates containers and a shuffled stone pool.
pub fn generate_fixture<R: Rng + ?Sized>(
    params: &FixtureParams,
    rng: &mut R,
) -> Result<Fixture, GeneratorError> {
    params.validate()?;

    let (min, max) = params.mass_range;
    let mut containers = Vec::with_capacity(params.num_containers);
    // (container id, mass in hundredths)
    let mut pool: Vec<(usize, u64)> = Vec::new();

    for id in 1..=params.num_containers {
        let target = (rng.gen_range(min..=max) * HUNDREDTHS).round().max(1.0) as u64;
        let container = Container::new(id, None, target as f64 / HUNDREDTHS, FIXTURE_TOLERANCE)?;

        let wanted = rng.gen_range(2..=params.max_stones_per_container);
        for part in split_mass(target, wanted, rng) {
            pool.push((id, part));
        }
        containers.push(container);
    }

    pool.shuffle(rng);

    let mut stones = Vec::with_capacity(pool.len());
    let mut original_distribution: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, (container_id, hundredths)) in pool.into_iter().enumerate() {
        let number = index + 1;
        stones.push(Stone::new(number, hundredths as f64 / HUNDREDTHS)?);
        original_distribution
            .entry(container_id)
            .or_default()
            .push(number);
    }

    let fixture = Fixture {
        containers,
        stones,
        original_distribution,
    };
    debug!(
        containers = fixture.containers.len(),
        stones = fixture.stones.len(),
        total_mass = fixture.total_stone_mass(),
        capacity = fixture.total_capacity(),
        "generated fixture"
    );
    Ok(fixture)
}

/// Splits `total` into `parts` positive integers that sum to `total`.
///
/// Every part but the last is drawn uniformly while leaving at least one unit
/// for each remaining part; the last part takes the rest. When `total` is too
/// small, fewer parts are produced.
fn split_mass<R: Rng + ?Sized>(total: u64, parts: usize, rng: &mut R) -> Vec<u64> {
    let parts = (parts as u64).clamp(1, total.max(1));
    let mut remaining = total;
    let mut out = Vec::with_capacity(parts as usize);

    for left_after in (0..parts).rev() {
        if left_after == 0 {
            out.push(remaining);
            break;
        }
        let upper = remaining - left_after;
        let part = rng.gen_range(1..=upper);
        out.push(part);
        remaining -= part;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_MASS;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn split_sums_to_total() {
        let mut rng = StdRng::seed_from_u64(1);
        for total in [1u64, 2, 5, 37, 1200] {
            for parts in 1..=6 {
                let split = split_mass(total, parts, &mut rng);
                assert_eq!(split.iter().sum::<u64>(), total);
                assert!(split.iter().all(|&p| p >= 1));
                assert!(split.len() <= parts);
                assert_eq!(split.len() as u64, (parts as u64).min(total));
            }
        }
    }

    #[test]
    fn each_container_group_fits_its_window() {
        let mut rng = StdRng::seed_from_u64(99);
        let params = FixtureParams::default();
        let fixture = generate_fixture(&params, &mut rng).unwrap();

        assert_eq!(fixture.containers.len(), 3);
        for container in &fixture.containers {
            let ids = &fixture.original_distribution[&container.id];
            assert!(ids.len() >= 2 && ids.len() <= params.max_stones_per_container);
            let sum: f64 = fixture
                .stones
                .iter()
                .filter(|s| ids.contains(&s.id))
                .map(|s| s.mass)
                .sum();
            assert!(sum >= container.min_mass - EPSILON_MASS);
            assert!(sum <= container.max_mass + EPSILON_MASS);
            assert!(container.target_mass >= params.mass_range.0 - EPSILON_MASS);
            assert!(container.target_mass <= params.mass_range.1 + EPSILON_MASS);
            assert_eq!(container.tolerance, FIXTURE_TOLERANCE);
        }
    }

    #[test]
    fn stones_are_renumbered_and_partitioned() {
        let mut rng = StdRng::seed_from_u64(5);
        let fixture = generate_fixture(&FixtureParams::default(), &mut rng).unwrap();

        let numbers: Vec<_> = fixture.stones.iter().map(|s| s.id).collect();
        assert_eq!(numbers, (1..=fixture.stones.len()).collect::<Vec<_>>());

        let grouped: Vec<usize> = fixture
            .original_distribution
            .values()
            .flatten()
            .copied()
            .collect();
        let unique: HashSet<_> = grouped.iter().copied().collect();
        assert_eq!(grouped.len(), fixture.stones.len());
        assert_eq!(unique.len(), fixture.stones.len());
        assert!(fixture.total_stone_mass() <= fixture.total_capacity() + EPSILON_MASS);
    }

    #[test]
    fn same_seed_gives_same_fixture() {
        let params = FixtureParams::default();
        let a = generate_fixture(&params, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = generate_fixture(&params, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a.stones, b.stones);
        assert_eq!(a.containers, b.containers);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut params = FixtureParams {
            num_containers: 0,
            ..FixtureParams::default()
        };
        assert_eq!(
            generate_fixture(&params, &mut rng).unwrap_err(),
            GeneratorError::NoContainers
        );

        params.num_containers = 2;
        params.mass_range = (5.0, 1.0);
        assert!(matches!(
            generate_fixture(&params, &mut rng),
            Err(GeneratorError::InvalidMassRange(_, _))
        ));

        params.mass_range = (1.0, 5.0);
        params.max_stones_per_container = 1;
        assert_eq!(
            generate_fixture(&params, &mut rng).unwrap_err(),
            GeneratorError::TooFewStones(1)
        );
    }

    #[test]
    fn rejects_too_many_containers() {
        let mut rng = StdRng::seed_from_u64(0);
        for count in [MAX_CONTAINERS + 1, usize::MAX] {
            let params = FixtureParams {
                num_containers: count,
                ..FixtureParams::default()
            };
            assert_eq!(
                generate_fixture(&params, &mut rng).unwrap_err(),
                GeneratorError::TooManyContainers(count)
            );
        }

        let params = FixtureParams {
            num_containers: MAX_CONTAINERS,
            ..FixtureParams::default()
        };
        assert_eq!(
            generate_fixture(&params, &mut rng).unwrap().containers.len(),
            MAX_CONTAINERS
        );
    }

    #[test]
    fn rejects_too_many_stones_per_container() {
        let mut rng = StdRng::seed_from_u64(0);
        let params = FixtureParams {
            max_stones_per_container: 5_000_000,
            mass_range: (5_000.0, 5_000.0),
            ..FixtureParams::default()
        };
        assert_eq!(
            generate_fixture(&params, &mut rng).unwrap_err(),
            GeneratorError::TooManyStones(5_000_000)
        );

        let params = FixtureParams {
            max_stones_per_container: MAX_STONES_PER_CONTAINER,
            ..FixtureParams::default()
        };
        let fixture = generate_fixture(&params, &mut rng).unwrap();
        assert!(fixture.stones.len() <= params.num_containers * MAX_STONES_PER_CONTAINER);
    }

    #[test]
    fn rejects_targets_above_cap() {
        let mut rng = StdRng::seed_from_u64(0);
        let params = FixtureParams {
            mass_range: (50_000.0, 50_000.0),
            ..FixtureParams::default()
        };
        assert_eq!(
            generate_fixture(&params, &mut rng).unwrap_err(),
            GeneratorError::TargetTooLarge(50_000.0)
        );

        let params = FixtureParams {
            mass_range: (MAX_TARGET_MASS, MAX_TARGET_MASS),
            ..FixtureParams::default()
        };
        let fixture = generate_fixture(&params, &mut rng).unwrap();
        assert!(fixture.containers.iter().all(|c| c.target_mass == MAX_TARGET_MASS));
    }
}

//! Data models for stone distribution.
//!
//! This module defines the fundamental records the distribution engine works with:
//! - `Stone`: An indivisible item with a mass and a presentation color
//! - `Container`: A target mass with a tolerance window
//!
//! Both are validated on construction; the engine itself assumes valid input.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{MassWindow, Weighted, validation};

/// Validation error for stone and container data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid mass: {0}")]
    InvalidMass(String),
    #[error("Invalid tolerance: {0}")]
    InvalidTolerance(String),
    #[error("Duplicate stone identity: {0}")]
    DuplicateStone(usize),
}

/// Presentation color of a stone.
///
/// Colors carry no meaning for the distribution; they are assigned
/// round-robin by stone number so that a list of stones is easy to scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoneColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl StoneColor {
    pub const PALETTE: [StoneColor; 6] = [
        StoneColor::Red,
        StoneColor::Blue,
        StoneColor::Green,
        StoneColor::Yellow,
        StoneColor::Purple,
        StoneColor::Orange,
    ];

    /// Returns the color for a 1-based stone number.
    pub fn for_number(number: usize) -> Self {
        Self::PALETTE[number.saturating_sub(1) % Self::PALETTE.len()]
    }

    /// Human-readable color name.
    pub fn display_name(&self) -> &'static str {
        match self {
            StoneColor::Red => "Red",
            StoneColor::Blue => "Blue",
            StoneColor::Green => "Green",
            StoneColor::Yellow => "Yellow",
            StoneColor::Purple => "Purple",
            StoneColor::Orange => "Orange",
        }
    }
}

impl std::fmt::Display for StoneColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Represents a stone to be distributed.
///
/// # Fields
/// * `id` - Stone number, unique within one distribution
/// * `mass` - Mass in carats
/// * `color` - Presentation color
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({ "id": 1, "mass": 1.25, "color": "red" }))]
pub struct Stone {
    pub id: usize,
    pub mass: f64,
    pub color: StoneColor,
}

impl Stone {
    /// Creates a new stone with validation.
    ///
    /// The color is derived from the stone number.
    ///
    /// # Examples
    /// ```
    /// use stone_sorter::model::{Stone, StoneColor};
    ///
    /// let stone = Stone::new(2, 0.75).unwrap();
    /// assert_eq!(stone.color, StoneColor::Blue);
    ///
    /// assert!(Stone::new(3, -0.5).is_err());
    /// ```
    pub fn new(id: usize, mass: f64) -> Result<Self, ValidationError> {
        validation::validate_positive(mass, "Stone mass").map_err(ValidationError::InvalidMass)?;
        Ok(Self {
            id,
            mass,
            color: StoneColor::for_number(id),
        })
    }
}

impl Weighted for Stone {
    fn mass(&self) -> f64 {
        self.mass
    }
}

/// Rejects stone collections that reuse an identity.
pub fn ensure_unique_stones(stones: &[Stone]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(stones.len());
    for stone in stones {
        if !seen.insert(stone.id) {
            return Err(ValidationError::DuplicateStone(stone.id));
        }
    }
    Ok(())
}

/// A container with a target mass and a tolerance window.
///
/// `min_mass` and `max_mass` are computed once on construction.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Container 1",
    "target_mass": 10.0,
    "tolerance": 0.5,
    "min_mass": 9.5,
    "max_mass": 10.5
}))]
pub struct Container {
    pub id: usize,
    pub name: String,
    pub target_mass: f64,
    pub tolerance: f64,
    pub min_mass: f64,
    pub max_mass: f64,
}

impl Container {
    /// Creates a new container after validating target and tolerance.
    ///
    /// # Parameters
    /// * `id` - Container identity
    /// * `name` - Label; defaults to `Container {id}` when absent or blank
    /// * `target_mass` - Target mass in carats
    /// * `tolerance` - Allowed deviation in either direction
    pub fn new(
        id: usize,
        name: Option<String>,
        target_mass: f64,
        tolerance: f64,
    ) -> Result<Self, ValidationError> {
        validation::validate_positive(target_mass, "Target mass")
            .map_err(ValidationError::InvalidMass)?;
        validation::validate_positive(tolerance, "Tolerance")
            .map_err(ValidationError::InvalidTolerance)?;

        let name = name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Container {}", id));
        let window = MassWindow::around(target_mass, tolerance);

        Ok(Self {
            id,
            name,
            target_mass,
            tolerance,
            min_mass: window.min,
            max_mass: window.max,
        })
    }

    /// The stored tolerance window.
    #[inline]
    pub fn window(&self) -> MassWindow {
        MassWindow {
            target: self.target_mass,
            min: self.min_mass,
            max: self.max_mass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_cycle_by_number() {
        assert_eq!(StoneColor::for_number(1), StoneColor::Red);
        assert_eq!(StoneColor::for_number(6), StoneColor::Orange);
        assert_eq!(StoneColor::for_number(7), StoneColor::Red);
        assert_eq!(StoneColor::for_number(0), StoneColor::Red);
        assert_eq!(StoneColor::Purple.to_string(), "Purple");
    }

    #[test]
    fn stone_rejects_invalid_mass() {
        assert!(Stone::new(1, 0.01).is_ok());
        assert!(matches!(
            Stone::new(1, 0.0),
            Err(ValidationError::InvalidMass(_))
        ));
        assert!(Stone::new(1, f64::NAN).is_err());
        assert!(Stone::new(1, f64::INFINITY).is_err());
    }

    #[test]
    fn container_derives_window_once() {
        let container = Container::new(3, None, 10.0, 0.25).unwrap();
        assert_eq!(container.name, "Container 3");
        assert_eq!(container.min_mass, 9.75);
        assert_eq!(container.max_mass, 10.25);
        assert_eq!(container.window().target, 10.0);
    }

    #[test]
    fn container_keeps_custom_name() {
        let container = Container::new(1, Some("  Ring set ".to_string()), 4.0, 0.1).unwrap();
        assert_eq!(container.name, "Ring set");

        let blank = Container::new(2, Some("   ".to_string()), 4.0, 0.1).unwrap();
        assert_eq!(blank.name, "Container 2");
    }

    #[test]
    fn container_rejects_non_positive_window() {
        assert!(matches!(
            Container::new(1, None, 0.0, 1.0),
            Err(ValidationError::InvalidMass(_))
        ));
        assert!(matches!(
            Container::new(1, None, 5.0, 0.0),
            Err(ValidationError::InvalidTolerance(_))
        ));
        assert!(Container::new(1, None, 5.0, f64::NAN).is_err());
    }

    #[test]
    fn duplicate_stones_are_detected() {
        let stones = vec![
            Stone::new(1, 1.0).unwrap(),
            Stone::new(2, 2.0).unwrap(),
            Stone::new(1, 3.0).unwrap(),
        ];
        assert_eq!(
            ensure_unique_stones(&stones),
            Err(ValidationError::DuplicateStone(1))
        );
        assert!(ensure_unique_stones(&stones[..2]).is_ok());
    }
}

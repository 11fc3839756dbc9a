//! Common numeric types and traits for mass handling.
//!
//! Masses are carats stored as `f64`. Container windows are computed once
//! and reused for every comparison so that repeated subtraction and addition
//! never drift the bounds.

/// Default slack for window comparisons.
///
/// Large enough to absorb binary rounding of two-decimal sums
/// (e.g. `1.1 + 2.2`), far below the smallest carat step of `0.01`.
pub const EPSILON_MASS: f64 = 1e-9;

/// Trait for objects with a mass.
pub trait Weighted {
    /// Returns the mass in carats.
    fn mass(&self) -> f64;
}

/// Sums the masses of a collection of weighted items.
pub fn total_mass<'a, T, I>(items: I) -> f64
where
    T: Weighted + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(Weighted::mass).sum()
}

/// An inclusive mass interval around a target.
///
/// # Examples
/// ```
/// use stone_sorter::types::{MassWindow, EPSILON_MASS};
///
/// let window = MassWindow::around(10.0, 1.0);
/// assert!(window.contains(10.5, EPSILON_MASS));
/// assert!(window.contains(11.0, EPSILON_MASS));
/// assert!(!window.contains(11.5, EPSILON_MASS));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassWindow {
    pub target: f64,
    pub min: f64,
    pub max: f64,
}

impl MassWindow {
    /// Creates the window `[target - tolerance, target + tolerance]`.
    #[inline]
    pub fn around(target: f64, tolerance: f64) -> Self {
        Self {
            target,
            min: target - tolerance,
            max: target + tolerance,
        }
    }

    /// Checks whether `mass` lies inside the window (inclusive on both ends).
    #[inline]
    pub fn contains(&self, mass: f64, epsilon: f64) -> bool {
        mass >= self.min - epsilon && mass <= self.max + epsilon
    }

    /// Absolute distance of `mass` from the target.
    #[inline]
    pub fn deviation(&self, mass: f64) -> f64 {
        (mass - self.target).abs()
    }

    /// Width of the window.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Validation functions shared by the boundary types.
pub mod validation {

    /// Validates a value that must be strictly positive and finite.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    /// * `name` - Name of the value for error messages
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_positive(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }
}

//! Typed parameter bindings.
//!
//! Each tunable value carries the range and step it was exposed with, so a host
//! (CLI flag, browser slider, test) can push raw numbers and get back the value
//! the simulation will actually use.

use super::ConfigError;

/// Range and step constraints for one named parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Uniform name the parameter is bound to.
    pub name: &'static str,
    /// Inclusive lower bound.
    pub min: Option<f32>,
    /// Inclusive upper bound.
    pub max: Option<f32>,
    /// Snapping increment, measured from `min` (or zero when unbounded below).
    pub step: Option<f32>,
}

impl ParamSpec {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            min: None,
            max: None,
            step: None,
        }
    }

    pub const fn range(mut self, min: f32, max: f32) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub const fn at_least(mut self, min: f32) -> Self {
        self.min = Some(min);
        self
    }

    pub const fn step(mut self, step: f32) -> Self {
        self.step = Some(step);
        self
    }

    /// Snap `value` to the step grid, then clamp it into bounds.
    pub fn apply(&self, value: f32) -> f32 {
        let mut v = value;
        if let Some(step) = self.step.filter(|s| *s > 0.0) {
            let origin = self.min.unwrap_or(0.0);
            v = origin + ((v - origin) / step).round() * step;
        }
        if let Some(min) = self.min {
            v = v.max(min);
        }
        if let Some(max) = self.max {
            v = v.min(max);
        }
        v
    }

    /// Whether `value` already lies inside the bounds (step is not checked).
    pub fn contains(&self, value: f32) -> bool {
        value.is_finite()
            && self.min.is_none_or(|min| value >= min)
            && self.max.is_none_or(|max| value <= max)
    }
}

/// A set of named, range-checked simulation parameters.
pub trait Tunable {
    /// All parameters this type exposes.
    fn param_specs() -> &'static [ParamSpec];

    /// Current value of a parameter, `None` for unknown names.
    fn get_param(&self, name: &str) -> Option<f32>;

    /// Store an already-constrained value. Only called with known names.
    fn store_param(&mut self, name: &str, value: f32);

    /// Look up the spec for `name`.
    fn spec(name: &str) -> Option<&'static ParamSpec> {
        Self::param_specs().iter().find(|s| s.name == name)
    }

    /// Constrain and store a parameter, returning the applied value.
    fn set_param(&mut self, name: &str, value: f32) -> Result<f32, ConfigError> {
        let spec = Self::spec(name).ok_or_else(|| ConfigError::UnknownParam(name.to_string()))?;
        if !value.is_finite() {
            return Err(ConfigError::NonFiniteParam { name: spec.name });
        }
        let applied = spec.apply(value);
        self.store_param(spec.name, applied);
        log::debug!("param {} <- {} (requested {})", spec.name, applied, value);
        Ok(applied)
    }

    /// Check every parameter against its bounds.
    fn validate_params(&self) -> Result<(), ConfigError> {
        for spec in Self::param_specs() {
            let Some(value) = self.get_param(spec.name) else {
                continue;
            };
            if !spec.contains(value) {
                return Err(ConfigError::ParamOutOfRange {
                    name: spec.name,
                    value,
                    min: spec.min.unwrap_or(f32::NEG_INFINITY),
                    max: spec.max.unwrap_or(f32::INFINITY),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OCTAVES: ParamSpec = ParamSpec::new("octaves").range(0.0, 10.0).step(1.0);

    #[test]
    fn test_apply_snaps_to_step() {
        assert_eq!(OCTAVES.apply(3.4), 3.0);
        assert_eq!(OCTAVES.apply(3.6), 4.0);
    }

    #[test]
    fn test_apply_clamps() {
        assert_eq!(OCTAVES.apply(-2.0), 0.0);
        assert_eq!(OCTAVES.apply(42.0), 10.0);
    }

    #[test]
    fn test_step_measured_from_min() {
        let ts = ParamSpec::new("ts").range(0.01, 1.0).step(0.01);
        let v = ts.apply(0.034);
        assert!((v - 0.03).abs() < 1e-6);
    }

    #[test]
    fn test_unbounded_above() {
        let scale = ParamSpec::new("scale").at_least(0.01);
        assert_eq!(scale.apply(1000.0), 1000.0);
        assert_eq!(scale.apply(0.0), 0.01);
        assert!(scale.contains(1e6));
        assert!(!scale.contains(f32::NAN));
    }

    proptest! {
        #[test]
        fn prop_apply_stays_in_range(v in -1e6f32..1e6f32) {
            let spec = ParamSpec::new("m").range(-0.07, 0.07);
            let applied = spec.apply(v);
            prop_assert!(spec.contains(applied));
        }

        #[test]
        fn prop_apply_is_idempotent(v in -100f32..100f32) {
            let once = OCTAVES.apply(v);
            prop_assert_eq!(OCTAVES.apply(once), once);
        }
    }
}

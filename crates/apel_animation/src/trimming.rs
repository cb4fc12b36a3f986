//! Trimming restricts an animation to part of its computed path

use crate::error::{AnimationError, Result};
use std::f32::consts::TAU;

/// Step range `[start, end)` of a path that is actually drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepTrimming {
    start: u32,
    end: Option<u32>,
}

impl StepTrimming {
    /// Draw every step
    pub const FULL: StepTrimming = StepTrimming {
        start: 0,
        end: None,
    };

    /// Draw steps from `start` up to, but excluding, `end` (`None` = to the end)
    pub fn new(start: u32, end: Option<u32>) -> Result<Self> {
        if let Some(end) = end {
            if end <= start {
                return Err(AnimationError::validation(format!(
                    "invalid step trimming {start}..{end}"
                )));
            }
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> Option<u32> {
        self.end
    }

    pub fn contains(&self, step: u32) -> bool {
        step >= self.start && self.end.map_or(true, |end| step < end)
    }
}

/// Angle range, in radians, swept by an orbiting animator
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngleTrimming {
    start: f32,
    end: f32,
}

impl AngleTrimming {
    /// Default end angle, just short of a full turn so the start is not drawn twice
    pub const FULL_TURN_END: f32 = TAU - 0.0001;

    /// Sweep from `start` to `end`; both are wrapped into `[0, TAU)`
    pub fn new(start: f32, end: f32) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(AnimationError::validation("trimming angles must be finite"));
        }
        let start = start.rem_euclid(TAU);
        let end = end.rem_euclid(TAU);
        if start == end {
            return Err(AnimationError::validation(
                "trimming start and end angles must differ",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    /// Angle covered going from start to end, wrapping past `TAU` if needed
    pub fn span(&self) -> f32 {
        let span = self.end - self.start;
        if span <= 0.0 {
            span + TAU
        } else {
            span
        }
    }
}

impl Default for AngleTrimming {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: Self::FULL_TURN_END,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_step_trimming_bounds() {
        let trim = StepTrimming::new(2, Some(4)).unwrap();
        let kept: Vec<u32> = (0..6).filter(|s| trim.contains(*s)).collect();
        assert_eq!(kept, vec![2, 3]);
        assert!(StepTrimming::FULL.contains(1_000));
        assert!(StepTrimming::new(3, Some(3)).is_err());
    }

    #[test]
    fn test_angle_trimming_wraps() {
        let trim = AngleTrimming::new(1.5 * PI, 2.5 * PI).unwrap();
        assert!((trim.start() - 1.5 * PI).abs() < 1e-5);
        assert!((trim.end() - 0.5 * PI).abs() < 1e-5);
        assert!((trim.span() - PI).abs() < 1e-5);
    }

    #[test]
    fn test_default_angle_trimming_is_almost_full_turn() {
        let trim = AngleTrimming::default();
        assert!((trim.span() - TAU).abs() < 1e-3);
        assert!(AngleTrimming::new(0.0, TAU).is_err());
    }
}

//! Bézier curves

use crate::error::{CoreError, Result};
use crate::math::Vec3;

/// Number of chord samples used when no explicit sample count is given
pub const DEFAULT_LENGTH_SAMPLES: u32 = 100;

/// A Bézier curve of fixed or arbitrary degree
#[derive(Clone, Debug, PartialEq)]
pub enum BezierCurve {
    Linear {
        start: Vec3,
        end: Vec3,
    },
    Quadratic {
        start: Vec3,
        control: Vec3,
        end: Vec3,
    },
    Cubic {
        start: Vec3,
        control_a: Vec3,
        control_b: Vec3,
        end: Vec3,
    },
    /// Arbitrary degree, evaluated with de Casteljau's algorithm.
    /// Holds start, every control point and end, in order.
    Parameterized(Vec<Vec3>),
}

impl BezierCurve {
    pub fn linear(start: Vec3, end: Vec3) -> Self {
        BezierCurve::Linear { start, end }
    }

    pub fn quadratic(start: Vec3, control: Vec3, end: Vec3) -> Self {
        BezierCurve::Quadratic {
            start,
            control,
            end,
        }
    }

    pub fn cubic(start: Vec3, control_a: Vec3, control_b: Vec3, end: Vec3) -> Self {
        BezierCurve::Cubic {
            start,
            control_a,
            control_b,
            end,
        }
    }

    /// Curve through `start`, any number of `controls`, and `end`
    pub fn parameterized(start: Vec3, controls: &[Vec3], end: Vec3) -> Self {
        let mut points = Vec::with_capacity(controls.len() + 2);
        points.push(start);
        points.extend_from_slice(controls);
        points.push(end);
        BezierCurve::Parameterized(points)
    }

    pub fn start(&self) -> Vec3 {
        match self {
            BezierCurve::Linear { start, .. }
            | BezierCurve::Quadratic { start, .. }
            | BezierCurve::Cubic { start, .. } => *start,
            BezierCurve::Parameterized(points) => points.first().copied().unwrap_or_default(),
        }
    }

    pub fn end(&self) -> Vec3 {
        match self {
            BezierCurve::Linear { end, .. }
            | BezierCurve::Quadratic { end, .. }
            | BezierCurve::Cubic { end, .. } => *end,
            BezierCurve::Parameterized(points) => points.last().copied().unwrap_or_default(),
        }
    }

    pub fn control_points(&self) -> Vec<Vec3> {
        match self {
            BezierCurve::Linear { .. } => Vec::new(),
            BezierCurve::Quadratic { control, .. } => vec![*control],
            BezierCurve::Cubic {
                control_a,
                control_b,
                ..
            } => vec![*control_a, *control_b],
            BezierCurve::Parameterized(points) if points.len() > 2 => {
                points[1..points.len() - 1].to_vec()
            }
            BezierCurve::Parameterized(_) => Vec::new(),
        }
    }

    /// Point on the curve at `t` in `[0, 1]`
    pub fn compute(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        match self {
            BezierCurve::Linear { start, end } => start.lerp(*end, t),
            BezierCurve::Quadratic {
                start,
                control,
                end,
            } => *start * (u * u) + *control * (2.0 * u * t) + *end * (t * t),
            BezierCurve::Cubic {
                start,
                control_a,
                control_b,
                end,
            } => {
                *start * (u * u * u)
                    + *control_a * (3.0 * u * u * t)
                    + *control_b * (3.0 * u * t * t)
                    + *end * (t * t * t)
            }
            BezierCurve::Parameterized(points) => de_casteljau(points, t),
        }
    }

    /// Arc length approximated by `samples` chords
    pub fn length(&self, samples: u32) -> f32 {
        if let BezierCurve::Linear { start, end } = self {
            return start.distance(*end);
        }
        let samples = samples.max(1);
        let interval = 1.0 / samples as f32;
        let mut prev = self.start();
        let mut total = 0.0;
        for i in 1..=samples {
            let point = self.compute(interval * i as f32);
            total += prev.distance(point);
            prev = point;
        }
        total
    }

    /// Reject curves that collapse to a single point
    pub fn validate(&self) -> Result<()> {
        if let BezierCurve::Parameterized(points) = self {
            if points.len() < 2 {
                return Err(CoreError::validation(
                    "a Bézier curve needs a start and an end point",
                ));
            }
        }
        if self.start() == self.end() && self.control_points().iter().all(|c| *c == self.start())
        {
            return Err(CoreError::validation("Bézier curve is degenerate"));
        }
        Ok(())
    }
}

fn de_casteljau(points: &[Vec3], t: f32) -> Vec3 {
    let mut work = points.to_vec();
    let mut len = work.len();
    if len == 0 {
        return Vec3::ZERO;
    }
    while len > 1 {
        for i in 0..len - 1 {
            work[i] = work[i].lerp(work[i + 1], t);
        }
        len -= 1;
    }
    work[0]
}

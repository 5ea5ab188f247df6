//! Closed Catmull-Rom curve, used for the train track.

use anyhow::ensure;
use cgmath::{InnerSpace, Vector3};

#[derive(Clone, Debug, PartialEq)]
pub struct ClosedPath {
    points: Vec<Vector3<f32>>,
}

impl ClosedPath {
    /// A loop through `points`; the last point connects back to the first.
    pub fn new(points: Vec<Vector3<f32>>) -> anyhow::Result<Self> {
        ensure!(
            points.len() >= 3,
            "a closed path needs at least 3 control points, got {}",
            points.len()
        );
        Ok(Self { points })
    }

    pub fn control_points(&self) -> &[Vector3<f32>] {
        &self.points
    }

    /// Position at progress `u`. Values outside [0, 1) wrap around.
    pub fn point_at(&self, u: f32) -> Vector3<f32> {
        let (p0, p1, p2, p3, t) = self.segment(u);
        let t2 = t * t;
        let t3 = t2 * t;
        (p1 * 2.0
            + (p2 - p0) * t
            + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
            + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
            * 0.5
    }

    /// Unit direction of travel at progress `u`.
    pub fn tangent_at(&self, u: f32) -> Vector3<f32> {
        let (p0, p1, p2, p3, t) = self.segment(u);
        let derivative = ((p2 - p0)
            + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * (2.0 * t)
            + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * (3.0 * t * t))
            * 0.5;
        if derivative.magnitude2() > f32::EPSILON {
            derivative.normalize()
        } else {
            (p2 - p1).normalize()
        }
    }

    /// `segments` evenly spaced samples along the loop, without repeating the start.
    pub fn sample(&self, segments: usize) -> Vec<Vector3<f32>> {
        (0..segments)
            .map(|i| self.point_at(i as f32 / segments as f32))
            .collect()
    }

    fn segment(
        &self,
        u: f32,
    ) -> (
        Vector3<f32>,
        Vector3<f32>,
        Vector3<f32>,
        Vector3<f32>,
        f32,
    ) {
        let n = self.points.len();
        let scaled = u.rem_euclid(1.0) * n as f32;
        let i = (scaled.floor() as usize) % n;
        let t = (scaled - scaled.floor()).clamp(0.0, 1.0);
        (
            self.points[(i + n - 1) % n],
            self.points[i],
            self.points[(i + 1) % n],
            self.points[(i + 2) % n],
            t,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> ClosedPath {
        ClosedPath::new(vec![
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 10.0),
            Vector3::new(-10.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -10.0),
        ])
        .unwrap()
    }

    #[test]
    fn passes_through_control_points() {
        let path = square();
        for (i, point) in path.control_points().iter().enumerate() {
            let sampled = path.point_at(i as f32 / 4.0);
            assert!((sampled - *point).magnitude() < 1e-4, "{:?} vs {:?}", sampled, point);
        }
    }

    #[test]
    fn loop_is_closed() {
        let path = square();
        let start = path.point_at(0.0);
        let end = path.point_at(0.99999);
        assert!((start - end).magnitude() < 1e-2);
        assert!((path.point_at(1.25) - path.point_at(0.25)).magnitude() < 1e-4);
    }

    #[test]
    fn tangent_is_unit_length() {
        let path = square();
        for u in [0.0, 0.1, 0.5, 0.77] {
            assert!((path.tangent_at(u).magnitude() - 1.0).abs() < 1e-4);
        }
        // counter-clockwise seen from above: at (10,0,0) it heads towards +z
        assert!(path.tangent_at(0.0).z > 0.9);
    }

    #[test]
    fn needs_three_points() {
        assert!(ClosedPath::new(vec![Vector3::new(0.0, 0.0, 0.0); 2]).is_err());
    }
}

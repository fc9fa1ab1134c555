//! Piecewise-linear spline over an arbitrary value type.

/// Control points sorted by `t`, interpolated with a caller-supplied lerp.
pub struct LinearSpline<T> {
    points: Vec<(f64, T)>,
    lerp: fn(f64, &T, &T) -> T,
}

impl<T: Clone> LinearSpline<T> {
    /// Empty spline using `lerp(alpha, a, b)` between neighbouring points.
    pub fn new(lerp: fn(f64, &T, &T) -> T) -> Self {
        Self {
            points: Vec::new(),
            lerp,
        }
    }

    /// Add a control point. Points must be added in ascending `t`.
    pub fn add_point(&mut self, t: f64, value: T) -> &mut Self {
        self.points.push((t, value));
        self
    }

    /// Value at `t`, clamped to the end points. `None` when empty.
    pub fn get(&self, t: f64) -> Option<T> {
        let mut p1 = 0;
        for (i, (pt, _)) in self.points.iter().enumerate() {
            if *pt >= t {
                break;
            }
            p1 = i;
        }
        let (t1, v1) = self.points.get(p1)?;
        let p2 = (p1 + 1).min(self.points.len() - 1);
        if p1 == p2 {
            return Some(v1.clone());
        }
        let (t2, v2) = &self.points[p2];
        let alpha = ((t - t1) / (t2 - t1)).clamp(0.0, 1.0);
        Some((self.lerp)(alpha, v1, v2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lerp(a: f64, x: &f64, y: &f64) -> f64 {
        x + (y - x) * a
    }

    #[test]
    fn test_interpolates_between_points() {
        let mut s = LinearSpline::new(lerp);
        s.add_point(0.0, 0.0).add_point(0.5, 10.0).add_point(1.0, 30.0);
        assert_eq!(s.get(0.25), Some(5.0));
        assert_eq!(s.get(0.75), Some(20.0));
        assert_eq!(s.get(0.5), Some(10.0));
    }

    #[test]
    fn test_clamps_outside_range() {
        let mut s = LinearSpline::new(lerp);
        s.add_point(0.0, 1.0).add_point(1.0, 2.0);
        assert_eq!(s.get(-3.0), Some(1.0));
        assert_eq!(s.get(7.0), Some(2.0));
    }

    #[test]
    fn test_empty_and_single_point() {
        let mut s = LinearSpline::new(lerp);
        assert_eq!(s.get(0.3), None);
        s.add_point(0.5, 4.0);
        assert_eq!(s.get(0.9), Some(4.0));
    }
}

use nalgebra as na;
use std::f64::consts::{FRAC_PI_2, PI};

/// Angle between two vectors divided by a right angle: 0 for parallel,
/// 1 for perpendicular, 2 for opposite. NaN if either vector is zero.
#[inline]
pub fn normalized_angle(v1: &na::Vector2<f64>, v2: &na::Vector2<f64>) -> f64 {
    let cos = v1.dot(v2) / (v1.norm() * v2.norm());

    cos.clamp(-1.0, 1.0).acos() / FRAC_PI_2
}

/// Gaussian-like bump peaking at `l == l_avg`.
#[inline]
pub fn avg_length_score(l: f64, l_avg: f64) -> f64 {
    (-PI * (1.0 - l / l_avg).powi(2)).exp()
}

#[inline]
pub fn diff_length_score(l1: f64, l2: f64) -> f64 {
    1.0 / (1.0 + (l2 - l1).abs() / l1)
}

/// Nonzero only for folded-back configurations (`d_theta >= 1`).
#[inline]
pub fn angle_score(d_theta: f64) -> f64 {
    if d_theta >= 1.0 {
        (1.0 - d_theta).powi(2)
    } else {
        0.0
    }
}

/// Direction of the segment `a -> b` folded into `[0, pi)`.
#[inline]
pub fn folded_angle(a: &na::Point2<f64>, b: &na::Point2<f64>) -> f64 {
    let d = b - a;
    let angle = d.y.atan2(d.x);

    if angle < 0.0 {
        angle + PI
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn angle_is_normalized() {
        let x = na::Vector2::new(3.0, 0.0);

        assert_abs_diff_eq!(normalized_angle(&x, &na::Vector2::new(1.0, 0.0)), 0.0);
        let up = normalized_angle(&x, &na::Vector2::new(0.0, 2.0));
        assert_abs_diff_eq!(up, 1.0, epsilon = 1e-12);
        let back = normalized_angle(&x, &na::Vector2::new(-5.0, 0.0));
        assert_abs_diff_eq!(back, 2.0, epsilon = 1e-12);
        assert!(normalized_angle(&x, &na::Vector2::zeros()).is_nan());
    }

    #[test]
    fn scores() {
        assert_abs_diff_eq!(avg_length_score(12.0, 12.0), 1.0);
        assert_abs_diff_eq!(avg_length_score(24.0, 12.0), (-PI).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(diff_length_score(12.0, 24.0), 0.5);
        assert_abs_diff_eq!(angle_score(0.5), 0.0);
        assert_abs_diff_eq!(angle_score(1.0), 0.0);
        assert_abs_diff_eq!(angle_score(2.0), 1.0);
    }

    #[test]
    fn folded_angle_range() {
        let o = na::Point2::new(0.0, 0.0);

        let angle = |x, y| folded_angle(&o, &na::Point2::new(x, y));

        assert_abs_diff_eq!(angle(1.0, 1.0), PI / 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angle(1.0, -1.0), 3.0 * PI / 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angle(0.0, -1.0), PI / 2.0, epsilon = 1e-12);
    }
}

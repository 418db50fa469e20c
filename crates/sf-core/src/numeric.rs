/// Floating point type used throughout the pipeline.
pub type Real = f64;

/// Absolute and relative slack for comparing derived values.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Max, mean and min of a slice, ignoring NaN entries.
///
/// Returns `None` when the slice holds no finite-comparable value.
pub fn max_mean_min(values: &[Real]) -> Option<(Real, Real, Real)> {
    let mut max = Real::NEG_INFINITY;
    let mut min = Real::INFINITY;
    let mut sum = 0.0;
    let mut count = 0usize;
    for &v in values {
        if v.is_nan() {
            continue;
        }
        max = max.max(v);
        min = min.min(v);
        sum += v;
        count += 1;
    }
    (count > 0).then(|| (max, sum / count as Real, min))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_within_tolerance() {
        let tol = Tolerances::default();
        let magnitude = (0.1_f64 * 0.1 + 0.2 * 0.2).sqrt();
        assert!(nearly_equal(magnitude, 0.05_f64.sqrt(), tol));
        assert!(nearly_equal(0.0, 5e-13, tol));
        assert!(!nearly_equal(5.0, 5.0 + 1e-6, tol));

        let loose = Tolerances { abs: 0.0, rel: 1e-3 };
        assert!(nearly_equal(1000.0, 1000.5, loose));
        assert!(!nearly_equal(1.0, 1.01, loose));
    }

    #[test]
    fn max_mean_min_skips_nan() {
        let (max, mean, min) = max_mean_min(&[1.0, Real::NAN, 3.0, 2.0]).unwrap();
        assert_eq!(max, 3.0);
        assert_eq!(mean, 2.0);
        assert_eq!(min, 1.0);
        assert!(max_mean_min(&[]).is_none());
        assert!(max_mean_min(&[Real::NAN]).is_none());
    }
}

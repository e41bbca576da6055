/// lin_interp returns the linearly interpolated value at x for given discrete data points xp, fp.
/// xp must be increasing. Values outside of the xp range are clamped to the first/last fp value.
/// Returns None if xp and fp are empty or of unequal length. Inspired by numpy.interp.
pub fn lin_interp(x: f64, xp: &[f64], fp: &[f64]) -> Option<f64> {
    if xp.len() != fp.len() || xp.is_empty() {
        return None;
    }

    if x <= xp[0] {
        return Some(fp[0]);
    }

    // binary search for the segment that contains x
    let idx_upper = xp.partition_point(|&val| val < x);

    if idx_upper >= xp.len() {
        return fp.last().copied();
    }

    let dx = xp[idx_upper] - xp[idx_upper - 1];
    if dx <= 0.0 {
        return Some(fp[idx_upper]);
    }

    Some(fp[idx_upper - 1] + (x - xp[idx_upper - 1]) * (fp[idx_upper] - fp[idx_upper - 1]) / dx)
}

/// dist_sq returns the squared Euclidean distance between the points a and b.
pub fn dist_sq(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// cumulative_lengths returns the cumulative distance along a polyline for every point, starting
/// at 0.0 for the first point. The last element is therefore the total polyline length.
pub fn cumulative_lengths(points: &[[f64; 2]]) -> Vec<f64> {
    let mut cum_s = Vec::with_capacity(points.len());
    let mut s = 0.0;

    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            s += dist_sq(points[i - 1], *point).sqrt();
        }
        cum_s.push(s);
    }

    cum_s
}

/// clamp_finite clamps x into [min, max]. Non-finite x is mapped to min.
pub fn clamp_finite(x: f64, min: f64, max: f64) -> f64 {
    if !x.is_finite() {
        return min;
    }
    x.max(min).min(max)
}

/// wrap_into wraps x into [0, period[ (period must be positive).
pub fn wrap_into(x: f64, period: f64) -> f64 {
    let mut wrapped = x % period;
    if wrapped < 0.0 {
        wrapped += period;
    }
    // x % period can return period itself for tiny negative inputs after the correction above
    if wrapped >= period {
        wrapped = 0.0;
    }
    wrapped
}

pub(crate) const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

const EPSILON: f64 = 1e-9;

#[inline]
pub(crate) fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0].mul_add(b[0], a[1].mul_add(b[1], a[2] * b[2]))
}

#[inline]
pub(crate) fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Unit vector in the direction of `v`, or `None` for a (near) zero vector
pub(crate) fn normalize(v: &[f64; 3]) -> Option<[f64; 3]> {
    let norm = dot(v, v).sqrt();
    if !norm.is_finite() || norm < EPSILON {
        return None;
    }
    Some([v[0] / norm, v[1] / norm, v[2] / norm])
}

/// Scan-axis normal of an imaging plane given its row and column directions
pub(crate) fn scan_normal(row: &[f64; 3], column: &[f64; 3]) -> Option<[f64; 3]> {
    normalize(&cross(row, column))
}

//! Dynamic time warping between two scalar sequences.

/// Optimal warping path between `a` and `b` under the absolute-difference cost.
///
/// The path runs from `(0, 0)` to `(a.len() - 1, b.len() - 1)` and advances
/// by one step in `a`, `b` or both at a time. Ties are broken towards the
/// diagonal, then towards advancing `a`. Empty inputs give an empty path.
pub fn dtw_path(a: &[f64], b: &[f64]) -> Vec<(usize, usize)> {
    let n = a.len();
    let m = b.len();
    if n == 0 || m == 0 {
        return Vec::new();
    }

    // accumulated cost, row-major over (i, j)
    let mut acc = vec![f64::INFINITY; n * m];
    for i in 0..n {
        for j in 0..m {
            let cost = (a[i] - b[j]).abs();
            let prev = if i == 0 && j == 0 {
                0.0
            } else {
                let diag = if i > 0 && j > 0 { acc[(i - 1) * m + (j - 1)] } else { f64::INFINITY };
                let up = if i > 0 { acc[(i - 1) * m + j] } else { f64::INFINITY };
                let left = if j > 0 { acc[i * m + (j - 1)] } else { f64::INFINITY };
                diag.min(up).min(left)
            };
            acc[i * m + j] = cost + prev;
        }
    }

    let mut path = Vec::with_capacity(n + m - 1);
    let (mut i, mut j) = (n - 1, m - 1);
    path.push((i, j));
    while i > 0 || j > 0 {
        if i == 0 {
            j -= 1;
        } else if j == 0 {
            i -= 1;
        } else {
            let diag = acc[(i - 1) * m + (j - 1)];
            let up = acc[(i - 1) * m + j];
            let left = acc[i * m + (j - 1)];
            if diag <= up && diag <= left {
                i -= 1;
                j -= 1;
            } else if up <= left {
                i -= 1;
            } else {
                j -= 1;
            }
        }
        path.push((i, j));
    }
    path.reverse();
    path
}

/// Shape distance `|1 - path_len / max(len(a), len(b))|`.
///
/// Zero when the warping path is the straight diagonal; grows as the path
/// needs more off-diagonal steps to align the two sequences.
pub fn path_length_score(a: &[f64], b: &[f64]) -> f64 {
    let length = a.len().max(b.len());
    if length == 0 {
        return 0.0;
    }
    let path = dtw_path(a, b);
    (1.0 - path.len() as f64 / length as f64).abs()
}

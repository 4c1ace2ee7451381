//! Small dense linear algebra for the penalized least-squares fit.

/// Solve `a · x = b` for a square row-major `n × n` matrix by Gaussian
/// elimination with partial pivoting.
///
/// Returns `None` when the system is singular.
pub fn solve(a: &[f64], b: &[f64], n: usize) -> Option<Vec<f64>> {
    debug_assert_eq!(a.len(), n * n);
    debug_assert_eq!(b.len(), n);

    let mut m = a.to_vec();
    let mut x = b.to_vec();

    for col in 0..n {
        // Find pivot
        let mut pivot_row = col;
        for row in (col + 1)..n {
            if m[row * n + col].abs() > m[pivot_row * n + col].abs() {
                pivot_row = row;
            }
        }

        let pivot = m[pivot_row * n + col];
        if pivot == 0.0 || !pivot.is_finite() {
            return None;
        }

        if pivot_row != col {
            for j in 0..n {
                m.swap(col * n + j, pivot_row * n + j);
            }
            x.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = m[row * n + col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                m[row * n + j] -= factor * m[col * n + j];
            }
            x[row] -= factor * x[col];
        }
    }

    // Back substitution
    for col in (0..n).rev() {
        let mut acc = x[col];
        for j in (col + 1)..n {
            acc -= m[col * n + j] * x[j];
        }
        x[col] = acc / m[col * n + col];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Solve the ridge-style normal equations `(XᵀX + diag(penalty)) β = Xᵀy`.
///
/// `rows` holds the design matrix row by row; every row has `penalty.len()`
/// columns.
pub fn penalized_least_squares(rows: &[Vec<f64>], y: &[f64], penalty: &[f64]) -> Option<Vec<f64>> {
    let p = penalty.len();
    let mut xtx = vec![0.0; p * p];
    let mut xty = vec![0.0; p];

    for (row, &target) in rows.iter().zip(y) {
        for i in 0..p {
            let ri = row[i];
            if ri == 0.0 {
                continue;
            }
            xty[i] += ri * target;
            for j in i..p {
                xtx[i * p + j] += ri * row[j];
            }
        }
    }

    for i in 0..p {
        for j in 0..i {
            xtx[i * p + j] = xtx[j * p + i];
        }
        xtx[i * p + i] += penalty[i];
    }

    solve(&xtx, &xty, p)
}

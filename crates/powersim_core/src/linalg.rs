//! Dense linear algebra for the small symmetric systems of the estimator.
//!
//! Design matrices here have at most three columns, so the cross-product
//! matrices are tiny and a cyclic Jacobi sweep is both exact enough and fast.

/// Sweeps after which the Jacobi iteration gives up converging
const MAX_SWEEPS: usize = 64;

/// Square symmetric matrix stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl SymmetricMatrix {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    pub fn identity(dim: usize) -> Self {
        let mut m = Self::zeros(dim);
        for i in 0..dim {
            m.data[i * dim + i] = 1.0;
        }
        m
    }

    /// Cross-product `XᵀX` of a row-major design with `dim` columns
    pub fn gram<'a>(dim: usize, rows: impl IntoIterator<Item = &'a [f64]>) -> Self {
        let mut m = Self::zeros(dim);
        for row in rows {
            for i in 0..dim {
                for j in i..dim {
                    m.data[i * dim + j] += row[i] * row[j];
                }
            }
        }
        for i in 0..dim {
            for j in 0..i {
                m.data[i * dim + j] = m.data[j * dim + i];
            }
        }
        m
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.dim + j] = value;
    }

    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        (0..self.dim)
            .map(|i| (0..self.dim).map(|j| self.get(i, j) * v[j]).sum())
            .collect()
    }

    fn off_diagonal_norm(&self) -> f64 {
        let mut sum = 0.0;
        for i in 0..self.dim {
            for j in 0..self.dim {
                if i != j {
                    sum += self.get(i, j).powi(2);
                }
            }
        }
        sum.sqrt()
    }

    fn frobenius_norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Eigendecomposition by cyclic Jacobi rotations
    pub fn eigen(&self) -> Eigen {
        let n = self.dim;
        let mut a = self.clone();
        let mut v = Self::identity(n);
        let tolerance = f64::EPSILON * a.frobenius_norm();

        for _ in 0..MAX_SWEEPS {
            if a.off_diagonal_norm() <= tolerance {
                break;
            }
            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = a.get(p, q);
                    if apq == 0.0 {
                        continue;
                    }
                    let theta = (a.get(q, q) - a.get(p, p)) / (2.0 * apq);
                    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;

                    // A <- A·J
                    for k in 0..n {
                        let akp = a.get(k, p);
                        let akq = a.get(k, q);
                        a.set(k, p, c * akp - s * akq);
                        a.set(k, q, s * akp + c * akq);
                    }
                    // A <- Jᵀ·A
                    for k in 0..n {
                        let apk = a.get(p, k);
                        let aqk = a.get(q, k);
                        a.set(p, k, c * apk - s * aqk);
                        a.set(q, k, s * apk + c * aqk);
                    }
                    // V <- V·J
                    for k in 0..n {
                        let vkp = v.get(k, p);
                        let vkq = v.get(k, q);
                        v.set(k, p, c * vkp - s * vkq);
                        v.set(k, q, s * vkp + c * vkq);
                    }
                }
            }
        }

        Eigen {
            values: (0..n).map(|i| a.get(i, i)).collect(),
            vectors: v,
        }
    }
}

/// Eigenvalues and column eigenvectors of a symmetric matrix
#[derive(Debug, Clone)]
pub struct Eigen {
    pub values: Vec<f64>,
    /// Column `i` is the eigenvector of `values[i]`
    pub vectors: SymmetricMatrix,
}

impl Eigen {
    pub fn min_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Eigenvalues at or below `rcond · λ_max` count as zero
    fn cutoff(&self, rcond: f64) -> f64 {
        rcond * self.max_value().max(0.0)
    }

    /// Number of eigenvalues above the relative cutoff
    pub fn rank(&self, rcond: f64) -> usize {
        let cutoff = self.cutoff(rcond);
        self.values.iter().filter(|&&l| l > cutoff).count()
    }

    /// Moore–Penrose pseudo-inverse `V · diag(1/λ) · Vᵀ`, dropping the
    /// eigenvalues under the relative cutoff
    pub fn pseudo_inverse(&self, rcond: f64) -> SymmetricMatrix {
        let n = self.values.len();
        let cutoff = self.cutoff(rcond);
        let mut inv = SymmetricMatrix::zeros(n);
        for (k, &lambda) in self.values.iter().enumerate() {
            if lambda <= cutoff {
                continue;
            }
            for i in 0..n {
                for j in 0..n {
                    let value = inv.get(i, j)
                        + self.vectors.get(i, k) * self.vectors.get(j, k) / lambda;
                    inv.set(i, j, value);
                }
            }
        }
        inv
    }
}

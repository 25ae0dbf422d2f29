//! Ordinary least squares estimation of the treatment effect
//!
//! The model always includes an intercept and the treatment indicator, and
//! adds the pre measurement as a covariate when correction is requested.
//! The treatment coefficient sits at column 1 in both designs.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::DesignError;
use crate::linalg::SymmetricMatrix;
use crate::model::{Estimate, Outcome, SyntheticSample, Unit};

/// Smallest eigenvalue of `XᵀX` below which a design is flagged singular
pub const SINGULAR_THRESHOLD: f64 = 1e-10;

/// Relative cutoff for the eigenvalues of `XᵀX`: eigenvalues at or below
/// `ε · nobs · λ_max` count as zero in the rank and the pseudo-inverse.
///
/// This is machine precision scaled by the row count, the same order as the
/// rank tolerance of an SVD of the design itself.
pub fn rank_rcond(nobs: usize) -> f64 {
    f64::EPSILON * nobs as f64
}

/// Fewest units an intercept plus one predictor can be fit to
pub const MIN_UNITS: usize = 3;

/// Column of the treatment indicator in every design
const TREATMENT_COLUMN: usize = 1;

/// The two supported design matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Design {
    /// `[1, treated]`
    TreatmentOnly,
    /// `[1, treated, pre]`
    TreatmentCovariate,
}

impl Design {
    pub fn from_correction(correction: bool) -> Self {
        if correction {
            Design::TreatmentCovariate
        } else {
            Design::TreatmentOnly
        }
    }

    pub fn columns(&self) -> usize {
        match self {
            Design::TreatmentOnly => 2,
            Design::TreatmentCovariate => 3,
        }
    }

    /// Design row for a unit; only the first `columns()` entries are used
    #[inline]
    fn row(&self, unit: &Unit) -> [f64; 3] {
        match self {
            Design::TreatmentOnly => [1.0, unit.treatment(), 0.0],
            Design::TreatmentCovariate => [1.0, unit.treatment(), unit.pre],
        }
    }
}

impl Outcome {
    /// Response value of a unit under this outcome transform
    #[inline]
    pub fn response(&self, unit: &Unit) -> f64 {
        match self {
            Outcome::Post => unit.post,
            Outcome::Change => unit.post - unit.pre,
        }
    }
}

/// A fitted OLS model
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub design: Design,
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub nobs: usize,
    pub rank: usize,
    /// Residual degrees of freedom, `nobs - rank`
    pub df_resid: usize,
    pub rss: f64,
    /// Smallest eigenvalue of the cross-product matrix `XᵀX`
    pub min_eigenvalue: f64,
}

impl OlsFit {
    pub fn is_singular(&self) -> bool {
        self.min_eigenvalue < SINGULAR_THRESHOLD
    }

    /// Two-sided p-value of coefficient `j` under Student's t with
    /// `df_resid` degrees of freedom.
    ///
    /// Reported as 1.0 when the test is undefined (no residual degrees of
    /// freedom or an undefined statistic). A zero standard error on a
    /// non-zero coefficient gives 0.0.
    pub fn p_value(&self, j: usize) -> f64 {
        let beta = self.coefficients[j];
        let se = self.std_errors[j];
        if self.df_resid == 0 || !se.is_finite() {
            return 1.0;
        }
        let t = beta / se;
        if t.is_nan() {
            return 1.0;
        }
        if t.is_infinite() {
            return 0.0;
        }
        StudentsT::new(0.0, 1.0, self.df_resid as f64)
            .map(|dist| (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
            .unwrap_or(1.0)
    }

    /// Treatment coefficient, its p-value and the singularity flag
    pub fn treatment_effect(&self) -> Estimate {
        Estimate {
            estimate: self.coefficients[TREATMENT_COLUMN],
            pvalue: self.p_value(TREATMENT_COLUMN),
            singular: self.is_singular(),
        }
    }
}

/// Fit `response ~ 1 + treated [+ pre]` by least squares.
///
/// The normal equations are solved with the pseudo-inverse of `XᵀX`, so a
/// rank-deficient design yields the minimum-norm solution instead of
/// failing. Degeneracy is reported through `min_eigenvalue`.
pub fn fit_ols(
    sample: &SyntheticSample,
    outcome: Outcome,
    design: Design,
) -> Result<OlsFit, DesignError> {
    let nobs = sample.len();
    if nobs < MIN_UNITS {
        return Err(DesignError::TooFewUnits {
            units: nobs,
            minimum: MIN_UNITS,
        });
    }

    let p = design.columns();
    let rows: Vec<[f64; 3]> = sample.iter().map(|u| design.row(u)).collect();
    let response: Vec<f64> = sample.iter().map(|u| outcome.response(u)).collect();

    let gram = SymmetricMatrix::gram(p, rows.iter().map(|r| &r[..p]));
    let mut xty = vec![0.0; p];
    for (row, y) in rows.iter().zip(&response) {
        for (acc, x) in xty.iter_mut().zip(&row[..p]) {
            *acc += x * y;
        }
    }

    let eigen = gram.eigen();
    let rcond = rank_rcond(nobs);
    let rank = eigen.rank(rcond);
    let xtx_inv = eigen.pseudo_inverse(rcond);
    let coefficients = xtx_inv.mul_vec(&xty);

    let rss: f64 = rows
        .iter()
        .zip(&response)
        .map(|(row, y)| {
            let fitted: f64 = row[..p].iter().zip(&coefficients).map(|(x, b)| x * b).sum();
            (y - fitted).powi(2)
        })
        .sum();

    let df_resid = nobs.saturating_sub(rank);
    let sigma2 = if df_resid > 0 {
        rss / df_resid as f64
    } else {
        f64::NAN
    };
    let std_errors = (0..p).map(|j| (sigma2 * xtx_inv.get(j, j)).sqrt()).collect();

    Ok(OlsFit {
        design,
        coefficients,
        std_errors,
        nobs,
        rank,
        df_resid,
        rss,
        min_eigenvalue: eigen.min_value(),
    })
}

/// Estimate the treatment effect of a sample under the given outcome
/// transform and covariate choice.
///
/// Fails only when the sample has fewer than three units. Singular designs
/// are reported through the `singular` flag, not as an error.
pub fn estimate(
    sample: &SyntheticSample,
    outcome: Outcome,
    correction: bool,
) -> Result<Estimate, DesignError> {
    let fit = fit_ols(sample, outcome, Design::from_correction(correction))?;
    Ok(fit.treatment_effect())
}

//! Chi-square goodness-of-fit against a uniform distribution of complaints
//! across boroughs.

use crate::analyzers::regions::RegionCount;
use crate::config::ChiSquareConfig;
use crate::error::{ProcessingError, Result};
use serde::Serialize;

/// Upper-tail critical values for df = 1..=30
const CRITICAL_0_10: [f64; 30] = [
    2.706, 4.605, 6.251, 7.779, 9.236, 10.645, 12.017, 13.362, 14.684, 15.987, 17.275, 18.549,
    19.812, 21.064, 22.307, 23.542, 24.769, 25.989, 27.204, 28.412, 29.615, 30.813, 32.007,
    33.196, 34.382, 35.563, 36.741, 37.916, 39.087, 40.256,
];
const CRITICAL_0_05: [f64; 30] = [
    3.841, 5.991, 7.815, 9.488, 11.070, 12.592, 14.067, 15.507, 16.919, 18.307, 19.675, 21.026,
    22.362, 23.685, 24.996, 26.296, 27.587, 28.869, 30.144, 31.410, 32.671, 33.924, 35.172,
    36.415, 37.652, 38.885, 40.113, 41.337, 42.557, 43.773,
];
const CRITICAL_0_01: [f64; 30] = [
    6.635, 9.210, 11.345, 13.277, 15.086, 16.812, 18.475, 20.090, 21.666, 23.209, 24.725, 26.217,
    27.688, 29.141, 30.578, 32.000, 33.409, 34.805, 36.191, 37.566, 38.932, 40.289, 41.638,
    42.980, 44.314, 45.642, 46.963, 48.278, 49.588, 50.892,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareTest {
    /// Alphabetical
    pub regions: Vec<String>,
    pub observed: Vec<usize>,
    pub expected: Vec<f64>,
    pub statistic: f64,
    pub degrees_of_freedom: usize,
    pub significance_level: f64,
    pub critical_value: f64,
    pub reject_null: bool,
}

impl ChiSquareTest {
    pub fn decision(&self) -> &'static str {
        if self.reject_null {
            "Reject H0: borough complaint counts differ significantly"
        } else {
            "Fail to reject H0: no significant difference between boroughs"
        }
    }
}

/// Expected counts under a uniform null and the chi-square statistic.
/// Needs at least two categories and a non-zero total.
pub fn chi_square_statistic(observed: &[usize]) -> Result<(Vec<f64>, f64)> {
    let k = observed.len();
    let n: usize = observed.iter().sum();

    if k <= 1 {
        return Err(ProcessingError::InsufficientData(format!(
            "goodness-of-fit needs at least two boroughs, found {}",
            k
        )));
    }
    if n == 0 {
        return Err(ProcessingError::InsufficientData(
            "goodness-of-fit needs at least one complaint".to_string(),
        ));
    }

    let e = n as f64 / k as f64;
    let expected = vec![e; k];
    let statistic = observed
        .iter()
        .map(|&o| {
            let diff = o as f64 - e;
            diff * diff / e
        })
        .sum();

    Ok((expected, statistic))
}

/// Run the test over borough counts, ordered by borough name
pub fn goodness_of_fit(counts: &[RegionCount], config: &ChiSquareConfig) -> Result<ChiSquareTest> {
    let mut sorted: Vec<&RegionCount> = counts.iter().collect();
    sorted.sort_by(|a, b| a.region.cmp(&b.region));

    let observed: Vec<usize> = sorted.iter().map(|c| c.count).collect();
    let (expected, statistic) = chi_square_statistic(&observed)?;

    let degrees_of_freedom = config.degrees_of_freedom.unwrap_or(observed.len() - 1);
    let critical_value = config
        .critical_value
        .unwrap_or_else(|| critical_value(degrees_of_freedom, config.significance_level));

    Ok(ChiSquareTest {
        regions: sorted.iter().map(|c| c.region.clone()).collect(),
        observed,
        expected,
        statistic,
        degrees_of_freedom,
        significance_level: config.significance_level,
        critical_value,
        reject_null: statistic > critical_value,
    })
}

/// Upper-tail chi-square critical value. Tabulated for α ∈ {0.10, 0.05, 0.01}
/// and df ≤ 30, Wilson-Hilferty approximation otherwise.
pub fn critical_value(degrees_of_freedom: usize, significance_level: f64) -> f64 {
    let table = [
        (0.10, &CRITICAL_0_10),
        (0.05, &CRITICAL_0_05),
        (0.01, &CRITICAL_0_01),
    ];

    if (1..=30).contains(&degrees_of_freedom) {
        for (alpha, values) in table {
            if (alpha - significance_level).abs() < 1e-9 {
                return values[degrees_of_freedom - 1];
            }
        }
    }

    let k = degrees_of_freedom.max(1) as f64;
    let z = normal_quantile(1.0 - significance_level);
    let h = 2.0 / (9.0 * k);
    k * (1.0 - h + z * h.sqrt()).powi(3)
}

/// Inverse standard normal CDF (Acklam's rational approximation)
fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

//! ARIMA (AutoRegressive Integrated Moving Average) model
//!
//! - **AR**: past values of the differenced series predict the next one
//! - **I**: differencing `d` times removes trend before fitting
//! - **MA**: past forecast errors; only `q = 0` is estimated here
//!
//! AR coefficients come from the Yule-Walker equations, solved with the
//! Levinson-Durbin recursion. With `d = 0` the series is demeaned first;
//! with `d >= 1` the differenced series is modelled without a constant,
//! so no drift term is carried.
//!
//! ```rust
//! use climate_forecast::forecast::arima::{Arima, ArimaOrder};
//!
//! let data: Vec<f64> = (1..=30).map(|x| x as f64 + (x as f64 * 0.7).sin()).collect();
//! let fitted = Arima::new(ArimaOrder::new(2, 1, 0)).fit(&data).unwrap();
//! assert_eq!(fitted.forecast(3).len(), 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::{ClimateError, Result};

const VARIANCE_EPSILON: f64 = 1e-10;

/// `(p, d, q)` order of an ARIMA model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
}

impl ArimaOrder {
    #[must_use]
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Smallest series length the order can be fitted on
    #[must_use]
    pub const fn min_observations(&self) -> usize {
        self.p + self.d + 1
    }
}

/// Unfitted ARIMA model with a fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arima {
    order: ArimaOrder,
}

/// ARIMA model fitted to a concrete series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedArima {
    order: ArimaOrder,
    /// AR coefficients, lag 1 first
    ar_coeffs: Vec<f64>,
    /// Process mean, zero once the series is differenced
    mean: f64,
    /// Last `p` values of the differenced series
    recent: Vec<f64>,
    /// Last value at each differencing level, level 0 first
    levels: Vec<f64>,
}

impl Arima {
    #[must_use]
    pub const fn new(order: ArimaOrder) -> Self {
        Self { order }
    }

    #[must_use]
    pub const fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Fit the model against the full series
    pub fn fit(&self, data: &[f64]) -> Result<FittedArima> {
        let ArimaOrder { p, d, q } = self.order;

        if q > 0 {
            return Err(ClimateError::model_fit(format!(
                "moving-average order {q} is not supported"
            )));
        }

        let min_required = self.order.min_observations();
        if data.len() < min_required {
            return Err(ClimateError::model_fit(format!(
                "series has {} points, ARIMA({p},{d},{q}) needs at least {min_required}",
                data.len()
            )));
        }

        if data.iter().any(|x| !x.is_finite()) {
            return Err(ClimateError::model_fit(
                "series contains NaN or infinite values",
            ));
        }

        if variance(data) < VARIANCE_EPSILON {
            return Err(ClimateError::model_fit("series is constant"));
        }

        let mut levels = Vec::with_capacity(d);
        let mut differenced = data.to_vec();
        for _ in 0..d {
            levels.push(differenced[differenced.len() - 1]);
            differenced = difference(&differenced);
        }

        let process_mean = if d == 0 { mean(&differenced) } else { 0.0 };
        let ar_coeffs = yule_walker(&differenced, process_mean, p);
        let recent = differenced[differenced.len() - p..].to_vec();

        tracing::debug!(?ar_coeffs, mean = process_mean, observations = data.len(), "Fitted ARIMA model");

        Ok(FittedArima {
            order: self.order,
            ar_coeffs,
            mean: process_mean,
            recent,
            levels,
        })
    }
}

impl FittedArima {
    #[must_use]
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    #[must_use]
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coeffs
    }

    /// Predict the next `steps` values on the original scale
    #[must_use]
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        if steps == 0 {
            return Vec::new();
        }

        let mut window = self.recent.clone();
        let mut predicted = Vec::with_capacity(steps);

        for _ in 0..steps {
            let mut next = self.mean;
            for (lag, coeff) in self.ar_coeffs.iter().enumerate() {
                next += coeff * (window[window.len() - 1 - lag] - self.mean);
            }
            window.push(next);
            predicted.push(next);
        }

        self.integrate(predicted)
    }

    /// Undo differencing, innermost level first
    fn integrate(&self, mut values: Vec<f64>) -> Vec<f64> {
        for last in self.levels.iter().rev() {
            let mut running = *last;
            for value in &mut values {
                running += *value;
                *value = running;
            }
        }
        values
    }
}

fn difference(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

fn variance(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / data.len() as f64
}

/// Solve the Yule-Walker equations for `p` AR coefficients
fn yule_walker(data: &[f64], mean: f64, p: usize) -> Vec<f64> {
    let mut coeffs = vec![0.0; p];
    if p == 0 {
        return coeffs;
    }

    let n = data.len();
    let centered: Vec<f64> = data.iter().map(|x| x - mean).collect();
    let autocov: Vec<f64> = (0..=p)
        .map(|lag| {
            (lag..n)
                .map(|i| centered[i] * centered[i - lag])
                .sum::<f64>()
                / n as f64
        })
        .collect();

    let mut error = autocov[0];
    if error < VARIANCE_EPSILON {
        return coeffs;
    }

    // Levinson-Durbin
    for k in 0..p {
        let mut acc = autocov[k + 1];
        for j in 0..k {
            acc -= coeffs[j] * autocov[k - j];
        }
        let reflection = acc / error;

        let previous = coeffs.clone();
        coeffs[k] = reflection;
        for j in 0..k {
            coeffs[j] = previous[j] - reflection * previous[k - 1 - j];
        }

        error *= 1.0 - reflection * reflection;
        if error < VARIANCE_EPSILON {
            break;
        }
    }

    coeffs
}

//! Small numeric helpers shared by the ranking and the chart series.

/// Variance of a Beta(a, b) random variable.
///
/// Pure elementwise formula; degenerate shapes (a + b == 0) yield a
/// non-finite value rather than an error.
pub fn beta_variance(a: f64, b: f64) -> f64 {
    let s = a + b;
    (a * b) / (s * s * (s + 1.0))
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Mean, spread and count of one group of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub sd: Option<f64>,
    pub n: usize,
}

pub fn summarize(values: &[f64]) -> Option<Summary> {
    Some(Summary {
        mean: mean(values)?,
        sd: sample_std_dev(values),
        n: values.len(),
    })
}

/// Running mean used when collapsing duplicate cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn value(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Summary statistics over hourly load series.
use statrs::statistics::Statistics;

/// Largest value of the series, or zero for an empty series.
pub fn peak(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.;
    }
    Statistics::max(series.iter())
}

/// Mean over the strictly positive values of the series, or `None` if there are none.
pub fn mean_of_positive(series: &[f64]) -> Option<f64> {
    let positive: Vec<f64> = series.iter().copied().filter(|value| *value > 0.).collect();
    if positive.is_empty() {
        return None;
    }

    Some(Statistics::mean(positive))
}

/// Smallest strictly positive value of the series, or `None` if there are none.
pub fn min_of_positive(series: &[f64]) -> Option<f64> {
    let positive: Vec<f64> = series.iter().copied().filter(|value| *value > 0.).collect();
    if positive.is_empty() {
        return None;
    }

    Some(Statistics::min(positive))
}

/// Trading days per year used to annualize daily return dispersion.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Simple Moving Average (SMA)
/// Returns a vector aligned with `values`:
/// - `None` for indices `0..window-1` (fewer than `window` points so far)
/// - `Some(mean)` of the `window` values ending at (and including) the index
///
/// Each mean is summed from its own window, so long series carry no
/// running-sum drift.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let warm_up = (window - 1).min(values.len());

    std::iter::repeat(None)
        .take(warm_up)
        .chain(
            values
                .windows(window)
                .map(|w| Some(w.iter().sum::<f64>() / window as f64)),
        )
        .collect()
}

/// Simple returns `(p[i] - p[i-1]) / p[i-1]`, one per consecutive pair.
///
/// A zero previous price yields a return of `0.0` instead of an infinity.
/// That keeps the series finite but is not a meaningful return.
pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Population standard deviation (divides by `n`). `None` for an empty slice.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;

    Some(variance.sqrt())
}

/// Annualized rolling volatility
///
/// Output is aligned with `prices`:
/// - indices `0..window` are always `None` (fixed warm-up)
/// - index `i >= window` is the population std dev of returns
///   `r[i-window]..r[i-1]`, times √252
///
/// The return window stops one short of `r[i]`, the return ending at `i`.
/// Reference values depend on that boundary.
///
/// Fewer than two prices means no returns, so every entry is `None`.
pub fn rolling_volatility(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    let len = prices.len();
    if len < 2 {
        return vec![None; len];
    }

    let returns = simple_returns(prices);
    let annualization = TRADING_DAYS_PER_YEAR.sqrt();

    (0..len)
        .map(|i| {
            if i < window {
                return None;
            }
            population_std_dev(&returns[i - window..i]).map(|sd| sd * annualization)
        })
        .collect()
}

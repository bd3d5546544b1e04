use crate::snapshot::Limits;

/// Density of a trace across `bins` horizontal bands of the plot, scaled so
/// the busiest band is 1.
///
/// Each pair of consecutive defined samples adds one to every band its
/// connecting segment crosses.
pub fn distribution(values: &[f64], limits: Limits, bins: usize) -> Vec<f64> {
    let mut counts = vec![0.0; bins];
    let span = limits.hi - limits.lo;
    if bins == 0 || !(span > 0.0) {
        return counts;
    }
    let scale = bins as f64 / span;

    for pair in values.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if !a.is_finite() || !b.is_finite() {
            continue;
        }
        let mut begin = (scale * (a - limits.lo)) as i64;
        let mut end = (scale * (b - limits.lo)) as i64;
        if begin > end {
            std::mem::swap(&mut begin, &mut end);
        }
        if end < 0 || begin > bins as i64 {
            continue;
        }
        let begin = begin.max(0) as usize;
        let end = (end as usize).min(bins);
        for count in &mut counts[begin..end] {
            *count += 1.0;
        }
    }

    let max = counts.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        for count in &mut counts {
            *count /= max;
        }
    }
    counts
}

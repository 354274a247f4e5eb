//! Progress roll-ups. Pure functions over already-loaded values.

/// Percentage of the way from `initial` to `target`, clamped to 0..=100.
/// A degenerate key result (target == initial) is either done or not.
pub fn key_result_progress(initial: f64, target: f64, current: f64) -> f64 {
    let span = target - initial;
    if span.abs() < f64::EPSILON {
        if current >= target {
            100.0
        } else {
            0.0
        }
    } else {
        ((current - initial) / span * 100.0).clamp(0.0, 100.0)
    }
}

/// Arithmetic mean of the key result progress values, 0 with none.
pub fn objective_progress(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_measured_from_the_initial_value() {
        assert_eq!(key_result_progress(0.0, 100.0, 40.0), 40.0);
        assert_eq!(key_result_progress(50.0, 150.0, 100.0), 50.0);
    }

    #[test]
    fn progress_clamps_at_both_ends() {
        assert_eq!(key_result_progress(0.0, 100.0, -10.0), 0.0);
        assert_eq!(key_result_progress(0.0, 100.0, 250.0), 100.0);
    }

    #[test]
    fn degenerate_span_is_all_or_nothing() {
        assert_eq!(key_result_progress(10.0, 10.0, 10.0), 100.0);
        assert_eq!(key_result_progress(10.0, 10.0, 9.0), 0.0);
    }

    #[test]
    fn objective_progress_is_the_mean() {
        assert_eq!(objective_progress(&[100.0, 50.0, 0.0]), 50.0);
        assert_eq!(objective_progress(&[]), 0.0);
    }
}

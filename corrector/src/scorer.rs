//! # Scorer Module
//!
//! Turns the per-sub-task verdicts of one exercise into the integer percentage stored in an
//! attempt slot.

/// Computes `floor(100 * correct / total)` over a slice of verdicts.
///
/// Flooring means 99.9% never becomes a pass: only an exercise with every sub-task correct
/// scores 100.
///
/// # Arguments
///
/// * `verdicts` - One `bool` per sub-task of the exercise, `true` when the answer matched.
///
/// # Returns
///
/// The percentage as a `u32` in `0..=100`. An empty slice scores `0`.
///
/// # Example
///
/// ```
/// use corrector::scorer::compute_percentage;
///
/// assert_eq!(compute_percentage(&[true, true, false]), 66);
/// assert_eq!(compute_percentage(&[true, true]), 100);
/// assert_eq!(compute_percentage(&[]), 0);
/// ```
pub fn compute_percentage(verdicts: &[bool]) -> u32 {
    if verdicts.is_empty() {
        return 0;
    }
    let correct = verdicts.iter().filter(|&&v| v).count();
    (correct * 100 / verdicts.len()) as u32
}

use crate::types::CellValue;

/// ValueComparator is a strategy trait for grading a single sub-task.
///
/// Implementations must always produce a verdict: values that cannot be interpreted
/// count as a wrong answer, never as an error.
pub trait ValueComparator: Send + Sync {
    /// Returns `true` if `attempt` is accepted for the expected value.
    ///
    /// - `attempt`: the value the student entered.
    /// - `expected`: the value from the student's answer key.
    /// - `tolerance_rel`: relative tolerance in percent, if configured.
    /// - `tolerance_abs`: absolute tolerance, if configured.
    fn compare(
        &self,
        attempt: &CellValue,
        expected: &CellValue,
        tolerance_rel: Option<f64>,
        tolerance_abs: Option<f64>,
    ) -> bool;
}

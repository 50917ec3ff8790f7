//! A comparator that accepts numeric answers inside a tolerance window and textual answers
//! irrespective of case and surrounding whitespace.
//!
//! The dispatch happens on the expected value:
//!
//! | expected | rule |
//! |----------|------|
//! | empty    | always accepted |
//! | text     | `attempt.as_text().trim().to_lowercase() == expected.trim().to_lowercase()` |
//! | number   | attempt inside the relative window, the absolute window, or exactly equal |
//!
//! Textual attempts against a numeric expectation are normalized first: a decimal comma becomes
//! a decimal point and all whitespace is removed (`"1 234,5"` → `1234.5`). Anything that still
//! fails to parse is a wrong answer.

use crate::traits::comparator::ValueComparator;
use crate::types::CellValue;
use tracing::{debug, warn};

/// Default [`ValueComparator`] of the correction job.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToleranceComparator;

impl ValueComparator for ToleranceComparator {
    fn compare(
        &self,
        attempt: &CellValue,
        expected: &CellValue,
        tolerance_rel: Option<f64>,
        tolerance_abs: Option<f64>,
    ) -> bool {
        compare(attempt, expected, tolerance_rel, tolerance_abs)
    }
}

/// Compares one submitted value against one expected value.
///
/// Never fails: uninterpretable attempts are logged and count as incorrect.
pub fn compare(
    attempt: &CellValue,
    expected: &CellValue,
    tolerance_rel: Option<f64>,
    tolerance_abs: Option<f64>,
) -> bool {
    match expected {
        CellValue::Empty => true,
        CellValue::Text(solution) => {
            solution.trim().to_lowercase() == attempt.as_text().trim().to_lowercase()
        }
        CellValue::Number(solution) => {
            let Some(value) = numeric_attempt(attempt) else {
                warn!(
                    %attempt,
                    solution,
                    "Submitted value could not be interpreted as a number"
                );
                return false;
            };

            debug!(
                value,
                solution, ?tolerance_rel, ?tolerance_abs, "Comparing numeric answer"
            );

            let relative = tolerance_rel.is_some_and(|rel| {
                within(
                    value,
                    (1.0 - rel / 100.0) * solution,
                    (1.0 + rel / 100.0) * solution,
                )
            });
            let absolute = tolerance_abs
                .is_some_and(|abs| within(value, solution - abs, solution + abs));

            relative || absolute || value == *solution
        }
    }
}

/// Numeric reading of a submitted value; `None` for empty cells, unparsable or non-finite text.
fn numeric_attempt(attempt: &CellValue) -> Option<f64> {
    let value = match attempt {
        CellValue::Number(n) => *n,
        CellValue::Text(raw) => normalize_decimal(raw).parse::<f64>().ok()?,
        CellValue::Empty => return None,
    };
    value.is_finite().then_some(value)
}

/// Decimal comma to decimal point, whitespace removed.
fn normalize_decimal(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// Containment in `[a, b]` after ordering the bounds; negative solutions invert them.
fn within(value: f64, a: f64, b: f64) -> bool {
    let (low, high) = if a > b { (b, a) } else { (a, b) };
    low <= value && value <= high
}

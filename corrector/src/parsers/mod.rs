//! # Parsers
//!
//! This module turns the row lists extracted from workbooks into domain values.
//! Each parser implements [`crate::traits::parser::Parser`] over a `serde_json::Value`.
//!
//! The available parsers are:
//! - [`template_parser`]: For template rows, producing an [`crate::types::ExerciseTemplate`].
//! - [`submission_parser`]: For submission rows, producing a [`crate::types::StudentSubmission`].

pub mod submission_parser;
pub mod template_parser;

pub use submission_parser::JsonSubmissionParser;
pub use template_parser::JsonTemplateParser;

/// Groups `(exercise_number, item)` rows by their 1-based exercise number.
///
/// Numbers must be positive and must not decrease. Index `n - 1` of the result holds the
/// rows of exercise `n`; exercises without rows below the highest number are `None`.
pub(crate) fn group_rows<T>(
    rows: impl IntoIterator<Item = (i64, T)>,
) -> Result<Vec<Option<Vec<T>>>, String> {
    let mut groups: Vec<Option<Vec<T>>> = Vec::new();
    let mut last = 0i64;

    for (position, (exercise, item)) in rows.into_iter().enumerate() {
        if exercise < 1 {
            return Err(format!(
                "row {} has exercise number {exercise}, numbers start at 1",
                position + 1
            ));
        }
        if exercise < last {
            return Err(format!(
                "row {} exercise number {exercise} descends from {last}",
                position + 1
            ));
        }
        last = exercise;

        let idx = (exercise - 1) as usize;
        if groups.len() <= idx {
            groups.resize_with(idx + 1, || None);
        }
        groups[idx].get_or_insert_with(Vec::new).push(item);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_exercise_number() {
        let groups = group_rows(vec![(1, "a"), (1, "b"), (3, "c")]).unwrap();
        assert_eq!(groups, vec![Some(vec!["a", "b"]), None, Some(vec!["c"])]);
    }

    #[test]
    fn rejects_descending_and_non_positive_numbers() {
        assert!(group_rows(vec![(2, ()), (1, ())]).is_err());
        assert!(group_rows(vec![(0, ())]).is_err());
        assert!(group_rows(vec![(-4, ())]).is_err());
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(group_rows(Vec::<(i64, ())>::new()).unwrap().is_empty());
    }
}

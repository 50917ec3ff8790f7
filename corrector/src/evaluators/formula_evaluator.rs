use super::formula::{self, Scope};
use crate::error::CorrectorError;
use crate::traits::evaluator::TemplateEvaluator;
use crate::types::{CellValue, ExerciseTemplate, SolutionMatrix, SubtaskSolution};
use tracing::{debug, error};

/// In-process [`TemplateEvaluator`] that computes formula cells without a spreadsheet
/// application.
///
/// Formulas see `mat_num`, the dummy values as `a1 ..= aN`, and the value of every sub-task
/// resolved before them whose name is a plain identifier. Literal expected values pass through
/// unchanged.
#[derive(Debug, Default)]
pub struct FormulaEvaluator {
    open: bool,
}

impl FormulaEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn numeric(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => s.trim().replace(',', ".").parse().ok(),
        CellValue::Empty => None,
    }
}

impl TemplateEvaluator for FormulaEvaluator {
    fn open(&mut self) -> Result<(), CorrectorError> {
        self.open = true;
        Ok(())
    }

    fn evaluate(
        &mut self,
        template: &ExerciseTemplate,
        mat_num: i64,
        dummy_values: &[CellValue],
    ) -> Result<SolutionMatrix, CorrectorError> {
        if !self.open {
            return Err(CorrectorError::TemplateEvaluation(
                "evaluator used before open".to_string(),
            ));
        }

        let mut scope = Scope::new();
        scope.set("mat_num", mat_num as f64);
        for (idx, dummy) in dummy_values.iter().enumerate() {
            if let Some(value) = numeric(dummy) {
                scope.set(&format!("a{}", idx + 1), value);
            }
        }

        let mut solutions = Vec::with_capacity(template.exercises.len());
        for (exercise_idx, exercise) in template.exercises.iter().enumerate() {
            let mut resolved = Vec::with_capacity(exercise.len());
            for subtask in exercise {
                let value = match &subtask.formula {
                    Some(source) => {
                        let value = formula::evaluate(source, &scope).map_err(|e| {
                            error!(
                                exercise = exercise_idx + 1,
                                subtask = %subtask.name,
                                formula = %source,
                                error = %e,
                                "Formula evaluation failed"
                            );
                            CorrectorError::TemplateEvaluation(format!(
                                "exercise {} sub-task {:?}: {}",
                                exercise_idx + 1,
                                subtask.name,
                                e
                            ))
                        })?;
                        CellValue::Number(value)
                    }
                    None => subtask.expected_value.clone(),
                };

                if let (true, Some(n)) = (is_identifier(&subtask.name), numeric(&value)) {
                    scope.set(&subtask.name, n);
                }

                resolved.push(SubtaskSolution {
                    name: subtask.name.clone(),
                    value,
                    tolerance_rel: subtask.tolerance_rel,
                    tolerance_abs: subtask.tolerance_abs,
                });
            }
            solutions.push(resolved);
        }

        debug!(mat_num, "Resolved template formulas");
        Ok(solutions)
    }

    fn close(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::SolutionGenerator;
    use crate::types::SubtaskSpec;

    fn template() -> ExerciseTemplate {
        ExerciseTemplate::new(
            vec![
                vec![
                    SubtaskSpec::formula("force", "=a1 * a2", Some(1.0), None),
                    SubtaskSpec::literal("colour", "Red", None, None),
                ],
                vec![
                    SubtaskSpec::formula("twice", "=2 * force", None, Some(0.1)),
                    SubtaskSpec::formula("id_tail", "=mod(mat_num, 100)", None, None),
                ],
            ],
            3,
            2,
        )
        .unwrap()
    }

    #[test]
    fn resolves_formulas_literals_and_references() {
        let mut generator = SolutionGenerator::new(FormulaEvaluator::new());
        let key = generator
            .generate(
                &template(),
                123456,
                &[CellValue::Number(2.0), CellValue::Text("2,6".into())],
            )
            .unwrap();

        assert_eq!(key[0][0].value, CellValue::Number(5.2));
        assert_eq!(key[0][0].tolerance_rel, Some(1.0));
        assert_eq!(key[0][1].value, CellValue::Text("Red".into()));
        assert_eq!(key[1][0].value, CellValue::Number(10.4));
        assert_eq!(key[1][0].tolerance_abs, Some(0.1));
        assert_eq!(key[1][1].value, CellValue::Number(56.0));
    }

    #[test]
    fn failing_formula_is_a_template_error() {
        let mut generator = SolutionGenerator::new(FormulaEvaluator::new());
        let err = generator
            .generate(
                &template(),
                1,
                &[CellValue::Number(1.0), CellValue::Empty],
            )
            .unwrap_err();
        assert!(matches!(err, CorrectorError::TemplateEvaluation(msg) if msg.contains("force")));
    }

    #[test]
    fn requires_open() {
        let mut evaluator = FormulaEvaluator::new();
        assert!(evaluator.evaluate(&template(), 1, &[]).is_err());
        evaluator.open().unwrap();
        assert!(evaluator.is_open());
        evaluator.close();
        evaluator.close();
        assert!(!evaluator.is_open());
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("v_max"));
        assert!(!is_identifier("v max"));
        assert!(!is_identifier("1a"));
        assert!(!is_identifier(""));
    }
}

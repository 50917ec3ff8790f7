use crate::error::CorrectorError;
use crate::traits::evaluator::TemplateEvaluator;
use crate::types::{CellValue, ExerciseTemplate, SolutionMatrix};
use tracing::{debug, error};

/// Scoped use of a [`TemplateEvaluator`].
///
/// `open` runs on creation, `close` runs when the session is dropped, whichever way the
/// caller leaves the scope.
pub struct EvaluatorSession<'a, E: TemplateEvaluator + ?Sized> {
    evaluator: &'a mut E,
}

impl<'a, E: TemplateEvaluator + ?Sized> EvaluatorSession<'a, E> {
    pub fn open(evaluator: &'a mut E) -> Result<Self, CorrectorError> {
        if let Err(e) = evaluator.open() {
            evaluator.close();
            return Err(e);
        }
        Ok(Self { evaluator })
    }

    pub fn evaluate(
        &mut self,
        template: &ExerciseTemplate,
        mat_num: i64,
        dummy_values: &[CellValue],
    ) -> Result<SolutionMatrix, CorrectorError> {
        self.evaluator.evaluate(template, mat_num, dummy_values)
    }
}

impl<E: TemplateEvaluator + ?Sized> Drop for EvaluatorSession<'_, E> {
    fn drop(&mut self) {
        self.evaluator.close();
    }
}

/// Produces the answer key of one student.
pub struct SolutionGenerator<'a> {
    evaluator: Box<dyn TemplateEvaluator + 'a>,
}

impl<'a> SolutionGenerator<'a> {
    pub fn new<E: TemplateEvaluator + 'a>(evaluator: E) -> Self {
        Self {
            evaluator: Box::new(evaluator),
        }
    }

    /// Resolves `template` for `mat_num` and `dummy_values`.
    ///
    /// The result has exactly one list per template exercise and one entry per sub-task,
    /// in declaration order.
    ///
    /// # Errors
    ///
    /// [`CorrectorError::TemplateEvaluation`] if the dummy vector has the wrong length, the
    /// evaluator fails, or the evaluator returns a differently shaped matrix.
    pub fn generate(
        &mut self,
        template: &ExerciseTemplate,
        mat_num: i64,
        dummy_values: &[CellValue],
    ) -> Result<SolutionMatrix, CorrectorError> {
        if dummy_values.len() != template.dummy_count {
            return Err(CorrectorError::TemplateEvaluation(format!(
                "expected {} dummy values, got {}",
                template.dummy_count,
                dummy_values.len()
            )));
        }

        let solutions = {
            let mut session = EvaluatorSession::open(self.evaluator.as_mut())?;
            session.evaluate(template, mat_num, dummy_values)?
        };

        check_shape(template, &solutions)?;
        debug!(
            mat_num,
            exercises = solutions.len(),
            "Generated student-specific answer key"
        );
        Ok(solutions)
    }
}

fn check_shape(template: &ExerciseTemplate, solutions: &SolutionMatrix) -> Result<(), CorrectorError> {
    if solutions.len() != template.exercises.len() {
        error!(
            expected = template.exercises.len(),
            got = solutions.len(),
            "Evaluator returned a different number of exercises"
        );
        return Err(CorrectorError::TemplateEvaluation(format!(
            "evaluator produced {} exercises, template declares {}",
            solutions.len(),
            template.exercises.len()
        )));
    }

    for (idx, (declared, resolved)) in template.exercises.iter().zip(solutions).enumerate() {
        if declared.len() != resolved.len() {
            return Err(CorrectorError::TemplateEvaluation(format!(
                "evaluator produced {} values for exercise {}, template declares {}",
                resolved.len(),
                idx + 1,
                declared.len()
            )));
        }
    }
    Ok(())
}

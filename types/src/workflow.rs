//! The four-step draw → recognize → edit → solve flow.

use std::cmp::Ordering;

use thiserror::Error;

/// One of the four linear stages. Discriminants are the 1-based step numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum WorkflowStep {
    #[default]
    Draw = 1,
    Recognize = 2,
    Edit = 3,
    Solve = 4,
}

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 4] = [
        WorkflowStep::Draw,
        WorkflowStep::Recognize,
        WorkflowStep::Edit,
        WorkflowStep::Solve,
    ];

    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.number() == number)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            WorkflowStep::Draw => "Draw",
            WorkflowStep::Recognize => "Recognize",
            WorkflowStep::Edit => "Edit",
            WorkflowStep::Solve => "Solve",
        }
    }
}

/// Indicator state of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMark {
    Completed,
    Active,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("cannot advance from {from:?} back to {to:?}")]
    Backward { from: WorkflowStep, to: WorkflowStep },
    #[error("{op} is only valid from {expected:?}, current step is {actual:?}")]
    InvalidRegression {
        op: &'static str,
        expected: WorkflowStep,
        actual: WorkflowStep,
    },
}

/// Forward-only state machine with a reset and two named regressions.
///
/// Holds no business data; it only decides which view is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Workflow {
    current: WorkflowStep,
}

impl Workflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current(&self) -> WorkflowStep {
        self.current
    }

    /// Jump to `step`. Re-entering the current step is allowed (retry).
    pub fn advance(&mut self, step: WorkflowStep) -> Result<(), WorkflowError> {
        if step < self.current {
            return Err(WorkflowError::Backward {
                from: self.current,
                to: step,
            });
        }
        self.current = step;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.current = WorkflowStep::Draw;
    }

    /// Return to Draw after a recognition attempt.
    pub fn back_to_draw(&mut self) -> Result<(), WorkflowError> {
        self.regress("back_to_draw", WorkflowStep::Recognize, WorkflowStep::Draw)
    }

    /// Return to Edit from the solution view.
    pub fn back_to_edit(&mut self) -> Result<(), WorkflowError> {
        self.regress("back_to_edit", WorkflowStep::Solve, WorkflowStep::Edit)
    }

    fn regress(
        &mut self,
        op: &'static str,
        expected: WorkflowStep,
        target: WorkflowStep,
    ) -> Result<(), WorkflowError> {
        if self.current != expected {
            return Err(WorkflowError::InvalidRegression {
                op,
                expected,
                actual: self.current,
            });
        }
        self.current = target;
        Ok(())
    }

    #[must_use]
    pub fn mark(&self, step: WorkflowStep) -> StepMark {
        match step.cmp(&self.current) {
            Ordering::Less => StepMark::Completed,
            Ordering::Equal => StepMark::Active,
            Ordering::Greater => StepMark::Pending,
        }
    }

    /// Indicator marks for all four steps, in order.
    #[must_use]
    pub fn indicator(&self) -> [(WorkflowStep, StepMark); 4] {
        WorkflowStep::ALL.map(|step| (step, self.mark(step)))
    }
}

#[cfg(test)]
mod tests {
    use super::{StepMark, Workflow, WorkflowError, WorkflowStep};

    #[test]
    fn starts_at_draw() {
        let workflow = Workflow::new();
        assert_eq!(workflow.current(), WorkflowStep::Draw);
        assert_eq!(workflow.mark(WorkflowStep::Draw), StepMark::Active);
        assert_eq!(workflow.mark(WorkflowStep::Solve), StepMark::Pending);
    }

    #[test]
    fn advance_marks_earlier_steps_completed() {
        let mut workflow = Workflow::new();
        workflow.advance(WorkflowStep::Edit).unwrap();

        assert_eq!(
            workflow.indicator(),
            [
                (WorkflowStep::Draw, StepMark::Completed),
                (WorkflowStep::Recognize, StepMark::Completed),
                (WorkflowStep::Edit, StepMark::Active),
                (WorkflowStep::Solve, StepMark::Pending),
            ]
        );
    }

    #[test]
    fn reset_clears_all_completion() {
        let mut workflow = Workflow::new();
        workflow.advance(WorkflowStep::Solve).unwrap();
        workflow.reset();

        assert_eq!(workflow.current(), WorkflowStep::Draw);
        assert!(
            workflow
                .indicator()
                .iter()
                .all(|(_, mark)| *mark != StepMark::Completed)
        );
    }

    #[test]
    fn advance_rejects_backward_jump() {
        let mut workflow = Workflow::new();
        workflow.advance(WorkflowStep::Solve).unwrap();
        let err = workflow.advance(WorkflowStep::Recognize).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Backward {
                from: WorkflowStep::Solve,
                to: WorkflowStep::Recognize,
            }
        );
        assert_eq!(workflow.current(), WorkflowStep::Solve);
    }

    #[test]
    fn advance_to_current_step_is_allowed() {
        let mut workflow = Workflow::new();
        workflow.advance(WorkflowStep::Recognize).unwrap();
        assert!(workflow.advance(WorkflowStep::Recognize).is_ok());
    }

    #[test]
    fn named_regressions_only_from_their_step() {
        let mut workflow = Workflow::new();
        assert!(workflow.back_to_draw().is_err());

        workflow.advance(WorkflowStep::Recognize).unwrap();
        assert!(workflow.back_to_edit().is_err());
        workflow.back_to_draw().unwrap();
        assert_eq!(workflow.current(), WorkflowStep::Draw);

        workflow.advance(WorkflowStep::Solve).unwrap();
        workflow.back_to_edit().unwrap();
        assert_eq!(workflow.current(), WorkflowStep::Edit);
    }

    #[test]
    fn step_numbers_round_trip() {
        for step in WorkflowStep::ALL {
            assert_eq!(WorkflowStep::from_number(step.number()), Some(step));
        }
        assert_eq!(WorkflowStep::from_number(0), None);
        assert_eq!(WorkflowStep::from_number(5), None);
    }
}

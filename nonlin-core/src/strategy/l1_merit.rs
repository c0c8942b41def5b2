//! Exact l1 merit function acceptance.
//!
//! `phi_rho(x) = phi(x) + rho * theta(x)`. A trial point is accepted when
//! the actual merit reduction reaches a fraction of the predicted one. When
//! the prediction is not a descent for the merit function, the penalty is
//! raised first.

use crate::error::SolverError;
use crate::iterate::ProgressMeasures;
use crate::options::Options;
use crate::strategy::GlobalizationStrategy;

pub struct L1MeritFunction {
    penalty_parameter: f64,
    sufficient_decrease_factor: f64,
    tolerance: f64,
}

impl L1MeritFunction {
    pub fn new(options: &Options) -> Result<Self, SolverError> {
        Ok(Self {
            penalty_parameter: options.get_double("merit_initial_penalty")?,
            sufficient_decrease_factor: options.get_double("merit_sufficient_decrease_factor")?,
            tolerance: options.get_double("tolerance")?,
        })
    }

    fn merit(&self, progress: ProgressMeasures) -> f64 {
        progress.optimality + self.penalty_parameter * progress.infeasibility
    }
}

impl GlobalizationStrategy for L1MeritFunction {
    fn initialize(&mut self, _first_progress: ProgressMeasures) {}

    fn is_iterate_acceptable(
        &mut self,
        current_progress: ProgressMeasures,
        trial_progress: ProgressMeasures,
        _objective_multiplier: f64,
        predicted_reduction: f64,
    ) -> bool {
        let infeasibility_reduction =
            current_progress.infeasibility - trial_progress.infeasibility;

        let mut predicted_merit_reduction =
            predicted_reduction + self.penalty_parameter * infeasibility_reduction;
        if predicted_merit_reduction < 0. && 0. < infeasibility_reduction {
            // not a merit descent direction yet: raise the penalty until the
            // infeasibility term dominates
            self.penalty_parameter = 1.5 * (-predicted_reduction) / infeasibility_reduction;
            predicted_merit_reduction =
                predicted_reduction + self.penalty_parameter * infeasibility_reduction;
        }
        if predicted_merit_reduction < 0. {
            return false;
        }

        let actual_reduction = self.merit(current_progress) - self.merit(trial_progress);
        let rounding_slack = 1e-15 * current_progress.optimality.abs().max(1.);
        self.sufficient_decrease_factor * predicted_merit_reduction
            <= actual_reduction + rounding_slack
    }

    fn reset(&mut self) {}

    fn register_current_progress(&mut self, _current_progress: ProgressMeasures) {}

    fn is_infeasibility_acceptable(&self, infeasibility: f64) -> bool {
        infeasibility <= self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sufficient_decrease() {
        let options = Options::default();
        let mut merit = L1MeritFunction::new(&options).unwrap();
        let current = ProgressMeasures { infeasibility: 1., optimality: 10. };
        let good = ProgressMeasures { infeasibility: 0.5, optimality: 9. };
        assert!(merit.is_iterate_acceptable(current, good, 1., 1.));

        let bad = ProgressMeasures { infeasibility: 2., optimality: 10.5 };
        assert!(!merit.is_iterate_acceptable(current, bad, 1., 1.));
    }

    #[test]
    fn test_penalty_increase_on_negative_prediction() {
        let options = Options::default();
        let mut merit = L1MeritFunction::new(&options).unwrap();
        let before = merit.penalty_parameter;
        let current = ProgressMeasures { infeasibility: 1., optimality: 0. };
        let trial = ProgressMeasures { infeasibility: 0.1, optimality: 1. };
        // predicted objective increase, but large feasibility gain: the
        // penalty must grow to make the prediction a descent
        merit.is_iterate_acceptable(current, trial, 1., -100. * before);
        assert!(before < merit.penalty_parameter);
    }
}

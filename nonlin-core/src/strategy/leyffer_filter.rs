//! Filter acceptance strategy of Fletcher & Leyffer.
//!
//! A trial pair is acceptable when it is not dominated by the filter or the
//! current iterate. Iterations where the predicted optimality reduction
//! outweighs the current infeasibility (the switching condition) must also
//! achieve an Armijo fraction of that prediction; otherwise the current pair
//! joins the filter (h-type iteration).

use crate::error::SolverError;
use crate::iterate::ProgressMeasures;
use crate::options::Options;
use crate::strategy::{
    create_filter, Filter, FilterStrategyParameters, GlobalizationStrategy,
};

pub struct LeyfferFilterStrategy {
    filter: Filter,
    parameters: FilterStrategyParameters,
    initial_upper_bound: f64,
}

impl LeyfferFilterStrategy {
    pub fn new(options: &Options) -> Result<Self, SolverError> {
        Ok(Self {
            filter: create_filter(options)?,
            parameters: FilterStrategyParameters::from_options(options)?,
            initial_upper_bound: f64::INFINITY,
        })
    }
}

impl GlobalizationStrategy for LeyfferFilterStrategy {
    fn initialize(&mut self, first_progress: ProgressMeasures) {
        let upper_bound = self.parameters.upper_bound.max(
            self.parameters.infeasibility_fraction * first_progress.infeasibility,
        );
        self.filter.upper_bound = upper_bound;
        self.initial_upper_bound = upper_bound;
    }

    fn is_iterate_acceptable(
        &mut self,
        current_progress: ProgressMeasures,
        trial_progress: ProgressMeasures,
        _objective_multiplier: f64,
        predicted_reduction: f64,
    ) -> bool {
        let trial_infeasibility = trial_progress.infeasibility;
        let trial_optimality = trial_progress.optimality;

        if !self.filter.acceptable(trial_infeasibility, trial_optimality) {
            return false;
        }
        if !self.filter.acceptable_wrt_pair(
            current_progress.infeasibility,
            current_progress.optimality,
            trial_infeasibility,
            trial_optimality,
        ) {
            return false;
        }

        if self
            .parameters
            .switching_condition(predicted_reduction, current_progress.infeasibility)
        {
            // f-type: require sufficient actual decrease of the optimality
            // measure
            let actual_reduction = current_progress.optimality - trial_optimality;
            self.parameters.armijo_factor * predicted_reduction <= actual_reduction
        } else {
            // h-type: augment the filter with the current pair
            self.filter
                .add(current_progress.infeasibility, current_progress.optimality);
            true
        }
    }

    fn reset(&mut self) {
        self.filter.reset();
        self.filter.upper_bound = self.initial_upper_bound;
    }

    fn register_current_progress(&mut self, current_progress: ProgressMeasures) {
        self.filter
            .add(current_progress.infeasibility, current_progress.optimality);
    }

    fn is_infeasibility_acceptable(&self, infeasibility: f64) -> bool {
        if self.filter.is_empty() {
            self.filter.acceptable_wrt_upper_bound(infeasibility)
        } else {
            infeasibility < self.filter.smallest_infeasibility()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> LeyfferFilterStrategy {
        let options = Options::default();
        let mut strategy = LeyfferFilterStrategy::new(&options).unwrap();
        strategy.initialize(ProgressMeasures {
            infeasibility: 1.,
            optimality: 10.,
        });
        strategy
    }

    #[test]
    fn test_h_type_iteration_augments_filter() {
        let mut strategy = strategy();
        let current = ProgressMeasures { infeasibility: 1., optimality: 10. };
        // no predicted reduction: h-type, accepted on the theta margin
        let trial = ProgressMeasures { infeasibility: 0.5, optimality: 10.5 };
        assert!(strategy.is_iterate_acceptable(current, trial, 1., 0.));
        // the current pair is now in the filter: a dominated pair is rejected
        let dominated = ProgressMeasures { infeasibility: 1., optimality: 11. };
        assert!(!strategy.is_iterate_acceptable(current, dominated, 1., 0.));
    }

    #[test]
    fn test_f_type_requires_armijo_decrease() {
        let mut strategy = strategy();
        // nearly feasible: the switching condition holds for any positive
        // predicted reduction
        let current = ProgressMeasures { infeasibility: 1e-10, optimality: 10. };
        let predicted = 1.;
        let good_trial = ProgressMeasures { infeasibility: 1e-10, optimality: 9. };
        assert!(strategy.is_iterate_acceptable(current, good_trial, 1., predicted));
        let bad_trial = ProgressMeasures { infeasibility: 1e-10, optimality: 10. - 1e-9 };
        assert!(!strategy.is_iterate_acceptable(current, bad_trial, 1., predicted));
    }

    #[test]
    fn test_upper_bound_rejects() {
        let mut strategy = strategy();
        let current = ProgressMeasures { infeasibility: 1., optimality: 10. };
        let far = ProgressMeasures { infeasibility: 1e4, optimality: -1e9 };
        assert!(!strategy.is_iterate_acceptable(current, far, 1., 0.));
    }
}

//! Filter acceptance strategy of Waechter & Biegler.
//!
//! Differs from the Leyffer variant in how f-type iterations are gated: the
//! Armijo test only replaces the filter test when the current infeasibility
//! is already small (below a threshold seeded from the initial iterate);
//! everywhere else the iteration is h-type and the filter is augmented. The
//! filter envelope is seeded from the initial infeasibility.

use crate::error::SolverError;
use crate::iterate::ProgressMeasures;
use crate::options::Options;
use crate::strategy::{
    create_filter, Filter, FilterStrategyParameters, GlobalizationStrategy,
};

pub struct WaechterFilterStrategy {
    filter: Filter,
    parameters: FilterStrategyParameters,
    initial_upper_bound: f64,
    initial_infeasibility: f64,
    /// below this infeasibility, switching iterations use pure Armijo
    small_infeasibility_threshold: f64,
}

impl WaechterFilterStrategy {
    pub fn new(options: &Options) -> Result<Self, SolverError> {
        Ok(Self {
            filter: create_filter(options)?,
            parameters: FilterStrategyParameters::from_options(options)?,
            initial_upper_bound: f64::INFINITY,
            initial_infeasibility: f64::INFINITY,
            small_infeasibility_threshold: f64::INFINITY,
        })
    }
}

impl GlobalizationStrategy for WaechterFilterStrategy {
    fn initialize(&mut self, first_progress: ProgressMeasures) {
        self.initial_infeasibility = first_progress.infeasibility;
        let upper_bound = self.parameters.upper_bound.max(
            self.parameters.infeasibility_fraction * first_progress.infeasibility,
        );
        self.filter.upper_bound = upper_bound;
        self.initial_upper_bound = upper_bound;
        self.small_infeasibility_threshold = 1e-4 * first_progress.infeasibility.max(1.);
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

        let switching = self
            .parameters
            .switching_condition(predicted_reduction, current_progress.infeasibility);
        if switching && current_progress.infeasibility <= self.small_infeasibility_threshold {
            // f-type: objective-driven, Armijo on the optimality measure,
            // no filter augmentation
            let actual_reduction = current_progress.optimality - trial_optimality;
            self.parameters.armijo_factor * predicted_reduction <= actual_reduction
        } else {
            // h-type: require progress against the current pair and remember
            // it in the filter
            if !self.filter.acceptable_wrt_pair(
                current_progress.infeasibility,
                current_progress.optimality,
                trial_infeasibility,
                trial_optimality,
            ) {
                return false;
            }
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

    #[test]
    fn test_far_from_feasibility_stays_h_type() {
        let options = Options::default();
        let mut strategy = WaechterFilterStrategy::new(&options).unwrap();
        strategy.initialize(ProgressMeasures { infeasibility: 10., optimality: 0. });

        // large infeasibility: even with a big predicted reduction the
        // iteration is h-type and needs infeasibility (or optimality)
        // progress against the current pair
        let current = ProgressMeasures { infeasibility: 10., optimality: 0. };
        let no_progress = ProgressMeasures { infeasibility: 10., optimality: 0. };
        assert!(!strategy.is_iterate_acceptable(current, no_progress, 1., 1e6));

        let progress = ProgressMeasures { infeasibility: 5., optimality: 1. };
        assert!(strategy.is_iterate_acceptable(current, progress, 1., 1e6));
    }

    #[test]
    fn test_near_feasibility_uses_armijo() {
        let options = Options::default();
        let mut strategy = WaechterFilterStrategy::new(&options).unwrap();
        strategy.initialize(ProgressMeasures { infeasibility: 1., optimality: 10. });

        let current = ProgressMeasures { infeasibility: 1e-8, optimality: 10. };
        let trial = ProgressMeasures { infeasibility: 2e-8, optimality: 9. };
        // switching holds (pred = 1 >> theta^2) and theta is small: f-type
        assert!(strategy.is_iterate_acceptable(current, trial, 1., 1.));
    }
}

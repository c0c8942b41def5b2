//! Globalization strategies: the acceptance tests applied to trial iterates.

mod filter;
mod l1_merit;
mod leyffer_filter;
mod waechter_filter;

pub use filter::Filter;
pub use l1_merit::L1MeritFunction;
pub use leyffer_filter::LeyfferFilterStrategy;
pub use waechter_filter::WaechterFilterStrategy;

use crate::error::SolverError;
use crate::iterate::ProgressMeasures;
use crate::options::Options;

/// Accept/reject logic for trial iterates.
pub trait GlobalizationStrategy {
    /// Seed internal state (filter upper bound, reference measures) from the
    /// initial iterate's progress.
    fn initialize(&mut self, first_progress: ProgressMeasures);

    /// Decide whether the trial progress is acceptable given the current
    /// progress and the reduction the local model predicted.
    fn is_iterate_acceptable(
        &mut self,
        current_progress: ProgressMeasures,
        trial_progress: ProgressMeasures,
        objective_multiplier: f64,
        predicted_reduction: f64,
    ) -> bool;

    /// Forget accumulated history (phase switch or barrier update).
    fn reset(&mut self);

    /// Record the progress of the current iterate before leaving it behind
    /// (phase switches register the abandoned point).
    fn register_current_progress(&mut self, current_progress: ProgressMeasures);

    /// Whether an infeasibility level on its own is promising enough to keep
    /// iterating towards feasibility.
    fn is_infeasibility_acceptable(&self, infeasibility: f64) -> bool;
}

/// Build the strategy selected by the `strategy` option.
pub fn create_strategy(options: &Options) -> Result<Box<dyn GlobalizationStrategy>, SolverError> {
    match options.get_string("strategy")? {
        "leyffer-filter" => Ok(Box::new(LeyfferFilterStrategy::new(options)?)),
        "waechter-filter" => Ok(Box::new(WaechterFilterStrategy::new(options)?)),
        "l1-merit" => Ok(Box::new(L1MeritFunction::new(options)?)),
        other => Err(SolverError::InvalidOption(format!(
            "unknown globalization strategy {other}"
        ))),
    }
}

/// Parameters shared by both filter strategies.
pub(crate) struct FilterStrategyParameters {
    /// switching condition fraction
    pub delta: f64,
    /// absolute cap on the initial filter upper bound
    pub upper_bound: f64,
    /// fraction of the initial infeasibility entering the upper bound
    pub infeasibility_fraction: f64,
    /// exponent of theta in the switching condition
    pub switching_infeasibility_exponent: f64,
    /// Armijo factor for f-type iterations
    pub armijo_factor: f64,
}

impl FilterStrategyParameters {
    pub fn from_options(options: &Options) -> Result<Self, SolverError> {
        Ok(Self {
            delta: options.get_double("filter_delta")?,
            upper_bound: options.get_double("filter_ubd")?,
            infeasibility_fraction: options.get_double("filter_fact")?,
            switching_infeasibility_exponent: options
                .get_double("filter_switching_infeasibility_exponent")?,
            armijo_factor: options.get_double("filter_armijo_factor")?,
        })
    }

    /// f-type test: the predicted optimality improvement outweighs the
    /// current infeasibility.
    pub fn switching_condition(&self, predicted_reduction: f64, current_infeasibility: f64) -> bool {
        predicted_reduction
            > self.delta * current_infeasibility.powf(self.switching_infeasibility_exponent)
    }
}

pub(crate) fn create_filter(options: &Options) -> Result<Filter, SolverError> {
    Ok(Filter::new(
        options.get_usize("filter_capacity")?,
        options.get_double("filter_gamma_theta")?,
        options.get_double("filter_gamma_phi")?,
    ))
}

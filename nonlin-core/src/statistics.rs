//! Minimal iteration table, printed on stderr in verbose mode.

pub struct Statistics {
    enabled: bool,
    header_printed: bool,
}

impl Statistics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            header_printed: false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn print_iteration(
        &mut self,
        iteration: usize,
        phase: usize,
        step_norm: f64,
        objective: f64,
        infeasibility: f64,
        stationarity: f64,
        complementarity: f64,
    ) {
        if !self.enabled {
            return;
        }
        if !self.header_printed {
            eprintln!(
                "{:>6} {:>6} {:>12} {:>14} {:>14} {:>14} {:>14}",
                "major", "phase", "step norm", "objective", "primal infeas.", "stationarity", "complement."
            );
            self.header_printed = true;
        }
        eprintln!(
            "{iteration:>6} {phase:>6} {step_norm:>12.4e} {objective:>14.6e} {infeasibility:>14.4e} {stationarity:>14.4e} {complementarity:>14.4e}"
        );
    }
}

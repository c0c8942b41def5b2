//! Filter container for bi-criterion acceptance in
//! (infeasibility, objective) space.
//!
//! Entries are kept sorted by increasing infeasibility; inserting a pair
//! prunes every entry it dominates. No member dominates another, and every
//! member lies strictly below the upper bound on infeasibility.

#[derive(Debug, Clone, Copy)]
struct FilterEntry {
    infeasibility: f64,
    optimality: f64,
}

#[derive(Debug)]
pub struct Filter {
    entries: Vec<FilterEntry>,
    capacity: usize,
    pub upper_bound: f64,
    /// theta margin: a pair must improve infeasibility to beta * theta_k
    beta: f64,
    /// phi margin: or improve optimality by gamma * its own infeasibility
    gamma: f64,
}

impl Filter {
    pub fn new(capacity: usize, beta: f64, gamma: f64) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            upper_bound: f64::INFINITY,
            beta,
            gamma,
        }
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn smallest_infeasibility(&self) -> f64 {
        self.entries
            .first()
            .map(|entry| entry.infeasibility)
            .unwrap_or(f64::INFINITY)
    }

    pub fn acceptable_wrt_upper_bound(&self, infeasibility: f64) -> bool {
        infeasibility < self.upper_bound
    }

    /// Margin test of (theta, phi) against a single reference pair.
    fn acceptable_wrt_entry(&self, reference: FilterEntry, infeasibility: f64, optimality: f64) -> bool {
        infeasibility <= self.beta * reference.infeasibility
            || optimality <= reference.optimality - self.gamma * infeasibility
    }

    /// Acceptability with respect to the upper bound and every filter entry.
    pub fn acceptable(&self, infeasibility: f64, optimality: f64) -> bool {
        if !self.acceptable_wrt_upper_bound(infeasibility) {
            return false;
        }
        self.entries
            .iter()
            .all(|&entry| self.acceptable_wrt_entry(entry, infeasibility, optimality))
    }

    /// Acceptability with respect to an arbitrary pair (usually the current
    /// iterate), with the same margins.
    pub fn acceptable_wrt_pair(
        &self,
        reference_infeasibility: f64,
        reference_optimality: f64,
        infeasibility: f64,
        optimality: f64,
    ) -> bool {
        self.acceptable_wrt_entry(
            FilterEntry {
                infeasibility: reference_infeasibility,
                optimality: reference_optimality,
            },
            infeasibility,
            optimality,
        )
    }

    /// Insert a pair, pruning the entries it dominates. A pair at or above
    /// the upper bound is not stored.
    pub fn add(&mut self, infeasibility: f64, optimality: f64) {
        if !self.acceptable_wrt_upper_bound(infeasibility) {
            return;
        }
        self.entries.retain(|entry| {
            !(infeasibility <= entry.infeasibility && optimality <= entry.optimality)
        });
        let position = self
            .entries
            .partition_point(|entry| entry.infeasibility < infeasibility);
        self.entries.insert(
            position,
            FilterEntry {
                infeasibility,
                optimality,
            },
        );
        // shed the most infeasible entry when over capacity
        if self.capacity < self.entries.len() {
            self.entries.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> Filter {
        let mut filter = Filter::new(50, 0.999, 0.001);
        filter.upper_bound = 100.;
        filter
    }

    #[test]
    fn test_domination() {
        let mut filter = filter();
        filter.add(1., 10.);
        // dominated by (1, 10): rejected
        assert!(!filter.acceptable(1., 10.5));
        // improves infeasibility enough: accepted
        assert!(filter.acceptable(0.5, 11.));
        // improves optimality enough: accepted
        assert!(filter.acceptable(1., 9.));
    }

    #[test]
    fn test_add_prunes_dominated_entries() {
        let mut filter = filter();
        filter.add(2., 10.);
        filter.add(1., 12.);
        // dominates both
        filter.add(0.5, 5.);
        assert_eq!(filter.smallest_infeasibility(), 0.5);
        // old entries are gone: a pair only dominated by them is accepted
        assert!(filter.acceptable(1.5, 11.));
    }

    #[test]
    fn test_upper_bound() {
        let mut filter = filter();
        assert!(!filter.acceptable(100., -1e9));
        filter.add(200., -1e9);
        // nothing above the upper bound is stored
        assert!(filter.is_empty());
    }

    #[test]
    fn test_entries_stay_sorted() {
        let mut filter = filter();
        filter.add(3., 1.);
        filter.add(1., 3.);
        filter.add(2., 2.);
        assert_eq!(filter.smallest_infeasibility(), 1.);
    }
}

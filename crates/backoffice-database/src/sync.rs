//! Association set synchronisation.
//!
//! Replacing the permissions of a role (or the roles of a user) is planned
//! as a symmetric difference between the stored set and the requested set:
//! ids only in the stored set are detached, ids only in the requested set
//! are attached, and ids in both are left alone. Applying the same target
//! twice yields an empty plan the second time.

use std::collections::BTreeSet;

/// The rows to remove and insert to turn one id set into another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan<T> {
    /// Ids present in the target but not stored yet.
    pub attach: Vec<T>,
    /// Ids stored but absent from the target.
    pub detach: Vec<T>,
}

impl<T> SyncPlan<T> {
    /// Whether applying the plan changes nothing.
    pub fn is_noop(&self) -> bool {
        self.attach.is_empty() && self.detach.is_empty()
    }
}

/// Plan the changes that make `current` equal to `target`.
///
/// Duplicates in either input are ignored. Both output lists are sorted.
pub fn plan_sync<T: Ord + Copy>(current: &[T], target: &[T]) -> SyncPlan<T> {
    let current: BTreeSet<T> = current.iter().copied().collect();
    let target: BTreeSet<T> = target.iter().copied().collect();

    SyncPlan {
        attach: target.difference(&current).copied().collect(),
        detach: current.difference(&target).copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_attaches_and_detaches_difference_only() {
        let plan = plan_sync(&[1, 2, 3], &[2, 3, 4, 5]);
        assert_eq!(plan.attach, vec![4, 5]);
        assert_eq!(plan.detach, vec![1]);
    }

    #[test]
    fn test_plan_to_empty_target_detaches_everything() {
        let plan = plan_sync(&[3, 1], &[]);
        assert!(plan.attach.is_empty());
        assert_eq!(plan.detach, vec![1, 3]);
    }

    #[test]
    fn test_same_set_is_noop() {
        let plan = plan_sync(&[7, 8, 8], &[8, 7]);
        assert!(plan.is_noop());
    }
}

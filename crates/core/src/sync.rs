//! Many-to-many relation sync planning.
//!
//! A sync replaces the set of ids linked to an owner with a target set.
//! [`SyncPlan::diff`] computes which links to insert and which to remove;
//! links present in both sets are left untouched. Applying the plan is the
//! persistence layer's job.

use std::collections::HashSet;

use crate::types::DbId;

/// The link changes needed to turn a current id set into a target id set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Ids in the target but not currently linked, in target order.
    pub attach: Vec<DbId>,
    /// Ids currently linked but absent from the target, in current order.
    pub detach: Vec<DbId>,
}

impl SyncPlan {
    /// Compute the plan. Duplicate ids in either input are collapsed.
    pub fn diff(current: &[DbId], target: &[DbId]) -> Self {
        let current_set: HashSet<DbId> = current.iter().copied().collect();
        let target_set: HashSet<DbId> = target.iter().copied().collect();

        let mut seen = HashSet::new();
        let attach = target
            .iter()
            .copied()
            .filter(|id| !current_set.contains(id) && seen.insert(*id))
            .collect();

        let mut seen = HashSet::new();
        let detach = current
            .iter()
            .copied()
            .filter(|id| !target_set.contains(id) && seen.insert(*id))
            .collect();

        Self { attach, detach }
    }

    /// `true` when the current set already equals the target set.
    pub fn is_noop(&self) -> bool {
        self.attach.is_empty() && self.detach.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ids(n: usize) -> Vec<DbId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn empty_to_target_attaches_everything() {
        let target = ids(2);
        let plan = SyncPlan::diff(&[], &target);
        assert_eq!(plan.attach, target);
        assert!(plan.detach.is_empty());
    }

    #[test]
    fn target_empty_detaches_everything() {
        let current = ids(3);
        let plan = SyncPlan::diff(&current, &[]);
        assert!(plan.attach.is_empty());
        assert_eq!(plan.detach, current);
    }

    #[test]
    fn shared_ids_are_untouched() {
        let [a, b, c] = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let plan = SyncPlan::diff(&[a, b], &[b, c]);
        assert_eq!(plan.attach, vec![c]);
        assert_eq!(plan.detach, vec![a]);
    }

    #[test]
    fn same_set_is_noop() {
        let current = ids(3);
        let mut target = current.clone();
        target.reverse();
        assert!(SyncPlan::diff(&current, &target).is_noop());
    }

    #[test]
    fn duplicates_collapse() {
        let a = Uuid::new_v4();
        let plan = SyncPlan::diff(&[], &[a, a, a]);
        assert_eq!(plan.attach, vec![a]);
    }

    #[test]
    fn applying_plan_twice_is_idempotent() {
        let current = ids(2);
        let target = vec![current[1], Uuid::new_v4()];
        let plan = SyncPlan::diff(&current, &target);

        let mut after: Vec<DbId> = current
            .iter()
            .copied()
            .filter(|id| !plan.detach.contains(id))
            .collect();
        after.extend(&plan.attach);

        assert!(SyncPlan::diff(&after, &target).is_noop());
    }
}

//! Rules deriving the purchasing requirement of a running task from its progress.
//!
//! Rules follow Wu et al. 2024, "Can't Be Late: Optimizing Spot Instance Savings under Deadlines". `delay` is
//! the time a task loses when it is moved to another host, in milliseconds.

use crate::price::interval::PriceState;
use crate::scheduler::task::{PurchaseRequirement, ServiceTask};

/// Computation time the task still needs.
pub fn remaining_computation_time(task: &dyn ServiceTask) -> u64 {
    task.duration().saturating_sub(task.current_progress())
}

/// Safety net rule: the task must go on-demand once the time left before the deadline can't absorb
/// two more moves.
pub fn safety_net(task: &dyn ServiceTask, delay: u64) -> bool {
    let remaining_time = task.time_to_deadline() as i128;
    let computation_time = remaining_computation_time(task) as i128;
    remaining_time < computation_time + 2 * delay as i128
}

/// Hysteria rule: a task ahead of its expected progress by more than two moves can afford spot hosts.
///
/// `now` is the simulation time the expected progress is measured from.
pub fn hysteria(task: &dyn ServiceTask, now: u64, delay: u64) -> bool {
    let remaining_time = task.time_to_deadline() as i128;
    let computation_time = remaining_computation_time(task) as i128;
    let expected_progress = if remaining_time > 0 {
        now as i128 * computation_time / remaining_time
    } else {
        0
    };
    (task.current_progress() as i128) > expected_progress + 2 * delay as i128
}

/// Applies the safety net rule on top of an already derived requirement.
pub fn apply_safety_net(requirement: PurchaseRequirement, task: &dyn ServiceTask, delay: u64) -> PurchaseRequirement {
    if safety_net(task, delay) {
        PurchaseRequirement::OnDemand
    } else {
        requirement
    }
}

/// Whether a task running on a host in `state` has to be moved to satisfy the requirement.
pub fn needs_reschedule(requirement: PurchaseRequirement, state: PriceState) -> bool {
    match requirement {
        PurchaseRequirement::Any => false,
        PurchaseRequirement::OnDemand => state != PriceState::OnDemand,
        PurchaseRequirement::Spot => state != PriceState::Spot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::task::Task;

    #[test]
    fn test_safety_net_threshold() {
        // 1200 ms left for 1000 ms of computation
        let task = Task::new(0, 1, 1, 1000, 1200);
        assert!(!safety_net(&task, 100));
        assert!(safety_net(&task, 101));

        let mut task = task;
        task.add_progress(400);
        assert!(!safety_net(&task, 300));
        assert!(safety_net(&task, 301));
    }

    #[test]
    fn test_safety_net_after_deadline() {
        let mut task = Task::new(0, 1, 1, 1000, 1000);
        task.set_time(1500);
        assert!(safety_net(&task, 0));
        assert_eq!(
            apply_safety_net(PurchaseRequirement::Spot, &task, 0),
            PurchaseRequirement::OnDemand
        );
    }

    #[test]
    fn test_hysteria_threshold() {
        let mut task = Task::new(0, 1, 1, 1000, 4000);
        task.set_time(1000);
        task.add_progress(600);
        // expected progress = 1000 * 400 / 3000 = 133
        assert!(hysteria(&task, 1000, 233));
        assert!(!hysteria(&task, 1000, 234));
    }

    #[test]
    fn test_hysteria_after_deadline() {
        let mut task = Task::new(0, 1, 1, 1000, 1000);
        task.set_time(2000);
        assert!(!hysteria(&task, 2000, 0));
        task.add_progress(1);
        assert!(hysteria(&task, 2000, 0));
    }

    #[test]
    fn test_needs_reschedule() {
        assert!(!needs_reschedule(PurchaseRequirement::Any, PriceState::Spot));
        assert!(needs_reschedule(PurchaseRequirement::OnDemand, PriceState::Spot));
        assert!(!needs_reschedule(PurchaseRequirement::OnDemand, PriceState::OnDemand));
        assert!(needs_reschedule(PurchaseRequirement::Spot, PriceState::OnDemand));
    }
}

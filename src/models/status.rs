// Work item status state machine with validation

use super::ItemStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusTransitionError {
    #[error("Invalid status transition from {from:?} to {to:?}")]
    InvalidTransition { from: ItemStatus, to: ItemStatus },
}

/// Validates if a work item can transition from one status to another
///
/// The allowed lifecycle is pending → processing → {success | failed}, with
/// failed → processing permitted so an item can be retried in place.
pub fn can_transition(from: ItemStatus, to: ItemStatus) -> bool {
    match (from, to) {
        // From Pending
        (ItemStatus::Pending, ItemStatus::Processing) => true,

        // From Processing
        (ItemStatus::Processing, ItemStatus::Success) => true,
        (ItemStatus::Processing, ItemStatus::Failed) => true,

        // From Failed - can be retried in place
        (ItemStatus::Failed, ItemStatus::Processing) => true,

        // Same state is always allowed (no-op)
        (a, b) if a == b => true,

        // All other transitions are invalid
        _ => false,
    }
}

/// Validates and performs a status transition
pub fn transition_status(
    current: ItemStatus,
    target: ItemStatus,
) -> Result<ItemStatus, StatusTransitionError> {
    if !can_transition(current, target) {
        return Err(StatusTransitionError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    Ok(target)
}

/// Check if a status is a terminal state for summary purposes
///
/// Note that failed is only terminal once the retry budget is exhausted; the
/// orchestrator owns that decision.
pub fn is_terminal_status(status: ItemStatus) -> bool {
    matches!(status, ItemStatus::Success | ItemStatus::Failed)
}

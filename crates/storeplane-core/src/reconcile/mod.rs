//! Reconcile - when the registry refreshes, and the gates in front of
//! create and delete.

mod gate;
mod reconciler;

pub use gate::{delete_prompt, AssumeYes, Confirm};
pub use reconciler::{CreateOutcome, DeleteOutcome, Reconciler, RefreshOutcome};

//! Recurring transactions.
//!
//! There is no background scheduler. Occurrences are created lazily by the first
//! request from the logged in owner on or after the due date, public pages included.

mod engine;
mod frequency;
mod middleware;

pub use engine::{RECURRING_NOTE_PREFIX, materialize_due_transactions, recurring_note};
pub use frequency::{Frequency, next_occurrence};
pub use middleware::{
    RecurrenceState, SessionRecurrenceState, recurrence_middleware, session_recurrence_middleware,
};

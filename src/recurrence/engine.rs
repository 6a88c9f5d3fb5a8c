//! Creates the occurrences of recurring transactions that have fallen due.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use time::PrimitiveDateTime;

use crate::{
    Error,
    auth::UserID,
    recurrence::next_occurrence,
    transaction::{
        Transaction, create_transaction, get_recurring_transactions, set_next_date,
        transaction_exists_on,
    },
};

/// Marks the notes of transactions created from a recurring schedule.
pub const RECURRING_NOTE_PREFIX: &str = "(Recurring)";

/// The note carried by an occurrence created from a transaction with `note`.
///
/// The prefix is added once, so occurrences of occurrences keep the same note.
pub fn recurring_note(note: Option<&str>) -> String {
    let note = note.map(str::trim).unwrap_or_default();

    if note.starts_with(RECURRING_NOTE_PREFIX) {
        return note.to_owned();
    }

    if note.is_empty() {
        RECURRING_NOTE_PREFIX.to_owned()
    } else {
        format!("{RECURRING_NOTE_PREFIX} {note}")
    }
}

fn is_due(transaction: &Transaction, now: PrimitiveDateTime) -> bool {
    match transaction.next_date {
        Some(next_date) => now.date() >= next_date.date(),
        None => false,
    }
}

/// Create the due occurrences of the recurring transactions owned by `user_id`.
///
/// A transaction is due when the calendar date of `now` has reached the calendar date
/// of its `next_date`. Each occurrence copies the template, is dated `now` and gets
/// its own schedule. The template's schedule is moved to match. An occurrence is skipped
/// if the user already has a transaction with the same type, amount and note today,
/// but the template's schedule still moves forward so it does not fire again tomorrow.
///
/// All occurrences are committed together, so an error leaves the database unchanged.
///
/// # Errors
/// Returns an error if any query fails. Nothing is written in that case.
pub fn materialize_due_transactions(
    user_id: UserID,
    now: PrimitiveDateTime,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    // IMMEDIATE takes the write lock up front so the duplicate check and the insert
    // cannot interleave with another writer.
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let mut created = Vec::new();

    for template in get_recurring_transactions(user_id, &sql_transaction)? {
        if !is_due(&template, now) {
            continue;
        }

        let note = recurring_note(template.note.as_deref());

        if transaction_exists_on(
            user_id,
            template.transaction_type,
            template.amount,
            &note,
            now.date(),
            &sql_transaction,
        )? {
            tracing::debug!(
                "Skipping occurrence of transaction {} for user {user_id}, already created today",
                template.id
            );
            set_next_date(
                template.id,
                next_occurrence(template.frequency, now),
                &sql_transaction,
            )?;
            continue;
        }

        let occurrence = create_transaction(
            Transaction::build(template.amount, template.transaction_type, now)
                .category_id(template.category_id)
                .note(Some(note.as_str()))
                .recurring(template.frequency),
            user_id,
            &sql_transaction,
        )?;

        set_next_date(
            template.id,
            next_occurrence(template.frequency, now),
            &sql_transaction,
        )?;

        created.push(occurrence);
    }

    sql_transaction.commit()?;

    if !created.is_empty() {
        tracing::info!(
            "Created {} recurring transaction(s) for user {user_id}",
            created.len()
        );
    }

    Ok(created)
}

#[cfg(test)]
mod recurring_note_tests {
    use super::recurring_note;

    #[test]
    fn adds_prefix() {
        assert_eq!(recurring_note(Some("Rent")), "(Recurring) Rent");
    }

    #[test]
    fn empty_note_is_just_the_prefix() {
        assert_eq!(recurring_note(None), "(Recurring)");
        assert_eq!(recurring_note(Some("  ")), "(Recurring)");
    }

    #[test]
    fn prefix_is_not_stacked() {
        assert_eq!(recurring_note(Some("(Recurring) Rent")), "(Recurring) Rent");
    }
}

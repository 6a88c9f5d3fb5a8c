//! Defines the contact message model and its database queries.

use rusqlite::{Connection, Row};
use time::PrimitiveDateTime;

use crate::{Error, auth::Email};

pub type MessageId = i64;

/// A message sent through the contact form.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub id: MessageId,
    pub name: String,
    pub email: String,
    pub message: String,
    /// When the message was sent, in local time.
    pub date_sent: PrimitiveDateTime,
}

pub fn create_contact_message_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS contact_message (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                message TEXT NOT NULL,
                date_sent TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_message_row(row: &Row) -> Result<ContactMessage, rusqlite::Error> {
    Ok(ContactMessage {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        message: row.get(3)?,
        date_sent: row.get(4)?,
    })
}

/// Store a message from the contact form.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingField] if the name or message is blank,
/// - [Error::InvalidEmail] if the email is not a usable address,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_contact_message(
    name: &str,
    email: &str,
    message: &str,
    date_sent: PrimitiveDateTime,
    connection: &Connection,
) -> Result<ContactMessage, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::MissingField("name"));
    }

    let email = Email::new(email)?;

    let message = message.trim();
    if message.is_empty() {
        return Err(Error::MissingField("message"));
    }

    connection
        .prepare(
            "INSERT INTO contact_message (name, email, message, date_sent)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, name, email, message, date_sent",
        )?
        .query_row((name, email.as_str(), message, date_sent), map_message_row)
        .map_err(|error| error.into())
}

/// Get every contact message, newest first.
pub fn get_contact_messages(connection: &Connection) -> Result<Vec<ContactMessage>, Error> {
    connection
        .prepare(
            "SELECT id, name, email, message, date_sent FROM contact_message
            ORDER BY date_sent DESC, id DESC",
        )?
        .query_map([], map_message_row)?
        .map(|maybe_message| maybe_message.map_err(|error| error.into()))
        .collect()
}

pub fn count_contact_messages(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(*) FROM contact_message", [], |row| {
            row.get::<_, i64>(0).map(|count| count as usize)
        })
        .map_err(|error| error.into())
}

/// # Errors
/// Returns [Error::DeleteMissingMessage] if there is no message with `id`.
pub fn delete_contact_message(id: MessageId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM contact_message WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingMessage);
    }

    Ok(())
}

#[cfg(test)]
mod contact_core_tests {
    use time::macros::datetime;

    use crate::{Error, test_utils::get_test_connection};

    use super::{
        count_contact_messages, create_contact_message, delete_contact_message,
        get_contact_messages,
    };

    #[test]
    fn messages_are_listed_newest_first() {
        let connection = get_test_connection();
        create_contact_message(
            "Sita",
            "sita@example.com",
            "First",
            datetime!(2024-01-01 10:00),
            &connection,
        )
        .unwrap();
        create_contact_message(
            "Ram",
            "ram@example.com",
            "Second",
            datetime!(2024-02-01 10:00),
            &connection,
        )
        .unwrap();

        let messages = get_contact_messages(&connection).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message, "Second");
        assert_eq!(messages[1].message, "First");
        assert_eq!(count_contact_messages(&connection), Ok(2));
    }

    #[test]
    fn rejects_blank_fields_and_bad_email() {
        let connection = get_test_connection();
        let now = datetime!(2024-01-01 10:00);

        assert_eq!(
            create_contact_message(" ", "sita@example.com", "Hi", now, &connection),
            Err(Error::MissingField("name"))
        );
        assert!(matches!(
            create_contact_message("Sita", "not-an-email", "Hi", now, &connection),
            Err(Error::InvalidEmail(_))
        ));
        assert_eq!(
            create_contact_message("Sita", "sita@example.com", "\n", now, &connection),
            Err(Error::MissingField("message"))
        );
        assert_eq!(count_contact_messages(&connection), Ok(0));
    }

    #[test]
    fn delete_message() {
        let connection = get_test_connection();
        let message = create_contact_message(
            "Sita",
            "sita@example.com",
            "Hello",
            datetime!(2024-01-01 10:00),
            &connection,
        )
        .unwrap();

        delete_contact_message(message.id, &connection).unwrap();

        assert_eq!(count_contact_messages(&connection), Ok(0));
        assert_eq!(
            delete_contact_message(message.id, &connection),
            Err(Error::DeleteMissingMessage)
        );
    }
}

use rusqlite::Connection;

use crate::{
    auth::{Email, PasswordHash, Role, User, create_user},
    db::initialize,
};

/// An in-memory database with every table created and the default categories seeded.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

#[track_caller]
fn insert_user(username: &str, role: Role, connection: &Connection) -> User {
    create_user(
        username,
        &Email::new(&format!("{username}@example.com")).expect("Invalid test email"),
        // Tests that log in hash their own password, so a placeholder is enough here.
        PasswordHash::new_unchecked("not a real hash"),
        role,
        connection,
    )
    .expect("Could not create test user")
}

#[track_caller]
pub(crate) fn insert_test_user(username: &str, connection: &Connection) -> User {
    insert_user(username, Role::User, connection)
}

#[track_caller]
pub(crate) fn insert_test_admin(username: &str, connection: &Connection) -> User {
    insert_user(username, Role::Admin, connection)
}

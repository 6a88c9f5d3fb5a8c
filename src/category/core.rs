use rusqlite::{Connection, OptionalExtension, Row};

use crate::{Error, auth::UserID, transaction_type::TransactionType};

pub type CategoryId = i64;

/// A label for income or expenses, e.g. 'Salary' or 'Food'.
///
/// Categories without an owner are the global defaults shared by every user.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// The id for the category.
    pub id: CategoryId,
    /// The display name.
    pub name: String,
    /// Transactions may only use categories of the same type.
    pub transaction_type: TransactionType,
    /// The user who created the category, or `None` for the global defaults.
    pub user_id: Option<UserID>,
}

impl Category {
    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }
}

/// The categories every user starts with.
pub const DEFAULT_CATEGORIES: [(&str, TransactionType); 5] = [
    ("Salary", TransactionType::Income),
    ("Food", TransactionType::Expense),
    ("Rent", TransactionType::Expense),
    ("Travel", TransactionType::Expense),
    ("Other", TransactionType::Expense),
];

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            user_id INTEGER,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    // NULL never equals NULL in a unique index, so global categories are mapped to 0.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_category_name
            ON category(name, type, IFNULL(user_id, 0))",
        (),
    )?;

    Ok(())
}

/// Insert the [DEFAULT_CATEGORIES] as global categories if they do not exist yet.
pub fn seed_default_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare(
        "INSERT INTO category (name, type, user_id)
            SELECT ?1, ?2, NULL
            WHERE NOT EXISTS (
                SELECT 1 FROM category WHERE name = ?1 AND type = ?2 AND user_id IS NULL
            )",
    )?;

    for (name, transaction_type) in DEFAULT_CATEGORIES {
        statement.execute((name, transaction_type))?;
    }

    Ok(())
}

pub fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        transaction_type: row.get(2)?,
        user_id: row.get(3)?,
    })
}

/// Create a category owned by `user_id`.
///
/// # Errors
/// Returns a:
/// - [Error::EmptyCategoryName] if `name` is blank,
/// - [Error::DuplicateCategory] if a global category or one of the user's categories
///   already has the same name and type,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    name: &str,
    transaction_type: TransactionType,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyCategoryName);
    }

    // The unique index only covers categories with the same owner,
    // so clashes with the global categories are checked here.
    let existing: Option<CategoryId> = connection
        .query_row(
            "SELECT id FROM category
            WHERE name = ?1 AND type = ?2 AND (user_id IS NULL OR user_id = ?3)",
            (name, transaction_type, user_id),
            |row| row.get(0),
        )
        .optional()?;

    if existing.is_some() {
        return Err(Error::DuplicateCategory);
    }

    connection.execute(
        "INSERT INTO category (name, type, user_id) VALUES (?1, ?2, ?3)",
        (name, transaction_type, user_id),
    )?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        name: name.to_owned(),
        transaction_type,
        user_id: Some(user_id),
    })
}

/// Get the global categories and the categories owned by `user_id`, ordered by name.
pub fn get_categories_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, type, user_id FROM category
            WHERE user_id IS NULL OR user_id = :user_id
            ORDER BY name ASC, type ASC",
        )?
        .query_map(&[(":user_id", &user_id)], map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Get a category that `user_id` is allowed to use.
///
/// # Errors
/// Returns [Error::InvalidCategory] if the category does not exist or belongs to another user.
pub fn get_category_for_user(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .query_row(
            "SELECT id, name, type, user_id FROM category
            WHERE id = ?1 AND (user_id IS NULL OR user_id = ?2)",
            (category_id, user_id),
            map_row_to_category,
        )
        .optional()?
        .ok_or(Error::InvalidCategory(Some(category_id)))
}

#[cfg(test)]
mod category_tests {
    use crate::{
        Error,
        category::core::{
            create_category, get_categories_for_user, get_category_for_user,
            seed_default_categories,
        },
        test_utils::{get_test_connection, insert_test_user},
        transaction_type::TransactionType,
    };

    #[test]
    fn seeds_default_categories_once() {
        let connection = get_test_connection();

        seed_default_categories(&connection).unwrap();

        let count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM category WHERE user_id IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);

        let category =
            create_category("  Groceries ", TransactionType::Expense, user.id, &connection)
                .unwrap();

        assert!(category.id > 0);
        assert_eq!(category.name, "Groceries");
        assert_eq!(category.user_id, Some(user.id));
    }

    #[test]
    fn create_category_rejects_empty_name() {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);

        let result = create_category("   ", TransactionType::Expense, user.id, &connection);

        assert_eq!(result, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn create_category_rejects_duplicate_of_global_category() {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);

        let result = create_category("Food", TransactionType::Expense, user.id, &connection);

        assert_eq!(result, Err(Error::DuplicateCategory));
    }

    #[test]
    fn create_category_rejects_duplicate_of_own_category() {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);
        create_category("Gifts", TransactionType::Income, user.id, &connection).unwrap();

        let result = create_category("Gifts", TransactionType::Income, user.id, &connection);

        assert_eq!(result, Err(Error::DuplicateCategory));
    }

    #[test]
    fn same_name_with_other_type_is_allowed() {
        let connection = get_test_connection();
        let user = insert_test_user("sita", &connection);

        let result = create_category("Food", TransactionType::Income, user.id, &connection);

        assert!(result.is_ok());
    }

    #[test]
    fn users_only_see_global_and_own_categories() {
        let connection = get_test_connection();
        let sita = insert_test_user("sita", &connection);
        let ram = insert_test_user("ram", &connection);
        create_category("Gifts", TransactionType::Income, sita.id, &connection).unwrap();
        let rams_category =
            create_category("Fuel", TransactionType::Expense, ram.id, &connection).unwrap();

        let names: Vec<String> = get_categories_for_user(sita.id, &connection)
            .unwrap()
            .into_iter()
            .map(|category| category.name)
            .collect();

        assert_eq!(
            names,
            vec!["Food", "Gifts", "Other", "Rent", "Salary", "Travel"]
        );
        assert_eq!(
            get_category_for_user(rams_category.id, sita.id, &connection),
            Err(Error::InvalidCategory(Some(rams_category.id)))
        );
    }
}

use std::{
    error::Error,
    io::{self},
    path::Path,
    process::exit,
};

use clap::Parser;
use rusqlite::Connection;

use ledgerly::{
    Email, PasswordHash, Role, ValidatedPassword, create_user, get_user_by_email, initialize_db,
    set_user_password, set_user_role,
};

/// A utility for creating an admin account, or promoting an existing user to admin.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address the admin logs in with.
    #[arg(long)]
    email: String,

    /// The name shown for the admin. Only used when creating a new account.
    #[arg(long, default_value = "admin")]
    username: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let email = match Email::new(&args.email) {
        Ok(email) => email,
        Err(error) => {
            print_error(error);
            exit(1);
        }
    };

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    match get_user_by_email(&email, &connection) {
        Ok(user) => {
            println!("Promoting {} to admin", user.email);
            set_user_role(user.id, Role::Admin, &connection)?;

            if let Some(password_hash) = prompt_password_hash(&[&user.username, email.as_str()])
            {
                set_user_password(user.id, &password_hash, &connection)?;
                println!("Password updated.");
            }
        }
        Err(ledgerly::Error::NotFound) => {
            println!("Creating admin account for {email}");

            let Some(password_hash) = prompt_password_hash(&[&args.username, email.as_str()])
            else {
                print_error("A password is required to create an account.");
                exit(1);
            };

            create_user(
                &args.username,
                &email,
                password_hash,
                Role::Admin,
                &connection,
            )?;
        }
        Err(error) => return Err(error.into()),
    }

    println!("Success!");

    Ok(())
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        None => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }
}

/// Ask for a password twice. Returns `None` if stdin is closed.
fn prompt_password_hash(user_inputs: &[&str]) -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = match rpassword::prompt_password("Enter a new password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        let validated_password = match ValidatedPassword::new(&first_password, user_inputs) {
            Ok(password) => password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
                continue;
            }
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}

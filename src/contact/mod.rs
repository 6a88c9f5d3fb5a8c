//! Messages sent through the public contact form.

mod contact_page;
mod core;

pub use contact_page::{ContactForm, ContactState, get_contact_page, post_contact};
pub use core::{
    ContactMessage, MessageId, count_contact_messages, create_contact_message,
    create_contact_message_table, delete_contact_message, get_contact_messages,
};

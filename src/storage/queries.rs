//! SQL query builders.
//!
//! Generates the parameterized insert for `user_logins`.

use crate::storage::sink::IdempotencyStrategy;

/// Get the list of columns written for every record.
///
/// Returns tuples of (column_name, parameter_placeholder).
pub fn get_user_login_columns() -> Vec<(&'static str, &'static str)> {
    vec![
        ("user_id", "$1"),
        ("device_type", "$2"),
        ("masked_ip", "$3"),
        ("masked_device_id", "$4"),
        ("locale", "$5"),
        ("app_version", "$6"),
        ("create_date", "$7"),
    ]
}

/// Build INSERT query for user_logins.
///
/// Under [`IdempotencyStrategy::MessageId`] the queue message id is written as
/// an eighth column and a repeat delivery becomes a no-op.
pub fn build_user_login_insert(strategy: IdempotencyStrategy) -> String {
    let mut columns = get_user_login_columns();
    if strategy == IdempotencyStrategy::MessageId {
        columns.push(("message_id", "$8"));
    }

    let col_names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<&str> = columns.iter().map(|(_, ph)| *ph).collect();

    let mut query = format!(
        "INSERT INTO user_logins ({}) VALUES ({})",
        col_names.join(", "),
        placeholders.join(", ")
    );
    if strategy == IdempotencyStrategy::MessageId {
        query.push_str(" ON CONFLICT (message_id) DO NOTHING");
    }
    query
}

//! Record lookup by full ID or unique prefix.

use uuid::Uuid;

use deskboard_core::storage::{AgeSqliteStorage, RecordFilter, Session, Stored};
use deskboard_core::{Record, StorageEngine};

use crate::errors::CliError;

/// Shortest prefix accepted in place of a full ID.
pub const MIN_PREFIX_LEN: usize = 4;

/// Find one of the session user's records by full UUID or unique prefix.
pub fn find_record<R: Record>(
    storage: &AgeSqliteStorage,
    session: &Session,
    input: &str,
    list_hint: &str,
) -> anyhow::Result<Stored<R>> {
    let kind = R::KIND;
    let trimmed = input.trim();
    if let Ok(id) = Uuid::parse_str(trimmed) {
        return storage.get::<R>(session, &id)?.ok_or_else(|| {
            CliError::not_found(format!("No {} with ID {}", kind, id), list_hint).into()
        });
    }

    let prefix = trimmed.to_lowercase();
    if prefix.len() < MIN_PREFIX_LEN || !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
    {
        return Err(CliError::invalid_input(format!(
            "Invalid ID: {} (use a full ID or at least {} characters of one)",
            input, MIN_PREFIX_LEN
        ))
        .into());
    }

    let mut matches: Vec<Stored<R>> = storage
        .list::<R>(session, &RecordFilter::new())?
        .into_iter()
        .filter(|stored| stored.id.to_string().starts_with(&prefix))
        .collect();
    match matches.len() {
        0 => Err(CliError::not_found(format!("No {} with ID {}", kind, input), list_hint).into()),
        1 => Ok(matches.remove(0)),
        n => Err(CliError::invalid_input(format!(
            "ID prefix {} matches {} {} records; use more characters",
            input, n, kind
        ))
        .into()),
    }
}

/// Find a record among already-loaded ones by full UUID or unique prefix.
pub fn pick<'a, T, F>(items: &'a [T], input: &str, what: &str, id_of: F) -> anyhow::Result<&'a T>
where
    F: Fn(&T) -> Uuid,
{
    let prefix = input.trim().to_lowercase();
    if prefix.is_empty() {
        return Err(CliError::invalid_input(format!("Missing {} ID", what)).into());
    }
    let matches: Vec<&T> = items
        .iter()
        .filter(|item| id_of(item).to_string().starts_with(&prefix))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only),
        [] => Err(CliError::invalid_input(format!("No {} with ID {}", what, input)).into()),
        _ => Err(CliError::invalid_input(format!(
            "{} ID prefix {} is ambiguous; use more characters",
            what, input
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_by_prefix() {
        let a = Uuid::parse_str("aaaa1111-0000-0000-0000-000000000000").unwrap();
        let b = Uuid::parse_str("aaaa2222-0000-0000-0000-000000000000").unwrap();
        let items = vec![a, b];

        assert_eq!(*pick(&items, "aaaa1", "task", |id| *id).unwrap(), a);
        assert_eq!(*pick(&items, &b.to_string(), "task", |id| *id).unwrap(), b);
        assert!(pick(&items, "aaaa", "task", |id| *id).is_err());
        assert!(pick(&items, "ffff", "task", |id| *id).is_err());
        assert!(pick(&items, "", "task", |id| *id).is_err());
    }
}

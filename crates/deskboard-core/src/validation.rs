//! Field validation helpers shared by record types.

use std::collections::HashSet;

use crate::error::{DeskError, Result};

/// Maximum bytes per tag.
pub const MAX_TAG_BYTES: usize = 128;

/// Maximum tags per record.
pub const MAX_TAGS_PER_RECORD: usize = 100;

/// Maximum bytes for a serialized record.
pub const MAX_DATA_BYTES: usize = 1024 * 1024;

/// Normalize and validate tags.
///
/// - Trims whitespace and converts to lowercase
/// - Removes duplicates, keeping first occurrence order
/// - Allows only alphanumerics, dash, underscore and colon
/// - Enforces length limits
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>> {
    if tags.len() > MAX_TAGS_PER_RECORD {
        return Err(DeskError::Validation(format!(
            "Too many tags (max {})",
            MAX_TAGS_PER_RECORD
        )));
    }

    let mut seen = HashSet::with_capacity(tags.len());
    let mut normalized = Vec::with_capacity(tags.len());

    for tag in tags {
        let trimmed = tag.trim().to_ascii_lowercase();
        if trimmed.is_empty() {
            return Err(DeskError::Validation("Empty tag is not allowed".to_string()));
        }
        if trimmed.len() > MAX_TAG_BYTES {
            return Err(DeskError::Validation(format!(
                "Tag too long (max {} bytes)",
                MAX_TAG_BYTES
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
        {
            return Err(DeskError::Validation(format!(
                "Tag contains invalid characters: {}",
                tag
            )));
        }
        if seen.insert(trimmed.clone()) {
            normalized.push(trimmed);
        }
    }

    Ok(normalized)
}

/// Require a non-blank text field.
pub fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DeskError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags_lowercases_and_dedupes() {
        let tags = vec![
            " Work ".to_string(),
            "work".to_string(),
            "client:acme".to_string(),
        ];
        assert_eq!(
            normalize_tags(&tags).unwrap(),
            vec!["work".to_string(), "client:acme".to_string()]
        );
    }

    #[test]
    fn test_normalize_tags_rejects_bad_input() {
        assert!(normalize_tags(&["".to_string()]).is_err());
        assert!(normalize_tags(&["has space".to_string()]).is_err());
        assert!(normalize_tags(&["x".repeat(MAX_TAG_BYTES + 1)]).is_err());
        let many: Vec<String> = (0..=MAX_TAGS_PER_RECORD).map(|i| format!("t{}", i)).collect();
        assert!(normalize_tags(&many).is_err());
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("Title", "Quarterly review").is_ok());
        let err = require_text("Title", "   ").unwrap_err();
        assert!(err.to_string().contains("Title cannot be empty"));
    }
}

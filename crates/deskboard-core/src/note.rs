//! Free-form notes.

use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::record::{Record, RecordKind};
use crate::validation::{normalize_tags, require_text};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl Note {
    /// Build a note with normalized tags.
    pub fn new(title: impl Into<String>, body: impl Into<String>, tags: &[String]) -> Result<Self> {
        let note = Self {
            title: title.into().trim().to_string(),
            body: body.into(),
            tags: normalize_tags(tags)?,
            pinned: false,
        };
        note.validate()?;
        Ok(note)
    }

    /// First non-empty line of the body, for list views.
    pub fn preview(&self, max_chars: usize) -> String {
        let line = self
            .body
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("");
        if line.chars().count() <= max_chars {
            line.to_string()
        } else {
            let cut: String = line.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{}...", cut)
        }
    }
}

impl Record for Note {
    const KIND: RecordKind = RecordKind::Note;

    fn validate(&self) -> Result<()> {
        require_text("Title", &self.title)?;
        let normalized = normalize_tags(&self.tags)?;
        if normalized != self.tags {
            return Err(DeskError::Validation(
                "Tags must be normalized".to_string(),
            ));
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        format!("{} {} {}", self.title, self.body, self.tags.join(" "))
    }
}

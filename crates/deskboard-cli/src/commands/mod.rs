//! Command handlers, one module per command group.

pub mod dashboard;
pub mod gtci;
pub mod init;
pub mod leave;
pub mod maintenance;
pub mod matters;
pub mod meetings;
pub mod misc;
pub mod networth;
pub mod notes;
pub mod projects;
pub mod records;
pub mod users;
pub mod workflow;

use uuid::Uuid;

use crate::app::AppContext;
use crate::ui::{header, print, short_id, UiContext};

/// IDs are shortened for people and kept whole for scripts.
pub(crate) fn display_id(ui: &UiContext, id: &Uuid) -> String {
    if ui.mode.is_pretty() {
        short_id(id)
    } else {
        id.to_string()
    }
}

/// Text for an optional field, `-` when unset.
pub(crate) fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => "-".to_string(),
    }
}

/// Print a view header in pretty mode.
pub(crate) fn print_header(ctx: &AppContext, ui: &UiContext, command: &str, context: Option<&str>) {
    if ui.mode.is_pretty() && !ctx.quiet() {
        print(ui, &header(ui, command, context));
    }
}

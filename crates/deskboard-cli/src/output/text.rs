//! Text output shared by mutating commands.

use crate::ui::{print, receipt, UiContext};

/// Print an action receipt unless quiet.
pub fn print_receipt(ui: &UiContext, quiet: bool, title: &str, items: &[(&str, &str)]) {
    if quiet {
        return;
    }
    print(ui, &receipt(ui, title, items));
}

/// Print the receipt for a deleted record.
pub fn print_deleted(ui: &UiContext, quiet: bool, what: &str, id: &uuid::Uuid) {
    let id = id.to_string();
    print_receipt(ui, quiet, &format!("Deleted {}", what), &[("ID", &id)]);
}

//! UI primitives for the Deskboard CLI.
//!
//! This module provides:
//! - **Context**: Environment detection (TTY, width, color, unicode)
//! - **Mode**: Output mode resolution (json, plain, pretty)
//! - **Theme**: Badge tokens and styles
//! - **Render**: Tables, headers, receipts, hints
//! - **Format**: String, date and number helpers
//!
//! # Usage
//!
//! ```ignore
//! let ui = ctx.ui_context(args.json, args.format);
//!
//! if ui.mode.is_json() {
//!     return print_json(&value);
//! }
//!
//! print(&ui, &header(&ui, "matter list", None));
//! print(&ui, &simple_table(&ui, &columns(&["ID", "Reference"]), &rows));
//! ```

mod context;
pub mod format;
mod mode;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use mode::{FormatFlag, OutputMode};
pub use theme::Badge;

pub use render::{
    badge, blank_line, columns, header, hint, kv, print, print_error, receipt, section,
    simple_table, table,
};

pub use format::{format_date, format_datetime, format_days, format_optional_date, short_id, truncate};

//! Output formatting helpers for the CLI.
//!
//! JSON output is built from the stored records; text output goes through
//! the `ui` primitives.

mod json;
mod text;

pub use json::{envelope_json, print_json, record_json};
pub use text::{print_deleted, print_receipt};

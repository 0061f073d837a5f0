//! Input, parsing and lookup helpers shared by command handlers.

pub mod input;
pub mod parsing;
pub mod records;

pub use input::{env_passphrase, prompt_new_passphrase, prompt_passphrase, read_body};
pub use parsing::{
    parse_choice, parse_date, parse_datetime, parse_minutes, parse_money, parse_optional_date,
    parse_window_days,
};
pub use records::{find_record, pick};

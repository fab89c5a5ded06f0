pub mod browser;
mod parser;

pub use browser::{BrowserError, NamesBrowser, NamesOptions};
pub use parser::{NamesToggle, find_names_toggle, is_names_toggle, parse_name_rows, parse_name_table};

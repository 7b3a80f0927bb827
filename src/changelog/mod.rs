pub mod format;
pub mod parser;

pub use format::{FormatLimits, format_summary, format_title};
pub use parser::latest_entry;

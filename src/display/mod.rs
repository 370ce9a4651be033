pub mod format;

pub use format::{format_raw, format_time, DisplayFormat, INVALID_FORMAT};

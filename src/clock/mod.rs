pub mod reference;
pub mod source;
pub mod zones;

pub use reference::{SharedReference, TimeReference};
pub use source::{Clock, ManualClock, SystemClock, TimeSource};
pub use zones::{TimeZone, TIME_ZONES};

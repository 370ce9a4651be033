use chrono::NaiveDateTime;

pub const INVALID_FORMAT: &str = "Invalid format";

/// Which parts of the time are shown: date on/off crossed with 24/12-hour.
///
/// Raw values match what older settings files persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayFormat {
    #[default]
    ShowDate24,
    HideDate24,
    ShowDate12,
    HideDate12,
}

impl DisplayFormat {
    pub const ALL: [DisplayFormat; 4] = [
        DisplayFormat::ShowDate24,
        DisplayFormat::HideDate24,
        DisplayFormat::ShowDate12,
        DisplayFormat::HideDate12,
    ];

    pub fn from_parts(show_date: bool, twelve_hour: bool) -> Self {
        match (show_date, twelve_hour) {
            (true, false) => DisplayFormat::ShowDate24,
            (false, false) => DisplayFormat::HideDate24,
            (true, true) => DisplayFormat::ShowDate12,
            (false, true) => DisplayFormat::HideDate12,
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(DisplayFormat::ShowDate24),
            1 => Some(DisplayFormat::HideDate24),
            2 => Some(DisplayFormat::ShowDate12),
            3 => Some(DisplayFormat::HideDate12),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            DisplayFormat::ShowDate24 => 0,
            DisplayFormat::HideDate24 => 1,
            DisplayFormat::ShowDate12 => 2,
            DisplayFormat::HideDate12 => 3,
        }
    }

    pub fn shows_date(self) -> bool {
        matches!(self, DisplayFormat::ShowDate24 | DisplayFormat::ShowDate12)
    }

    pub fn uses_12_hour(self) -> bool {
        matches!(self, DisplayFormat::ShowDate12 | DisplayFormat::HideDate12)
    }

    /// Flips date visibility, keeping the hour format.
    pub fn toggle_show_date(self) -> Self {
        Self::from_parts(!self.shows_date(), self.uses_12_hour())
    }

    /// Flips 24/12-hour, keeping date visibility.
    pub fn toggle_hour_format(self) -> Self {
        Self::from_parts(self.shows_date(), !self.uses_12_hour())
    }

    fn pattern(self) -> &'static str {
        match self {
            DisplayFormat::ShowDate24 => "%Y-%m-%d %H:%M:%S",
            DisplayFormat::ShowDate12 => "%Y-%m-%d %I:%M:%S %p",
            DisplayFormat::HideDate24 => "%H:%M:%S",
            DisplayFormat::HideDate12 => "%I:%M:%S %p",
        }
    }
}

pub fn format_time(time: &NaiveDateTime, format: DisplayFormat) -> String {
    time.format(format.pattern()).to_string()
}

/// Formats against a persisted raw value; unknown values give the sentinel.
pub fn format_raw(time: &NaiveDateTime, raw: i32) -> String {
    match DisplayFormat::from_raw(raw) {
        Some(format) => format_time(time, format),
        None => INVALID_FORMAT.to_string(),
    }
}

use chrono::Local;

/// A fixed-offset zone selectable for network time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZone {
    pub label: &'static str,
    /// Minutes east of UTC.
    pub offset_minutes: i32,
}

impl TimeZone {
    const fn new(offset_minutes: i32, label: &'static str) -> Self {
        Self {
            label,
            offset_minutes,
        }
    }

    pub fn offset_seconds(&self) -> i64 {
        self.offset_minutes as i64 * 60
    }
}

pub const UTC_INDEX: usize = 15;

pub const TIME_ZONES: [TimeZone; 39] = [
    TimeZone::new(-720, "UTC-12:00 - Baker Island Time (BIT)"),
    TimeZone::new(-660, "UTC-11:00 - Samoa Standard Time (SST)"),
    TimeZone::new(-600, "UTC-10:00 - Hawaii-Aleutian Standard Time (HST)"),
    TimeZone::new(-570, "UTC-09:30 - Marquesas Islands Time (MIT)"),
    TimeZone::new(-540, "UTC-09:00 - Alaska Standard Time (AKST)"),
    TimeZone::new(-480, "UTC-08:00 - Pacific Standard Time (PST)"),
    TimeZone::new(-420, "UTC-07:00 - Mountain Standard Time (MST)"),
    TimeZone::new(-360, "UTC-06:00 - Central Standard Time (CST)"),
    TimeZone::new(-300, "UTC-05:00 - Eastern Standard Time (EST)"),
    TimeZone::new(-270, "UTC-04:30 - Venezuelan Standard Time (VET)"),
    TimeZone::new(-240, "UTC-04:00 - Atlantic Standard Time (AST)"),
    TimeZone::new(-210, "UTC-03:30 - Newfoundland Standard Time (NST)"),
    TimeZone::new(-180, "UTC-03:00 - Argentina/Brazil Time (ART/BRT)"),
    TimeZone::new(-120, "UTC-02:00 - South Georgia Time (GST)"),
    TimeZone::new(-60, "UTC-01:00 - Azores Standard Time (AZOT)"),
    TimeZone::new(0, "UTC±00:00 - Greenwich Mean Time (GMT)"),
    TimeZone::new(60, "UTC+01:00 - Central European Time (CET)"),
    TimeZone::new(120, "UTC+02:00 - Eastern European Time (EET)"),
    TimeZone::new(180, "UTC+03:00 - Moscow Standard Time (MSK)"),
    TimeZone::new(210, "UTC+03:30 - Iran Standard Time (IRST)"),
    TimeZone::new(240, "UTC+04:00 - Gulf Standard Time (GST)"),
    TimeZone::new(270, "UTC+04:30 - Afghanistan Time (AFT)"),
    TimeZone::new(300, "UTC+05:00 - Pakistan Standard Time (PKT)"),
    TimeZone::new(330, "UTC+05:30 - India Standard Time (IST)"),
    TimeZone::new(345, "UTC+05:45 - Nepal Time (NPT)"),
    TimeZone::new(360, "UTC+06:00 - Bangladesh Standard Time (BST)"),
    TimeZone::new(390, "UTC+06:30 - Cocos Islands Time (CCT)"),
    TimeZone::new(420, "UTC+07:00 - Indochina Time (ICT)"),
    TimeZone::new(480, "UTC+08:00 - China Standard Time (CST)"),
    TimeZone::new(525, "UTC+08:45 - Australian Central Western Time (ACWST)"),
    TimeZone::new(540, "UTC+09:00 - Japan Standard Time (JST)"),
    TimeZone::new(570, "UTC+09:30 - Australian Central Standard Time (ACST)"),
    TimeZone::new(600, "UTC+10:00 - Australian Eastern Standard Time (AEST)"),
    TimeZone::new(630, "UTC+10:30 - Lord Howe Time (LHST)"),
    TimeZone::new(660, "UTC+11:00 - Solomon Islands Time (SBT)"),
    TimeZone::new(720, "UTC+12:00 - New Zealand Standard Time (NZST)"),
    TimeZone::new(765, "UTC+12:45 - Chatham Islands Time (CHAST)"),
    TimeZone::new(780, "UTC+13:00 - Tonga Standard Time (TOT)"),
    TimeZone::new(840, "UTC+14:00 - Line Islands Time (LINT)"),
];

/// Catalog entry by index. Out-of-range indices fall back to UTC.
pub fn zone(index: usize) -> TimeZone {
    TIME_ZONES.get(index).copied().unwrap_or(TIME_ZONES[UTC_INDEX])
}

/// Index of the zone whose Windows-style bias (minutes *west* of UTC) equals
/// `bias_minutes`, or 0 when nothing in the catalog matches.
pub fn matching_zone(bias_minutes: i32) -> usize {
    zone_for_offset(-bias_minutes).unwrap_or(0)
}

pub fn zone_for_offset(offset_minutes: i32) -> Option<usize> {
    TIME_ZONES
        .iter()
        .position(|zone| zone.offset_minutes == offset_minutes)
}

/// Catalog index for the host's current UTC offset, daylight saving included.
pub fn system_zone_index() -> usize {
    let offset_minutes = Local::now().offset().local_minus_utc() / 60;
    matching_zone(-offset_minutes)
}

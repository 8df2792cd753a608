use core::fmt;

const SECS_PER_DAY: i64 = 86_400;

/// Wall-clock time of day in the station's time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl LocalTime {
    pub fn from_utc(utc_epoch_secs: u64, offset_hours: i8) -> Self {
        let local = i64::try_from(utc_epoch_secs)
            .unwrap_or(i64::MAX)
            .saturating_add(i64::from(offset_hours) * 3600);
        let of_day = local.rem_euclid(SECS_PER_DAY);

        // of_day < 86400, every component fits a u8
        Self {
            hours: (of_day / 3600) as u8,
            minutes: (of_day % 3600 / 60) as u8,
            seconds: (of_day % 60) as u8,
        }
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

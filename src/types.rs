use core::fmt;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};

/// A timezone-less calendar date and time, as stored in ZIP and TAR headers.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DateTimeCS {
    year: u16,
    month: u16,
    day: u16,
    hour: u16,
    minute: u16,
    second: u16,
}

impl Default for DateTimeCS {
    /// 1980, January 1th, 12AM: the MS-DOS epoch.
    fn default() -> Self {
        Self {
            year: 1980,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTimeCS {
    pub fn new(year: u16, month: u16, day: u16, hour: u16, minute: u16, second: u16) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub fn from_chrono_datetime<Tz: TimeZone>(datetime: DateTime<Tz>) -> Self {
        Self {
            year: datetime.year() as u16,
            month: datetime.month() as u16,
            day: datetime.day() as u16,
            hour: datetime.hour() as u16,
            minute: datetime.minute() as u16,
            second: datetime.second() as u16,
        }
    }

    pub fn now() -> Self {
        Self::from_chrono_datetime(Local::now())
    }

    pub fn from_msdos(datepart: u16, timepart: u16) -> Self {
        let seconds = (timepart & 0b0000000000011111) << 1;
        let minutes = (timepart & 0b0000011111100000) >> 5;
        let hours = (timepart & 0b1111100000000000) >> 11;
        let days = datepart & 0b0000000000011111;
        let months = (datepart & 0b0000000111100000) >> 5;
        let years = (datepart & 0b1111111000000000) >> 9;

        Self {
            year: years + 1980,
            month: months,
            day: days,
            hour: hours,
            minute: minutes,
            second: seconds,
        }
    }

    /// Convert to a chrono date time, falling back to the MS-DOS epoch for invalid dates.
    pub fn to_time(&self) -> NaiveDateTime {
        let date = NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
            .or_else(|| NaiveDate::from_ymd_opt(1980, 1, 1))
            .unwrap_or(NaiveDate::MIN);

        date.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
            .or_else(|| date.and_hms_opt(0, 0, 0))
            .unwrap_or(NaiveDateTime::MIN)
    }

    /// `(date, time)` in MS-DOS format. Years before 1980 are stored as 1980; seconds are
    /// truncated to even values.
    pub fn ms_dos(&self) -> (u16, u16) {
        let date = self.day | (self.month << 5) | self.year.saturating_sub(1980) << 9;
        let time = (self.second / 2) | (self.minute << 5) | self.hour << 11;
        (date, time)
    }

    /// Seconds since the unix epoch, reading the date time as UTC. Dates before 1970 give 0.
    pub fn unix_timestamp(&self) -> u64 {
        let timestamp = self.to_time().and_utc().timestamp();
        u64::try_from(timestamp).unwrap_or(0)
    }
}

impl fmt::Display for DateTimeCS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_time())
    }
}

/// The (timezone-less) date and time that will be written in the archive alongside each file.
///
/// Use `FileDateTime::Zero` if the date and time are insignificant. This will set the value to
/// 1980, January 1th, 12AM.
/// Use `FileDateTime::Custom` if you need to set a custom date and time.
/// Use `FileDateTime::Now` to stamp each entry with the time it is added.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum FileDateTime {
    /// 1980, January 1th, 12AM.
    Zero,
    Custom(DateTimeCS),
    #[default]
    Now,
}

impl FileDateTime {
    /// Resolve to a fixed date time; `Now` is read from the clock at each call.
    pub fn resolve(&self) -> DateTimeCS {
        match self {
            FileDateTime::Zero => DateTimeCS::default(),
            FileDateTime::Custom(date_time) => *date_time,
            FileDateTime::Now => DateTimeCS::now(),
        }
    }

    pub fn ms_dos(&self) -> (u16, u16) {
        self.resolve().ms_dos()
    }

    pub fn unix_timestamp(&self) -> u64 {
        match self {
            FileDateTime::Now => u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0),
            _ => self.resolve().unix_timestamp(),
        }
    }
}

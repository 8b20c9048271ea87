//! Solar Hijri (Jalali) day keys used for quota rollover.
//!
//! Quota days follow the civil calendar of the licensees: the Solar Hijri
//! calendar as observed in Tehran. Conversion uses the 33-year break table
//! (the same algorithm as `jalaali-js`/`moment-jalaali`), so day keys agree
//! with the ones written by earlier deployments.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Asia/Tehran has been UTC+03:30 all year since DST was abolished in 2022.
const TEHRAN_OFFSET_SECS: i64 = 3 * 3600 + 30 * 60;

/// Jalali years at which the leap cycle pattern changes.
const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

/// Source of the current instant.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A date in the Solar Hijri calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl JalaliDate {
    /// Convert a Gregorian date. `None` outside the break table
    /// (roughly 560 to 3798 CE).
    pub fn from_gregorian(date: NaiveDate) -> Option<Self> {
        let gregorian_year = date.year();
        let mut year = gregorian_year - 621;
        let info = year_info(year)?;
        let nowruz = NaiveDate::from_ymd_opt(gregorian_year, 3, info.march_day)?;

        let mut k = (date - nowruz).num_days();
        if k >= 0 {
            // First six months have 31 days
            if k <= 185 {
                return Some(Self {
                    year,
                    month: (1 + k / 31) as u32,
                    day: (k % 31 + 1) as u32,
                });
            }
            k -= 186;
        } else {
            // Between January 1st and Nowruz: tail of the previous year
            year -= 1;
            k += 179;
            if info.leap == 1 {
                k += 1;
            }
        }

        Some(Self {
            year,
            month: (7 + k / 30) as u32,
            day: (k % 30 + 1) as u32,
        })
    }

    /// `YYYY-MM-DD`, zero padded.
    pub fn day_key(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

struct YearInfo {
    /// Years since the last leap year; 0 means this year is leap.
    leap: i32,
    /// Day of Gregorian March on which this year starts.
    march_day: u32,
}

fn year_info(year: i32) -> Option<YearInfo> {
    if year < BREAKS[0] || year >= BREAKS[BREAKS.len() - 1] {
        return None;
    }

    let gregorian_year = year + 621;
    let mut leap_jalali = -14;
    let mut previous = BREAKS[0];
    let mut jump = 0;

    for &next in &BREAKS[1..] {
        jump = next - previous;
        if year < next {
            break;
        }
        leap_jalali += jump / 33 * 8 + (jump % 33) / 4;
        previous = next;
    }

    let mut n = year - previous;
    leap_jalali += n / 33 * 8 + (n % 33 + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_jalali += 1;
    }

    let leap_gregorian = gregorian_year / 4 - (gregorian_year / 100 + 1) * 3 / 4 - 150;
    let march_day = 20 + leap_jalali - leap_gregorian;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut leap = ((n + 1) % 33 - 1) % 4;
    if leap == -1 {
        leap = 4;
    }

    Some(YearInfo {
        leap,
        march_day: u32::try_from(march_day).ok()?,
    })
}

/// Day key for the instant `now`, as seen in Tehran.
pub fn day_key(now: DateTime<Utc>) -> String {
    let local = (now.naive_utc() + Duration::seconds(TEHRAN_OFFSET_SECS)).date();

    match JalaliDate::from_gregorian(local) {
        Some(date) => date.day_key(),
        None => {
            tracing::warn!(%local, "date outside the Solar Hijri table, using the Gregorian day");
            local.format("%Y-%m-%d").to_string()
        }
    }
}

/// Today's day key according to `clock`.
pub fn today(clock: &dyn Clock) -> String {
    day_key(clock.now())
}

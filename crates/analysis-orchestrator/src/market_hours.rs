use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

fn is_weekday(day: Weekday) -> bool {
    !matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Weekday session `[open, close)` in the exchange's local time
fn session_open(now: DateTime<Utc>, tz: Tz, open: (u32, u32), close: (u32, u32)) -> bool {
    let local = now.with_timezone(&tz);
    if !is_weekday(local.weekday()) {
        return false;
    }
    let (Some(open), Some(close)) = (
        NaiveTime::from_hms_opt(open.0, open.1, 0),
        NaiveTime::from_hms_opt(close.0, close.1, 0),
    ) else {
        return false;
    };
    let time = local.time();
    time >= open && time < close
}

/// NYSE/Nasdaq regular session, 09:30-16:00 New York
pub fn is_us_market_open(now: DateTime<Utc>) -> bool {
    session_open(now, chrono_tz::America::New_York, (9, 30), (16, 0))
}

/// Continental cash session, 09:00-17:30 Paris
pub fn is_europe_market_open(now: DateTime<Utc>) -> bool {
    session_open(now, chrono_tz::Europe::Paris, (9, 0), (17, 30))
}

/// Tokyo session, 09:00-15:00
pub fn is_asia_market_open(now: DateTime<Utc>) -> bool {
    session_open(now, chrono_tz::Asia::Tokyo, (9, 0), (15, 0))
}

/// CME Globex equity futures.
///
/// Trades Sunday 18:00 through Friday 17:00 New York with a daily
/// maintenance break from 17:00 to 18:00.
pub fn is_futures_open(now: DateTime<Utc>) -> bool {
    let local = now.with_timezone(&chrono_tz::America::New_York);
    let hour = local.hour();
    match local.weekday() {
        Weekday::Sat => false,
        Weekday::Sun => hour >= 18,
        Weekday::Fri => hour < 17,
        _ => hour != 17,
    }
}

/// "Open" or "Closed" for a region name; empty for regions we don't track.
pub fn market_status(region: &str, now: DateTime<Utc>) -> &'static str {
    let open = match region.to_lowercase().as_str() {
        "us" => is_us_market_open(now),
        "europe" => is_europe_market_open(now),
        "asia" => is_asia_market_open(now),
        "futures" => is_futures_open(now),
        _ => return "",
    };
    if open {
        "Open"
    } else {
        "Closed"
    }
}

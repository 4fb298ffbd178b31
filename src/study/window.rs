use crate::data::BarSeries;
use chrono::{Duration, NaiveDate};

//calendar days per trading day
const CALENDAR_PER_TRADING: f64 = 7.0 / 5.0;

//symmetric date range around an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl EventWindow {
    //half of the duration, converted from trading to calendar days and rounded up
    pub fn half_width_days(duration_trading_days: u32) -> i64 {
        (duration_trading_days as f64 * CALENDAR_PER_TRADING / 2.0).ceil() as i64
    }

    //none when either edge falls outside the representable calendar
    pub fn around(event_date: NaiveDate, duration_trading_days: u32) -> Option<Self> {
        let half = Duration::days(Self::half_width_days(duration_trading_days));
        Some(EventWindow {
            start: event_date.checked_sub_signed(half)?,
            end: event_date.checked_add_signed(half)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

//buy-and-hold reference returns over a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub long: f64,
    pub short: f64,
}

//long = last/first - 1, short = first/last - 1
//first is the first bar at or after the window start, last the last bar at or before its end
pub fn baseline_returns(series: &BarSeries, window: &EventWindow) -> Option<Baseline> {
    let first = series.first_on_or_after(window.start)?;
    let last = series.last_on_or_before(window.end)?;

    if first.date > last.date {
        return None;
    }

    Some(Baseline {
        long: last.close / first.close - 1.0,
        short: first.close / last.close - 1.0,
    })
}

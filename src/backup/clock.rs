//! Time source for archive names

use chrono::{Local, NaiveDateTime};

/// Archive name timestamp layout. Fixed width, so name order is time order.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Supplies the wall-clock time used to name archives
pub trait Clock: Send + Sync {
    /// Current local time
    fn now(&self) -> NaiveDateTime;
}

/// The system clock, in local time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Format a time as an archive name timestamp
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

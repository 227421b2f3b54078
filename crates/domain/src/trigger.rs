use chrono::prelude::*;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// The local wall-clock minute at which members get their daily prompt.
///
/// The match is exact: a member whose local time is one minute past the
/// window is not due anymore. Seconds are ignored, so any tick landing
/// inside the matching minute fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerWindow {
    pub hour: u32,
    pub minute: u32,
}

impl TriggerWindow {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    pub fn matches(&self, local: &DateTime<Tz>) -> bool {
        local.hour() == self.hour && local.minute() == self.minute
    }
}

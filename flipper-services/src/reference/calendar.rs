//! SkyBlock calendar events

use chrono::{DateTime, Utc};
use flipper_core::{Calendar, CalendarEvent, Domain};
use flipper_hypixel::types::{parse_entries, RawCalendarEvent, CALENDAR_PATH};
use serde_json::Value;

use super::{ReferenceDomain, ReferenceStore};

pub struct CalendarDomain;

impl ReferenceDomain for CalendarDomain {
    type Data = Calendar;

    const DOMAIN: Domain = Domain::Calendar;
    const PATH: &'static str = CALENDAR_PATH;

    fn parse(payload: &Value, now: DateTime<Utc>) -> Option<Calendar> {
        let entries = payload.get("events").filter(|v| v.is_array())?;
        let events = parse_entries::<RawCalendarEvent>(Some(entries))
            .into_iter()
            .filter_map(|raw| raw.into_event(now))
            .collect();
        Some(Calendar { events })
    }

    fn size(data: &Calendar) -> usize {
        data.len()
    }
}

pub type CalendarStore = ReferenceStore<CalendarDomain>;

impl ReferenceStore<CalendarDomain> {
    /// Events running at `now`
    pub fn active_events(&self, now: DateTime<Utc>) -> Vec<CalendarEvent> {
        self.current()
            .map(|record| record.data.active_events(now).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Events not started yet, soonest first
    pub fn upcoming_events(&self, now: DateTime<Utc>) -> Vec<CalendarEvent> {
        self.current()
            .map(|record| record.data.upcoming_events(now).into_iter().cloned().collect())
            .unwrap_or_default()
    }
}

//! Slot generation and overlap rules.
//!
//! Pure functions over minute-of-day ranges - no database access.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::models::{hhmm, Booking};

/// First bookable start hour
pub const OPEN_HOUR: u32 = 9;
/// Operating window ends here; the last slot starts an hour earlier
pub const CLOSE_HOUR: u32 = 21;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// One-hour slot on a given date. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub is_available: bool,
}

impl TimeSlot {
    /// Half-open `[start, end)` in minutes since midnight
    pub fn minutes(&self) -> MinuteRange {
        MinuteRange {
            start: minute_of_day(self.start_time),
            end: minute_of_day(self.start_time) + 60,
        }
    }
}

/// Half-open range of minutes since midnight. `end` may be 1440.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteRange {
    pub start: u32,
    pub end: u32,
}

impl MinuteRange {
    pub fn overlaps(&self, other: &MinuteRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Every slot of the operating window on `date`, all available.
pub fn generate_slots(date: NaiveDate) -> Vec<TimeSlot> {
    (OPEN_HOUR..CLOSE_HOUR)
        .filter_map(|hour| {
            Some(TimeSlot {
                date,
                start_time: NaiveTime::from_hms_opt(hour, 0, 0)?,
                end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0)?,
                is_available: true,
            })
        })
        .collect()
}

/// Portion of a booking that falls on `date`, if any.
///
/// Days strictly inside a multi-day booking are occupied end to end.
pub fn occupied_range_on(booking: &Booking, date: NaiveDate) -> Option<MinuteRange> {
    if date < booking.date || date > booking.last_date() {
        return None;
    }

    let start = if date == booking.date {
        minute_of_day(booking.start_time)
    } else {
        0
    };
    let end = if date == booking.last_date() {
        minute_of_day(booking.end_time)
    } else {
        MINUTES_PER_DAY
    };

    (start < end).then_some(MinuteRange { start, end })
}

/// Mark slots that overlap any occupied range as unavailable.
pub fn apply_occupied(slots: &mut [TimeSlot], occupied: &[MinuteRange]) {
    for slot in slots.iter_mut() {
        let range = slot.minutes();
        if occupied.iter().any(|busy| range.overlaps(busy)) {
            slot.is_available = false;
        }
    }
}

pub fn block_all(slots: &mut [TimeSlot]) {
    for slot in slots.iter_mut() {
        slot.is_available = false;
    }
}

/// End times reachable from `start` through consecutive available slots.
///
/// Walks forward from the start slot and stops at the first unavailable one,
/// so a chosen end never spans a booked or blocked gap. Only ends between
/// `minimum_hours` and `maximum_hours` after the start are offered.
pub fn end_time_options(
    slots: &[TimeSlot],
    start: NaiveTime,
    minimum_hours: i32,
    maximum_hours: i32,
) -> Vec<NaiveTime> {
    let mut ordered: Vec<&TimeSlot> = slots.iter().collect();
    ordered.sort_by_key(|slot| slot.start_time);

    let Some(first) = ordered.iter().position(|slot| slot.start_time == start) else {
        return Vec::new();
    };

    let mut options = Vec::new();
    for (offset, slot) in ordered[first..].iter().enumerate() {
        let hours = offset as i32 + 1;
        if !slot.is_available || hours > maximum_hours {
            break;
        }
        if hours >= minimum_hours {
            options.push(slot.end_time);
        }
    }
    options
}

/// Calendar dates on which a rental picked up at `pickup` may end.
pub fn return_date_options(pickup: NaiveDateTime, minimum_hours: i32, maximum_hours: i32) -> Vec<NaiveDate> {
    if maximum_hours < minimum_hours {
        return Vec::new();
    }

    let earliest = (pickup + Duration::hours(minimum_hours as i64)).date();
    let latest = (pickup + Duration::hours(maximum_hours as i64)).date();

    earliest
        .iter_days()
        .take_while(|day| *day <= latest)
        .collect()
}

/// Filter a return date's slots down to valid return times.
///
/// A slot is kept available only if it is free, the rental length up to its
/// start lies within the vehicle bounds, and on the pickup date it starts
/// after the pickup time. The rental must also be free all the way to the
/// return: nothing past the first unavailable slot at or after pickup is
/// offered, nor anything later than `free_until`, the first conflict found on
/// the dates before this one.
pub fn filter_return_slots(
    pickup: NaiveDateTime,
    slots: &[TimeSlot],
    minimum_hours: i32,
    maximum_hours: i32,
    free_until: Option<NaiveDateTime>,
) -> Vec<TimeSlot> {
    let mut ordered = slots.to_vec();
    ordered.sort_by_key(|slot| slot.start_time);

    let mut gap_seen = false;
    ordered
        .into_iter()
        .map(|slot| {
            let return_at = slot.date.and_time(slot.start_time);
            if return_at >= pickup && !slot.is_available {
                gap_seen = true;
            }

            let minutes = (return_at - pickup).num_minutes();
            let within_bounds =
                minutes >= minimum_hours as i64 * 60 && minutes <= maximum_hours as i64 * 60;
            let after_pickup = slot.date != pickup.date() || slot.start_time > pickup.time();
            let reachable = !gap_seen && free_until.map_or(true, |limit| return_at <= limit);

            TimeSlot {
                is_available: slot.is_available && within_bounds && after_pickup && reachable,
                ..slot
            }
        })
        .collect()
}

//! Half-hour clinic slots.
//!
//! Requested times are free-form `"YYYY-MM-DD HH:MM"` strings. They are
//! rounded to the nearest clinic slot (`:00` or `:30`) and checked against
//! the clinic's business hours before anything touches the store.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive hour range in which slots may be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessHours {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open_hour: 8,
            close_hour: 15,
        }
    }
}

impl BusinessHours {
    pub fn new(open_hour: u32, close_hour: u32) -> Self {
        Self {
            open_hour,
            close_hour,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        (self.open_hour..=self.close_hour).contains(&hour)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("malformed time slot '{input}': {reason}")]
    Malformed { input: String, reason: String },

    #[error("{hour:02}:{minute:02} is outside business hours ({open:02}:00-{close:02}:30)")]
    OutsideBusinessHours {
        hour: u32,
        minute: u32,
        open: u32,
        close: u32,
    },
}

impl SlotError {
    fn malformed(input: &str, reason: impl Into<String>) -> Self {
        SlotError::Malformed {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A canonical clinic slot: a date plus an hour and a minute of 0 or 30.
///
/// The hour is kept unbounded so that rounding 23:50 up yields hour 24,
/// which business-hours validation then rejects. A `TimeSlot` returned by
/// [`normalize_slot`] always has an hour inside the configured range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot {
    date: NaiveDate,
    hour: u32,
    minute: u32,
}

impl TimeSlot {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).map(|time| self.date.and_time(time))
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}",
            self.date.format(DATE_FORMAT),
            self.hour,
            self.minute
        )
    }
}

/// Raw requested time before rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequestedTime {
    date: NaiveDate,
    hours: u32,
    minutes: u32,
}

impl FromStr for RequestedTime {
    type Err = SlotError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let [date_token, time_token] = tokens.as_slice() else {
            return Err(SlotError::malformed(
                input,
                format!("expected '<date> HH:MM', got {} token(s)", tokens.len()),
            ));
        };

        let date = NaiveDate::parse_from_str(date_token, DATE_FORMAT).map_err(|err| {
            SlotError::malformed(input, format!("invalid date '{date_token}': {err}"))
        })?;

        let mut clock = time_token.split(':');
        let (Some(hours), Some(minutes), None) = (clock.next(), clock.next(), clock.next()) else {
            return Err(SlotError::malformed(
                input,
                format!("time '{time_token}' must contain exactly one ':'"),
            ));
        };

        if !is_digits(hours) {
            return Err(SlotError::malformed(input, format!("hour '{hours}' is not a number")));
        }
        if !is_digits(minutes) {
            return Err(SlotError::malformed(
                input,
                format!("minute '{minutes}' is not a number"),
            ));
        }
        let hours: u32 = hours
            .parse()
            .map_err(|_| SlotError::malformed(input, format!("hour '{hours}' is not a number")))?;
        let minutes: u32 = minutes.parse().map_err(|_| {
            SlotError::malformed(input, format!("minute '{minutes}' is not a number"))
        })?;

        if hours > 23 {
            return Err(SlotError::malformed(input, format!("hour {hours} out of range")));
        }
        if minutes > 59 {
            return Err(SlotError::malformed(
                input,
                format!("minute {minutes} out of range"),
            ));
        }

        Ok(Self {
            date,
            hours,
            minutes,
        })
    }
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

impl RequestedTime {
    /// Round to the clinic grid: 15..=45 goes to :30, earlier to :00 of the
    /// same hour, later to :00 of the next hour. The date never rolls over.
    fn round(self) -> TimeSlot {
        let (hour, minute) = match self.minutes {
            15..=45 => (self.hours, 30),
            0..15 => (self.hours, 0),
            _ => (self.hours + 1, 0),
        };
        TimeSlot {
            date: self.date,
            hour,
            minute,
        }
    }
}

/// Rounds `input` to a clinic slot without checking business hours.
pub fn round_to_slot(input: &str) -> Result<TimeSlot, SlotError> {
    Ok(input.parse::<RequestedTime>()?.round())
}

/// Rounds `input` to a clinic slot and rejects it if the resulting hour is
/// outside `hours`.
pub fn normalize_slot(input: &str, hours: &BusinessHours) -> Result<TimeSlot, SlotError> {
    let slot = round_to_slot(input)?;
    if !hours.contains(slot.hour) {
        return Err(SlotError::OutsideBusinessHours {
            hour: slot.hour,
            minute: slot.minute,
            open: hours.open_hour,
            close: hours.close_hour,
        });
    }
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours() -> BusinessHours {
        BusinessHours::default()
    }

    #[test]
    fn minutes_between_fifteen_and_forty_five_round_to_half_past() {
        for minute in 15..=45 {
            let input = format!("2024-03-10 10:{minute:02}");
            let slot = normalize_slot(&input, &hours()).unwrap();
            assert_eq!(slot.to_string(), "2024-03-10 10:30", "minute {minute}");
        }
    }

    #[test]
    fn minutes_below_fifteen_round_down() {
        for minute in 0..15 {
            let input = format!("2024-03-10 09:{minute:02}");
            let slot = normalize_slot(&input, &hours()).unwrap();
            assert_eq!(slot.to_string(), "2024-03-10 09:00", "minute {minute}");
        }
    }

    #[test]
    fn minutes_above_forty_five_round_up_to_next_hour() {
        for minute in 46..60 {
            let input = format!("2024-03-10 10:{minute:02}");
            let slot = normalize_slot(&input, &hours()).unwrap();
            assert_eq!(slot.to_string(), "2024-03-10 11:00", "minute {minute}");
        }
    }

    #[test]
    fn only_hours_eight_through_fifteen_are_accepted() {
        for hour in 0..24 {
            let input = format!("2024-03-10 {hour:02}:00");
            let result = normalize_slot(&input, &hours());
            if (8..=15).contains(&hour) {
                assert!(result.is_ok(), "hour {hour} should be open");
            } else {
                assert!(
                    matches!(result, Err(SlotError::OutsideBusinessHours { .. })),
                    "hour {hour} should be closed"
                );
            }
        }
    }

    #[test]
    fn canonical_slots_are_unchanged() {
        for hour in 8..=15 {
            for minute in [0, 30] {
                let canonical = format!("2024-03-10 {hour:02}:{minute:02}");
                let slot = normalize_slot(&canonical, &hours()).unwrap();
                assert_eq!(slot.to_string(), canonical);
            }
        }
    }

    #[test]
    fn ten_fifty_becomes_eleven() {
        let slot = normalize_slot("2024-03-10 10:50", &hours()).unwrap();
        assert_eq!(slot.to_string(), "2024-03-10 11:00");
    }

    #[test]
    fn seventeen_ten_is_rejected_after_rounding() {
        let rounded = round_to_slot("2024-03-10 17:10").unwrap();
        assert_eq!(rounded.to_string(), "2024-03-10 17:00");
        let err = normalize_slot("2024-03-10 17:10", &hours()).unwrap_err();
        assert_eq!(
            err,
            SlotError::OutsideBusinessHours {
                hour: 17,
                minute: 0,
                open: 8,
                close: 15
            }
        );
    }

    #[test]
    fn rounding_into_closing_hour_and_past_it() {
        assert_eq!(
            normalize_slot("2024-03-10 14:50", &hours()).unwrap().to_string(),
            "2024-03-10 15:00"
        );
        assert_eq!(
            normalize_slot("2024-03-10 15:40", &hours()).unwrap().to_string(),
            "2024-03-10 15:30"
        );
        assert!(matches!(
            normalize_slot("2024-03-10 15:50", &hours()),
            Err(SlotError::OutsideBusinessHours { hour: 16, .. })
        ));
        assert!(matches!(
            normalize_slot("2024-03-10 07:50", &hours()),
            Ok(slot) if slot.to_string() == "2024-03-10 08:00"
        ));
    }

    #[test]
    fn late_evening_round_up_does_not_roll_the_date() {
        let slot = round_to_slot("2024-03-10 23:50").unwrap();
        assert_eq!(slot.hour(), 24);
        assert_eq!(slot.date(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(slot.to_naive_datetime(), None);
    }

    #[test]
    fn single_digit_hours_are_padded() {
        let slot = normalize_slot("2024-03-10 9:05", &hours()).unwrap();
        assert_eq!(slot.to_string(), "2024-03-10 09:00");
    }

    #[test]
    fn malformed_inputs_are_classified() {
        let cases = [
            "",
            "2024-03-10",
            "2024-03-10 1030",
            "2024-03-10 10:30:00",
            "2024-03-10 ab:30",
            "2024-03-10 10:xx",
            "2024-03-10 +9:05",
            "2024-03-10 10:+5",
            "2024-03-10 -1:30",
            "2024-03-10 :30",
            "2024-03-10 10:30 extra",
            "2024-03-10 24:00",
            "2024-03-10 10:60",
            "2024-02-30 10:00",
            "tomorrow 10:00",
        ];
        for input in cases {
            assert!(
                matches!(normalize_slot(input, &hours()), Err(SlotError::Malformed { .. })),
                "'{input}' should be malformed"
            );
        }
    }

    #[test]
    fn custom_business_hours_are_respected() {
        let evening = BusinessHours::new(17, 20);
        assert!(normalize_slot("2024-03-10 17:10", &evening).is_ok());
        assert!(normalize_slot("2024-03-10 10:00", &evening).is_err());
    }
}

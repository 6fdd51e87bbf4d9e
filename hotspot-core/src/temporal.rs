//! Hour-of-day and day-of-week weighting of mobility events.
//!
//! The band table is injected configuration so a calibrated table can replace
//! the hand-set defaults without touching the lookup.

use std::fmt;

use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{MobilityEvent, RawMobilityEvent};

/// An hour of the day in `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourOfDay(u8);

/// Error returned when an hour lies outside `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("hour {hour} is outside 0..=23")]
pub struct HourOfDayError {
    /// Rejected value.
    pub hour: u32,
}

impl HourOfDay {
    /// Wrap an hour, rejecting values above 23.
    ///
    /// # Errors
    /// Returns [`HourOfDayError`] when `hour > 23`.
    pub fn new(hour: u32) -> Result<Self, HourOfDayError> {
        u8::try_from(hour)
            .ok()
            .filter(|value| *value < 24)
            .map(Self)
            .ok_or(HourOfDayError { hour })
    }

    /// The wrapped hour.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HourOfDay {
    type Error = HourOfDayError;

    fn try_from(hour: u8) -> Result<Self, Self::Error> {
        Self::new(u32::from(hour))
    }
}

/// Named temporal band an event falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalBand {
    /// Any hour not covered by another band.
    OffPeak,
    /// 07:00 to 09:59 on any day.
    Breakfast,
    /// 12:00 to 13:59, Monday to Thursday.
    WeekdayLunch,
    /// 18:00 to 21:59, Monday to Thursday.
    WeekdayDinner,
    /// 18:00 to 21:59, Friday to Sunday.
    WeekendDinner,
    /// 22:00 to 00:59, Monday to Thursday.
    LateNightWeekday,
    /// 22:00 to 00:59, Friday to Sunday.
    LateNightWeekend,
}

impl TemporalBand {
    /// Resolve the band for an hour and weekday.
    ///
    /// Friday counts as part of the weekend.
    #[must_use]
    pub const fn classify(hour: HourOfDay, day: Weekday) -> Self {
        let weekend = matches!(day, Weekday::Fri | Weekday::Sat | Weekday::Sun);
        match (hour.0, weekend) {
            (22..=23 | 0, true) => Self::LateNightWeekend,
            (22..=23 | 0, false) => Self::LateNightWeekday,
            (7..=9, _) => Self::Breakfast,
            (12..=13, false) => Self::WeekdayLunch,
            (18..=21, true) => Self::WeekendDinner,
            (18..=21, false) => Self::WeekdayDinner,
            _ => Self::OffPeak,
        }
    }

    /// Snake-case band name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OffPeak => "off_peak",
            Self::Breakfast => "breakfast",
            Self::WeekdayLunch => "weekday_lunch",
            Self::WeekdayDinner => "weekday_dinner",
            Self::WeekendDinner => "weekend_dinner",
            Self::LateNightWeekday => "late_night_weekday",
            Self::LateNightWeekend => "late_night_weekend",
        }
    }
}

impl fmt::Display for TemporalBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight per temporal band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalWeights {
    /// Weight outside every named band; the floor of the table.
    pub off_peak: f64,
    /// Breakfast weight.
    pub breakfast: f64,
    /// Weekday lunch weight.
    pub weekday_lunch: f64,
    /// Weekday dinner weight.
    pub weekday_dinner: f64,
    /// Weekend dinner weight; the ceiling of the table.
    pub weekend_dinner: f64,
    /// Weekday late-night weight.
    pub late_night_weekday: f64,
    /// Weekend late-night weight.
    pub late_night_weekend: f64,
}

impl Default for TemporalWeights {
    fn default() -> Self {
        Self {
            off_peak: 0.3,
            breakfast: 0.5,
            weekday_lunch: 0.8,
            weekday_dinner: 1.0,
            weekend_dinner: 1.5,
            late_night_weekday: 0.4,
            late_night_weekend: 0.7,
        }
    }
}

/// Errors raised when validating a [`TemporalWeights`] table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemporalWeightsError {
    /// A band weight was zero, negative, NaN or infinite.
    #[error("weight for {band} must be finite and positive, got {value}")]
    NonPositive {
        /// Offending band.
        band: TemporalBand,
        /// Rejected weight.
        value: f64,
    },
    /// Weekend dinner did not strictly exceed another band.
    #[error("weekend_dinner ({ceiling}) must exceed {band} ({value})")]
    CeilingViolated {
        /// Weekend dinner weight.
        ceiling: f64,
        /// Band that matched or exceeded it.
        band: TemporalBand,
        /// That band's weight.
        value: f64,
    },
    /// Off-peak did not stay strictly below another band.
    #[error("off_peak ({floor}) must stay below {band} ({value})")]
    FloorViolated {
        /// Off-peak weight.
        floor: f64,
        /// Band that matched or undercut it.
        band: TemporalBand,
        /// That band's weight.
        value: f64,
    },
}

impl TemporalWeights {
    /// Weight configured for `band`.
    #[must_use]
    pub const fn for_band(&self, band: TemporalBand) -> f64 {
        match band {
            TemporalBand::OffPeak => self.off_peak,
            TemporalBand::Breakfast => self.breakfast,
            TemporalBand::WeekdayLunch => self.weekday_lunch,
            TemporalBand::WeekdayDinner => self.weekday_dinner,
            TemporalBand::WeekendDinner => self.weekend_dinner,
            TemporalBand::LateNightWeekday => self.late_night_weekday,
            TemporalBand::LateNightWeekend => self.late_night_weekend,
        }
    }

    fn entries(&self) -> [(TemporalBand, f64); 7] {
        [
            TemporalBand::OffPeak,
            TemporalBand::Breakfast,
            TemporalBand::WeekdayLunch,
            TemporalBand::WeekdayDinner,
            TemporalBand::WeekendDinner,
            TemporalBand::LateNightWeekday,
            TemporalBand::LateNightWeekend,
        ]
        .map(|band| (band, self.for_band(band)))
    }

    /// Check positivity and the ceiling/floor ordering.
    ///
    /// # Errors
    /// Returns the first [`TemporalWeightsError`] encountered.
    pub fn validate(&self) -> Result<(), TemporalWeightsError> {
        let entries = self.entries();
        if let Some((band, value)) = entries
            .iter()
            .copied()
            .find(|(_, value)| !value.is_finite() || *value <= 0.0)
        {
            return Err(TemporalWeightsError::NonPositive { band, value });
        }
        for (band, value) in entries {
            if band != TemporalBand::WeekendDinner && value >= self.weekend_dinner {
                return Err(TemporalWeightsError::CeilingViolated {
                    ceiling: self.weekend_dinner,
                    band,
                    value,
                });
            }
            if band != TemporalBand::OffPeak && value <= self.off_peak {
                return Err(TemporalWeightsError::FloorViolated {
                    floor: self.off_peak,
                    band,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Assigns temporal weights to mobility events.
///
/// # Examples
/// ```
/// use chrono::Weekday;
/// use hotspot_core::{HourOfDay, TemporalWeighter, TemporalWeights};
///
/// let weighter = TemporalWeighter::new(TemporalWeights::default())?;
/// let hour = HourOfDay::new(19)?;
/// assert_eq!(weighter.weight(hour, Weekday::Sat), 1.5);
/// assert_eq!(weighter.weight(hour, Weekday::Tue), 1.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalWeighter {
    weights: TemporalWeights,
}

impl TemporalWeighter {
    /// Build a weighter from a validated table.
    ///
    /// # Errors
    /// Returns [`TemporalWeightsError`] when the table is invalid.
    pub fn new(weights: TemporalWeights) -> Result<Self, TemporalWeightsError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    /// The weight table in use.
    #[must_use]
    pub const fn weights(&self) -> &TemporalWeights {
        &self.weights
    }

    /// Weight for an hour and weekday. Always finite and positive.
    #[must_use]
    pub const fn weight(&self, hour: HourOfDay, day: Weekday) -> f64 {
        self.weights.for_band(TemporalBand::classify(hour, day))
    }

    /// Weigh a single raw event using its local hour and weekday.
    #[must_use]
    pub fn weigh(&self, event: &RawMobilityEvent) -> MobilityEvent {
        let band = TemporalBand::classify(hour_of(event), event.timestamp.weekday());
        MobilityEvent::new(
            event.location,
            event.timestamp,
            band,
            self.weights.for_band(band),
        )
    }

    /// Weigh every event, preserving order.
    #[must_use]
    pub fn weigh_all(&self, events: &[RawMobilityEvent]) -> Vec<MobilityEvent> {
        events.iter().map(|event| self.weigh(event)).collect()
    }
}

fn hour_of(event: &RawMobilityEvent) -> HourOfDay {
    // chrono guarantees `hour()` lies in 0..=23.
    HourOfDay::new(event.timestamp.hour()).unwrap_or(HourOfDay(0))
}

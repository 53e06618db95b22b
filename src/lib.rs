//! Bounds validation and defaulting for date-input form fields.
//!
//! A submitted date is accepted when, after normalizing it and the field's
//! minimum and maximum to midnight in the field's time zone, it falls inside
//! the configured bounds. Pattern, locale and time zone fall back to sensible
//! defaults when the field does not set them.

mod bounds;
mod config;
mod consts;
mod converter;
mod field;
mod messages;
mod prelude;
mod types;
mod validator;

pub use bounds::{DateBounds, at_midnight};
pub use config::{EffectiveConfig, FieldConfig, LocaleSetting, RequestContext, resolve_locale, resolve_time_zone};
pub use consts::*;
pub use converter::{DateConverter, PatternConverter, converter_for};
pub use field::{FieldState, InputDate, SubmissionState};
pub use messages::{DefaultMessages, MessageCatalog};
pub use types::{DatePattern, PatternError};
pub use validator::{BoundsValidator, Severity, UserMessage, ValidationVerdict};

use crate::prelude::*;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A date as supplied by the caller: a typed value, an epoch offset, or text
/// written in the field's pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDateValue {
    /// Milliseconds since the Unix epoch
    #[display(fmt = "{_0}")]
    EpochMillis(i64),
    /// A point in time
    #[display(fmt = "{}", "_0.to_rfc3339()")]
    Instant(DateTime<Utc>),
    /// A calendar date, taken as midnight in the field's time zone
    #[display(fmt = "{_0}")]
    Date(NaiveDate),
    /// Text in the field's date pattern
    #[display(fmt = "{_0}")]
    Text(String),
}

/// Error raised when a raw value cannot be turned into a date.
/// The message is shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Text does not match the pattern.
    #[error("Unable to convert \"{value}\" to a date using the pattern {pattern}")]
    Unparsable { value: String, pattern: String },

    /// Epoch offset beyond what can be represented.
    #[error("Epoch value {0} is outside the supported date range")]
    EpochOutOfRange(i64),

    /// Wall-clock time skipped by the zone (e.g. a daylight saving gap).
    #[error("{local} does not exist in time zone {zone}")]
    NonexistentLocalTime { local: chrono::NaiveDateTime, zone: String },

    /// Instant whose calendar day falls outside the supported range once seen in the zone.
    #[error("{instant} is outside the supported date range in time zone {zone}")]
    OutOfZoneRange { instant: DateTime<Utc>, zone: String },
}

impl From<&str> for RawDateValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl RawDateValue {
    /// Blank text is treated the same as an absent value.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    /// Converts to an instant. Text goes through `converter`; calendar dates
    /// become midnight in `time_zone`.
    ///
    /// # Errors
    /// Returns `ConversionError` if the text does not parse, the epoch offset is
    /// out of range, midnight cannot be placed in `time_zone`, or the instant's
    /// day cannot be represented in `time_zone`.
    pub fn to_instant(&self, converter: &dyn DateConverter, time_zone: Tz) -> Result<DateTime<Utc>, ConversionError> {
        let instant = match self {
            Self::EpochMillis(millis) => {
                DateTime::from_timestamp_millis(*millis).ok_or(ConversionError::EpochOutOfRange(*millis))
            },
            Self::Instant(instant) => Ok(*instant),
            Self::Date(date) => {
                let local = date.and_time(chrono::NaiveTime::MIN);
                bounds::resolve_local(local, time_zone)
                    .map(|t| t.with_timezone(&Utc))
                    .ok_or_else(|| ConversionError::NonexistentLocalTime {
                        local,
                        zone: time_zone.name().to_owned(),
                    })
            },
            Self::Text(text) => converter.parse(text.trim()),
        }?;
        bounds::checked_midnight(instant, time_zone)?;
        Ok(instant)
    }
}

use std::{fmt, sync::Arc};

use chrono::{
    DateTime, NaiveTime, Utc,
    format::{self, Parsed, StrftimeItems},
};
use chrono_tz::Tz;
use unic_langid::LanguageIdentifier;

use crate::{
    ConversionError, DatePattern, EffectiveConfig,
    bounds::{checked_midnight, resolve_local, wall_clock},
};

/// Parser/formatter between user-facing text and instants.
pub trait DateConverter: fmt::Debug + Send + Sync {
    /// Parses text into an instant.
    ///
    /// # Errors
    /// Returns `ConversionError` if the text is not a date this converter understands.
    fn parse(&self, text: &str) -> Result<DateTime<Utc>, ConversionError>;

    /// Formats an instant as text.
    fn format(&self, instant: &DateTime<Utc>) -> String;
}

/// Converter driven by a `DatePattern` in a fixed zone.
///
/// Text without time fields parses to midnight in the zone; text with an
/// offset field (`Z`, `X`) keeps that offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternConverter {
    pattern:   DatePattern,
    locale:    LanguageIdentifier,
    time_zone: Tz,
}

impl PatternConverter {
    pub const fn new(pattern: DatePattern, locale: LanguageIdentifier, time_zone: Tz) -> Self {
        Self {
            pattern,
            locale,
            time_zone,
        }
    }

    pub fn from_effective(effective: &EffectiveConfig) -> Self {
        Self::new(effective.pattern.clone(), effective.locale.clone(), effective.time_zone)
    }

    pub const fn pattern(&self) -> &DatePattern {
        &self.pattern
    }

    pub const fn locale(&self) -> &LanguageIdentifier {
        &self.locale
    }

    pub const fn time_zone(&self) -> Tz {
        self.time_zone
    }

    fn unparsable(&self, text: &str) -> ConversionError {
        ConversionError::Unparsable {
            value:   text.to_owned(),
            pattern: self.pattern.to_string(),
        }
    }
}

impl DateConverter for PatternConverter {
    fn parse(&self, text: &str) -> Result<DateTime<Utc>, ConversionError> {
        let mut parsed = Parsed::new();
        format::parse(&mut parsed, text, StrftimeItems::new(self.pattern.strftime()))
            .map_err(|_| self.unparsable(text))?;

        let instant = if let Ok(with_offset) = parsed.to_datetime() {
            with_offset.with_timezone(&Utc)
        } else {
            let date = parsed.to_naive_date().map_err(|_| self.unparsable(text))?;
            let time = parsed.to_naive_time().unwrap_or(NaiveTime::MIN);
            let local = date.and_time(time);

            resolve_local(local, self.time_zone)
                .map(|t| t.with_timezone(&Utc))
                .ok_or_else(|| ConversionError::NonexistentLocalTime {
                    local,
                    zone: self.time_zone.name().to_owned(),
                })?
        };

        checked_midnight(instant, self.time_zone)?;
        Ok(instant)
    }

    fn format(&self, instant: &DateTime<Utc>) -> String {
        if wall_clock(*instant, self.time_zone).is_none() {
            tracing::warn!(
                "{} cannot be shown in {}; formatting in UTC",
                instant,
                self.time_zone.name()
            );
            return instant.format(self.pattern.strftime()).to_string();
        }
        instant
            .with_timezone(&self.time_zone)
            .format(self.pattern.strftime())
            .to_string()
    }
}

/// The caller's converter when one is configured, otherwise a fresh
/// `PatternConverter` for the effective settings.
/// Nothing is cached between calls.
pub fn converter_for(
    explicit: Option<&Arc<dyn DateConverter>>,
    effective: &EffectiveConfig,
) -> Arc<dyn DateConverter> {
    match explicit {
        Some(converter) => Arc::clone(converter),
        None => {
            tracing::debug!(
                "Building default converter: pattern={} locale={} zone={}",
                effective.pattern,
                effective.locale,
                effective.time_zone.name()
            );
            Arc::new(PatternConverter::from_effective(effective))
        },
    }
}

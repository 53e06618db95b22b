use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    BETWEEN_KEY, ConversionError, DateBounds, DateConverter, EffectiveConfig, MessageCatalog, ON_OR_AFTER_KEY,
    ON_OR_BEFORE_KEY, PatternConverter, RawDateValue, bounds::checked_midnight, prelude::*,
};

/// How serious a user message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub enum Severity {
    #[display(fmt = "info")]
    Info,
    #[display(fmt = "warn")]
    Warn,
    #[display(fmt = "error")]
    Error,
    #[display(fmt = "fatal")]
    Fatal,
}

/// A message attached to a field for the user to read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(fmt = "{severity}: {summary}")]
pub struct UserMessage {
    pub severity: Severity,
    pub summary:  String,
    pub detail:   String,
}

impl UserMessage {
    /// Error whose summary and detail are the same text
    pub fn error(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            severity: Severity::Error,
            summary:  text.clone(),
            detail:   text,
        }
    }
}

/// Outcome of one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    valid:   bool,
    message: Option<UserMessage>,
    value:   Option<DateTime<Tz>>,
}

impl ValidationVerdict {
    /// Valid verdict carrying the submitted date at midnight
    pub const fn accepted(value: DateTime<Tz>) -> Self {
        Self {
            valid:   true,
            message: None,
            value:   Some(value),
        }
    }

    /// Invalid verdict carrying the message for the user
    pub const fn rejected(message: UserMessage) -> Self {
        Self {
            valid:   false,
            message: Some(message),
            value:   None,
        }
    }

    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    pub const fn message(&self) -> Option<&UserMessage> {
        self.message.as_ref()
    }

    /// The accepted date, normalized to midnight in the effective zone
    pub const fn value(&self) -> Option<DateTime<Tz>> {
        self.value
    }

    pub fn into_message(self) -> Option<UserMessage> {
        self.message
    }
}

/// Decides whether a submitted date lies within a field's minimum and maximum.
///
/// The bounds are converted with the effective pattern and zone, the submitted
/// value with the field's converter. All three are normalized to midnight in
/// the effective zone before comparing, so the time of day never changes the
/// outcome. A missing bound leaves its side open, independently for each side.
#[derive(Clone, Copy)]
pub struct BoundsValidator<'a> {
    effective:         &'a EffectiveConfig,
    converter:         &'a dyn DateConverter,
    messages:          &'a dyn MessageCatalog,
    validator_message: Option<&'a str>,
}

impl<'a> BoundsValidator<'a> {
    pub const fn new(
        effective: &'a EffectiveConfig,
        converter: &'a dyn DateConverter,
        messages: &'a dyn MessageCatalog,
    ) -> Self {
        Self {
            effective,
            converter,
            messages,
            validator_message: None,
        }
    }

    /// Text used verbatim, as summary and detail, whenever a date is out of range
    #[must_use]
    pub const fn with_validator_message(mut self, message: Option<&'a str>) -> Self {
        self.validator_message = message;
        self
    }

    /// Validates `submitted` against the optional bounds.
    ///
    /// A value that fails to convert yields an invalid verdict with the
    /// conversion error's text; bounds are not compared in that case.
    pub fn validate(
        &self,
        minimum: Option<&RawDateValue>,
        maximum: Option<&RawDateValue>,
        submitted: &RawDateValue,
    ) -> ValidationVerdict {
        let (bounds, day) = match self.convert_all(minimum, maximum, submitted) {
            Ok(converted) => converted,
            Err(e) => {
                tracing::debug!("Rejecting {}: {}", submitted, e);
                return ValidationVerdict::rejected(UserMessage::error(e.to_string()));
            },
        };

        if bounds.is_unbounded() || bounds.contains(day.with_timezone(&Utc)) {
            tracing::debug!("Accepting {} within {}", submitted, bounds);
            return ValidationVerdict::accepted(day);
        }

        tracing::debug!("Rejecting {}: outside {}", submitted, bounds);
        ValidationVerdict::rejected(self.out_of_range_message(&bounds))
    }

    fn convert_all(
        &self,
        minimum: Option<&RawDateValue>,
        maximum: Option<&RawDateValue>,
        submitted: &RawDateValue,
    ) -> Result<(DateBounds, DateTime<Tz>), ConversionError> {
        let time_zone = self.effective.time_zone;
        // Bounds are written in the field's own pattern, whatever converter reads the submission.
        let pattern_converter = PatternConverter::from_effective(self.effective);
        let convert = |raw: Option<&RawDateValue>| {
            raw.filter(|r| !r.is_blank())
                .map(|r| r.to_instant(&pattern_converter, time_zone))
                .transpose()
        };

        let minimum = convert(minimum)?;
        let maximum = convert(maximum)?;
        let submitted = submitted.to_instant(self.converter, time_zone)?;
        let day = checked_midnight(submitted, time_zone)?;
        Ok((DateBounds::new(minimum, maximum, time_zone)?, day))
    }

    fn out_of_range_message(&self, bounds: &DateBounds) -> UserMessage {
        if let Some(text) = self.validator_message {
            return UserMessage::error(text);
        }

        let formatter = PatternConverter::from_effective(self.effective);
        let show = |d: DateTime<Tz>| formatter.format(&d.with_timezone(&Utc));

        let (key, args): (&str, Vec<String>) = match (bounds.minimum(), bounds.maximum()) {
            (Some(min), None) => (ON_OR_AFTER_KEY, vec![show(min)]),
            (None, Some(max)) => (ON_OR_BEFORE_KEY, vec![show(max)]),
            (min, max) => (BETWEEN_KEY, [min, max].into_iter().flatten().map(show).collect()),
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        UserMessage::error(self.messages.message(&self.effective.locale, key, &args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DefaultMessages, at_midnight,
        test_utils::{date, effective, local, utc, zone},
    };
    use chrono::{Datelike, Days, TimeDelta};
    use proptest::prelude::*;

    fn us() -> EffectiveConfig {
        effective("MM/dd/yy", "en-US", Tz::UTC)
    }

    fn validate(
        config: &EffectiveConfig,
        minimum: Option<RawDateValue>,
        maximum: Option<RawDateValue>,
        submitted: RawDateValue,
    ) -> ValidationVerdict {
        let converter = PatternConverter::from_effective(config);
        BoundsValidator::new(config, &converter, &DefaultMessages).validate(
            minimum.as_ref(),
            maximum.as_ref(),
            &submitted,
        )
    }

    #[test]
    fn test_january_examples() {
        let config = us();
        let min = Some(RawDateValue::from("01/01/14"));
        let max = Some(RawDateValue::from("01/31/14"));

        let inside = validate(&config, min.clone(), max.clone(), "01/15/14".into());
        assert!(inside.is_valid());
        assert_eq!(inside.message(), None);
        assert_eq!(inside.value().map(|d| d.with_timezone(&Utc)), Some(utc(2014, 1, 15)));

        let outside = validate(&config, min, max, "02/01/14".into());
        assert!(!outside.is_valid());
        assert_eq!(outside.value(), None);
        assert_eq!(
            outside.message(),
            Some(&UserMessage::error("Please enter a value between 01/01/14 and 01/31/14."))
        );
    }

    /// A missing minimum opens only the lower side and a missing maximum only
    /// the upper side; neither absence relaxes the other bound.
    #[test]
    fn test_verdict_cases() {
        struct TestCase {
            minimum:     Option<RawDateValue>,
            maximum:     Option<RawDateValue>,
            submitted:   RawDateValue,
            valid:       bool,
            description: &'static str,
        }

        let cases = [
            TestCase {
                minimum:     None,
                maximum:     Some(RawDateValue::Date(date(2014, 1, 31))),
                submitted:   RawDateValue::Date(date(2020, 1, 1)),
                valid:       false,
                description: "no lower bound, still bounded above",
            },
            TestCase {
                minimum:     None,
                maximum:     Some(RawDateValue::Date(date(2014, 1, 31))),
                submitted:   RawDateValue::Date(date(1901, 1, 1)),
                valid:       true,
                description: "no lower bound, far past",
            },
            TestCase {
                minimum:     Some(RawDateValue::Date(date(2014, 1, 1))),
                maximum:     None,
                submitted:   RawDateValue::Date(date(2013, 12, 31)),
                valid:       false,
                description: "no upper bound, day before the minimum",
            },
            TestCase {
                minimum:     Some(RawDateValue::Date(date(2014, 1, 1))),
                maximum:     None,
                submitted:   RawDateValue::Date(date(2100, 6, 1)),
                valid:       true,
                description: "no upper bound, far future",
            },
            TestCase {
                minimum:     None,
                maximum:     None,
                submitted:   RawDateValue::EpochMillis(0),
                valid:       true,
                description: "no bounds at all",
            },
            TestCase {
                minimum:     Some(RawDateValue::from("")),
                maximum:     Some(RawDateValue::from("  ")),
                submitted:   RawDateValue::from("07/04/76"),
                valid:       true,
                description: "blank bounds count as absent",
            },
            TestCase {
                minimum:     Some(RawDateValue::Instant(local(Tz::UTC, 2014, 1, 1, 23, 0))),
                maximum:     Some(RawDateValue::Instant(local(Tz::UTC, 2014, 1, 31, 1, 0))),
                submitted:   RawDateValue::Instant(local(Tz::UTC, 2014, 1, 31, 22, 0)),
                valid:       true,
                description: "time of day on the bounds is ignored",
            },
            TestCase {
                minimum:     Some(RawDateValue::EpochMillis(1_388_534_400_000)),
                maximum:     Some(RawDateValue::from("01/31/14")),
                submitted:   RawDateValue::Date(date(2014, 1, 1)),
                valid:       true,
                description: "mixed raw kinds, submitted equal to the minimum",
            },
        ];

        for case in cases {
            let verdict = validate(&us(), case.minimum, case.maximum, case.submitted);
            assert_eq!(verdict.is_valid(), case.valid, "{}", case.description);
            assert_eq!(verdict.message().is_none(), case.valid, "{}", case.description);
        }
    }

    #[test]
    fn test_one_sided_messages() {
        let config = us();

        let verdict = validate(&config, Some("01/01/14".into()), None, "12/31/13".into());
        assert_eq!(
            verdict.message().map(|m| m.summary.as_str()),
            Some("Please enter a value on or after 01/01/14.")
        );

        let verdict = validate(&config, None, Some("01/31/14".into()), "02/01/14".into());
        assert_eq!(
            verdict.message().map(|m| m.detail.as_str()),
            Some("Please enter a value on or before 01/31/14.")
        );
    }

    #[test]
    fn test_message_uses_effective_pattern_and_locale() {
        let config = effective("dd.MM.yyyy", "de-DE", zone("Europe/Berlin"));
        let verdict = validate(
            &config,
            Some(RawDateValue::Date(date(2014, 1, 1))),
            Some(RawDateValue::Date(date(2014, 1, 31))),
            RawDateValue::Date(date(2014, 2, 1)),
        );
        assert_eq!(
            verdict.into_message().map(|m| m.summary),
            Some("Bitte geben Sie einen Wert zwischen 01.01.2014 und 31.01.2014 ein.".to_owned())
        );
    }

    #[test]
    fn test_custom_validator_message() {
        let config = us();
        let converter = PatternConverter::from_effective(&config);
        let validator =
            BoundsValidator::new(&config, &converter, &DefaultMessages).with_validator_message(Some("Out of range"));

        for (min, max, submitted) in [
            (Some("01/01/14"), Some("01/31/14"), "02/01/14"),
            (Some("01/01/14"), None, "12/01/13"),
            (None, Some("01/31/14"), "01/01/20"),
        ] {
            let verdict = validator.validate(
                min.map(RawDateValue::from).as_ref(),
                max.map(RawDateValue::from).as_ref(),
                &submitted.into(),
            );
            assert!(!verdict.is_valid());
            assert_eq!(verdict.message(), Some(&UserMessage::error("Out of range")));
        }
    }

    #[test]
    fn test_conversion_failure_fails_fast() {
        let config = us();
        let converter = PatternConverter::from_effective(&config);
        let validator =
            BoundsValidator::new(&config, &converter, &DefaultMessages).with_validator_message(Some("Out of range"));

        let verdict = validator.validate(Some(&"not a date".into()), None, &"01/15/14".into());
        let message = verdict.message().expect("conversion failure carries a message");
        assert!(!verdict.is_valid());
        assert_eq!(message.severity, Severity::Error);
        assert_eq!(message.summary, message.detail);
        assert_eq!(
            message.summary,
            "Unable to convert \"not a date\" to a date using the pattern MM/dd/yy"
        );

        let verdict = validator.validate(None, None, &"15/01/2014".into());
        assert!(!verdict.is_valid(), "malformed submission is invalid even without bounds");
    }

    #[test]
    fn test_extreme_instants_are_invalid() {
        let tokyo = effective("MM/dd/yy", "en-US", zone("Asia/Tokyo"));
        let new_york = effective("MM/dd/yy", "en-US", zone("America/New_York"));
        let max = DateTime::<Utc>::MAX_UTC;
        let min = DateTime::<Utc>::MIN_UTC;

        let cases = [
            (&tokyo, RawDateValue::Instant(max)),
            (&tokyo, RawDateValue::EpochMillis(max.timestamp_millis())),
            (&new_york, RawDateValue::Instant(min)),
            (&new_york, RawDateValue::EpochMillis(min.timestamp_millis())),
            (&tokyo, RawDateValue::Date(chrono::NaiveDate::MIN)),
        ];
        for (config, submitted) in cases {
            let verdict = validate(config, None, None, submitted.clone());
            assert!(!verdict.is_valid(), "{submitted} should be rejected");
            assert_eq!(verdict.value(), None);
            assert!(verdict.message().is_some(), "{submitted} should carry a message");
        }

        let verdict = validate(&tokyo, Some(RawDateValue::Instant(max)), None, "01/15/14".into());
        assert!(!verdict.is_valid(), "unrepresentable bound is a conversion failure");
    }

    #[test]
    fn test_timezone_consistent_comparison() {
        // 23:30 on the maximum day in Honolulu is already the next day in UTC.
        let honolulu = zone("Pacific/Honolulu");
        let config = effective("MM/dd/yy", "en-US", honolulu);
        let verdict = validate(
            &config,
            Some("01/01/14".into()),
            Some("01/31/14".into()),
            RawDateValue::Instant(local(honolulu, 2014, 1, 31, 23, 30)),
        );
        assert!(verdict.is_valid());
        assert_eq!(
            verdict.value().map(|d| d.with_timezone(&Utc)),
            Some(local(honolulu, 2014, 1, 31, 0, 0))
        );
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(UserMessage::error("Out of range").to_string(), "error: Out of range");
    }

    proptest! {
        #[test]
        fn dates_between_bounds_are_valid(
            min_day in 0u64..20_000,
            span in 0u64..2_000,
            offset in 0u64..2_000,
            hour in 0u32..24,
        ) {
            let min = date(1970, 1, 1) + Days::new(min_day);
            let max = min + Days::new(span);
            let submitted = min + Days::new(offset.min(span));
            let verdict = validate(
                &us(),
                Some(RawDateValue::Date(min)),
                Some(RawDateValue::Date(max)),
                RawDateValue::Instant(local(Tz::UTC, submitted.year(), submitted.month(), submitted.day(), hour, 0)),
            );
            prop_assert!(verdict.is_valid());
        }

        #[test]
        fn dates_before_minimum_are_invalid(
            min_day in 1u64..20_000,
            before in 1u64..1_000,
            open_maximum in any::<bool>(),
        ) {
            let min = date(1970, 1, 1) + Days::new(min_day);
            let submitted = min - Days::new(before);
            let maximum = (!open_maximum).then(|| RawDateValue::Date(min + Days::new(30)));
            let verdict = validate(&us(), Some(RawDateValue::Date(min)), maximum, RawDateValue::Date(submitted));
            prop_assert!(!verdict.is_valid());
        }

        #[test]
        fn dates_after_maximum_are_invalid(max_day in 0u64..20_000, after in 1u64..1_000) {
            let max = date(1970, 1, 1) + Days::new(max_day);
            let submitted = max + Days::new(after);
            let verdict = validate(&us(), None, Some(RawDateValue::Date(max)), RawDateValue::Date(submitted));
            prop_assert!(!verdict.is_valid());
        }

        #[test]
        fn unbounded_accepts_everything(millis in -4_000_000_000_000i64..4_000_000_000_000) {
            let verdict = validate(&us(), None, None, RawDateValue::EpochMillis(millis));
            prop_assert!(verdict.is_valid());
        }

        #[test]
        fn time_of_day_does_not_change_verdict(
            day in 0u64..1_000,
            first in 0i64..(22 * 60),
            second in 0i64..(22 * 60),
            tz in prop::sample::select(vec![Tz::UTC, chrono_tz::America::Los_Angeles, chrono_tz::Asia::Kolkata]),
        ) {
            let config = effective("MM/dd/yy", "en-US", tz);
            let day = date(2013, 6, 1) + Days::new(day);
            // Stay within 22 hours of midnight so short daylight saving days keep the same date.
            let midnight = at_midnight(local(tz, day.year(), day.month(), day.day(), 12, 0), tz)
                .expect("day is representable")
                .with_timezone(&Utc);
            let at = |minutes: i64| RawDateValue::Instant(midnight + TimeDelta::minutes(minutes));
            let bounds = || (Some(RawDateValue::from("01/01/14")), Some(RawDateValue::from("01/31/14")));

            let (min, max) = bounds();
            let a = validate(&config, min, max, at(first));
            let (min, max) = bounds();
            let b = validate(&config, min, max, at(second));
            prop_assert_eq!(a.is_valid(), b.is_valid());
        }
    }
}

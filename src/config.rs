use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use unic_langid::{LanguageIdentifier, LanguageIdentifierError};

use crate::{
    DEFAULT_TIME_ZONE, DatePattern, DefaultMessages, LOCALE_TAG_UNDERSCORE, MessageCatalog, RawDateValue,
    prelude::*,
};

/// A locale given either as an identifier or as a tag still to be parsed
/// (`en-US`, `en_US`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, From, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocaleSetting {
    Identifier(LanguageIdentifier),
    Tag(String),
}

impl LocaleSetting {
    /// Coerces the setting into an identifier.
    ///
    /// # Errors
    /// Returns `LanguageIdentifierError` if the tag is not a valid language tag.
    pub fn to_identifier(&self) -> Result<LanguageIdentifier, LanguageIdentifierError> {
        match self {
            Self::Identifier(id) => Ok(id.clone()),
            Self::Tag(tag) => tag.trim().replace(LOCALE_TAG_UNDERSCORE, "-").parse(),
        }
    }
}

impl From<&str> for LocaleSetting {
    fn from(tag: &str) -> Self {
        Self::Tag(tag.to_owned())
    }
}

impl From<LocaleSetting> for String {
    fn from(setting: LocaleSetting) -> Self {
        match setting {
            LocaleSetting::Identifier(id) => id.to_string(),
            LocaleSetting::Tag(tag) => tag,
        }
    }
}

/// Ambient, read-only inputs of one request.
#[derive(Clone, Copy)]
pub struct RequestContext<'a> {
    locale:   &'a LanguageIdentifier,
    messages: &'a dyn MessageCatalog,
}

impl<'a> RequestContext<'a> {
    /// Context using the built-in message catalog
    pub fn new(locale: &'a LanguageIdentifier) -> Self {
        Self {
            locale,
            messages: &DefaultMessages,
        }
    }

    /// Context using a caller-supplied message catalog
    pub fn with_messages(locale: &'a LanguageIdentifier, messages: &'a dyn MessageCatalog) -> Self {
        Self { locale, messages }
    }

    /// The locale of the request
    pub const fn locale(&self) -> &'a LanguageIdentifier {
        self.locale
    }

    /// The catalog used to build user messages
    pub fn messages(&self) -> &'a dyn MessageCatalog {
        self.messages
    }
}

impl std::fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("locale", &self.locale.to_string())
            .finish_non_exhaustive()
    }
}

/// Pattern, locale and zone used for one validation pass, after defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub pattern:   DatePattern,
    pub locale:    LanguageIdentifier,
    pub time_zone: Tz,
}

/// Settings of a date field. Every setting is optional:
///
/// - `pattern`: defaults to the short date pattern of the effective locale
/// - `locale`: defaults to the request locale
/// - `time_zone`: IANA name, defaults to UTC
/// - `minimum_date` / `maximum_date`: absent means unbounded on that side
/// - `validator_message`: replaces the generated out-of-range message
/// - `style_class`: extra classes for the rendered field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pattern:           Option<DatePattern>,
    locale:            Option<LocaleSetting>,
    time_zone:         Option<String>,
    minimum_date:      Option<RawDateValue>,
    maximum_date:      Option<RawDateValue>,
    validator_message: Option<String>,
    style_class:       Option<String>,
}

impl FieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn pattern(&self) -> Option<&DatePattern> {
        self.pattern.as_ref()
    }

    pub const fn locale(&self) -> Option<&LocaleSetting> {
        self.locale.as_ref()
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.time_zone.as_deref()
    }

    pub const fn minimum_date(&self) -> Option<&RawDateValue> {
        self.minimum_date.as_ref()
    }

    pub const fn maximum_date(&self) -> Option<&RawDateValue> {
        self.maximum_date.as_ref()
    }

    pub fn validator_message(&self) -> Option<&str> {
        self.validator_message.as_deref()
    }

    pub fn style_class(&self) -> Option<&str> {
        self.style_class.as_deref()
    }

    pub fn set_pattern(&mut self, pattern: Option<DatePattern>) {
        self.pattern = pattern;
    }

    pub fn set_locale(&mut self, locale: Option<LocaleSetting>) {
        self.locale = locale;
    }

    pub fn set_time_zone(&mut self, time_zone: Option<String>) {
        self.time_zone = time_zone;
    }

    pub fn set_minimum_date(&mut self, minimum: Option<RawDateValue>) {
        self.minimum_date = minimum;
    }

    pub fn set_maximum_date(&mut self, maximum: Option<RawDateValue>) {
        self.maximum_date = maximum;
    }

    pub fn set_validator_message(&mut self, message: Option<String>) {
        self.validator_message = message;
    }

    pub fn set_style_class(&mut self, style_class: Option<String>) {
        self.style_class = style_class;
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: DatePattern) -> Self {
        self.set_pattern(Some(pattern));
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<LocaleSetting>) -> Self {
        self.set_locale(Some(locale.into()));
        self
    }

    #[must_use]
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.set_time_zone(Some(time_zone.into()));
        self
    }

    #[must_use]
    pub fn with_minimum_date(mut self, minimum: impl Into<RawDateValue>) -> Self {
        self.set_minimum_date(Some(minimum.into()));
        self
    }

    #[must_use]
    pub fn with_maximum_date(mut self, maximum: impl Into<RawDateValue>) -> Self {
        self.set_maximum_date(Some(maximum.into()));
        self
    }

    #[must_use]
    pub fn with_validator_message(mut self, message: impl Into<String>) -> Self {
        self.set_validator_message(Some(message.into()));
        self
    }

    #[must_use]
    pub fn with_style_class(mut self, style_class: impl Into<String>) -> Self {
        self.set_style_class(Some(style_class.into()));
        self
    }

    /// Resolves pattern, locale and zone against the request. Never fails:
    /// unusable settings fall back to their defaults.
    pub fn resolve(&self, ctx: &RequestContext<'_>) -> EffectiveConfig {
        let locale = resolve_locale(self.locale.as_ref(), ctx.locale());
        let pattern = self
            .pattern
            .clone()
            .unwrap_or_else(|| DatePattern::short_for(&locale));
        let time_zone = resolve_time_zone(self.time_zone.as_deref());

        EffectiveConfig {
            pattern,
            locale,
            time_zone,
        }
    }
}

/// The explicit locale when it is usable, the request locale otherwise.
pub fn resolve_locale(explicit: Option<&LocaleSetting>, ambient: &LanguageIdentifier) -> LanguageIdentifier {
    match explicit.map(LocaleSetting::to_identifier) {
        Some(Ok(locale)) => locale,
        Some(Err(e)) => {
            tracing::warn!("Ignoring locale {:?}: {}; using {}", explicit, e, ambient);
            ambient.clone()
        },
        None => ambient.clone(),
    }
}

/// Looks up a zone by IANA name. Absent, blank and unknown names give UTC.
pub fn resolve_time_zone(name: Option<&str>) -> Tz {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return DEFAULT_TIME_ZONE;
    };
    name.parse::<Tz>().unwrap_or_else(|e| {
        tracing::warn!("Unknown time zone {:?} ({}); using {}", name, e, DEFAULT_TIME_ZONE.name());
        DEFAULT_TIME_ZONE
    })
}

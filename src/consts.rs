use chrono_tz::Tz;

/// Zone used when the field does not name one.
/// Date-only comparisons stay independent of the server's local zone.
pub const DEFAULT_TIME_ZONE: Tz = Tz::UTC;

/// Pattern used when the locale has no known short date pattern
pub const FALLBACK_PATTERN: &str = "MM/dd/yy";

/// ISO 8601 calendar date pattern
pub const ISO_PATTERN: &str = "yyyy-MM-dd";

/// Language whose messages are used when the requested one is not available
pub const DEFAULT_LANGUAGE: &str = "en";

/// Message key used when both bounds are configured
pub const BETWEEN_KEY: &str = "please-enter-a-value-between-x-and-x";
/// Message key used when only a minimum is configured
pub const ON_OR_AFTER_KEY: &str = "please-enter-a-value-on-or-after-x";
/// Message key used when only a maximum is configured
pub const ON_OR_BEFORE_KEY: &str = "please-enter-a-value-on-or-before-x";

/// Class every rendered date field carries
pub const STYLE_CLASS_NAME: &str = "input-date";

/// Delimiter for literal text inside a date pattern
pub const PATTERN_QUOTE: char = '\'';

/// Separator accepted in locale tags besides `-` (`en_US`)
pub const LOCALE_TAG_UNDERSCORE: char = '_';

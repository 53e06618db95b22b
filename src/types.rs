use crate::consts::{FALLBACK_PATTERN, ISO_PATTERN, PATTERN_QUOTE};
use crate::prelude::*;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

/// Short date patterns by language and region, widened to two-digit month and day.
/// An empty region matches any region of the language.
const SHORT_PATTERNS: &[(&str, &str, &str)] = &[
    ("en", "US", "MM/dd/yy"),
    ("en", "GB", "dd/MM/yy"),
    ("en", "AU", "dd/MM/yy"),
    ("en", "IN", "dd/MM/yy"),
    ("en", "CA", "yy-MM-dd"),
    ("en", "", "MM/dd/yy"),
    ("fr", "CA", "yy-MM-dd"),
    ("fr", "", "dd/MM/yy"),
    ("de", "", "dd.MM.yy"),
    ("es", "", "dd/MM/yy"),
    ("it", "", "dd/MM/yy"),
    ("pt", "", "dd/MM/yy"),
    ("nl", "", "dd-MM-yy"),
    ("ru", "", "dd.MM.yy"),
    ("pl", "", "dd.MM.yy"),
    ("sv", "", "yy-MM-dd"),
    ("ja", "", "yy/MM/dd"),
    ("zh", "", "yy-MM-dd"),
    ("ko", "", "yy. MM. dd"),
];

/// Error raised when a date pattern cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum PatternError {
    #[display(fmt = "Empty date pattern")]
    Empty,
    #[display(fmt = "Unsupported letter '{letter}' in date pattern \"{pattern}\"")]
    UnsupportedLetter { letter: char, pattern: String },
    #[display(fmt = "Unterminated quote in date pattern \"{_0}\"")]
    UnterminatedQuote(String),
}

impl std::error::Error for PatternError {}

/// A date pattern in letter notation (`MM/dd/yy`, `yyyy-MM-dd'T'HH:mm`),
/// compiled once into chrono format items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(fmt = "{source}")]
#[serde(try_from = "String", into = "String")]
pub struct DatePattern {
    source:   String,
    strftime: String,
}

impl DatePattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    /// Returns `PatternError` if the pattern is empty, uses a letter with no
    /// chrono equivalent, or leaves a quoted literal open.
    pub fn new(source: impl Into<String>) -> Result<Self, PatternError> {
        let source = source.into();
        if source.trim().is_empty() {
            return Err(PatternError::Empty);
        }
        let strftime = compile(&source)?;
        Ok(Self { source, strftime })
    }

    /// ISO 8601 calendar date (`yyyy-MM-dd`)
    pub fn iso() -> Self {
        Self {
            source:   ISO_PATTERN.to_owned(),
            strftime: "%Y-%m-%d".to_owned(),
        }
    }

    /// Short date pattern for a locale.
    /// Deterministic: the same locale always yields the same pattern.
    pub fn short_for(locale: &LanguageIdentifier) -> Self {
        let language = locale.language.as_str();
        let region = locale.region.as_ref().map_or("", |r| r.as_str());

        let source = SHORT_PATTERNS
            .iter()
            .find(|(l, r, _)| *l == language && !r.is_empty() && *r == region)
            .or_else(|| SHORT_PATTERNS.iter().find(|(l, r, _)| *l == language && r.is_empty()))
            .map_or(FALLBACK_PATTERN, |(_, _, pattern)| *pattern);

        Self::new(source).unwrap_or_else(|_| Self::iso())
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled chrono format string
    pub(crate) fn strftime(&self) -> &str {
        &self.strftime
    }
}

impl TryFrom<String> for DatePattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for DatePattern {
    type Error = PatternError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DatePattern> for String {
    fn from(pattern: DatePattern) -> Self {
        pattern.source
    }
}

fn compile(source: &str) -> Result<String, PatternError> {
    let mut out = String::with_capacity(source.len() * 2);
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c == PATTERN_QUOTE {
            // '' outside a literal is an apostrophe
            if chars.next_if_eq(&PATTERN_QUOTE).is_some() {
                out.push(PATTERN_QUOTE);
                continue;
            }
            let mut closed = false;
            while let Some(q) = chars.next() {
                if q == PATTERN_QUOTE {
                    if chars.next_if_eq(&PATTERN_QUOTE).is_some() {
                        out.push(PATTERN_QUOTE);
                        continue;
                    }
                    closed = true;
                    break;
                }
                push_literal(&mut out, q);
            }
            if !closed {
                return Err(PatternError::UnterminatedQuote(source.to_owned()));
            }
        } else if c.is_ascii_alphabetic() {
            let mut width = 1;
            while chars.next_if_eq(&c).is_some() {
                width += 1;
            }
            let specifier = field_specifier(c, width).ok_or_else(|| PatternError::UnsupportedLetter {
                letter:  c,
                pattern: source.to_owned(),
            })?;
            out.push_str(specifier);
        } else {
            push_literal(&mut out, c);
        }
    }

    // Every specifier above is a valid chrono item; this only trips on a mapping bug.
    if StrftimeItems::new(&out).any(|item| matches!(item, Item::Error)) {
        return Err(PatternError::UnsupportedLetter {
            letter:  '%',
            pattern: source.to_owned(),
        });
    }
    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

const fn field_specifier(letter: char, width: usize) -> Option<&'static str> {
    let specifier = match (letter, width) {
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M' | 'L', 1) => "%-m",
        ('M' | 'L', 2) => "%m",
        ('M' | 'L', 3) => "%b",
        ('M' | 'L', _) => "%B",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('D', 1 | 2) => "%-j",
        ('D', _) => "%j",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('u', _) => "%u",
        ('a', _) => "%p",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('S', 1..=3) => "%3f",
        ('S', 4..=6) => "%6f",
        ('S', _) => "%9f",
        ('z', _) => "%Z",
        ('Z', _) => "%z",
        ('X', _) => "%:z",
        _ => return None,
    };
    Some(specifier)
}

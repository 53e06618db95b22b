use unic_langid::LanguageIdentifier;

use crate::{BETWEEN_KEY, DEFAULT_LANGUAGE, ON_OR_AFTER_KEY, ON_OR_BEFORE_KEY};

/// Source of translated user messages.
pub trait MessageCatalog: Send + Sync {
    /// Looks up the template for `key` in `locale` and fills `{0}`, `{1}`, ...
    /// with `args`.
    fn message(&self, locale: &LanguageIdentifier, key: &str, args: &[&str]) -> String;
}

/// (locale, key, template)
const TEMPLATES: &[(&str, &str, &str)] = &[
    ("en", BETWEEN_KEY, "Please enter a value between {0} and {1}."),
    ("en", ON_OR_AFTER_KEY, "Please enter a value on or after {0}."),
    ("en", ON_OR_BEFORE_KEY, "Please enter a value on or before {0}."),
    ("de", BETWEEN_KEY, "Bitte geben Sie einen Wert zwischen {0} und {1} ein."),
    ("de", ON_OR_AFTER_KEY, "Bitte geben Sie einen Wert ab {0} ein."),
    ("de", ON_OR_BEFORE_KEY, "Bitte geben Sie einen Wert bis {0} ein."),
    ("fr", BETWEEN_KEY, "Veuillez saisir une valeur comprise entre {0} et {1}."),
    ("fr", ON_OR_AFTER_KEY, "Veuillez saisir une valeur à partir du {0}."),
    ("fr", ON_OR_BEFORE_KEY, "Veuillez saisir une valeur jusqu'au {0}."),
    ("es", BETWEEN_KEY, "Introduzca un valor entre {0} y {1}."),
    ("es", ON_OR_AFTER_KEY, "Introduzca un valor a partir del {0}."),
    ("es", ON_OR_BEFORE_KEY, "Introduzca un valor hasta el {0}."),
    ("nl", BETWEEN_KEY, "Voer een waarde in tussen {0} en {1}."),
    ("nl", ON_OR_AFTER_KEY, "Voer een waarde in vanaf {0}."),
    ("nl", ON_OR_BEFORE_KEY, "Voer een waarde in tot en met {0}."),
];

/// Built-in catalog for the field's own messages.
///
/// Lookup order is `language-REGION`, then `language`, then English. A key
/// with no template anywhere comes back unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultMessages;

impl DefaultMessages {
    fn template(locale: &LanguageIdentifier, key: &str) -> Option<&'static str> {
        let language = locale.language.as_str();
        let full = locale
            .region
            .as_ref()
            .map(|region| format!("{language}-{}", region.as_str()));

        full.iter()
            .map(String::as_str)
            .chain([language, DEFAULT_LANGUAGE])
            .find_map(|tag| {
                TEMPLATES
                    .iter()
                    .find(|(l, k, _)| *l == tag && *k == key)
                    .map(|(_, _, template)| *template)
            })
    }
}

impl MessageCatalog for DefaultMessages {
    fn message(&self, locale: &LanguageIdentifier, key: &str, args: &[&str]) -> String {
        let Some(template) = Self::template(locale, key) else {
            return key.to_owned();
        };
        fill(template, args)
    }
}

/// Replaces each `{n}` in `template` with `args[n]` in one left-to-right pass.
/// Argument text is never rescanned; placeholders without an argument stay as written.
fn fill(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let arg = after
            .find('}')
            .and_then(|close| Some((close, args.get(after[..close].parse::<usize>().ok()?)?)));
        match arg {
            Some((close, arg)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            },
            None => {
                out.push('{');
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::locale;

    #[test]
    fn test_english_between() {
        let text = DefaultMessages.message(&locale("en-US"), BETWEEN_KEY, &["01/01/14", "01/31/14"]);
        assert_eq!(text, "Please enter a value between 01/01/14 and 01/31/14.");
    }

    #[test]
    fn test_language_lookup() {
        let text = DefaultMessages.message(&locale("de-AT"), ON_OR_AFTER_KEY, &["01.01.14"]);
        assert_eq!(text, "Bitte geben Sie einen Wert ab 01.01.14 ein.");

        let text = DefaultMessages.message(&locale("fr"), ON_OR_BEFORE_KEY, &["31/01/14"]);
        assert_eq!(text, "Veuillez saisir une valeur jusqu'au 31/01/14.");
    }

    #[test]
    fn test_falls_back_to_english() {
        let text = DefaultMessages.message(&locale("ja-JP"), BETWEEN_KEY, &["14/01/01", "14/01/31"]);
        assert_eq!(text, "Please enter a value between 14/01/01 and 14/01/31.");
    }

    #[test]
    fn test_fill_does_not_rescan_arguments() {
        let text = DefaultMessages.message(&locale("en"), BETWEEN_KEY, &["{1}", "01/31/14"]);
        assert_eq!(text, "Please enter a value between {1} and 01/31/14.");
    }

    #[test]
    fn test_fill_cases() {
        let cases = [
            ("{0} and {1}", &["a", "b"][..], "a and b"),
            ("{1} before {0}", &["a", "b"][..], "b before a"),
            ("{0}{0}", &["x"][..], "xx"),
            ("missing {2}", &["a"][..], "missing {2}"),
            ("braces {} and {x} stay", &[][..], "braces {} and {x} stay"),
            ("open {0", &["a"][..], "open {0"),
            ("{{0}}", &["a"][..], "{a}"),
        ];

        for (template, args, expected) in cases {
            assert_eq!(fill(template, args), expected, "filling {template:?}");
        }
    }

    #[test]
    fn test_unknown_key_returns_key() {
        assert_eq!(DefaultMessages.message(&locale("en"), "no-such-key", &[]), "no-such-key");
    }

    #[test]
    fn test_every_key_has_english() {
        for key in [BETWEEN_KEY, ON_OR_AFTER_KEY, ON_OR_BEFORE_KEY] {
            assert!(
                TEMPLATES.iter().any(|(l, k, _)| *l == DEFAULT_LANGUAGE && *k == key),
                "missing English template for {key}"
            );
        }
    }
}

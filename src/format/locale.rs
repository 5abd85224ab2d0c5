//! Number symbols per locale.

use crate::error::{CodecError, CodecResult};

/// Decimal and grouping separators of a locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    tag: String,
    decimal_separator: char,
    grouping_separator: char,
}

// (language, decimal, grouping)
const SYMBOLS: &[(&str, char, char)] = &[
    ("", '.', ','),
    ("en", '.', ','),
    ("sv", ',', '\u{a0}'),
    ("fi", ',', '\u{a0}'),
    ("nb", ',', '\u{a0}'),
    ("no", ',', '\u{a0}'),
    ("fr", ',', '\u{202f}'),
    ("ru", ',', '\u{a0}'),
    ("pl", ',', '\u{a0}'),
    ("de", ',', '.'),
    ("da", ',', '.'),
    ("nl", ',', '.'),
    ("es", ',', '.'),
    ("it", ',', '.'),
    ("pt", ',', '.'),
];

// Region overrides that differ from their language default.
const REGION_SYMBOLS: &[(&str, char, char)] = &[("de-CH", '.', '\''), ("pt-BR", ',', '.')];

impl Locale {
    /// The root locale: `.` as decimal separator and `,` for grouping.
    pub fn root() -> Self {
        Self {
            tag: String::new(),
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }

    /// Resolve a language tag such as `sv-SE`, `de` or `en_US`.
    ///
    /// Region-specific symbols are used when known; otherwise the language subtag decides.
    /// An unknown language is a configuration error.
    pub fn from_tag(tag: &str) -> CodecResult<Self> {
        let normalized = tag.trim().replace('_', "-");
        if let Some(&(_, d, g)) = REGION_SYMBOLS
            .iter()
            .find(|(t, _, _)| t.eq_ignore_ascii_case(&normalized))
        {
            return Ok(Self::custom(normalized, d, g));
        }

        let language = normalized.split('-').next().unwrap_or("").to_ascii_lowercase();
        SYMBOLS
            .iter()
            .find(|(l, _, _)| *l == language)
            .map(|&(_, d, g)| Self::custom(normalized.clone(), d, g))
            .ok_or_else(|| CodecError::config(format!("unsupported locale '{tag}'")))
    }

    /// A locale with explicit symbols.
    pub fn custom(tag: impl Into<String>, decimal_separator: char, grouping_separator: char) -> Self {
        Self {
            tag: tag.into(),
            decimal_separator,
            grouping_separator,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn grouping_separator(&self) -> char {
        self.grouping_separator
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::root()
    }
}

#[cfg(test)]
mod tests {
    use super::Locale;

    #[test]
    fn resolves_language_and_region() {
        let sv = Locale::from_tag("sv-SE").unwrap();
        assert_eq!(sv.decimal_separator(), ',');
        assert_eq!(sv.grouping_separator(), '\u{a0}');

        let us = Locale::from_tag("en_US").unwrap();
        assert_eq!(us.decimal_separator(), '.');

        let ch = Locale::from_tag("de-CH").unwrap();
        assert_eq!(ch.grouping_separator(), '\'');
        assert_eq!(Locale::from_tag("de-AT").unwrap().grouping_separator(), '.');
    }

    #[test]
    fn unknown_language_is_config_error() {
        assert!(Locale::from_tag("xx-YY").is_err());
        assert_eq!(Locale::from_tag("").unwrap(), Locale::custom("", '.', ','));
    }
}

//! Fixed-width fit/pad/fill algorithms.
//!
//! Widths are counted in `char`s.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Which side(s) fill characters go on.
///
/// `LeftPad` right-aligns the text, `RightPad` left-aligns it, `BothPad` centers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadPolicy {
    LeftPad,
    #[default]
    RightPad,
    BothPad,
}

/// Fits and pads text into a field of fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padder {
    width: usize,
    fill: char,
    policy: PadPolicy,
}

impl Padder {
    pub fn new(width: usize, fill: char, policy: PadPolicy) -> Self {
        Self { width, fill, policy }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn fill_char(&self) -> char {
        self.fill
    }

    pub fn policy(&self) -> PadPolicy {
        self.policy
    }

    /// Truncate to the field width, keeping the part opposite the pad side.
    ///
    /// `LeftPad` keeps the rightmost characters, `RightPad` the leftmost, and `BothPad` keeps
    /// a centered window, dropping the smaller half of the excess on the left.
    ///
    /// `fit` never removes fill, so reading a padded field back goes through
    /// [`Padder::strip`]: `strip(pad(text)) == text` for text without leading (left pad) or
    /// trailing (right pad) fill characters.
    pub fn fit<'a>(&self, text: &'a str) -> &'a str {
        let len = text.chars().count();
        if len <= self.width {
            return text;
        }
        let excess = len - self.width;
        let (skip, take) = match self.policy {
            PadPolicy::LeftPad => (excess, self.width),
            PadPolicy::RightPad => (0, self.width),
            PadPolicy::BothPad => (excess / 2, self.width),
        };
        char_slice(text, skip, take)
    }

    /// Pad text shorter than the field width with fill characters.
    ///
    /// `BothPad` puts the smaller half of an odd fill count on the left. With a `0` fill on
    /// the left, a leading sign stays in front of the zeros. Text longer than the width is a
    /// contract violation and yields [`CodecError::IndexOutOfBounds`].
    pub fn pad(&self, text: &str) -> CodecResult<String> {
        let len = text.chars().count();
        if len > self.width {
            return Err(CodecError::IndexOutOfBounds {
                width: self.width,
                len,
            });
        }
        Ok(self.padded(text, self.width - len))
    }

    /// Produce exactly `width` characters: [`Padder::fit`] then [`Padder::pad`].
    pub fn fill(&self, text: &str) -> String {
        let fitted = self.fit(text);
        self.padded(fitted, self.width - fitted.chars().count())
    }

    fn padded(&self, text: &str, count: usize) -> String {
        let mut out = String::with_capacity(text.len() + count * self.fill.len_utf8());
        match self.policy {
            PadPolicy::LeftPad => {
                let (sign, digits) = match text.chars().next() {
                    Some(c @ ('-' | '+')) if self.fill == '0' => (Some(c), &text[1..]),
                    _ => (None, text),
                };
                out.extend(sign);
                out.extend(std::iter::repeat_n(self.fill, count));
                out.push_str(digits);
            }
            PadPolicy::RightPad => {
                out.push_str(text);
                out.extend(std::iter::repeat_n(self.fill, count));
            }
            PadPolicy::BothPad => {
                let left = count / 2;
                out.extend(std::iter::repeat_n(self.fill, left));
                out.push_str(text);
                out.extend(std::iter::repeat_n(self.fill, count - left));
            }
        }
        out
    }

    /// Remove fill characters from the padded side(s) of a field read from input.
    ///
    /// When a digit fill consumes the whole field (e.g. `0000`), a single fill character is
    /// kept so the field still reads as a number.
    pub fn strip<'a>(&self, text: &'a str) -> &'a str {
        let stripped = match self.policy {
            PadPolicy::LeftPad => text.trim_start_matches(self.fill),
            PadPolicy::RightPad => text.trim_end_matches(self.fill),
            PadPolicy::BothPad => text.trim_matches(self.fill),
        };
        if stripped.is_empty() && !text.is_empty() && self.fill.is_ascii_digit() {
            &text[text.len() - self.fill.len_utf8()..]
        } else {
            stripped
        }
    }
}

/// Slice `take` chars starting at char index `skip`.
pub(crate) fn char_slice(text: &str, skip: usize, take: usize) -> &str {
    let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let start = indices.nth(skip).unwrap_or(text.len());
    let end = if take == 0 {
        start
    } else {
        indices.nth(take - 1).unwrap_or(text.len())
    };
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{PadPolicy, Padder, char_slice};
    use crate::error::CodecError;

    #[test]
    fn fit_keeps_side_opposite_padding() {
        let left = Padder::new(3, ' ', PadPolicy::LeftPad);
        let right = Padder::new(3, ' ', PadPolicy::RightPad);
        assert_eq!(left.fit("abcdef"), "def");
        assert_eq!(right.fit("abcdef"), "abc");
        assert_eq!(right.fit("ab"), "ab");
    }

    #[test]
    fn both_pad_fit_centers_window() {
        // Odd excess: smaller half dropped on the left.
        assert_eq!(Padder::new(3, ' ', PadPolicy::BothPad).fit("abcdef"), "bcd");
        // Even excess.
        assert_eq!(Padder::new(2, ' ', PadPolicy::BothPad).fit("abcdef"), "cd");
        assert_eq!(Padder::new(4, ' ', PadPolicy::BothPad).fit("abcdef"), "bcde");
    }

    #[test]
    fn both_pad_splits_fill_smaller_share_left() {
        let p = Padder::new(6, '*', PadPolicy::BothPad);
        assert_eq!(p.pad("ab").unwrap(), "**ab**");
        assert_eq!(p.pad("abc").unwrap(), "*abc**");
        assert_eq!(Padder::new(5, '*', PadPolicy::BothPad).pad("ab").unwrap(), "*ab**");
    }

    #[test]
    fn pad_sides() {
        assert_eq!(Padder::new(5, '.', PadPolicy::LeftPad).pad("ab").unwrap(), "...ab");
        assert_eq!(Padder::new(5, '.', PadPolicy::RightPad).pad("ab").unwrap(), "ab...");
        assert_eq!(Padder::new(2, '.', PadPolicy::RightPad).pad("ab").unwrap(), "ab");
    }

    #[test]
    fn pad_longer_than_width_is_index_error() {
        let err = Padder::new(2, ' ', PadPolicy::RightPad).pad("abc").unwrap_err();
        assert!(matches!(err, CodecError::IndexOutOfBounds { width: 2, len: 3 }));
    }

    #[test]
    fn zero_fill_keeps_sign_first() {
        let p = Padder::new(6, '0', PadPolicy::LeftPad);
        assert_eq!(p.pad("-42").unwrap(), "-00042");
        assert_eq!(p.fill("-42"), "-00042");
        assert_eq!(Padder::new(6, ' ', PadPolicy::LeftPad).fill("-42"), "   -42");
    }

    #[test]
    fn fill_truncates_and_pads() {
        let p = Padder::new(4, '_', PadPolicy::RightPad);
        assert_eq!(p.fill("abcdef"), "abcd");
        assert_eq!(p.fill("ab"), "ab__");
        assert_eq!(Padder::new(4, ' ', PadPolicy::RightPad).fill("åäöüé"), "åäöü");
    }

    #[test]
    fn strip_keeps_single_zero() {
        let p = Padder::new(4, '0', PadPolicy::LeftPad);
        assert_eq!(p.strip("0042"), "42");
        assert_eq!(p.strip("0000"), "0");
        assert_eq!(Padder::new(4, ' ', PadPolicy::RightPad).strip("    "), "");
        assert_eq!(Padder::new(6, ' ', PadPolicy::BothPad).strip(" ab  "), "ab");
    }

    #[test]
    fn char_slice_handles_multibyte() {
        assert_eq!(char_slice("åäö", 1, 1), "ä");
        assert_eq!(char_slice("åäö", 2, 5), "ö");
        assert_eq!(char_slice("åäö", 5, 1), "");
        assert_eq!(char_slice("abc", 1, 0), "");
    }

    proptest! {
        #[test]
        fn strip_inverts_pad(text in "[a-z]{0,8}", width in 8usize..16) {
            for policy in [PadPolicy::LeftPad, PadPolicy::RightPad, PadPolicy::BothPad] {
                let p = Padder::new(width, ' ', policy);
                let padded = p.pad(&text).unwrap();
                prop_assert_eq!(padded.chars().count(), width);
                prop_assert_eq!(p.strip(&padded), text.as_str());
                prop_assert_eq!(p.fit(&padded), padded.as_str());
            }
        }

        #[test]
        fn fill_is_always_exact_width(text in "\\PC{0,20}", width in 0usize..12) {
            let p = Padder::new(width, '#', PadPolicy::BothPad);
            prop_assert_eq!(p.fill(&text).chars().count(), width);
        }
    }
}

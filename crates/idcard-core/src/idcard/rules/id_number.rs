//! Identity number recovery and validation.

use std::cmp::Reverse;

use super::normalize::strip_whitespace;
use super::patterns::PatternSet;
use super::{ExtractionMatch, FieldExtractor};

/// Length of a national identity number.
pub const ID_LENGTH: usize = 18;

/// A confusable span must still be at least half real digits.
const MIN_REAL_DIGITS: usize = 9;

/// MOD 11-2 weights for the first 17 digits.
const CHECKSUM_WEIGHTS: [u32; 17] = [7, 9, 10, 5, 8, 4, 2, 1, 6, 3, 7, 9, 10, 5, 8, 4, 2];

/// Check character indexed by the weighted sum modulo 11.
const CHECKSUM_MAP: [char; 11] = ['1', '0', 'X', '9', '8', '7', '6', '5', '4', '3', '2'];

/// Identity number extractor.
///
/// Searches the whitespace-stripped text, so match positions refer to
/// that compacted text rather than to the input.
pub struct IdNumberExtractor<'a> {
    patterns: &'a PatternSet,
    uppercase_check_digit: bool,
}

impl<'a> IdNumberExtractor<'a> {
    pub fn new(patterns: &'a PatternSet) -> Self {
        Self {
            patterns,
            uppercase_check_digit: true,
        }
    }

    /// Set whether a trailing `x` is upper-cased.
    pub fn with_uppercase_check_digit(mut self, uppercase: bool) -> Self {
        self.uppercase_check_digit = uppercase;
        self
    }

    fn finish(&self, span: &str) -> String {
        let corrected = correct_confusions(span);
        if self.uppercase_check_digit {
            corrected.to_uppercase()
        } else {
            corrected
        }
    }
}

impl FieldExtractor for IdNumberExtractor<'_> {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let compact = strip_whitespace(text);

        // Clean digit runs win over anything that needs correcting
        let strict: Vec<_> = self
            .patterns
            .id_strict
            .find_iter(&compact)
            .map(|m| {
                ExtractionMatch::new(self.finish(m.as_str()), 0.95, m.as_str())
                    .with_position(m.start(), m.end())
            })
            .collect();

        if !strict.is_empty() {
            return strict;
        }

        self.patterns
            .id_confusable_run
            .find_iter(&compact)
            .filter_map(|run| {
                let (offset, span) = best_window(run.as_str())?;
                let start = run.start() + offset;
                Some(
                    ExtractionMatch::new(self.finish(span), 0.6, span)
                        .with_position(start, start + ID_LENGTH),
                )
            })
            .collect()
    }
}

/// Pick the 18-character window of a confusable run with the most real
/// digits, preferring the earliest on ties.
///
/// A window may not reach past the last real digit of the run (or the `X`
/// right after it) unless the run is exactly one number long, so trailing
/// noise is never turned into digits.
fn best_window(run: &str) -> Option<(usize, &str)> {
    // The run pattern only admits ASCII, so byte offsets are char offsets.
    if run.len() < ID_LENGTH {
        return None;
    }

    let limit = if run.len() == ID_LENGTH {
        ID_LENGTH
    } else {
        real_end(run)
    };

    (0..=run.len() - ID_LENGTH)
        .filter(|start| start + ID_LENGTH <= limit)
        .map(|start| (start, &run[start..start + ID_LENGTH]))
        .filter(|(_, window)| is_candidate(window))
        .max_by_key(|(start, window)| (real_digits(window), Reverse(*start)))
}

fn is_candidate(window: &str) -> bool {
    let body_has_check_char = window[..ID_LENGTH - 1]
        .chars()
        .any(|c| c.eq_ignore_ascii_case(&'x'));
    let ends_in_check_char = window
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_digit() || c.eq_ignore_ascii_case(&'x'));

    !body_has_check_char && ends_in_check_char && real_digits(window) >= MIN_REAL_DIGITS
}

/// End of the last real digit in a run, including a check `X` right after it.
fn real_end(run: &str) -> usize {
    let digits_end = run
        .rfind(|c: char| c.is_ascii_digit())
        .map_or(0, |i| i + 1);

    match run[digits_end..].chars().next() {
        Some('X' | 'x') => digits_end + 1,
        _ => digits_end,
    }
}

fn real_digits(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Replace characters OCR commonly confuses with digits.
pub fn correct_confusions(span: &str) -> String {
    span.chars()
        .map(|c| match c {
            'l' | 'I' => '1',
            'o' | 'O' => '0',
            's' | 'S' => '5',
            'g' => '9',
            'B' => '8',
            c => c,
        })
        .collect()
}

/// Extract the identity number from text.
pub fn extract_id_number(patterns: &PatternSet, text: &str) -> Option<String> {
    IdNumberExtractor::new(patterns).extract(text).map(|m| m.value)
}

/// Structural check: 17 digits followed by a digit or `X`/`x`.
///
/// The check digit itself is not verified; see [`validate_checksum`].
pub fn validate_id_number(id: &str) -> bool {
    let bytes = id.as_bytes();
    if bytes.len() != ID_LENGTH {
        return false;
    }

    bytes[..ID_LENGTH - 1].iter().all(u8::is_ascii_digit)
        && matches!(bytes[ID_LENGTH - 1], b'0'..=b'9' | b'X' | b'x')
}

/// Verify the MOD 11-2 check digit of a structurally valid number.
pub fn validate_checksum(id: &str) -> bool {
    if !validate_id_number(id) {
        return false;
    }

    let sum: u32 = id
        .chars()
        .take(ID_LENGTH - 1)
        .filter_map(|c| c.to_digit(10))
        .zip(CHECKSUM_WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();

    let expected = CHECKSUM_MAP[(sum % 11) as usize];
    id.chars()
        .last()
        .is_some_and(|c| c.to_ascii_uppercase() == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_strict() {
        let patterns = PatternSet::new();
        let text = "住址 北京市朝阳区 公民身份号码 110101199003077515 签发机关";
        assert_eq!(
            extract_id_number(&patterns, text),
            Some("110101199003077515".to_string())
        );
    }

    #[test]
    fn test_extract_across_spaces() {
        let patterns = PatternSet::new();
        let text = "公民身份号码 110101 19900307 7515";
        assert_eq!(
            extract_id_number(&patterns, text),
            Some("110101199003077515".to_string())
        );
    }

    #[test]
    fn test_extract_takes_first_match() {
        let patterns = PatternSet::new();
        let text = "110101199003077515 和 440524188001010014";
        let all = IdNumberExtractor::new(&patterns).extract_all(text);

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].value, "110101199003077515");
        assert_eq!(all[0].position, Some((0, 18)));
    }

    #[test]
    fn test_recover_confused_characters() {
        let patterns = PatternSet::new();

        assert_eq!(
            extract_id_number(&patterns, "公民身份号码 53o1o2l99go1o111oX"),
            Some("53010219990101110X".to_string())
        );
        assert_eq!(
            extract_id_number(&patterns, "公民身份号码 1l0101199003077s15"),
            Some("110101199003077515".to_string())
        );
    }

    #[test]
    fn test_recovered_match_has_lower_confidence() {
        let patterns = PatternSet::new();
        let found = IdNumberExtractor::new(&patterns)
            .extract("号码1l0101199003077s15")
            .unwrap();

        assert!(found.confidence < 0.9);
        assert_eq!(found.source, "1l0101199003077s15");
    }

    #[test]
    fn test_recover_prefers_window_with_most_digits() {
        let patterns = PatternSet::new();
        assert_eq!(
            extract_id_number(&patterns, "号码o1101011990030775l5"),
            Some("110101199003077515".to_string())
        );
    }

    #[test]
    fn test_trailing_noise_does_not_complete_short_number() {
        let patterns = PatternSet::new();
        assert_eq!(extract_id_number(&patterns, "公民身份号码 1101011990030775 SOS"), None);
        assert_eq!(extract_id_number(&patterns, "公民身份号码 1101011990030775SO"), None);
        assert_eq!(
            extract_id_number(&patterns, "号码 1101011990o307751x Oo"),
            Some("11010119900307751X".to_string())
        );
    }

    #[test]
    fn test_mostly_letters_is_not_a_number() {
        let patterns = PatternSet::new();
        assert_eq!(extract_id_number(&patterns, "ssssssssssoooooooollllll12"), None);
    }

    #[test]
    fn test_no_match() {
        let patterns = PatternSet::new();
        assert_eq!(extract_id_number(&patterns, ""), None);
        assert_eq!(extract_id_number(&patterns, "公民身份号码 11010119900307"), None);
    }

    #[test]
    fn test_check_digit_case() {
        let patterns = PatternSet::new();
        let text = "11010519491231002x";

        assert_eq!(
            extract_id_number(&patterns, text),
            Some("11010519491231002X".to_string())
        );
        assert_eq!(
            IdNumberExtractor::new(&patterns)
                .with_uppercase_check_digit(false)
                .extract(text)
                .map(|m| m.value),
            Some("11010519491231002x".to_string())
        );
    }

    #[test]
    fn test_validate_id_number() {
        assert!(validate_id_number("110101199003077515"));
        assert!(validate_id_number("11010519491231002X"));
        assert!(validate_id_number("11010519491231002x"));
        assert!(!validate_id_number("11010119900307751"));
        assert!(!validate_id_number("1101011990030775155"));
        assert!(!validate_id_number("1101011990030775X5"));
        assert!(!validate_id_number("11010119900307751Y"));
        assert!(!validate_id_number(""));
    }

    #[test]
    fn test_validate_checksum() {
        assert!(validate_checksum("110101199003077512"));
        assert!(validate_checksum("11010519491231002X"));
        assert!(validate_checksum("11010519491231002x"));
        assert!(!validate_checksum("110101199003077515"));
        assert!(!validate_checksum("1101011990030775"));
    }

    #[test]
    fn test_correct_confusions() {
        assert_eq!(correct_confusions("l1o0s5g9B8I1O0S5X"), "1100559988110055X");
    }
}

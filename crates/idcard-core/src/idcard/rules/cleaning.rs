//! Per-field character cleanup and final status classification.

use crate::models::record::FieldStatus;

use super::patterns::{FieldKind, PatternSet};

/// CJK Unified Ideographs block.
pub fn is_han(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

fn keep_chars(value: &str, keep: impl Fn(char) -> bool) -> String {
    value.chars().filter(|c| keep(*c)).collect::<String>().trim().to_string()
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// First pass: drop characters that are noise for this kind of field.
pub fn clean_coarse(value: Option<&str>, kind: FieldKind) -> Option<String> {
    let value = value?;
    let cleaned = match kind {
        FieldKind::ValidityPeriod => keep_chars(value, |c| {
            is_han(c) || c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '-')
        }),
        FieldKind::Sex | FieldKind::BirthDate => value.trim().to_string(),
        _ => keep_chars(value, |c| is_han(c) || c.is_ascii_alphanumeric() || c == ' '),
    };
    non_empty(cleaned)
}

/// Second pass: field-specific canonical form.
pub fn post_process(value: Option<String>, kind: FieldKind) -> Option<String> {
    let value = value?;
    let processed = match kind {
        FieldKind::Name | FieldKind::Ethnicity | FieldKind::IssuingAuthority => {
            keep_chars(&value, is_han)
        }
        FieldKind::Address | FieldKind::ValidityPeriod => keep_chars(&value, |c| c != ' '),
        FieldKind::Sex | FieldKind::BirthDate => value.trim().to_string(),
    };
    non_empty(processed)
}

impl PatternSet {
    /// Final status of a cleaned value.
    pub fn classify(&self, value: Option<&str>, kind: FieldKind) -> FieldStatus {
        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ => return FieldStatus::NotFound,
        };

        let plausible = match kind {
            FieldKind::Name => value.chars().count() >= 2 && value.chars().all(is_han),
            FieldKind::Ethnicity | FieldKind::IssuingAuthority => value.chars().all(is_han),
            FieldKind::Address => value.chars().any(is_han),
            FieldKind::ValidityPeriod => self.validity_shape.is_match(value),
            FieldKind::BirthDate => self.birth_date_shape.is_match(value),
            FieldKind::Sex => matches!(value, "男" | "女"),
        };

        if plausible {
            FieldStatus::Success
        } else {
            FieldStatus::LowQuality
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clean(value: &str, kind: FieldKind) -> Option<String> {
        post_process(clean_coarse(Some(value), kind), kind)
    }

    #[test]
    fn test_han_only_fields() {
        assert_eq!(clean(" 张三abc1:", FieldKind::Name).as_deref(), Some("张三"));
        assert_eq!(clean("汉 ·", FieldKind::Ethnicity).as_deref(), Some("汉"));
        assert_eq!(
            clean("北京市公安局 A1", FieldKind::IssuingAuthority).as_deref(),
            Some("北京市公安局")
        );
    }

    #[test]
    fn test_address_cleanup() {
        assert_eq!(
            clean("北京市朝阳区\n建国路 1 号 A座,", FieldKind::Address).as_deref(),
            Some("北京市朝阳区建国路1号A座")
        );
    }

    #[test]
    fn test_validity_cleanup() {
        assert_eq!(
            clean("2010.03.07 - 2030.03.07。", FieldKind::ValidityPeriod).as_deref(),
            Some("2010.03.07-2030.03.07")
        );
        assert_eq!(
            clean("2015.01.01-长期", FieldKind::ValidityPeriod).as_deref(),
            Some("2015.01.01-长期")
        );
    }

    #[test]
    fn test_cleanup_of_noise_only_is_absent() {
        assert_eq!(clean("abc 123", FieldKind::Name), None);
        assert_eq!(clean("!!!", FieldKind::Address), None);
        assert_eq!(clean_coarse(None, FieldKind::Name), None);
        assert_eq!(post_process(None, FieldKind::Address), None);
    }

    #[test]
    fn test_classify_absent() {
        let patterns = PatternSet::new();
        assert_eq!(patterns.classify(None, FieldKind::Name), FieldStatus::NotFound);
        assert_eq!(patterns.classify(Some(""), FieldKind::Address), FieldStatus::NotFound);
    }

    #[test]
    fn test_classify_name() {
        let patterns = PatternSet::new();
        assert_eq!(patterns.classify(Some("张三"), FieldKind::Name), FieldStatus::Success);
        assert_eq!(patterns.classify(Some("张"), FieldKind::Name), FieldStatus::LowQuality);
        assert_eq!(patterns.classify(Some("张三A"), FieldKind::Name), FieldStatus::LowQuality);
    }

    #[test]
    fn test_classify_han_fields() {
        let patterns = PatternSet::new();
        assert_eq!(patterns.classify(Some("汉"), FieldKind::Ethnicity), FieldStatus::Success);
        assert_eq!(
            patterns.classify(Some("han"), FieldKind::Ethnicity),
            FieldStatus::LowQuality
        );
        assert_eq!(
            patterns.classify(Some("北京市公安局1"), FieldKind::IssuingAuthority),
            FieldStatus::LowQuality
        );
    }

    #[test]
    fn test_classify_address() {
        let patterns = PatternSet::new();
        assert_eq!(
            patterns.classify(Some("北京市朝阳区1号"), FieldKind::Address),
            FieldStatus::Success
        );
        assert_eq!(patterns.classify(Some("A12"), FieldKind::Address), FieldStatus::LowQuality);
    }

    #[test]
    fn test_classify_validity_period() {
        let patterns = PatternSet::new();
        let classify = |v| patterns.classify(Some(v), FieldKind::ValidityPeriod);

        assert_eq!(classify("2010.03.07-2030.03.07"), FieldStatus::Success);
        assert_eq!(classify("2015.01.01-长期"), FieldStatus::Success);
        assert_eq!(classify("2010.3.7-2030.3.7"), FieldStatus::LowQuality);
        assert_eq!(classify("20100307-20300307"), FieldStatus::LowQuality);
    }

    #[test]
    fn test_classify_birth_date() {
        let patterns = PatternSet::new();
        let classify = |v| patterns.classify(Some(v), FieldKind::BirthDate);

        assert_eq!(classify("1990年03月07日"), FieldStatus::Success);
        assert_eq!(classify("1990年3月7日"), FieldStatus::Success);
        assert_eq!(classify("1990-03-07"), FieldStatus::LowQuality);
    }

    #[test]
    fn test_classify_sex() {
        let patterns = PatternSet::new();
        assert_eq!(patterns.classify(Some("女"), FieldKind::Sex), FieldStatus::Success);
        assert_eq!(patterns.classify(Some("M"), FieldKind::Sex), FieldStatus::LowQuality);
    }
}

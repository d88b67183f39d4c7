//! Keyword-anchored field extraction.
//!
//! A card is a fixed sequence of labeled sections, so a value runs from
//! its label to whichever known label comes next. Using every keyword as a
//! stop anchor keeps extraction working when OCR drops or adds line breaks.

use tracing::trace;

use super::patterns::{FieldKind, PatternSet};

impl PatternSet {
    /// Extract an anchored field, trying each alias of `kind` in order.
    ///
    /// Returns `None` when no alias matches. A match may still be an empty
    /// string when the label is immediately followed by another label.
    pub fn extract_field(&self, text: &str, kind: FieldKind) -> Option<String> {
        let anchors = self.anchors.get(&kind)?;

        anchors.iter().find_map(|anchor| {
            let value = match kind {
                FieldKind::ValidityPeriod => anchor
                    .regex
                    .captures(text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str())?,
                _ => {
                    let m = anchor.regex.find(text)?;
                    self.until_next_keyword(&text[m.end()..])
                }
            };

            trace!("{:?} anchored on {:?}", kind, anchor.alias);
            Some(self.strip_trailing_keywords(value.trim()))
        })
    }

    /// The prefix of `rest` before the first known keyword.
    fn until_next_keyword<'t>(&self, rest: &'t str) -> &'t str {
        match self.stop_anchor.find(rest) {
            Some(stop) => &rest[..stop.start()],
            None => rest,
        }
    }

    /// Drop a keyword that bled into the end of a value.
    fn strip_trailing_keywords(&self, value: &str) -> String {
        self.keywords
            .iter()
            .fold(value.to_string(), |acc, keyword| match acc.strip_suffix(keyword) {
                Some(stripped) => stripped.trim().to_string(),
                None => acc,
            })
    }

    /// Sex (`男`/`女`) directly after the sex label.
    pub fn extract_direct_sex(&self, text: &str) -> Option<String> {
        self.direct_sex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// A `YYYY年M月D日` date directly after the birth label.
    pub fn extract_direct_birth_date(&self, text: &str) -> Option<String> {
        self.direct_birth_date
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CARD: &str = "姓名 张三 性别 男 民族 汉 出生 1990年03月07日 住址 北京市朝阳区 \
                        公民身份号码 110101199003077515 签发机关 北京市公安局 \
                        有效期限 2010.03.07-2030.03.07";

    fn extract(text: &str, kind: FieldKind) -> Option<String> {
        PatternSet::new().extract_field(text, kind)
    }

    #[test]
    fn test_extract_all_anchored_fields() {
        assert_eq!(extract(CARD, FieldKind::Name).as_deref(), Some("张三"));
        assert_eq!(extract(CARD, FieldKind::Ethnicity).as_deref(), Some("汉"));
        assert_eq!(extract(CARD, FieldKind::Address).as_deref(), Some("北京市朝阳区"));
        assert_eq!(
            extract(CARD, FieldKind::IssuingAuthority).as_deref(),
            Some("北京市公安局")
        );
        assert_eq!(
            extract(CARD, FieldKind::ValidityPeriod).as_deref(),
            Some("2010.03.07-2030.03.07")
        );
    }

    #[test]
    fn test_value_without_separators() {
        let text = "姓名张三性别男民族汉";
        assert_eq!(extract(text, FieldKind::Name).as_deref(), Some("张三"));
        assert_eq!(extract(text, FieldKind::Ethnicity).as_deref(), Some("汉"));
    }

    #[test]
    fn test_value_runs_to_end_of_text() {
        assert_eq!(
            extract("签发机关 北京市公安局朝阳分局", FieldKind::IssuingAuthority).as_deref(),
            Some("北京市公安局朝阳分局")
        );
    }

    #[test]
    fn test_address_keeps_embedded_line_breaks() {
        let text = "住址 北京市朝阳区\n建国路1号 公民身份号码 110101199003077515";
        assert_eq!(
            extract(text, FieldKind::Address).as_deref(),
            Some("北京市朝阳区\n建国路1号")
        );
    }

    #[test]
    fn test_alias_fallback() {
        assert_eq!(
            extract("发证机关 上海市公安局", FieldKind::IssuingAuthority).as_deref(),
            Some("上海市公安局")
        );
        assert_eq!(
            extract("有效期解 2015.01.01-长期", FieldKind::ValidityPeriod).as_deref(),
            Some("2015.01.01-长期")
        );
    }

    #[test]
    fn test_label_followed_by_label_is_empty() {
        assert_eq!(extract("姓名 性别 男", FieldKind::Name).as_deref(), Some(""));
    }

    #[test]
    fn test_missing_label() {
        assert_eq!(extract("性别 男", FieldKind::Name), None);
        assert_eq!(extract("", FieldKind::Address), None);
    }

    #[test]
    fn test_malformed_validity_period_not_matched() {
        assert_eq!(extract("有效期限 2010.3.7至2030.3.7", FieldKind::ValidityPeriod), None);
    }

    #[test]
    fn test_strip_trailing_keywords() {
        let patterns = PatternSet::new();
        assert_eq!(patterns.strip_trailing_keywords("北京市公安局 住址"), "北京市公安局");
        assert_eq!(patterns.strip_trailing_keywords("北京市"), "北京市");
    }

    #[test]
    fn test_direct_sex_and_birth_date() {
        let patterns = PatternSet::new();
        assert_eq!(patterns.extract_direct_sex(CARD).as_deref(), Some("男"));
        assert_eq!(patterns.extract_direct_sex("性別女").as_deref(), Some("女"));
        assert_eq!(patterns.extract_direct_sex("性别 未知"), None);

        assert_eq!(
            patterns.extract_direct_birth_date(CARD).as_deref(),
            Some("1990年03月07日")
        );
        assert_eq!(
            patterns.extract_direct_birth_date("出生日期 1985年7月1日").as_deref(),
            Some("1985年7月1日")
        );
        assert_eq!(patterns.extract_direct_birth_date("出生 1985.07.01"), None);
    }
}

//! Keyword tables and compiled patterns shared by every extraction stage.

use std::collections::HashMap;

use regex::Regex;

/// Name label.
pub const NAME: &str = "姓名";
/// Ethnicity label.
pub const ETHNICITY: &str = "民族";
/// Address label.
pub const ADDRESS: &str = "住址";
/// Citizen identity number label.
pub const ID_NUMBER: &str = "公民身份号码";
/// Issuing authority label.
pub const ISSUING_AUTHORITY: &str = "签发机关";
/// Validity period label.
pub const VALIDITY_PERIOD: &str = "有效期限";
/// Sex label.
pub const SEX: &str = "性别";
/// Birth label.
pub const BIRTH: &str = "出生";

/// Every canonical section label, in card order. Each one ends the value
/// of whichever field precedes it.
pub const ALL_KEYWORDS: [&str; 8] = [
    NAME,
    ETHNICITY,
    ADDRESS,
    ID_NUMBER,
    ISSUING_AUTHORITY,
    VALIDITY_PERIOD,
    SEX,
    BIRTH,
];

/// Frequent OCR misreads of section labels, applied in order.
///
/// No replacement contains any misread, so normalizing twice is the same
/// as normalizing once.
pub const KEYWORD_CORRECTIONS: [(&str, &str); 3] = [
    ("茶发机关", ISSUING_AUTHORITY),
    ("有效期解", VALIDITY_PERIOD),
    ("公民9编号编", ID_NUMBER),
];

const NAME_ALIASES: &[&str] = &["姓名", "姓名:"];
const ETHNICITY_ALIASES: &[&str] = &["民族", "民族:"];
const ADDRESS_ALIASES: &[&str] = &["住址", "住址:"];
const ISSUING_AUTHORITY_ALIASES: &[&str] = &["签发机关", "发证机关", "茶发机关"];
const VALIDITY_PERIOD_ALIASES: &[&str] = &["有效期限", "有效期解"];

/// Strict identity number: 17 digits and a digit or `X` check character.
const ID_STRICT: &str = r"[0-9]{17}[0-9Xx]";

/// Runs of characters an identity number may be made of once OCR
/// confusions are taken into account.
const ID_CONFUSABLE_RUN: &str = r"[0-9lIoOsSgBXx]{18,}";

const VALIDITY_DATES: &str = r"[0-9]{4}\.[0-9]{2}\.[0-9]{2}-(?:[0-9]{4}\.[0-9]{2}\.[0-9]{2}|长期)";

/// Kinds of field that go through cleaning and classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Name,
    Sex,
    Ethnicity,
    Address,
    IssuingAuthority,
    ValidityPeriod,
    BirthDate,
}

impl FieldKind {
    /// Fields located by keyword anchoring, in extraction order.
    pub const ANCHORED: [FieldKind; 5] = [
        FieldKind::Name,
        FieldKind::Ethnicity,
        FieldKind::Address,
        FieldKind::IssuingAuthority,
        FieldKind::ValidityPeriod,
    ];

    /// Keyword aliases tried in order; empty for fields that are not
    /// keyword anchored.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Name => NAME_ALIASES,
            Self::Ethnicity => ETHNICITY_ALIASES,
            Self::Address => ADDRESS_ALIASES,
            Self::IssuingAuthority => ISSUING_AUTHORITY_ALIASES,
            Self::ValidityPeriod => VALIDITY_PERIOD_ALIASES,
            Self::Sex | Self::BirthDate => &[],
        }
    }
}

/// A compiled keyword anchor for one alias.
#[derive(Debug)]
pub(crate) struct Anchor {
    pub(crate) alias: &'static str,
    pub(crate) regex: Regex,
}

/// Immutable keyword tables and compiled patterns.
///
/// Built once and shared read-only (typically behind an `Arc`) by any
/// number of concurrent parses.
#[derive(Debug)]
pub struct PatternSet {
    pub(crate) keywords: Vec<&'static str>,
    pub(crate) corrections: Vec<(&'static str, &'static str)>,
    pub(crate) anchors: HashMap<FieldKind, Vec<Anchor>>,
    pub(crate) stop_anchor: Regex,
    pub(crate) id_strict: Regex,
    pub(crate) id_confusable_run: Regex,
    pub(crate) direct_sex: Regex,
    pub(crate) direct_birth_date: Regex,
    pub(crate) validity_shape: Regex,
    pub(crate) birth_date_shape: Regex,
}

impl PatternSet {
    /// Compile the full pattern set.
    pub fn new() -> Self {
        let anchors = FieldKind::ANCHORED
            .into_iter()
            .map(|kind| {
                let compiled = kind
                    .aliases()
                    .iter()
                    .copied()
                    .map(|alias| Anchor {
                        alias,
                        regex: anchor_regex(alias, kind),
                    })
                    .collect();
                (kind, compiled)
            })
            .collect();

        let stop_anchor = ALL_KEYWORDS
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");

        Self {
            keywords: ALL_KEYWORDS.to_vec(),
            corrections: KEYWORD_CORRECTIONS.to_vec(),
            anchors,
            stop_anchor: compile(&stop_anchor),
            id_strict: compile(ID_STRICT),
            id_confusable_run: compile(ID_CONFUSABLE_RUN),
            direct_sex: compile(r"(?:性别|性別)\s*(男|女)"),
            direct_birth_date: compile(r"(?:出生|出生日期)\s*([0-9]{4}年[0-9]{1,2}月[0-9]{1,2}日)"),
            validity_shape: compile(&format!("^{VALIDITY_DATES}$")),
            birth_date_shape: compile(r"^[0-9]{4}年[0-9]{1,2}月[0-9]{1,2}日$"),
        }
    }

    /// All canonical keywords.
    pub fn keywords(&self) -> &[&'static str] {
        &self.keywords
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}

fn anchor_regex(alias: &str, kind: FieldKind) -> Regex {
    let escaped = regex::escape(alias);
    match kind {
        FieldKind::ValidityPeriod => compile(&format!(r"{escaped}\s*({VALIDITY_DATES})")),
        _ => compile(&format!(r"{escaped}\s*")),
    }
}

// Every pattern is a constant or built from escaped constants.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

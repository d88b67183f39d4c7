//! Sex, birth date and age derived from identity number digits.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Sex encoded by the parity of the 17th identity number digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Odd is male, even is female.
    pub fn from_parity_digit(digit: u32) -> Self {
        if digit % 2 == 0 { Self::Female } else { Self::Male }
    }

    /// The label printed on the card.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "男",
            Self::Female => "女",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Birth date as encoded at offsets 6..14.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BirthParts<'a> {
    year: &'a str,
    month: &'a str,
    day: &'a str,
}

impl BirthParts<'_> {
    fn month(&self) -> u32 {
        self.month.parse().unwrap_or(0)
    }

    fn day(&self) -> u32 {
        self.day.parse().unwrap_or(0)
    }

    fn format(&self) -> String {
        format!("{}年{}月{}日", self.year, self.month, self.day)
    }
}

/// Fields computed from a valid identity number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedFields {
    /// `YYYY年MM月DD日`, absent if month or day is out of range.
    pub birth_date: Option<String>,
    pub sex: Option<Sex>,
    /// Whole years on the reference date, absent without a birth date.
    pub age: Option<i32>,
}

impl DerivedFields {
    /// Derive fields from `id`, computing age as of `today`.
    pub fn from_id_number(id: &str, today: NaiveDate) -> Self {
        let birth = birth_parts(id);

        Self {
            birth_date: birth.as_ref().map(BirthParts::format),
            sex: sex_from_id(id),
            age: birth.as_ref().and_then(|b| age_on(b, today)),
        }
    }
}

fn birth_parts(id: &str) -> Option<BirthParts<'_>> {
    let segment = id.get(6..14)?;
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let parts = BirthParts {
        year: &segment[0..4],
        month: &segment[4..6],
        day: &segment[6..8],
    };

    let valid = (1..=12).contains(&parts.month()) && (1..=31).contains(&parts.day());
    valid.then_some(parts)
}

/// Sex from the digit at offset 16; absent if that is not a digit.
pub fn sex_from_id(id: &str) -> Option<Sex> {
    id.chars()
        .nth(16)
        .and_then(|c| c.to_digit(10))
        .map(Sex::from_parity_digit)
}

fn age_on(birth: &BirthParts<'_>, today: NaiveDate) -> Option<i32> {
    let year: i32 = birth.year.parse().ok()?;
    let mut age = today.year() - year;

    // Birthday not reached yet this year
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }

    (age >= 0).then_some(age)
}

/// Convert `YYYY年M月D日` to `YYYY-MM-DD` when it names a real date.
pub fn birth_date_iso(text: &str) -> Option<String> {
    let rest = text.trim().strip_suffix('日')?;
    let (year, rest) = rest.split_once('年')?;
    let (month, day) = rest.split_once('月')?;

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
        .map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sex_from_parity() {
        assert_eq!(sex_from_id("110101199003077515"), Some(Sex::Male));
        assert_eq!(sex_from_id("110101199003077526"), Some(Sex::Female));
        assert_eq!(sex_from_id("1101011990030775X5"), None);
        assert_eq!(sex_from_id("1101"), None);
    }

    #[test]
    fn test_derive_birth_date() {
        let derived = DerivedFields::from_id_number("110101199003077515", date(2026, 10, 19));
        assert_eq!(derived.birth_date.as_deref(), Some("1990年03月07日"));
        assert_eq!(derived.sex, Some(Sex::Male));
        assert_eq!(derived.age, Some(36));
    }

    #[test]
    fn test_age_birthday_boundary() {
        let id = "110101199003077515";
        assert_eq!(DerivedFields::from_id_number(id, date(2026, 3, 6)).age, Some(35));
        assert_eq!(DerivedFields::from_id_number(id, date(2026, 3, 7)).age, Some(36));
        assert_eq!(DerivedFields::from_id_number(id, date(2026, 1, 1)).age, Some(35));
        assert_eq!(DerivedFields::from_id_number(id, date(2026, 12, 31)).age, Some(36));
    }

    #[test]
    fn test_leap_day_birthday() {
        let id = "110101200002290013";
        assert_eq!(DerivedFields::from_id_number(id, date(2023, 2, 28)).age, Some(22));
        assert_eq!(DerivedFields::from_id_number(id, date(2023, 3, 1)).age, Some(23));
    }

    #[test]
    fn test_out_of_range_month_or_day() {
        let derived = DerivedFields::from_id_number("110101199013077515", date(2026, 1, 1));
        assert_eq!(derived.birth_date, None);
        assert_eq!(derived.age, None);
        assert_eq!(derived.sex, Some(Sex::Male));

        let derived = DerivedFields::from_id_number("110101199003327526", date(2026, 1, 1));
        assert_eq!(derived.birth_date, None);
        assert_eq!(derived.sex, Some(Sex::Female));
    }

    #[test]
    fn test_future_birth_has_no_age() {
        let derived = DerivedFields::from_id_number("110101209903077515", date(2026, 1, 1));
        assert_eq!(derived.birth_date.as_deref(), Some("2099年03月07日"));
        assert_eq!(derived.age, None);
    }

    #[test]
    fn test_birth_date_iso() {
        assert_eq!(birth_date_iso("1990年03月07日").as_deref(), Some("1990-03-07"));
        assert_eq!(birth_date_iso("1990年3月7日").as_deref(), Some("1990-03-07"));
        assert_eq!(birth_date_iso("1990年02月30日"), None);
        assert_eq!(birth_date_iso("1990-03-07"), None);
    }
}

//! `YYYY-MM` month value used by loading and product requirement rows.
//!
//! Parsing here accepts exactly what the `monthyear` CHECK constraint accepts,
//! so callers can reject bad input before it reaches the database.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonthYearError {
    #[error("'{0}' is not in YYYY-MM format")]
    Format(String),

    #[error("year {0} is outside {min}..={max}", min = MonthYear::MIN_YEAR, max = MonthYear::MAX_YEAR)]
    YearOutOfRange(u16),

    #[error("month {0} is outside 1..=12")]
    MonthOutOfRange(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    year: u16,
    month: u8,
}

impl MonthYear {
    pub const MIN_YEAR: u16 = 2000;
    pub const MAX_YEAR: u16 = 2100;

    pub fn new(year: u16, month: u8) -> Result<Self, MonthYearError> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return Err(MonthYearError::YearOutOfRange(year));
        }
        if !(1..=12).contains(&month) {
            return Err(MonthYearError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    /// The following month, or `None` past December 2100
    pub fn succ(&self) -> Option<Self> {
        if self.month == 12 {
            Self::new(self.year + 1, 1).ok()
        } else {
            Self::new(self.year, self.month + 1).ok()
        }
    }

    /// January through December of `year`
    pub fn months_of_year(year: u16) -> Result<Vec<Self>, MonthYearError> {
        (1..=12).map(|m| Self::new(year, m)).collect()
    }

    /// Inclusive range `from..=to`; empty when `from > to`
    pub fn range(from: Self, to: Self) -> Vec<Self> {
        let mut months = Vec::new();
        let mut current = Some(from);
        while let Some(m) = current {
            if m > to {
                break;
            }
            months.push(m);
            current = m.succ();
        }
        months
    }
}

impl FromStr for MonthYear {
    type Err = MonthYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !shape_ok {
            return Err(MonthYearError::Format(s.to_string()));
        }

        // Shape was checked above, so both halves are plain digits
        let year: u16 = s[..4]
            .parse()
            .map_err(|_| MonthYearError::Format(s.to_string()))?;
        let month: u8 = s[5..]
            .parse()
            .map_err(|_| MonthYearError::Format(s.to_string()))?;

        Self::new(year, month)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2025-01", 2025, 1)]
    #[case("2000-12", 2000, 12)]
    #[case("2100-06", 2100, 6)]
    fn test_parse_valid(#[case] input: &str, #[case] year: u16, #[case] month: u8) {
        let m: MonthYear = input.parse().unwrap();
        assert_eq!((m.year(), m.month()), (year, month));
        assert_eq!(m.to_string(), input);
    }

    #[rstest]
    #[case("2025-13")]
    #[case("2025-00")]
    #[case("1999-12")]
    #[case("2101-01")]
    #[case("2025-1")]
    #[case("2025/01")]
    #[case("2025-1a")]
    #[case(" 2025-01")]
    #[case("")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(input.parse::<MonthYear>().is_err(), "{input:?} should be rejected");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            "2025-13".parse::<MonthYear>(),
            Err(MonthYearError::MonthOutOfRange(13))
        );
        assert_eq!(
            "1999-01".parse::<MonthYear>(),
            Err(MonthYearError::YearOutOfRange(1999))
        );
    }

    #[test]
    fn test_succ_rolls_over_year() {
        let dec = MonthYear::new(2024, 12).unwrap();
        assert_eq!(dec.succ(), Some(MonthYear::new(2025, 1).unwrap()));
        assert_eq!(MonthYear::new(2100, 12).unwrap().succ(), None);
    }

    #[test]
    fn test_range() {
        let from: MonthYear = "2024-11".parse().unwrap();
        let to: MonthYear = "2025-02".parse().unwrap();
        let labels: Vec<String> = MonthYear::range(from, to).iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);
        assert!(MonthYear::range(to, from).is_empty());
    }

    #[test]
    fn test_months_of_year() {
        let months = MonthYear::months_of_year(2025).unwrap();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].to_string(), "2025-01");
        assert_eq!(months[11].to_string(), "2025-12");
    }

    #[test]
    fn test_serde_as_string() {
        let m: MonthYear = "2025-03".parse().unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"2025-03\"");
        let back: MonthYear = serde_json::from_str("\"2025-03\"").unwrap();
        assert_eq!(back, m);
        assert!(serde_json::from_str::<MonthYear>("\"2025-13\"").is_err());
    }
}

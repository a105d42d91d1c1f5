/// Permissive scan for a date buried somewhere inside a title
use chrono::NaiveDate;
use regex::{Captures, Regex};
use tracing::debug;

const MONTH_NAMES: &str = concat!(
    "january|february|march|april|may|june|july|august|september|october|november|december|",
    "jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec",
);

/// Field order of a recognised date shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// 2019-03-14, 2019/03/14, 2019.03.14
    YearMonthDay,
    /// 3/14/2019, 03-14-19, 3.14.2019
    MonthDayYear,
    /// March 14, 2019 / Mar 14th 2019
    MonthNameDayYear,
    /// 14 March 2019 / 14th of March, 2019
    DayMonthNameYear,
}

/// A date found by the scanner together with where it was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub date: NaiveDate,
    pub start: usize,
    pub len: usize,
}

/// Regex-backed scanner for the date shapes that show up in video titles.
///
/// Only complete dates (day, month and year) are accepted. A candidate that
/// does not form a real calendar date is skipped and the scan carries on.
#[derive(Debug, Clone)]
pub struct FuzzyScanner {
    patterns: Vec<(Regex, Shape)>,
}

impl FuzzyScanner {
    pub fn new() -> Self {
        let sources = [
            (r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\b".to_string(), Shape::YearMonthDay),
            (r"\b(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})\b".to_string(), Shape::MonthDayYear),
            (
                format!(r"(?i)\b({MONTH_NAMES})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"),
                Shape::MonthNameDayYear,
            ),
            (
                format!(
                    r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({})\.?,?\s+(\d{{4}})\b",
                    MONTH_NAMES
                ),
                Shape::DayMonthNameYear,
            ),
        ];

        let patterns = sources
            .into_iter()
            .filter_map(|(source, shape)| match Regex::new(&source) {
                Ok(re) => Some((re, shape)),
                Err(e) => {
                    debug!("Skipping date pattern {:?}: {}", shape, e);
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    /// Leftmost valid date in `text`; on a tie the longer match wins
    pub fn scan(&self, text: &str) -> Option<FuzzyMatch> {
        self.patterns
            .iter()
            .filter_map(|(re, shape)| {
                re.captures_iter(text).find_map(|caps| {
                    let whole = caps.get(0)?;
                    let date = build_date(&caps, *shape)?;
                    Some(FuzzyMatch {
                        date,
                        start: whole.start(),
                        len: whole.len(),
                    })
                })
            })
            .min_by_key(|m| (m.start, std::cmp::Reverse(m.len)))
    }
}

impl Default for FuzzyScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn build_date(caps: &Captures<'_>, shape: Shape) -> Option<NaiveDate> {
    let text = |i: usize| caps.get(i).map(|m| m.as_str());
    let number = |i: usize| text(i).and_then(|s| s.parse::<u32>().ok());

    let (year, month, day) = match shape {
        Shape::YearMonthDay => (text(1)?.parse::<i32>().ok()?, number(2)?, number(3)?),
        Shape::MonthDayYear => (expand_year(text(3)?)?, number(1)?, number(2)?),
        Shape::MonthNameDayYear => (
            text(3)?.parse::<i32>().ok()?,
            month_from_name(text(1)?)?,
            number(2)?,
        ),
        Shape::DayMonthNameYear => (
            text(3)?.parse::<i32>().ok()?,
            month_from_name(text(2)?)?,
            number(1)?,
        ),
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Two-digit years pivot at 70: `19` is 2019, `85` is 1985
fn expand_year(raw: &str) -> Option<i32> {
    let year = raw.parse::<i32>().ok()?;
    match raw.len() {
        2 if year < 70 => Some(2000 + year),
        2 => Some(1900 + year),
        _ => Some(year),
    }
}

/// Month number from an English month name or its abbreviation
pub fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scan(text: &str) -> Option<NaiveDate> {
        FuzzyScanner::new().scan(text).map(|m| m.date)
    }

    #[test]
    fn test_numeric_us_date() {
        assert_eq!(scan("Road Trip - 03/14/2019"), Some(ymd(2019, 3, 14)));
        assert_eq!(scan("Vlog 7-4-21 fireworks"), Some(ymd(2021, 7, 4)));
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(scan("Daily vlog 2018-10-31 Halloween"), Some(ymd(2018, 10, 31)));
    }

    #[test]
    fn test_month_name_forms() {
        assert_eq!(scan("Exploring Abandoned Mall - March 14, 2019"), Some(ymd(2019, 3, 14)));
        assert_eq!(scan("Disney day (Sept 3rd 2016)"), Some(ymd(2016, 9, 3)));
        assert_eq!(scan("Back on the road 4th of July, 2020"), Some(ymd(2020, 7, 4)));
        assert_eq!(scan("we went out 12 dec. 2015"), Some(ymd(2015, 12, 12)));
    }

    #[test]
    fn test_invalid_candidate_is_skipped() {
        assert_eq!(scan("Bad stamp 2/30/2020 then March 1, 2020"), Some(ymd(2020, 3, 1)));
        assert_eq!(scan("Bad stamp 2/30/2020 only"), None);
    }

    #[test]
    fn test_leftmost_date_wins() {
        assert_eq!(scan("January 2, 2017 recap of 12/25/2016"), Some(ymd(2017, 1, 2)));
    }

    #[test]
    fn test_incomplete_dates_are_ignored() {
        assert_eq!(scan("Best of 2019"), None);
        assert_eq!(scan("March 14 at the beach"), None);
        assert_eq!(scan("Just a fun day!"), None);
        assert_eq!(scan("version 1.2.3 release"), None);
    }

    #[test]
    fn test_month_from_name() {
        assert_eq!(month_from_name("March"), Some(3));
        assert_eq!(month_from_name("SEPT"), Some(9));
        assert_eq!(month_from_name("foo"), None);
    }
}

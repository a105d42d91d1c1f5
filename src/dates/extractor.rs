/// Recording-date extraction from video titles
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fuzzy::FuzzyScanner;
use crate::config::DateParsingConfig;

/// One step of the extraction chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateStrategy {
    /// Parse the whole title with a strftime pattern such as `%m/%d/%Y`
    Strict(String),
    /// Accept the first complete date found anywhere in the title
    Fuzzy,
}

impl DateStrategy {
    /// Apply this strategy to a title. Failure is `None`, never an error.
    pub fn apply(&self, title: &str, scanner: &FuzzyScanner) -> Option<NaiveDate> {
        match self {
            DateStrategy::Strict(pattern) => {
                let title = title.trim();
                NaiveDate::parse_from_str(title, pattern)
                    .ok()
                    .filter(|date| full_year_field(pattern, title, *date))
            }
            DateStrategy::Fuzzy => scanner.scan(title).map(|m| m.date),
        }
    }
}

/// chrono's `%Y` also takes 1-3 digit years, so `03/14/19` would parse as
/// year 19. A `%Y` field only counts when the title spells out four digits.
fn full_year_field(pattern: &str, title: &str, date: NaiveDate) -> bool {
    !pattern.contains("%Y") || title.contains(&format!("{:04}", date.year()))
}

/// A successful extraction and the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<'a> {
    pub date: NaiveDate,
    pub strategy: &'a DateStrategy,
}

/// Ordered strict-then-fuzzy chain; the first strategy that yields a date wins
#[derive(Debug, Clone)]
pub struct DateExtractor {
    strategies: Vec<DateStrategy>,
    scanner: FuzzyScanner,
}

impl DateExtractor {
    /// Build the chain from strict patterns (tried in order) and the fuzzy flag
    pub fn new<I, S>(patterns: I, fuzzy_enabled: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut strategies: Vec<DateStrategy> = patterns
            .into_iter()
            .map(|p| DateStrategy::Strict(p.into()))
            .collect();

        if fuzzy_enabled {
            strategies.push(DateStrategy::Fuzzy);
        }

        Self {
            strategies,
            scanner: FuzzyScanner::new(),
        }
    }

    pub fn from_config(config: &DateParsingConfig) -> Self {
        Self::new(config.title_patterns.iter().cloned(), config.fuzzy_matching)
    }

    pub fn strategies(&self) -> &[DateStrategy] {
        &self.strategies
    }

    pub fn extract(&self, title: &str) -> Option<NaiveDate> {
        self.extract_with_strategy(title).map(|e| e.date)
    }

    pub fn extract_with_strategy(&self, title: &str) -> Option<Extraction<'_>> {
        let found = self.strategies.iter().find_map(|strategy| {
            strategy
                .apply(title, &self.scanner)
                .map(|date| Extraction { date, strategy })
        });

        match &found {
            Some(e) => debug!("Dated {:?} as {} via {:?}", title, e.date, e.strategy),
            None => debug!("No date found in title {:?}", title),
        }

        found
    }
}

/// One-shot form of [`DateExtractor::extract`]
pub fn extract(title: &str, patterns: &[String], fuzzy_enabled: bool) -> Option<NaiveDate> {
    DateExtractor::new(patterns.iter().cloned(), fuzzy_enabled).extract(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_strict_pattern_covers_whole_title() {
        let patterns = vec!["Road Trip - %m/%d/%Y".to_string()];
        assert_eq!(extract("Road Trip - 03/14/2019", &patterns, false), Some(ymd(2019, 3, 14)));
    }

    #[test]
    fn test_strict_pattern_does_not_match_substring() {
        let patterns = vec!["%m/%d/%Y".to_string()];
        assert_eq!(extract("Road Trip - 03/14/2019", &patterns, false), None);
    }

    #[test]
    fn test_fuzzy_recovers_embedded_date() {
        let patterns = vec!["%m/%d/%Y".to_string()];
        assert_eq!(extract("Road Trip - 03/14/2019", &patterns, true), Some(ymd(2019, 3, 14)));
    }

    #[test]
    fn test_unparseable_title_is_absent() {
        let patterns = vec!["%m/%d/%Y".to_string(), "%B %d, %Y".to_string()];
        assert_eq!(extract("Just a fun day!", &patterns, false), None);
        assert_eq!(extract("Just a fun day!", &patterns, true), None);
    }

    #[test]
    fn test_first_strict_pattern_wins() {
        // 01/02/2020 reads differently under each pattern
        let extractor = DateExtractor::new(["%d/%m/%Y", "%m/%d/%Y"], false);
        let extraction = extractor.extract_with_strategy("01/02/2020").unwrap();
        assert_eq!(extraction.date, ymd(2020, 2, 1));
        assert_eq!(extraction.strategy, &DateStrategy::Strict("%d/%m/%Y".to_string()));
    }

    #[test]
    fn test_strict_runs_before_fuzzy() {
        let extractor = DateExtractor::new(["%d.%m.%Y"], true);
        let extraction = extractor.extract_with_strategy("04.01.2020").unwrap();
        assert_eq!(extraction.date, ymd(2020, 1, 4));
        assert!(matches!(extraction.strategy, DateStrategy::Strict(_)));

        let extraction = extractor.extract_with_strategy("Vlog 04.01.2020").unwrap();
        assert_eq!(extraction.date, ymd(2020, 4, 1));
        assert_eq!(extraction.strategy, &DateStrategy::Fuzzy);
    }

    #[test]
    fn test_two_digit_year_skips_four_digit_pattern() {
        let extractor = DateExtractor::new(["%m/%d/%Y", "%m/%d/%y"], false);
        let extraction = extractor.extract_with_strategy("03/14/19").unwrap();
        assert_eq!(extraction.date, ymd(2019, 3, 14));
        assert_eq!(extraction.strategy, &DateStrategy::Strict("%m/%d/%y".to_string()));

        assert_eq!(extract("03/14/2019", &["%m/%d/%Y".to_string()], false), Some(ymd(2019, 3, 14)));
        assert_eq!(extract("03/14/19", &["%m/%d/%Y".to_string()], false), None);
    }

    #[test]
    fn test_default_chain_reads_two_digit_year() {
        let patterns = crate::config::Config::default().date_parsing.title_patterns;
        assert_eq!(extract("03/14/19", &patterns, true), Some(ymd(2019, 3, 14)));
        assert_eq!(extract("3/4/2019", &patterns, true), Some(ymd(2019, 3, 4)));
    }

    #[test]
    fn test_garbage_pattern_never_panics() {
        let extractor = DateExtractor::new(["%Q%%%", ""], false);
        assert_eq!(extractor.extract("12/25/2019"), None);
    }

    #[test]
    fn test_chain_order() {
        let extractor = DateExtractor::new(["%Y-%m-%d"], true);
        assert_eq!(
            extractor.strategies(),
            &[DateStrategy::Strict("%Y-%m-%d".to_string()), DateStrategy::Fuzzy]
        );
    }
}

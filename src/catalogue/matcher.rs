/// "On this day" lookup across every recorded year
use super::{Catalogue, VideoRecord};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar day without a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// `None` unless month is 1..=12 and day is 1..=31
    pub fn new(month: u32, day: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (1..=31).contains(&day) {
            Some(Self { month, day })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Parses `MM-DD` (or `M/D`)
impl FromStr for MonthDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, day) = s
            .split_once(|c: char| c == '-' || c == '/')
            .ok_or_else(|| format!("expected MM-DD, got {:?}", s))?;

        let month: u32 = month.trim().parse().map_err(|_| format!("bad month in {:?}", s))?;
        let day: u32 = day.trim().parse().map_err(|_| format!("bad day in {:?}", s))?;

        MonthDay::new(month, day).ok_or_else(|| format!("{:?} is not a calendar day", s))
    }
}

/// Every video recorded on `month`/`day` in any year, oldest first.
///
/// Equality is literal, so Feb 29 only matches Feb 29. Records without a
/// parseable recording date never match. Videos sharing the same date keep
/// catalogue order.
pub fn videos_for_date(catalogue: &Catalogue, month: u32, day: u32) -> Vec<&VideoRecord> {
    let mut matching: Vec<(NaiveDate, &VideoRecord)> = catalogue
        .videos
        .iter()
        .filter_map(|video| video.recording_date().map(|date| (date, video)))
        .filter(|(date, _)| date.month() == month && date.day() == day)
        .collect();

    matching.sort_by_key(|(date, _)| *date);
    matching.into_iter().map(|(_, video)| video).collect()
}

pub fn videos_on(catalogue: &Catalogue, query: MonthDay) -> Vec<&VideoRecord> {
    videos_for_date(catalogue, query.month(), query.day())
}

/// What a downstream renderer needs per matched video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayMatch<'a> {
    pub year: i32,
    pub title: &'a str,
    pub url: &'a str,
    pub video_id: &'a str,
}

/// [`videos_on`] projected to renderer views
pub fn day_matches(catalogue: &Catalogue, query: MonthDay) -> Vec<DayMatch<'_>> {
    videos_on(catalogue, query)
        .into_iter()
        .filter_map(|video| {
            Some(DayMatch {
                year: video.year()?,
                title: &video.title,
                url: &video.url,
                video_id: &video.video_id,
            })
        })
        .collect()
}

/// The caller's "today", used as the match query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Today {
    pub date: NaiveDate,
    pub query: MonthDay,
}

impl Today {
    /// Current date in the given zone
    pub fn in_zone(tz: Tz) -> Self {
        Self::at(Utc::now().with_timezone(&tz).date_naive())
    }

    pub fn at(date: NaiveDate) -> Self {
        Self {
            date,
            query: MonthDay::of(date),
        }
    }

    /// `query` placed in `year`, or in a leap year when `year` has no Feb 29.
    /// `None` for days no month has, such as 04-31.
    pub fn on(query: MonthDay, year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, query.month(), query.day())
            .or_else(|| NaiveDate::from_ymd_opt(2000, query.month(), query.day()))
            .map(|date| Self { date, query })
    }

    /// Full month name, e.g. `January`
    pub fn month_name(&self) -> String {
        self.date.format("%B").to_string()
    }

    /// Zero-padded day, e.g. `04`
    pub fn day_label(&self) -> String {
        self.date.format("%d").to_string()
    }

    /// e.g. `January 04`
    pub fn label(&self) -> String {
        self.date.format("%B %d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::ChannelInfo;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn catalogue(entries: &[(&str, Option<&str>)]) -> Catalogue {
        let records = entries.iter().map(|(id, recorded)| {
            let mut record = VideoRecord::new(*id, format!("video {}", id), ymd(2023, 6, 1), None);
            record.recording_date = recorded.map(str::to_string);
            record
        });
        Catalogue::from_records(ChannelInfo::placeholder("Chan", "@chan"), records).0
    }

    fn ids<'a>(videos: &[&'a VideoRecord]) -> Vec<&'a str> {
        videos.iter().map(|v| v.video_id.as_str()).collect()
    }

    #[test]
    fn test_matches_across_years_oldest_first() {
        let catalogue = catalogue(&[
            ("late", Some("2022-01-04")),
            ("other", Some("2021-01-05")),
            ("early", Some("2020-01-04")),
        ]);

        assert_eq!(ids(&videos_for_date(&catalogue, 1, 4)), vec!["early", "late"]);
    }

    #[test]
    fn test_same_date_keeps_catalogue_order() {
        let catalogue = catalogue(&[
            ("second-2019", Some("2019-08-10")),
            ("first-2018", Some("2018-08-10")),
            ("third-2019", Some("2019-08-10")),
        ]);

        assert_eq!(
            ids(&videos_for_date(&catalogue, 8, 10)),
            vec!["first-2018", "second-2019", "third-2019"]
        );
    }

    #[test]
    fn test_leap_day_is_literal() {
        let catalogue = catalogue(&[
            ("feb28", Some("2019-02-28")),
            ("leap", Some("2020-02-29")),
            ("mar1", Some("2021-03-01")),
        ]);

        assert_eq!(ids(&videos_for_date(&catalogue, 2, 29)), vec!["leap"]);
        assert_eq!(ids(&videos_for_date(&catalogue, 2, 28)), vec!["feb28"]);
    }

    #[test]
    fn test_undated_and_malformed_never_match() {
        let catalogue = catalogue(&[
            ("undated", None),
            ("garbage", Some("not a date")),
            ("bad-month", Some("2020-13-04")),
            ("good", Some("2020-03-04")),
        ]);

        assert_eq!(ids(&videos_for_date(&catalogue, 3, 4)), vec!["good"]);
    }

    #[test]
    fn test_out_of_range_query_is_empty() {
        let catalogue = catalogue(&[("good", Some("2020-03-04"))]);
        assert!(videos_for_date(&catalogue, 13, 4).is_empty());
        assert!(videos_for_date(&catalogue, 0, 0).is_empty());
    }

    #[test]
    fn test_day_matches_expose_year() {
        let catalogue = catalogue(&[("a", Some("2016-12-25")), ("b", Some("2014-12-25"))]);
        let matches = day_matches(&catalogue, MonthDay::new(12, 25).unwrap());

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].year, 2014);
        assert_eq!(matches[0].title, "video b");
        assert_eq!(matches[0].url, "https://www.youtube.com/watch?v=b");
        assert_eq!(matches[1].year, 2016);
    }

    #[test]
    fn test_month_day_parse() {
        assert_eq!("01-04".parse::<MonthDay>().unwrap(), MonthDay::new(1, 4).unwrap());
        assert_eq!("2/29".parse::<MonthDay>().unwrap(), MonthDay::new(2, 29).unwrap());
        assert!("13-01".parse::<MonthDay>().is_err());
        assert!("0104".parse::<MonthDay>().is_err());
        assert_eq!(MonthDay::new(7, 4).unwrap().to_string(), "07-04");
    }

    #[test]
    fn test_today_labels() {
        let today = Today::at(ymd(2024, 1, 4));
        assert_eq!(today.query, MonthDay::new(1, 4).unwrap());
        assert_eq!(today.month_name(), "January");
        assert_eq!(today.day_label(), "04");
        assert_eq!(today.label(), "January 04");
    }

    #[test]
    fn test_today_on_month_day() {
        let leap = Today::on(MonthDay::new(2, 29).unwrap(), 2023).unwrap();
        assert_eq!(leap.query, MonthDay::new(2, 29).unwrap());
        assert_eq!(leap.label(), "February 29");

        assert_eq!(Today::on(MonthDay::new(7, 4).unwrap(), 2023).unwrap().date, ymd(2023, 7, 4));
        assert!(Today::on(MonthDay::new(4, 31).unwrap(), 2023).is_none());
    }

    #[test]
    fn test_today_in_zone_is_a_real_day() {
        let today = Today::in_zone(chrono_tz::Pacific::Kiritimati);
        assert_eq!(MonthDay::of(today.date), today.query);
    }
}

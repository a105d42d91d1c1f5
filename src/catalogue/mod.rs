/// Video catalogue: records, channel metadata, persistence and day matching
///
/// The catalogue is owned by whoever loaded it for the current run; nothing
/// holds on to records across runs.

pub mod matcher;
pub mod store;

pub use matcher::{day_matches, videos_for_date, videos_on, DayMatch, MonthDay, Today};
pub use store::{CatalogueError, CatalogueStore};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Date format used for every date stored in the catalogue
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoRecord {
    /// Stable id, unique within the catalogue
    pub video_id: String,

    /// Display title, often carrying the recording date
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Day the video went public
    pub upload_date: NaiveDate,

    /// Day the footage was taken, as stored (`YYYY-MM-DD`). Kept as text so a
    /// malformed hand edit survives a load and simply never matches.
    #[serde(default)]
    pub recording_date: Option<String>,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub thumbnail: String,
}

impl VideoRecord {
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        upload_date: NaiveDate,
        recording_date: Option<NaiveDate>,
    ) -> Self {
        let video_id = video_id.into();
        Self {
            url: watch_url(&video_id),
            video_id,
            title: title.into(),
            description: String::new(),
            upload_date,
            recording_date: recording_date.map(|d| d.format(DATE_FORMAT).to_string()),
            thumbnail: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = thumbnail.into();
        self
    }

    /// Parsed recording date; `None` when absent or malformed
    pub fn recording_date(&self) -> Option<NaiveDate> {
        self.recording_date.as_deref().and_then(parse_stored_date)
    }

    /// Year the footage was taken
    pub fn year(&self) -> Option<i32> {
        self.recording_date().map(|d| d.year())
    }
}

/// Accepts `YYYY-MM-DD`, or an ISO date-time whose date part is used
pub fn parse_stored_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| raw.parse::<NaiveDateTime>().ok().map(|dt| dt.date()))
}

/// Public watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Identifying metadata for the catalogued channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelInfo {
    #[serde(default)]
    pub channel_id: String,

    pub channel_name: String,

    pub channel_handle: String,

    /// Playlist holding every upload of the channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploads_playlist_id: Option<String>,

    #[serde(default)]
    pub total_videos: usize,

    /// Stamped on every save
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ChannelInfo {
    /// Channel info for a catalogue that has never been fetched
    pub fn placeholder(name: &str, handle: &str) -> Self {
        Self {
            channel_id: String::new(),
            channel_name: name.to_string(),
            channel_handle: handle.to_string(),
            uploads_playlist_id: None,
            total_videos: 0,
            last_updated: None,
        }
    }
}

/// Everything persisted for one channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Catalogue {
    pub channel_info: ChannelInfo,

    /// Source pagination order, not chronological
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
}

impl Catalogue {
    pub fn empty(channel_info: ChannelInfo) -> Self {
        Self {
            channel_info,
            videos: Vec::new(),
        }
    }

    /// Build a catalogue keeping the first occurrence of each video id.
    /// Returns the catalogue and the ids that were dropped as duplicates.
    pub fn from_records(
        mut channel_info: ChannelInfo,
        records: impl IntoIterator<Item = VideoRecord>,
    ) -> (Self, Vec<String>) {
        let mut seen = HashSet::new();
        let mut videos = Vec::new();
        let mut duplicates = Vec::new();

        for record in records {
            if seen.insert(record.video_id.clone()) {
                videos.push(record);
            } else {
                warn!("Dropping duplicate video id {}", record.video_id);
                duplicates.push(record.video_id);
            }
        }

        channel_info.total_videos = videos.len();
        (Self { channel_info, videos }, duplicates)
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    pub fn get(&self, video_id: &str) -> Option<&VideoRecord> {
        self.videos.iter().find(|v| v.video_id == video_id)
    }

    pub fn stats(&self) -> CatalogueStats {
        let mut dates: Vec<NaiveDate> =
            self.videos.iter().filter_map(|v| v.recording_date()).collect();
        dates.sort();

        CatalogueStats {
            total_videos: self.videos.len(),
            with_recording_date: dates.len(),
            without_recording_date: self.videos.len() - dates.len(),
            earliest: dates.first().copied(),
            latest: dates.last().copied(),
        }
    }
}

/// Summary numbers reported after a fetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueStats {
    pub total_videos: usize,
    pub with_recording_date: usize,
    pub without_recording_date: usize,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_record_serializes_iso_dates() {
        let record = VideoRecord::new("abc123", "Trip", ymd(2020, 1, 10), Some(ymd(2020, 1, 4)));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["upload_date"], "2020-01-10");
        assert_eq!(json["recording_date"], "2020-01-04");
        assert_eq!(json["url"], "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_undated_record_serializes_null() {
        let record = VideoRecord::new("abc123", "Trip", ymd(2020, 1, 10), None);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["recording_date"].is_null());
        assert_eq!(record.year(), None);
    }

    #[test]
    fn test_malformed_stored_date_reads_as_none() {
        let mut record = VideoRecord::new("abc123", "Trip", ymd(2020, 1, 10), None);
        record.recording_date = Some("2020-13-45".to_string());
        assert_eq!(record.recording_date(), None);

        record.recording_date = Some("2019-07-04T12:30:00".to_string());
        assert_eq!(record.recording_date(), Some(ymd(2019, 7, 4)));
        assert_eq!(record.year(), Some(2019));
    }

    #[test]
    fn test_from_records_drops_duplicates() {
        let records = vec![
            VideoRecord::new("a", "first", ymd(2020, 1, 1), None),
            VideoRecord::new("b", "second", ymd(2020, 1, 2), None),
            VideoRecord::new("a", "again", ymd(2020, 1, 3), None),
        ];

        let (catalogue, duplicates) =
            Catalogue::from_records(ChannelInfo::placeholder("Chan", "@chan"), records);

        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue.get("a").unwrap().title, "first");
        assert_eq!(duplicates, vec!["a".to_string()]);
        assert_eq!(catalogue.channel_info.total_videos, 2);
    }

    #[test]
    fn test_stats() {
        let records = vec![
            VideoRecord::new("a", "a", ymd(2021, 1, 1), Some(ymd(2019, 5, 1))),
            VideoRecord::new("b", "b", ymd(2021, 1, 1), None),
            VideoRecord::new("c", "c", ymd(2021, 1, 1), Some(ymd(2015, 2, 3))),
        ];
        let (catalogue, _) =
            Catalogue::from_records(ChannelInfo::placeholder("Chan", "@chan"), records);

        let stats = catalogue.stats();
        assert_eq!(stats.total_videos, 3);
        assert_eq!(stats.with_recording_date, 2);
        assert_eq!(stats.without_recording_date, 1);
        assert_eq!(stats.earliest, Some(ymd(2015, 2, 3)));
        assert_eq!(stats.latest, Some(ymd(2019, 5, 1)));
    }
}

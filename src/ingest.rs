/// Turning raw uploads into catalogue records
use crate::catalogue::{Catalogue, ChannelInfo, VideoRecord, DATE_FORMAT};
use crate::config::DateParsingConfig;
use crate::dates::DateExtractor;
use crate::youtube::{RawVideoEntry, VideoSource};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Titles the API substitutes for videos that are no longer viewable
pub const SKIPPED_TITLES: [&str; 2] = ["Private video", "Deleted video"];

/// Where a record's recording date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Title,
    UploadFallback,
    Unknown,
}

/// Tally of one assembly pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub extracted: usize,
    pub fallback: usize,
    pub undated: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

impl IngestReport {
    /// Records kept in the catalogue once duplicates are dropped
    pub fn assembled(&self) -> usize {
        (self.extracted + self.fallback + self.undated).saturating_sub(self.duplicates)
    }
}

/// Per-entry transform from raw upload to [`VideoRecord`]
pub struct Assembler {
    extractor: DateExtractor,
    use_upload_date_fallback: bool,
}

impl Assembler {
    pub fn new(extractor: DateExtractor, use_upload_date_fallback: bool) -> Self {
        Self {
            extractor,
            use_upload_date_fallback,
        }
    }

    pub fn from_config(config: &DateParsingConfig) -> Self {
        Self::new(DateExtractor::from_config(config), config.use_upload_date_fallback)
    }

    /// `None` for sentinel titles and entries without a usable upload date
    pub fn assemble_entry(&self, entry: &RawVideoEntry) -> Option<(VideoRecord, DateSource)> {
        if SKIPPED_TITLES.contains(&entry.title.as_str()) {
            debug!("Skipping unavailable video {}", entry.id);
            return None;
        }

        let upload_date = match upload_date(&entry.published_at) {
            Some(date) => date,
            None => {
                warn!(
                    "Skipping video {}: unusable publish time {:?}",
                    entry.id, entry.published_at
                );
                return None;
            }
        };

        let (recording_date, source) = match self.extractor.extract(&entry.title) {
            Some(date) => (Some(date), DateSource::Title),
            None if self.use_upload_date_fallback => {
                (Some(upload_date), DateSource::UploadFallback)
            }
            None => (None, DateSource::Unknown),
        };

        let record = VideoRecord::new(&*entry.id, &*entry.title, upload_date, recording_date)
            .with_description(entry.description.clone())
            .with_thumbnail(entry.thumbnail_url.clone());

        Some((record, source))
    }

    /// Assemble a batch, preserving input order
    pub fn assemble(&self, entries: &[RawVideoEntry]) -> (Vec<VideoRecord>, IngestReport) {
        let mut report = IngestReport::default();
        let mut records = Vec::with_capacity(entries.len());

        for entry in entries {
            match self.assemble_entry(entry) {
                Some((record, source)) => {
                    match source {
                        DateSource::Title => report.extracted += 1,
                        DateSource::UploadFallback => report.fallback += 1,
                        DateSource::Unknown => report.undated += 1,
                    }
                    records.push(record);
                }
                None => report.skipped += 1,
            }
        }

        (records, report)
    }
}

/// Date part of an RFC 3339 publish time
fn upload_date(published_at: &str) -> Option<NaiveDate> {
    let day = published_at.get(..10)?;
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

/// Full catalogue rebuild from a paginated source
pub struct Ingestor<'a> {
    source: &'a dyn VideoSource,
    assembler: Assembler,
}

impl<'a> Ingestor<'a> {
    pub fn new(source: &'a dyn VideoSource, assembler: Assembler) -> Self {
        Self { source, assembler }
    }

    /// Drain every page of `uploads_playlist_id` and build a fresh catalogue.
    ///
    /// Any page failure aborts the whole run so a partial listing never
    /// replaces a complete one. A page token seen twice is an error.
    pub async fn run(
        &self,
        channel_info: ChannelInfo,
        uploads_playlist_id: &str,
    ) -> Result<(Catalogue, IngestReport)> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0;

        loop {
            let page = self
                .source
                .fetch_page(uploads_playlist_id, page_token.as_deref())
                .await
                .with_context(|| format!("failed to fetch uploads page {}", pages + 1))?;
            pages += 1;
            entries.extend(page.entries);
            info!("📥 Fetched page {} ({} videos so far)", pages, entries.len());

            match page.next_page_token {
                Some(next) => {
                    if !seen_tokens.insert(next.clone()) {
                        bail!(
                            "uploads listing repeated page token {:?} after page {}",
                            next,
                            pages
                        );
                    }
                    page_token = Some(next);
                }
                None => break,
            }
        }

        let (records, mut report) = self.assembler.assemble(&entries);
        let (catalogue, duplicates) = Catalogue::from_records(channel_info, records);
        report.duplicates = duplicates.len();

        info!(
            "✅ Assembled {} videos ({} from titles, {} from upload dates, {} undated, \
             {} skipped, {} duplicates)",
            catalogue.len(),
            report.extracted,
            report.fallback,
            report.undated,
            report.skipped,
            report.duplicates
        );

        Ok((catalogue, report))
    }
}

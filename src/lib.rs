//! On This Day
//!
//! Keeps a catalogue of a channel's uploads with the day each video was
//! recorded, and answers "which videos were recorded on this month/day in any
//! year". The daily jobs turn that answer into a playlist and a forum post.

pub mod catalogue;
pub mod config;
pub mod dates;
pub mod ingest;
pub mod jobs;
pub mod reddit;
pub mod render;
pub mod youtube;

// Re-export main types for easy access
pub use crate::catalogue::{
    videos_for_date, Catalogue, CatalogueError, CatalogueStats, CatalogueStore, ChannelInfo,
    DayMatch, MonthDay, Today, VideoRecord,
};
pub use crate::config::{Config, ConfigBuilder, ConfigError, Credentials};
pub use crate::dates::{extract, DateExtractor, DateStrategy};
pub use crate::ingest::{Assembler, IngestReport, Ingestor};
pub use crate::jobs::{DailyDigest, JobOutcome, Skip};
pub use crate::reddit::{ForumPost, PostPublisher, RedditClient};
pub use crate::youtube::{PlaylistPublisher, RawVideoEntry, UploadsPage, VideoSource, YouTubeClient};

pub mod client;
pub mod playlist;

pub use client::YouTubeClient;
pub use playlist::{refresh_playlist, PlaylistUpdate, YouTubePlaylistPublisher};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One upload as the hosting API reports it, before any date handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawVideoEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    /// RFC 3339 publish instant
    pub published_at: String,
    pub thumbnail_url: String,
}

/// A page of uploads plus the token for the next one
#[derive(Debug, Clone, Default)]
pub struct UploadsPage {
    pub entries: Vec<RawVideoEntry>,
    pub next_page_token: Option<String>,
}

/// Paginated supplier of raw uploads
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn fetch_page(&self, playlist_id: &str, page_token: Option<&str>) -> Result<UploadsPage>;
}

/// Write access to the daily playlist
#[async_trait]
pub trait PlaylistPublisher: Send + Sync {
    /// Id of the playlist titled `title`, created if it does not exist
    async fn find_or_create(&self, title: &str, description: &str) -> Result<String>;

    /// Ids of the playlist's current items (item ids, not video ids)
    async fn list_items(&self, playlist_id: &str) -> Result<Vec<String>>;

    async fn remove_item(&self, item_id: &str) -> Result<()>;

    async fn add_video(&self, playlist_id: &str, video_id: &str) -> Result<()>;
}

/// Public URL of a playlist
pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={}", playlist_id)
}

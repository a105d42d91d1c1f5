use super::{RawVideoEntry, UploadsPage, VideoSource};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

pub const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page the API will return
const MAX_RESULTS: &str = "50";

/// Read-only YouTube Data API client keyed by an API key
pub struct YouTubeClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelIdItem {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: String,
    #[serde(default)]
    custom_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    published_at: String,
    resource_id: ResourceId,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Channel facts needed to fetch its uploads
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDetails {
    pub channel_id: String,
    pub title: String,
    pub uploads_playlist_id: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: API_BASE.to_string(),
            client,
        })
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, resource);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("YouTube API error {} on {}: {}", status, resource, text));
        }

        Ok(response.json().await?)
    }

    /// Resolve a handle such as `@TheDailyWoo` to a channel id.
    ///
    /// Uses the direct handle lookup, then falls back to a channel search
    /// preferring an exact custom URL match.
    pub async fn resolve_channel_id(&self, handle: &str) -> Result<String> {
        let handle = handle.trim_start_matches('@');

        let direct: ListResponse<ChannelIdItem> = self
            .get("channels", &[("part", "id"), ("forHandle", handle)])
            .await?;
        if let Some(item) = direct.items.into_iter().next() {
            return Ok(item.id);
        }

        let search: ListResponse<SearchItem> = self
            .get(
                "search",
                &[("part", "snippet"), ("q", handle), ("type", "channel"), ("maxResults", "5")],
            )
            .await?;

        let wanted = format!("@{}", handle.to_lowercase());
        let exact = search.items.iter().find(|item| {
            item.snippet
                .custom_url
                .as_deref()
                .is_some_and(|url| url.eq_ignore_ascii_case(&wanted))
        });

        exact
            .or_else(|| search.items.first())
            .map(|item| item.snippet.channel_id.clone())
            .ok_or_else(|| anyhow!("Channel not found: {}", handle))
    }

    pub async fn channel_details(&self, channel_id: &str) -> Result<ChannelDetails> {
        let response: ListResponse<ChannelItem> = self
            .get("channels", &[("part", "contentDetails,snippet"), ("id", channel_id)])
            .await?;

        let channel = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Channel not found: {}", channel_id))?;

        let uploads = channel.content_details.related_playlists.uploads;
        info!("📺 Channel: {} (uploads {})", channel.snippet.title, uploads);

        Ok(ChannelDetails {
            channel_id: channel_id.to_string(),
            title: channel.snippet.title,
            uploads_playlist_id: uploads,
        })
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn fetch_page(&self, playlist_id: &str, page_token: Option<&str>) -> Result<UploadsPage> {
        let mut query = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", MAX_RESULTS),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response: ListResponse<PlaylistItem> = self.get("playlistItems", &query).await?;

        let entries = response
            .items
            .into_iter()
            .map(|item| {
                let snippet = item.snippet;
                RawVideoEntry {
                    id: snippet.resource_id.video_id,
                    title: snippet.title,
                    description: snippet.description,
                    published_at: snippet.published_at,
                    thumbnail_url: snippet.thumbnails.high.map(|t| t.url).unwrap_or_default(),
                }
            })
            .collect();

        Ok(UploadsPage {
            entries,
            next_page_token: response.next_page_token,
        })
    }
}

/// Daily playlist maintenance through the OAuth-authenticated API
use super::{playlist_url, PlaylistPublisher};
use crate::config::OAuthCredentials;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::client::API_BASE;

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistList {
    #[serde(default = "Vec::new")]
    items: Vec<PlaylistEntry>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    id: String,
    #[serde(default)]
    snippet: Option<PlaylistEntrySnippet>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntrySnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

/// Playlist writer holding one access token for the run
pub struct YouTubePlaylistPublisher {
    access_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl YouTubePlaylistPublisher {
    /// Exchange the refresh token once and keep the access token for this run
    pub async fn authorize(credentials: &OAuthCredentials, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        let response = client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("OAuth token request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("OAuth token error {}: {}", status, text));
        }

        let token: TokenResponse = response.json().await?;
        info!("🔑 Obtained YouTube access token");

        Ok(Self {
            access_token: token.access_token,
            base_url: API_BASE.to_string(),
            client,
        })
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Err(anyhow!("YouTube API error {} while {}: {}", status, action, text))
    }

    async fn list_page(&self, resource: &str, query: &[(&str, &str)]) -> Result<PlaylistList> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, resource))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;
        let response = Self::check(response, &format!("listing {}", resource)).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PlaylistPublisher for YouTubePlaylistPublisher {
    async fn find_or_create(&self, title: &str, description: &str) -> Result<String> {
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("part", "snippet"), ("mine", "true"), ("maxResults", "50")];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page = self.list_page("playlists", &query).await?;

            let found = page
                .items
                .iter()
                .find(|p| p.snippet.as_ref().map(|s| s.title.as_str()) == Some(title));
            if let Some(existing) = found {
                info!("📋 Found existing playlist: {}", existing.id);
                return Ok(existing.id.clone());
            }

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        let body = json!({
            "snippet": { "title": title, "description": description },
            "status": { "privacyStatus": "public" }
        });
        let response = self
            .client
            .post(format!("{}/playlists", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("part", "snippet,status")])
            .json(&body)
            .send()
            .await?;
        let created: Created = Self::check(response, "creating playlist").await?.json().await?;

        info!("✨ Created playlist: {}", created.id);
        Ok(created.id)
    }

    async fn list_items(&self, playlist_id: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("part", "id"), ("playlistId", playlist_id), ("maxResults", "50")];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page = self.list_page("playlistItems", &query).await?;
            ids.extend(page.items.into_iter().map(|item| item.id));

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(ids)
    }

    async fn remove_item(&self, item_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/playlistItems", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("id", item_id)])
            .send()
            .await?;
        Self::check(response, "removing playlist item").await?;
        Ok(())
    }

    async fn add_video(&self, playlist_id: &str, video_id: &str) -> Result<()> {
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": { "kind": "youtube#video", "videoId": video_id }
            }
        });
        let response = self
            .client
            .post(format!("{}/playlistItems", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("part", "snippet")])
            .json(&body)
            .send()
            .await?;
        Self::check(response, "adding video").await?;
        debug!("Added {} to {}", video_id, playlist_id);
        Ok(())
    }
}

/// Outcome of a playlist refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistUpdate {
    pub playlist_id: String,
    pub added: usize,
    pub attempted: usize,
    pub url: String,
}

/// Find or create the playlist, empty it, then add `video_ids` in order.
///
/// Failing to find or create the playlist is an error. Failures while
/// clearing or adding are logged and skipped.
pub async fn refresh_playlist(
    publisher: &dyn PlaylistPublisher,
    title: &str,
    description: &str,
    video_ids: &[&str],
) -> Result<PlaylistUpdate> {
    let playlist_id = publisher
        .find_or_create(title, description)
        .await
        .with_context(|| format!("could not find or create playlist {:?}", title))?;

    match publisher.list_items(&playlist_id).await {
        Ok(items) => {
            for item_id in &items {
                if let Err(e) = publisher.remove_item(item_id).await {
                    warn!("Failed to remove playlist item {}: {}", item_id, e);
                }
            }
            info!("🧹 Cleared {} items from playlist", items.len());
        }
        Err(e) => warn!("Failed to list playlist items, not clearing: {}", e),
    }

    let mut added = 0;
    for video_id in video_ids {
        match publisher.add_video(&playlist_id, video_id).await {
            Ok(()) => added += 1,
            Err(e) => warn!("Failed to add video {}: {}", video_id, e),
        }
    }

    info!("🎬 Added {}/{} videos to playlist", added, video_ids.len());

    Ok(PlaylistUpdate {
        url: playlist_url(&playlist_id),
        playlist_id,
        added,
        attempted: video_ids.len(),
    })
}

/// Reddit self-post publishing
use crate::config::RedditCredentials;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const API_BASE: &str = "https://oauth.reddit.com";

/// A self post ready to submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPost {
    pub subreddit: String,
    pub title: String,
    pub body: String,
    pub flair_text: Option<String>,
}

/// Where a submitted post ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedPost {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait PostPublisher: Send + Sync {
    async fn submit(&self, post: &ForumPost) -> Result<SubmittedPost>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    json: SubmitJson,
}

#[derive(Debug, Deserialize)]
struct SubmitJson {
    #[serde(default)]
    errors: Vec<Value>,
    data: Option<SubmitData>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct FlairTemplate {
    id: String,
    #[serde(default)]
    text: String,
}

/// Script-app client authenticated with the password grant
pub struct RedditClient {
    access_token: String,
    client: reqwest::Client,
}

impl RedditClient {
    pub async fn authenticate(
        credentials: &RedditCredentials,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(credentials.user_agent.clone())
            .build()?;

        let response = client
            .post(TOKEN_URL)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .context("Reddit token request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Reddit auth error {}: {}", status, text));
        }

        let token: TokenResponse = response.json().await?;
        info!("🔑 Authenticated with Reddit as u/{}", credentials.username);

        Ok(Self {
            access_token: token.access_token,
            client,
        })
    }

    async fn apply_flair(&self, subreddit: &str, post_id: &str, flair_text: &str) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/r/{}/api/link_flair_v2", API_BASE, subreddit))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("flair templates unavailable ({})", response.status()));
        }

        let templates: Vec<FlairTemplate> = response.json().await?;
        let template = templates
            .iter()
            .find(|t| t.text.eq_ignore_ascii_case(flair_text))
            .ok_or_else(|| anyhow!("no flair template named {:?}", flair_text))?;

        let link = format!("t3_{}", post_id);
        let response = self
            .client
            .post(format!("{}/r/{}/api/selectflair", API_BASE, subreddit))
            .bearer_auth(&self.access_token)
            .form(&[
                ("api_type", "json"),
                ("link", link.as_str()),
                ("flair_template_id", template.id.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("selectflair failed ({})", response.status()));
        }

        debug!("Applied flair {:?} to {}", flair_text, link);
        Ok(())
    }
}

#[async_trait]
impl PostPublisher for RedditClient {
    async fn submit(&self, post: &ForumPost) -> Result<SubmittedPost> {
        let response = self
            .client
            .post(format!("{}/api/submit", API_BASE))
            .bearer_auth(&self.access_token)
            .form(&[
                ("sr", post.subreddit.as_str()),
                ("kind", "self"),
                ("title", post.title.as_str()),
                ("text", post.body.as_str()),
                ("api_type", "json"),
            ])
            .send()
            .await
            .context("Reddit submit request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Reddit API error {}: {}", status, text));
        }

        let submitted = parse_submit(response.json().await?)?;
        info!("📝 Posted to r/{}: {}", post.subreddit, submitted.url);

        if let Some(flair) = &post.flair_text {
            if let Err(e) = self.apply_flair(&post.subreddit, &submitted.id, flair).await {
                warn!("Could not set flair {:?}: {}", flair, e);
            }
        }

        Ok(submitted)
    }
}

fn parse_submit(response: SubmitResponse) -> Result<SubmittedPost> {
    if !response.json.errors.is_empty() {
        return Err(anyhow!("Reddit rejected post: {:?}", response.json.errors));
    }
    let data = response
        .json
        .data
        .ok_or_else(|| anyhow!("Reddit submit response had no post data"))?;
    Ok(SubmittedPost {
        id: data.id,
        url: data.url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_successful_submit() {
        let body = r#"{"json": {"errors": [], "data": {
            "id": "1abcde",
            "name": "t3_1abcde",
            "url": "https://www.reddit.com/r/test/comments/1abcde/x/"
        }}}"#;
        let post = parse_submit(serde_json::from_str(body).unwrap()).unwrap();
        assert_eq!(post.id, "1abcde");
        assert!(post.url.contains("/comments/1abcde/"));
    }

    #[test]
    fn test_parse_rejected_submit() {
        let body = r#"{"json": {"errors": [
            ["SUBREDDIT_NOEXIST", "that subreddit doesn't exist", "sr"]
        ]}}"#;
        let err = parse_submit(serde_json::from_str(body).unwrap()).unwrap_err();
        assert!(err.to_string().contains("SUBREDDIT_NOEXIST"));
    }
}

/// The daily jobs: rebuild the catalogue, refresh the playlist, post the digest
use crate::catalogue::{
    day_matches, Catalogue, CatalogueStats, CatalogueStore, ChannelInfo, DayMatch, Today,
};
use crate::config::{Config, FeatureConfig};
use crate::ingest::{Assembler, IngestReport, Ingestor};
use crate::reddit::{ForumPost, PostPublisher, SubmittedPost};
use crate::render::{fill_template, playlist_video_ids, TemplateVars};
use crate::youtube::{
    refresh_playlist, PlaylistPublisher, PlaylistUpdate, VideoSource, YouTubeClient,
};
use anyhow::{Context, Result};
use std::future::Future;
use tracing::info;

/// Why a publishing job did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Disabled,
    NothingToday,
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome<T> {
    Done(T),
    Skipped(Skip),
}

impl<T> JobOutcome<T> {
    pub fn done(&self) -> Option<&T> {
        match self {
            JobOutcome::Done(value) => Some(value),
            JobOutcome::Skipped(_) => None,
        }
    }
}

/// Result of a catalogue rebuild
#[derive(Debug, Clone)]
pub struct FetchSummary {
    pub report: IngestReport,
    pub stats: CatalogueStats,
}

/// Resolve the configured handle into channel info with its uploads playlist
pub async fn resolve_channel(client: &YouTubeClient, config: &Config) -> Result<ChannelInfo> {
    let channel_id = client
        .resolve_channel_id(&config.channel.handle)
        .await
        .with_context(|| format!("could not resolve channel {}", config.channel.handle))?;
    let details = client.channel_details(&channel_id).await?;

    Ok(ChannelInfo {
        channel_id: details.channel_id,
        channel_name: details.title,
        channel_handle: config.channel.handle.clone(),
        uploads_playlist_id: Some(details.uploads_playlist_id),
        total_videos: 0,
        last_updated: None,
    })
}

/// Rebuild the whole catalogue from `source` and replace the stored one.
/// Nothing is written unless every page was fetched.
pub async fn rebuild_catalogue(
    source: &dyn VideoSource,
    config: &Config,
    store: &CatalogueStore,
    channel_info: ChannelInfo,
) -> Result<FetchSummary> {
    let uploads_playlist_id = channel_info
        .uploads_playlist_id
        .clone()
        .context("channel has no uploads playlist")?;

    let ingestor = Ingestor::new(source, Assembler::from_config(&config.date_parsing));
    let (mut catalogue, report) = ingestor.run(channel_info, &uploads_playlist_id).await?;

    store.save(&mut catalogue)?;

    let stats = catalogue.stats();
    info!("📊 {} videos, {} with recording dates", stats.total_videos, stats.with_recording_date);
    if let (Some(earliest), Some(latest)) = (stats.earliest, stats.latest) {
        info!("📅 Date range: {} to {}", earliest, latest);
    }

    Ok(FetchSummary { report, stats })
}

/// Today's matches plus everything needed to publish them
pub struct DailyDigest<'a> {
    pub today: Today,
    pub matches: Vec<DayMatch<'a>>,
}

impl<'a> DailyDigest<'a> {
    pub fn prepare(catalogue: &'a Catalogue, today: Today) -> Self {
        let matches = day_matches(catalogue, today.query);
        info!("🗓️ {}: {} videos recorded on this day", today.label(), matches.len());
        for m in &matches {
            info!("  - {}: {}", m.year, m.title);
        }
        Self { today, matches }
    }

    /// Today in the configured zone
    pub fn for_today(catalogue: &'a Catalogue, config: &Config) -> Result<Self> {
        let tz = config.date_parsing.tz()?;
        Ok(Self::prepare(catalogue, Today::in_zone(tz)))
    }

    pub fn vars(&self, playlist_url: Option<&str>) -> TemplateVars {
        TemplateVars::new(&self.today, &self.matches, playlist_url)
    }

    pub fn playlist_title(&self, config: &Config) -> String {
        fill_template(&config.playlist.title_format, &self.vars(None))
    }

    pub fn forum_post(&self, config: &Config, playlist_url: Option<&str>) -> ForumPost {
        let vars = self.vars(playlist_url);
        ForumPost {
            subreddit: config.reddit.subreddit.clone(),
            title: fill_template(&config.reddit.post_title_format, &vars),
            body: fill_template(&config.reddit.post_template, &vars),
            flair_text: config.reddit.flair_text.clone(),
        }
    }

    fn gate(&self, features: &FeatureConfig, enabled: bool) -> Option<Skip> {
        if !enabled {
            Some(Skip::Disabled)
        } else if self.matches.is_empty() {
            Some(Skip::NothingToday)
        } else if features.dry_run {
            Some(Skip::DryRun)
        } else {
            None
        }
    }

    /// Refresh the day's playlist. `connect` is only called when something
    /// will actually be written.
    pub async fn update_playlist<P, F, Fut>(
        &self,
        config: &Config,
        connect: F,
    ) -> Result<JobOutcome<PlaylistUpdate>>
    where
        P: PlaylistPublisher,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P>>,
    {
        let title = self.playlist_title(config);
        if let Some(skip) = self.gate(&config.features, config.features.create_playlist) {
            info!("⏭️ Playlist {:?} not updated: {:?}", title, skip);
            return Ok(JobOutcome::Skipped(skip));
        }

        let publisher = connect().await?;
        let description = fill_template(&config.playlist.description_format, &self.vars(None));
        let video_ids = playlist_video_ids(&self.matches);
        let update = refresh_playlist(&publisher, &title, &description, &video_ids).await?;

        info!("🔗 Playlist URL: {}", update.url);
        Ok(JobOutcome::Done(update))
    }

    /// Submit the day's post. `connect` is only called when a post will be made.
    pub async fn post_digest<P, F, Fut>(
        &self,
        config: &Config,
        playlist_url: Option<&str>,
        connect: F,
    ) -> Result<JobOutcome<SubmittedPost>>
    where
        P: PostPublisher,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P>>,
    {
        let post = self.forum_post(config, playlist_url);
        if let Some(skip) = self.gate(&config.features, config.features.post_to_reddit) {
            if skip == Skip::DryRun {
                info!(
                    "📝 Would post to r/{}:\nTitle: {}\n\n{}",
                    post.subreddit, post.title, post.body
                );
            }
            info!("⏭️ Post not submitted: {:?}", skip);
            return Ok(JobOutcome::Skipped(skip));
        }

        let publisher = connect().await?;
        let submitted = publisher
            .submit(&post)
            .await
            .with_context(|| format!("failed to post to r/{}", post.subreddit))?;

        info!("🔗 Post URL: {}", submitted.url);
        Ok(JobOutcome::Done(submitted))
    }
}

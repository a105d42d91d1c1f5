/// Markdown and template rendering for matched videos
use crate::catalogue::{DayMatch, Today};

/// Shown instead of a list when nothing matched
pub const EMPTY_LIST: &str = "*No videos found for this date.*";

/// Stands in for `{playlist_url}` when no playlist was published
pub const PLAYLIST_PENDING: &str = "Coming soon!";

/// One `**{year}:** [{title}]({url})` line per match, separated by blank lines
pub fn format_video_list(matches: &[DayMatch<'_>]) -> String {
    if matches.is_empty() {
        return EMPTY_LIST.to_string();
    }

    matches
        .iter()
        .map(|m| format!("**{}:** [{}]({})", m.year, m.title, m.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Video ids in match order, for the playlist
pub fn playlist_video_ids<'a>(matches: &[DayMatch<'a>]) -> Vec<&'a str> {
    matches.iter().map(|m| m.video_id).collect()
}

/// Values substituted into title and body templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars {
    pub month: String,
    pub day: String,
    pub date: String,
    pub video_list: String,
    pub playlist_url: String,
}

impl TemplateVars {
    pub fn new(today: &Today, matches: &[DayMatch<'_>], playlist_url: Option<&str>) -> Self {
        Self {
            month: today.month_name(),
            day: today.day_label(),
            date: today.label(),
            video_list: format_video_list(matches),
            playlist_url: playlist_url.unwrap_or(PLAYLIST_PENDING).to_string(),
        }
    }
}

/// Replace `{month}`, `{day}`, `{date}`, `{video_list}` and `{playlist_url}`.
/// Unknown placeholders are left as written.
pub fn fill_template(template: &str, vars: &TemplateVars) -> String {
    template
        .replace("{month}", &vars.month)
        .replace("{day}", &vars.day)
        .replace("{date}", &vars.date)
        .replace("{playlist_url}", &vars.playlist_url)
        .replace("{video_list}", &vars.video_list)
}

use crate::{GrabberError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Opaque identifier of a video on the watch site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Accepts a bare id or any of the common watch URL shapes.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(GrabberError::InvalidVideoId("empty input".into()));
        }

        let candidate = if looks_like_url(trimmed) {
            id_from_url(trimmed)?
        } else {
            trimmed.to_string()
        };

        if !is_valid_id(&candidate) {
            return Err(GrabberError::InvalidVideoId(input.to_string()));
        }

        Ok(Self(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self, base_url: &str) -> String {
        format!("{}/watch?v={}", base_url.trim_end_matches('/'), self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for VideoId {
    type Err = GrabberError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn looks_like_url(input: &str) -> bool {
    input.contains("://") || input.contains("youtube.com/") || input.contains("youtu.be/")
}

fn id_from_url(input: &str) -> Result<String> {
    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| GrabberError::InvalidVideoId(format!("{}: {}", input, e)))?;
    let host = url.host_str().unwrap_or_default();

    if host == "youtu.be" || host.ends_with(".youtu.be") {
        return url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| GrabberError::InvalidVideoId(input.to_string()));
    }

    if url.path() == "/watch" {
        return url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| GrabberError::InvalidVideoId(input.to_string()));
    }

    let mut segments = url.path_segments().into_iter().flatten();
    match (segments.next(), segments.next()) {
        (Some("shorts" | "embed" | "live" | "v"), Some(id)) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(GrabberError::InvalidVideoId(input.to_string())),
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parses a list file: one id or URL per line, blank lines and `#` comments
/// ignored.
pub fn parse_list(content: &str) -> Result<Vec<VideoId>> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(VideoId::parse)
        .collect()
}

use std::collections::HashMap;
use std::fmt::Display;

const VIDEO_ID_LENGTH: usize = 11;

/// A YouTube video identifier: exactly 11 characters of `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

/// View counts keyed by video, built fresh on every fetch.
pub type ViewCountMap = HashMap<VideoId, u64>;

impl VideoId {
    /// Trims the input and returns `None` unless what is left is a well-formed ID.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();

        let well_formed = trimmed.len() == VIDEO_ID_LENGTH
            && trimmed
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

        well_formed.then(|| Self(trimmed.to_owned()))
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

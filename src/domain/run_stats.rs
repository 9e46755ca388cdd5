use serde::Serialize;

/// Counters for a single job run. They only ever go up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub users_processed: u64,
    pub videos_checked: u64,
    pub emails_sent: u64,
}

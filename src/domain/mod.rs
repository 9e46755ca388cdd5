mod run_stats;
mod subscriber;
mod subscriber_email;
mod video_id;

pub use run_stats::RunStats;
pub use subscriber::Subscriber;
pub use subscriber_email::SubscriberEmail;
pub use video_id::{VideoId, ViewCountMap};

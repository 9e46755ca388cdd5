use std::fmt::Display;

use validator::validate_email;

/// An email address read back from the subscribers table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(s: String) -> Result<Self, String> {
        let trimmed = s.trim();
        match validate_email(trimmed) {
            true => Ok(Self(trimmed.to_owned())),
            false => Err(format!("{:?} is not a valid subscriber email", s)),
        }
    }
}

impl Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

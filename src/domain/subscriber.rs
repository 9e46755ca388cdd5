use crate::domain::subscriber_email::SubscriberEmail;

#[derive(Debug, Clone)]
pub struct Subscriber {
    pub email: SubscriberEmail,
}

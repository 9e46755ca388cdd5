pub mod authentication;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod notifications;
pub mod routes;
pub mod startup;
pub mod subscribers;
pub mod telemetry;
pub mod youtube_client;

mod health_check;
mod run_job;

pub use health_check::check_health;
pub use run_job::{handle_panic, run_job, JobError, GENERIC_ERROR_MESSAGE};

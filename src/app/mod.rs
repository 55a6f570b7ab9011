pub mod auth;
pub mod best_effort;
pub mod notifications;

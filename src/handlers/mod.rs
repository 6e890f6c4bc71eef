pub mod applications;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod notifications;
pub mod screening;

pub mod auth;
pub mod clips;
pub mod webhooks;

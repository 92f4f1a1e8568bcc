use std::sync::Arc;
use crate::rate_limit::RateLimiter;

// The single admin account allowed into jammanage
#[derive(Clone)]
pub struct OwnerCredentials {
    pub username: String,
    pub password_hash: Option<String>, // None locks everyone out
}

// app's shared state
pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>,
    pub owner: OwnerCredentials,
}

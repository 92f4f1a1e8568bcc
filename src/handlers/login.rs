use axum::{Json, extract::{ConnectInfo, State, rejection::JsonRejection}};
use std::net::SocketAddr;
use std::sync::Arc;
use crate::error::AppError;
use crate::metrics::{LOGIN_ATTEMPTS, LOGIN_DENIED, LOGIN_FAILURES, LOGIN_SUCCESS};
use crate::models::{LoginRequest, LoginResponse};
use crate::password::verify_password;
use crate::state::{AppState, OwnerCredentials};

// Rate limit key - one counter per client address and account name.
// The address is bracketed since IPv6 text contains ':'.
fn login_identifier(addr: &SocketAddr, username: &str) -> String {
    format!("[{}]:{}", addr.ip(), username)
}

// Runs argon2 whenever a hash is configured, even for a wrong username,
// so response time does not reveal the owner's username.
async fn verify_owner(
    owner: &OwnerCredentials,
    username: &str,
    password: String,
) -> Result<bool, AppError> {
    let Some(hash) = owner.password_hash.clone() else {
        return Ok(false);
    };
    let username_matches = username == owner.username;

    let password_matches = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(username_matches && password_matches)
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    LOGIN_ATTEMPTS.inc();
    let Json(payload) = payload?;

    let identifier = login_identifier(&addr, &payload.username);
    let decision = state.rate_limiter.check(&identifier);

    // blocked before the credential store is touched
    if !decision.allowed {
        LOGIN_DENIED.inc();
        tracing::warn!(%identifier, "Login rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    let valid = verify_owner(&state.owner, &payload.username, payload.password).await?;

    if !valid {
        LOGIN_FAILURES.inc();
        tracing::warn!(%identifier, remaining = decision.remaining, "Failed owner login attempt");
        return Err(AppError::Auth {
            message: "Invalid credentials".to_string(),
            remaining: decision.remaining,
        });
    }

    state.rate_limiter.reset(&identifier);
    LOGIN_SUCCESS.inc();
    tracing::info!(username = %payload.username, "Owner login verified");

    Ok(Json(LoginResponse {
        success: true,
        role: "owner".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::cheap_hash;

    #[test]
    fn identifier_combines_ip_and_username() {
        let addr: SocketAddr = "203.0.113.9:51234".parse().unwrap();
        assert_eq!(login_identifier(&addr, "owner"), "[203.0.113.9]:owner");
    }

    #[test]
    fn ipv6_identifiers_do_not_collide() {
        let a: SocketAddr = "[::1]:80".parse().unwrap();
        let b: SocketAddr = "[::1:a]:80".parse().unwrap();
        assert_ne!(login_identifier(&a, "a:"), login_identifier(&b, ""));
        assert_eq!(login_identifier(&a, "owner"), "[::1]:owner");
    }

    fn owner(password_hash: Option<&str>) -> OwnerCredentials {
        OwnerCredentials {
            username: "owner".to_string(),
            password_hash: password_hash.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn wrong_username_still_runs_hash_check() {
        // a broken hash only errors if argon2 is actually reached
        let result = verify_owner(&owner(Some("not-a-phc-string")), "admin", "x".to_string()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn owner_verification_needs_both_fields() {
        let hash = cheap_hash("jam-secret");
        let owner = owner(Some(&hash));
        assert!(verify_owner(&owner, "owner", "jam-secret".to_string()).await.unwrap());
        assert!(!verify_owner(&owner, "admin", "jam-secret".to_string()).await.unwrap());
        assert!(!verify_owner(&owner, "owner", "wrong".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn no_configured_hash_never_verifies() {
        assert!(!verify_owner(&owner(None), "owner", "x".to_string()).await.unwrap());
    }

    #[test]
    fn identifier_ignores_client_port() {
        let a: SocketAddr = "203.0.113.9:1".parse().unwrap();
        let b: SocketAddr = "203.0.113.9:2".parse().unwrap();
        assert_eq!(login_identifier(&a, "owner"), login_identifier(&b, "owner"));
    }
}

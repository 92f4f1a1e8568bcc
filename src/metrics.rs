use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, register_counter, register_gauge};


lazy_static! {
    pub static ref LOGIN_ATTEMPTS: Counter =
        register_counter!("automart_login_attempts_total", "Total login attempts").unwrap();
    pub static ref LOGIN_DENIED: Counter =
        register_counter!("automart_login_denied_total", "Login attempts rejected by the rate limiter").unwrap();
    pub static ref LOGIN_FAILURES: Counter =
        register_counter!("automart_login_failures_total", "Login attempts with invalid credentials").unwrap();
    pub static ref LOGIN_SUCCESS: Counter =
        register_counter!("automart_login_success_total", "Successful owner logins").unwrap();
    pub static ref RATE_LIMIT_SWEPT: Counter =
        register_counter!("automart_rate_limit_swept_total", "Expired rate limit entries removed by the sweeper").unwrap();
    pub static ref RATE_LIMIT_ENTRIES: Gauge =
        register_gauge!("automart_rate_limit_entries", "Identifiers currently held by the rate limiter").unwrap();
}

use clap::Parser;
use std::time::Duration;

use crate::rate_limit::RateLimitConfig;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "automart-gateway")]
#[command(about = "Owner login guard for the Jain Automart admin console")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "AUTOMART_PORT", default_value_t = 8080)]
    pub port: u16,

    // Failed login attempts allowed per window
    #[arg(long, env = "AUTOMART_MAX_ATTEMPTS", default_value_t = 5)]
    pub max_attempts: u32,

    // Rate limit window in seconds
    #[arg(long, env = "AUTOMART_WINDOW_SECS", default_value_t = 600)]
    pub window_secs: u64,

    // How often expired entries are swept, in seconds
    #[arg(long, env = "AUTOMART_SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,

    // Username of the single "owner" account
    #[arg(long, env = "AUTOMART_OWNER_USERNAME", default_value = "owner")]
    pub owner_username: String,

    // Argon2 PHC string for the owner password
    #[arg(long, env = "AUTOMART_OWNER_PASSWORD_HASH")]
    pub owner_password_hash: Option<String>,

    // Print an argon2 hash for the given password and exit
    #[arg(long, value_name = "PASSWORD")]
    pub hash_password: Option<String>,
}

impl Args {
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_attempts: self.max_attempts,
            window: Duration::from_secs(self.window_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_login_policy() {
        let args = Args::try_parse_from(["automart-gateway"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.owner_username, "owner");
        assert_eq!(args.rate_limit_config(), RateLimitConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "automart-gateway",
            "--max-attempts",
            "3",
            "--window-secs",
            "30",
            "--sweep-interval-secs",
            "0",
        ])
        .unwrap();
        let config = args.rate_limit_config();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.window, Duration::from_secs(30));
        // a zero interval would panic in tokio::time::interval
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
    }
}

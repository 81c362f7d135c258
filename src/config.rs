// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Passing threshold for auto-scored exams, in percent.
/// Fixed for every exam; per-exam thresholds are deliberately unsupported.
pub const PASSING_PERCENTAGE: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    /// Optional teacher account seeded at startup.
    pub seed_teacher_username: Option<String>,
    pub seed_teacher_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let seed_teacher_username = env::var("SEED_TEACHER_USERNAME").ok();
        let seed_teacher_password = env::var("SEED_TEACHER_PASSWORD").ok();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            seed_teacher_username,
            seed_teacher_password,
        }
    }
}

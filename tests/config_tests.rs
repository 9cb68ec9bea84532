use std::env;

use nexus_portal::config::{AppConfig, Env};
use serial_test::serial;

const CONFIG_VARS: &[&str] = &[
    "APP_ENV",
    "TOKEN_SECRET",
    "STRIPE_SECRET",
    "SESSION_TTL_DAYS",
    "PORT",
    "DATABASE_URL",
];

// Every test starts from a clean slate; the process environment is shared,
// hence #[serial] on everything that touches it.
fn reset_env() {
    for var in CONFIG_VARS {
        unsafe { env::remove_var(var) };
    }
}

fn set(var: &str, value: &str) {
    unsafe { env::set_var(var, value) };
}

#[test]
fn test_default_config_is_local() {
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);
    assert_eq!(config.port, 5000);
    assert_eq!(config.session_ttl_days, 30);
    assert!(!config.token_secret.is_empty());
    assert!(!config.stripe_secret.is_empty());
}

#[test]
#[serial]
fn test_local_load_falls_back_to_dev_secrets() {
    reset_env();
    set("DATABASE_URL", "postgres://localhost:5432/portal");

    let config = AppConfig::load();
    assert_eq!(config.env, Env::Local);
    assert_eq!(config.db_url, "postgres://localhost:5432/portal");
    assert!(!config.token_secret.is_empty());
    assert!(!config.stripe_secret.is_empty());
    assert_eq!(config.port, 5000);
    assert_eq!(config.session_ttl_days, 30);
}

#[test]
#[serial]
fn test_production_mode_reads_mandatory_secrets() {
    reset_env();
    set("APP_ENV", "production");
    set("TOKEN_SECRET", "prod-signing-secret");
    set("STRIPE_SECRET", "sk_live_abc");
    set("DATABASE_URL", "postgres://db.internal:5432/portal");

    let config = AppConfig::load();
    assert_eq!(config.env, Env::Production);
    assert_eq!(config.token_secret, "prod-signing-secret");
    assert_eq!(config.stripe_secret, "sk_live_abc");
}

#[test]
#[serial]
fn test_unrecognised_app_env_means_local() {
    reset_env();
    set("APP_ENV", "staging");
    set("DATABASE_URL", "postgres://localhost:5432/portal");

    let config = AppConfig::load();
    assert_eq!(config.env, Env::Local);
}

#[test]
#[serial]
fn test_numeric_overrides_parse() {
    reset_env();
    set("DATABASE_URL", "postgres://localhost:5432/portal");
    set("SESSION_TTL_DAYS", "7");
    set("PORT", "8080");

    let config = AppConfig::load();
    assert_eq!(config.session_ttl_days, 7);
    assert_eq!(config.port, 8080);
}

#[test]
#[serial]
fn test_unparseable_numbers_fall_back_to_defaults() {
    reset_env();
    set("DATABASE_URL", "postgres://localhost:5432/portal");
    set("SESSION_TTL_DAYS", "soon");
    set("PORT", "-1");

    let config = AppConfig::load();
    assert_eq!(config.session_ttl_days, 30);
    assert_eq!(config.port, 5000);
}

#[test]
#[serial]
#[should_panic(expected = "TOKEN_SECRET")]
fn test_production_without_a_token_secret_refuses_to_start() {
    reset_env();
    set("APP_ENV", "production");
    set("STRIPE_SECRET", "sk_live_abc");
    set("DATABASE_URL", "postgres://db.internal:5432/portal");

    AppConfig::load();
}

#[test]
#[serial]
#[should_panic(expected = "DATABASE_URL")]
fn test_missing_database_url_refuses_to_start() {
    reset_env();

    AppConfig::load();
}

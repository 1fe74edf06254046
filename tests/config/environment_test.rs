use rig_dashboard::config::Environment;
use serial_test::serial;
use std::path::PathBuf;
use std::time::Duration;

const VARS: [&str; 7] = [
    "BASE_DIR",
    "CONFIG_DIR",
    "PUBLIC_DIR",
    "DATA_DIR",
    "PORT",
    "REMOTE_TIMEOUT_SECS",
    "FANOUT_CONCURRENCY",
];

fn clear() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[serial]
#[test]
fn paths_derive_from_base_dir() {
    clear();
    std::env::set_var("BASE_DIR", "/srv/rigs");
    std::env::set_var("DATA_DIR", "/var/lib/rigs");
    std::env::set_var("PORT", "4100");
    std::env::set_var("REMOTE_TIMEOUT_SECS", "3");

    let env = Environment::from_env().unwrap();
    assert_eq!(env.config_dir, PathBuf::from("/srv/rigs/config"));
    assert_eq!(env.public_dir, PathBuf::from("/srv/rigs/public"));
    assert_eq!(env.metrics_db_path(), PathBuf::from("/var/lib/rigs/metrics.db"));
    assert_eq!(env.port_override, Some(4100));
    assert_eq!(env.remote_timeout, Duration::from_secs(3));
    assert_eq!(env.fanout_concurrency, 32);

    clear();
}

#[serial]
#[test]
fn invalid_port_is_rejected() {
    clear();
    std::env::set_var("PORT", "not-a-port");

    assert!(Environment::from_env().is_err());

    clear();
}

#[serial]
#[test]
fn zero_tuning_values_fall_back_to_defaults() {
    clear();
    std::env::set_var("REMOTE_TIMEOUT_SECS", "0");
    std::env::set_var("FANOUT_CONCURRENCY", "0");

    let env = Environment::from_env().unwrap();
    assert_eq!(env.remote_timeout, Duration::from_secs(10));
    assert_eq!(env.fanout_concurrency, 32);
    assert_eq!(env.port_override, None);

    clear();
}

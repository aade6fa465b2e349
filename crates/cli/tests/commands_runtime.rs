use std::env;
use std::sync::{Mutex, OnceLock};

use agrilink_cli::commands::{migrate, seed, trends};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("AGRILINK_DATABASE_URL", "sqlite::memory:?cache=shared")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_unsupported_database() {
    with_env(&[("AGRILINK_DATABASE_URL", "postgres://localhost/agrilink")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_returns_dataset_summary_with_valid_env() {
    with_env(&[("AGRILINK_DATABASE_URL", "sqlite::memory:?cache=shared")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected demo seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("3 categories"));
        assert!(message.contains("8 products"));
        assert!(message.contains("3 trend snapshots"));
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(&[("AGRILINK_DATABASE_URL", "sqlite::memory:?cache=shared")], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");

        let first_payload = parse_payload(&first.output);
        let second_payload = parse_payload(&second.output);
        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn trends_recompute_reports_success() {
    with_env(&[("AGRILINK_DATABASE_URL", "sqlite::memory:?cache=shared")], || {
        let result = trends::run();
        assert_eq!(result.exit_code, 0, "expected trend recompute success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "trends");
        assert_eq!(payload["status"], "ok");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "AGRILINK_DATABASE_URL",
        "AGRILINK_DATABASE_MAX_CONNECTIONS",
        "AGRILINK_DATABASE_TIMEOUT_SECS",
        "AGRILINK_LLM_API_KEY",
        "GROQ_API_KEY",
        "AGRILINK_LLM_BASE_URL",
        "AGRILINK_LLM_MODEL",
        "AGRILINK_LLM_TIMEOUT_SECS",
        "AGRILINK_SERVER_BIND_ADDRESS",
        "AGRILINK_SERVER_PORT",
        "AGRILINK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "AGRILINK_LOGGING_LEVEL",
        "AGRILINK_LOGGING_FORMAT",
        "AGRILINK_LOG_LEVEL",
        "AGRILINK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}

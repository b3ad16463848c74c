//! Integration tests for TOML + environment configuration loading.
//!
//! Uses `figment::Jail` for sandboxed file and env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use fin_config::{ConfigError, FinConfig};
use pretty_assertions::assert_eq;

fn jailed_figment() -> Figment {
    Figment::from(Serialized::defaults(FinConfig::default()))
        .merge(Toml::file("config.toml"))
        .merge(Env::prefixed("FINSIGHT_").split("__"))
}

#[test]
fn loads_backend_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[backend]
base_url = "https://finance.example.com/app/"
timeout_secs = 45
user_agent = "finsight-test"
"#,
        )?;

        let config = FinConfig::from_figment(&jailed_figment()).expect("config loads");
        assert_eq!(config.backend.base_url, "https://finance.example.com/app/");
        assert_eq!(config.backend.timeout_secs, 45);
        assert_eq!(config.backend.user_agent, "finsight-test");
        Ok(())
    });
}

#[test]
fn partial_sections_keep_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[auth]
keyring_service = "finsight-test"
"#,
        )?;

        let config = FinConfig::from_figment(&jailed_figment()).expect("config loads");
        assert_eq!(config.auth.keyring_service, "finsight-test");
        assert_eq!(config.auth.expiry_buffer_secs, 60);
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000/app/");
        assert_eq!(config.general.connect_wait_secs, 120);
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[backend]
base_url = "https://from-toml.example.com/"
"#,
        )?;
        jail.set_env("FINSIGHT_BACKEND__BASE_URL", "https://from-env.example.com/");
        jail.set_env("FINSIGHT_GENERAL__DEFAULT_FORMAT", "table");

        let config = FinConfig::from_figment(&jailed_figment()).expect("config loads");
        assert_eq!(config.backend.base_url, "https://from-env.example.com/");
        assert_eq!(config.general.default_format, "table");
        Ok(())
    });
}

#[test]
fn invalid_base_url_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("FINSIGHT_BACKEND__BASE_URL", "localhost:8000");

        let err = FinConfig::from_figment(&jailed_figment()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "backend.base_url"
        ));
        Ok(())
    });
}

#[test]
fn malformed_value_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[backend]
timeout_secs = "soon"
"#,
        )?;

        let err = FinConfig::from_figment(&jailed_figment()).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
        Ok(())
    });
}

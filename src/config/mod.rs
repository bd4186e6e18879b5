use std::{fmt, path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};

pub(crate) mod duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Where the upstream registry lives and how to talk to it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegistryConfig {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub ssl_verify: bool,
    #[serde(with = "crate::config::duration", default = "default_timeout")]
    pub timeout: Duration,
}

impl RegistryConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
            protocol: Protocol::Https,
            ssl_verify: true,
            timeout: default_timeout(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListenConfig {
    pub address: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 4567,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PrometheusConfig {
    pub address: String,
    pub port: u16,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 9080,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuthenticationConfig {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

const fn default_max_age() -> Duration {
    Duration::from_secs(1_728_000)
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CorsConfig {
    pub enabled: bool,
    #[serde(with = "crate::config::duration", default = "default_max_age")]
    pub max_age: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age: default_max_age(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Configuration {
    pub listen: ListenConfig,
    pub registry: RegistryConfig,
    pub authentication: Option<AuthenticationConfig>,
    pub cors: CorsConfig,
    pub prometheus: Option<PrometheusConfig>,
    pub public: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            registry: RegistryConfig::default(),
            authentication: None,
            cors: CorsConfig::default(),
            prometheus: None,
            public: PathBuf::from("public"),
        }
    }
}

impl Configuration {
    pub fn figment(configs: Vec<PathBuf>) -> Figment {
        let fig = Figment::from(Serialized::defaults(Configuration::default()));

        let fig = match AppDirs::new(Some("crane"), true) {
            Some(app_dirs) => {
                let config_path = app_dirs.config_dir.join("config.yaml");
                match config_path.exists() {
                    true => fig.admerge(Yaml::file(config_path)),
                    false => fig,
                }
            }
            None => fig,
        };

        let fig = configs
            .into_iter()
            .fold(fig, |fig, config_path| fig.admerge(Yaml::file(config_path)));

        let fig = fig.admerge(Env::prefixed("CRANE_").split("__"));

        // Variables understood by the original deployment images
        let fig = fig.admerge(
            Env::prefixed("REGISTRY_")
                .only(&["host", "port", "proto", "ssl_verify"])
                .map(|key| match key.as_str().to_lowercase().as_str() {
                    "proto" => "registry.protocol".into(),
                    other => format!("registry.{other}").into(),
                }),
        );

        match std::env::var_os("USERNAME") {
            Some(_) => fig.admerge(
                Env::raw()
                    .only(&["username", "password"])
                    .map(|key| format!("authentication.{}", key.as_str().to_lowercase()).into()),
            ),
            None => fig,
        }
    }

    pub fn config(figment: Figment) -> Result<Configuration> {
        let config: Configuration = figment.extract().context("Failed to load configuration")?;

        if config.registry.host.is_empty() {
            bail!("registry.host must not be empty");
        }

        if config.registry.port == 0 {
            bail!("registry.port must not be 0");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let defaults = Configuration::default();
        assert_eq!(defaults.registry.host, "localhost");
        assert_eq!(defaults.registry.port, 5000);
        assert_eq!(defaults.registry.protocol, Protocol::Https);
        assert!(defaults.registry.ssl_verify);
        assert!(defaults.authentication.is_none());
        assert_eq!(defaults.registry.base_url(), "https://localhost:5000");
    }

    #[test]
    fn legacy_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("REGISTRY_HOST", "registry.example.com");
            jail.set_env("REGISTRY_PORT", "443");
            jail.set_env("REGISTRY_PROTO", "http");
            jail.set_env("REGISTRY_SSL_VERIFY", "false");

            let config = Configuration::config(Configuration::figment(vec![]))
                .expect("Configuration should be parseable");

            assert_eq!(config.registry.host, "registry.example.com");
            assert_eq!(config.registry.port, 443);
            assert_eq!(config.registry.protocol, Protocol::Http);
            assert!(!config.registry.ssl_verify);

            Ok(())
        });
    }

    #[test]
    fn basic_auth_from_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("USERNAME", "bob");
            jail.set_env("PASSWORD", "hunter2");

            let config = Configuration::config(Configuration::figment(vec![]))
                .expect("Configuration should be parseable");

            let auth = config.authentication.expect("Authentication should be set");
            assert_eq!(auth.username, "bob");
            assert_eq!(auth.password, "hunter2");

            Ok(())
        });
    }

    #[test]
    fn nested_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CRANE_LISTEN__PORT", "8080");
            jail.set_env("CRANE_REGISTRY__TIMEOUT", "3");

            let config = Configuration::config(Configuration::figment(vec![]))
                .expect("Configuration should be parseable");

            assert_eq!(config.listen.port, 8080);
            assert_eq!(config.registry.timeout, Duration::from_secs(3));

            Ok(())
        });
    }

    /// Later files override earlier ones
    #[test]
    fn stacking() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "base.yaml",
                r#"
                registry:
                  host: base.example.com
                  port: 5001
                "#,
            )?;

            jail.create_file(
                "override.yaml",
                r#"
                registry:
                  host: override.example.com
                prometheus:
                  address: 127.0.0.1
                  port: 9999
                "#,
            )?;

            let config = Configuration::config(Configuration::figment(vec![
                jail.directory().join("base.yaml"),
                jail.directory().join("override.yaml"),
            ]))
            .expect("Configuration should be parseable");

            assert_eq!(config.registry.host, "override.example.com");
            assert_eq!(config.registry.port, 5001);
            assert_eq!(config.prometheus.expect("prometheus is set").port, 9999);

            Ok(())
        });
    }

    #[test]
    fn rejects_empty_host() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "registry:\n  host: ''\n")?;

            let result = Configuration::config(Configuration::figment(vec![
                jail.directory().join("config.yaml"),
            ]));
            assert!(result.is_err());

            Ok(())
        });
    }
}

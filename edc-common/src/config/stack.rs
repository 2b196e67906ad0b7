//! Stack configuration: which Helm charts make up the EDC deployment.
//!
//! Loaded from an optional TOML file. Every table has defaults, so an empty
//! file (or no file) yields the standard stack: ingress-nginx, cert-manager,
//! Vault and PostgreSQL as infrastructure, plus the Tractus-X connector.

use super::source::ConfigSource;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading the stack configuration.
#[derive(Debug, Error)]
pub enum StackConfigError {
    #[error("Stack configuration not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid stack configuration: {0}")]
    Invalid(String),
}

/// One Helm chart to install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Release name (also the component's display name).
    pub name: String,
    /// Local name for the Helm repository.
    pub repo_name: String,
    /// Helm repository URL.
    pub repo_url: String,
    /// Chart reference, `<repo_name>/<chart>`.
    pub chart: String,
    /// Pinned chart version.
    #[serde(default)]
    pub version: Option<String>,
    /// Namespace the release lives in.
    pub namespace: String,
    /// Values passed with `--set`.
    #[serde(default)]
    pub set: BTreeMap<String, String>,
    /// Values files passed with `-f`.
    #[serde(default)]
    pub values: Vec<PathBuf>,
}

impl ComponentConfig {
    fn new(name: &str, repo_name: &str, repo_url: &str, chart: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            repo_name: repo_name.to_string(),
            repo_url: repo_url.to_string(),
            chart: chart.to_string(),
            version: None,
            namespace: namespace.to_string(),
            set: BTreeMap::new(),
            values: Vec::new(),
        }
    }

    fn with_set(mut self, key: &str, value: &str) -> Self {
        self.set.insert(key.to_string(), value.to_string());
        self
    }
}

/// cert-manager ClusterIssuer applied after the infrastructure charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterIssuerConfig {
    pub name: String,
    /// ACME account email. Without it the issuer is not created.
    pub email: Option<String>,
    pub server: String,
    pub ingress_class: String,
}

impl Default for ClusterIssuerConfig {
    fn default() -> Self {
        Self {
            name: "letsencrypt-prod".to_string(),
            email: None,
            server: "https://acme-v02.api.letsencrypt.org/directory".to_string(),
            ingress_class: "nginx".to_string(),
        }
    }
}

/// The full deployment stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Connector chart. Its `name` and `namespace` are the CLI defaults
    /// for `--release` and `--namespace`.
    pub connector: ComponentConfig,
    /// Supporting charts, installed in order by `--with-infra`.
    pub infra: Vec<ComponentConfig>,
    pub cluster_issuer: ClusterIssuerConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            connector: ComponentConfig::new(
                "edc",
                "tractusx-edc",
                "https://eclipse-tractusx.github.io/charts/dev",
                "tractusx-edc/tractusx-connector",
                "edc",
            ),
            infra: vec![
                ComponentConfig::new(
                    "ingress-nginx",
                    "ingress-nginx",
                    "https://kubernetes.github.io/ingress-nginx",
                    "ingress-nginx/ingress-nginx",
                    "ingress-nginx",
                ),
                ComponentConfig::new(
                    "cert-manager",
                    "jetstack",
                    "https://charts.jetstack.io",
                    "jetstack/cert-manager",
                    "cert-manager",
                )
                .with_set("crds.enabled", "true"),
                ComponentConfig::new(
                    "vault",
                    "hashicorp",
                    "https://helm.releases.hashicorp.com",
                    "hashicorp/vault",
                    "edc",
                )
                .with_set("server.dev.enabled", "true"),
                ComponentConfig::new(
                    "postgresql",
                    "bitnami",
                    "https://charts.bitnami.com/bitnami",
                    "bitnami/postgresql",
                    "edc",
                ),
            ],
            cluster_issuer: ClusterIssuerConfig::default(),
        }
    }
}

impl StackConfig {
    /// Default location: `<config-dir>/edcctl/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("edcctl").join("config.toml"))
    }

    /// Load the stack.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used if present, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource), StackConfigError> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(StackConfigError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                path.to_path_buf()
            }
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => return Ok((Self::default(), ConfigSource::Default)),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| StackConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|err| match err {
            StackConfigError::Parse { source, .. } => StackConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;

        tracing::debug!(path = %path.display(), "Loaded stack configuration");
        Ok((config, ConfigSource::File))
    }

    /// Parse and validate TOML content.
    pub fn parse(content: &str) -> Result<Self, StackConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| StackConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check names are present and unique and charts are set.
    pub fn validate(&self) -> Result<(), StackConfigError> {
        let mut seen = HashSet::new();
        for component in std::iter::once(&self.connector).chain(self.infra.iter()) {
            if component.name.trim().is_empty() {
                return Err(StackConfigError::Invalid(
                    "component with empty name".to_string(),
                ));
            }
            if !seen.insert((component.namespace.as_str(), component.name.as_str())) {
                return Err(StackConfigError::Invalid(format!(
                    "duplicate component '{}' in namespace '{}'",
                    component.name, component.namespace
                )));
            }
            if component.chart.trim().is_empty() || component.repo_url.trim().is_empty() {
                return Err(StackConfigError::Invalid(format!(
                    "component '{}' needs both chart and repo_url",
                    component.name
                )));
            }
            if component.namespace.trim().is_empty() {
                return Err(StackConfigError::Invalid(format!(
                    "component '{}' has an empty namespace",
                    component.name
                )));
            }
        }
        Ok(())
    }

    /// Distinct `(repo_name, repo_url)` pairs, in first-use order.
    pub fn repositories<'a>(
        &'a self,
        components: impl IntoIterator<Item = &'a ComponentConfig>,
    ) -> Vec<(&'a str, &'a str)> {
        let mut seen = HashSet::new();
        components
            .into_iter()
            .filter(|c| seen.insert(c.repo_name.as_str()))
            .map(|c| (c.repo_name.as_str(), c.repo_url.as_str()))
            .collect()
    }
}

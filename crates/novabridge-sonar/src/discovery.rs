//! Sonar service discovery.
//!
//! GG publishes its local addresses in `coreProps.json`. The TLS address
//! serves a sub-app registry (`/subApps`) in which Sonar reports its own web
//! server address once it is up.

use std::path::{Path, PathBuf};

use novabridge_db::program_data_dir;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SonarError, SonarResult};
use crate::http::{HttpTransport, Method};

/// Location of `coreProps.json` relative to the program data directory.
const CORE_PROPS_RELATIVE_PATH: &str = "SteelSeries/SteelSeries Engine 3/coreProps.json";

/// Contents of `coreProps.json` that matter here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoreProps {
    /// Plain GameSense address (`host:port`)
    #[serde(default)]
    pub address: Option<String>,
    /// TLS address of the GG web server (`host:port`)
    #[serde(default, rename = "ggEncryptedAddress")]
    pub gg_encrypted_address: Option<String>,
}

impl CoreProps {
    /// Read and parse a core props file.
    ///
    /// # Errors
    /// Returns a discovery error if the file is missing or not valid JSON.
    pub fn read(path: &Path) -> SonarResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            SonarError::CorePropsUnreadable { path: path.to_path_buf(), source }
        })?;
        serde_json::from_str(&content)
            .map_err(|source| SonarError::CorePropsInvalid { path: path.to_path_buf(), source })
    }

    /// `http://` URL of the GameSense server.
    ///
    /// # Errors
    /// Returns [`SonarError::MissingAddress`] if `address` is absent.
    pub fn gamesense_url(&self) -> SonarResult<String> {
        non_empty(self.address.as_deref())
            .map(|address| format!("http://{address}"))
            .ok_or(SonarError::MissingAddress("address"))
    }

    /// `https://` URL of the GG web server.
    ///
    /// # Errors
    /// Returns [`SonarError::MissingAddress`] if `ggEncryptedAddress` is absent.
    pub fn gg_url(&self) -> SonarResult<String> {
        non_empty(self.gg_encrypted_address.as_deref())
            .map(|address| format!("https://{address}"))
            .ok_or(SonarError::MissingAddress("ggEncryptedAddress"))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct SubAppsResponse {
    #[serde(default, rename = "subApps")]
    sub_apps: SubApps,
}

#[derive(Debug, Default, Deserialize)]
struct SubApps {
    sonar: Option<SubApp>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SubApp {
    is_enabled: bool,
    is_ready: bool,
    is_running: bool,
    metadata: SubAppMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SubAppMetadata {
    web_server_address: Option<String>,
}

/// Resolved service addresses. Valid until the next discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEndpoints {
    /// GameSense server, when published
    pub gamesense_url: Option<String>,
    /// GG web server (TLS)
    pub gg_url: String,
    /// Sonar web server, without trailing slash
    pub sonar_url: String,
}

impl ServiceEndpoints {
    /// Endpoints with a known Sonar URL and nothing else.
    #[must_use]
    pub fn with_sonar_url(sonar_url: impl Into<String>) -> Self {
        Self {
            gamesense_url: None,
            gg_url: String::new(),
            sonar_url: sonar_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `http://host:port` of the Sonar server, used for preset selection.
    /// A URL without a port uses its scheme's default.
    ///
    /// # Errors
    /// Returns [`SonarError::Unavailable`] if the Sonar URL cannot be parsed
    /// or has no host or port.
    pub fn local_url(&self) -> SonarResult<String> {
        let unparsable =
            || SonarError::Unavailable(format!("could not parse Sonar server URL: {}", self.sonar_url));
        let url = Url::parse(&self.sonar_url).map_err(|_| unparsable())?;
        match (url.host_str(), url.port_or_known_default()) {
            (Some(host), Some(port)) => Ok(format!("http://{host}:{port}")),
            _ => Err(unparsable()),
        }
    }
}

/// Finds the Sonar server from the core props file.
#[derive(Debug, Clone)]
pub struct ServiceDiscovery {
    core_props_path: PathBuf,
}

impl Default for ServiceDiscovery {
    fn default() -> Self {
        Self::new(Self::default_core_props_path())
    }
}

impl ServiceDiscovery {
    #[must_use]
    pub fn new(core_props_path: impl Into<PathBuf>) -> Self {
        Self { core_props_path: core_props_path.into() }
    }

    /// `%PROGRAMDATA%/SteelSeries/SteelSeries Engine 3/coreProps.json`
    #[must_use]
    pub fn default_core_props_path() -> PathBuf {
        program_data_dir().join(CORE_PROPS_RELATIVE_PATH)
    }

    #[must_use]
    pub fn core_props_path(&self) -> &Path {
        &self.core_props_path
    }

    /// Resolve the service endpoints.
    ///
    /// # Errors
    /// Returns a discovery error if the core props file is unusable or Sonar
    /// is missing, disabled, not ready, not running, or has no address, and a
    /// request error if the registry cannot be queried.
    pub fn discover(&self, http: &dyn HttpTransport) -> SonarResult<ServiceEndpoints> {
        let props = CoreProps::read(&self.core_props_path)?;
        let gg_url = props.gg_url()?;

        let registry_url = format!("{gg_url}/subApps");
        debug!(url = %registry_url, "Querying GG sub-app registry");
        let response = http.request(Method::Get, &registry_url)?;
        let registry: SubAppsResponse = serde_json::from_str(&response.body).map_err(|e| {
            SonarError::Unavailable(format!("malformed /subApps response: {e}"))
        })?;

        let sonar = registry
            .sub_apps
            .sonar
            .ok_or_else(|| SonarError::Unavailable("Sonar missing from /subApps".into()))?;
        if !sonar.is_enabled {
            return Err(SonarError::Unavailable("Sonar is disabled in SteelSeries GG".into()));
        }
        if !sonar.is_ready {
            return Err(SonarError::Unavailable("Sonar is not ready".into()));
        }
        if !sonar.is_running {
            return Err(SonarError::Unavailable("Sonar is not running".into()));
        }
        let sonar_url = non_empty(sonar.metadata.web_server_address.as_deref())
            .ok_or_else(|| SonarError::Unavailable("Sonar web server address missing".into()))?
            .trim_end_matches('/')
            .to_string();

        info!(sonar_url = %sonar_url, "Discovered Sonar");
        Ok(ServiceEndpoints { gamesense_url: props.gamesense_url().ok(), gg_url, sonar_url })
    }
}

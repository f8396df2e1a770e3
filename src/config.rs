//! Configuration file handling.
//!
//! The configuration file is stored at `$ICMS_HOME/config.json` and contains
//! the upstream API settings, the HTTP server settings and the refresh
//! cadence. The data directory also holds the two CSV snapshot files.

use crate::model::Source;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "icms";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";

const DEFAULT_RREO_URL: &str = "https://apidatalake.tesouro.gov.br/ords/siconfi/tt/rreo";
const DEFAULT_ANEXO: &str = "RREO-Anexo 03";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_EXERCICIO: u16 = 2023;
const DEFAULT_PERIODO: u8 = 6;
const DEFAULT_DEMONSTRATIVO: &str = "RREO";
const DEFAULT_ENTE: u32 = 41;
const DEFAULT_REFRESH_HOURS: u64 = 6;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The `Config` object represents the configuration of the app. You
/// instantiate it by providing the path to `$ICMS_HOME` and from there it
/// loads `$ICMS_HOME/config.json`. It also resolves the paths of the CSV
/// snapshot files, which live in the same directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory and writes an initial `config.json` with
    /// default settings. Refuses to overwrite an existing config file.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the icms home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.is_file() {
            bail!(
                "A config file already exists at '{}', delete it first if you want to start over",
                config_path.display()
            );
        }

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    /// Validates that the home directory and config file exist, loads the
    /// config file, and returns the loaded configuration object.
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Icms home is missing, run 'icms init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!(
                "The config file is missing '{}', run 'icms init' first",
                config_path.display()
            );
        }
        let config_file = ConfigFile::load(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The path of a source's CSV snapshot file within the data directory.
    pub fn csv_path(&self, source: Source) -> PathBuf {
        self.root.join(source.csv_filename())
    }

    /// The base URL for a source's fetch. Both default to the Tesouro
    /// datalake RREO endpoint but can be pointed elsewhere independently.
    pub fn base_url(&self, source: Source) -> &str {
        match source {
            Source::Tesouro => &self.config_file.tesouro_url,
            Source::Siconfi => &self.config_file.siconfi_url,
        }
    }

    /// The fixed query parameters sent with every fetch: fiscal year, period
    /// number, report type and entity id.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let f = &self.config_file;
        vec![
            ("an_exercicio".to_string(), f.an_exercicio.to_string()),
            ("nr_periodo".to_string(), f.nr_periodo.to_string()),
            (
                "co_tipo_demonstrativo".to_string(),
                f.co_tipo_demonstrativo.clone(),
            ),
            ("id_ente".to_string(), f.id_ente.to_string()),
        ]
    }

    /// The annex identifier a record must carry to be retained.
    pub fn anexo(&self) -> &str {
        &self.config_file.anexo
    }

    /// The fiscal year being queried.
    pub fn an_exercicio(&self) -> u16 {
        self.config_file.an_exercicio
    }

    pub fn bind_address(&self) -> &str {
        &self.config_file.bind_address
    }

    /// The value served in `Access-Control-Allow-Origin`. `*` is acceptable
    /// for this public dataset; set the deployed frontend origin to restrict.
    pub fn allowed_origin(&self) -> &str {
        &self.config_file.allowed_origin
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.config_file.refresh_hours * 60 * 60)
    }

    /// Upper bound on a single upstream request.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.http_timeout_secs)
    }
}

/// Represents the serialization and deserialization format of the
/// configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "icms",
///   "config_version": 1,
///   "tesouro_url": "https://apidatalake.tesouro.gov.br/ords/siconfi/tt/rreo",
///   "siconfi_url": "https://apidatalake.tesouro.gov.br/ords/siconfi/tt/rreo",
///   "an_exercicio": 2023,
///   "nr_periodo": 6,
///   "co_tipo_demonstrativo": "RREO",
///   "id_ente": 41,
///   "anexo": "RREO-Anexo 03",
///   "bind_address": "0.0.0.0:3000",
///   "allowed_origin": "*",
///   "refresh_hours": 6,
///   "http_timeout_secs": 30
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "icms"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL for the Tesouro fetch
    #[serde(default = "default_url")]
    tesouro_url: String,

    /// Base URL for the SICONFI fetch
    #[serde(default = "default_url")]
    siconfi_url: String,

    /// Fiscal year (an_exercicio query parameter)
    #[serde(default = "default_exercicio")]
    an_exercicio: u16,

    /// Reporting period number (nr_periodo query parameter)
    #[serde(default = "default_periodo")]
    nr_periodo: u8,

    /// Report type (co_tipo_demonstrativo query parameter)
    #[serde(default = "default_demonstrativo")]
    co_tipo_demonstrativo: String,

    /// Federative entity id (id_ente query parameter), 41 = Paraná
    #[serde(default = "default_ente")]
    id_ente: u32,

    /// Annex identifier used by the record filter
    #[serde(default = "default_anexo")]
    anexo: String,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    bind_address: String,

    /// Access-Control-Allow-Origin value, `*` or a specific origin
    #[serde(default = "default_allowed_origin")]
    allowed_origin: String,

    /// Hours between refresh cycles
    #[serde(default = "default_refresh_hours")]
    refresh_hours: u64,

    /// Per-request timeout for upstream fetches, in seconds
    #[serde(default = "default_timeout_secs")]
    http_timeout_secs: u64,
}

fn default_url() -> String {
    DEFAULT_RREO_URL.to_string()
}

fn default_exercicio() -> u16 {
    DEFAULT_EXERCICIO
}

fn default_periodo() -> u8 {
    DEFAULT_PERIODO
}

fn default_demonstrativo() -> String {
    DEFAULT_DEMONSTRATIVO.to_string()
}

fn default_ente() -> u32 {
    DEFAULT_ENTE
}

fn default_anexo() -> String {
    DEFAULT_ANEXO.to_string()
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

fn default_refresh_hours() -> u64 {
    DEFAULT_REFRESH_HOURS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            tesouro_url: default_url(),
            siconfi_url: default_url(),
            an_exercicio: DEFAULT_EXERCICIO,
            nr_periodo: DEFAULT_PERIODO,
            co_tipo_demonstrativo: DEFAULT_DEMONSTRATIVO.to_string(),
            id_ente: DEFAULT_ENTE,
            anexo: DEFAULT_ANEXO.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            allowed_origin: default_allowed_origin(),
            refresh_hours: DEFAULT_REFRESH_HOURS,
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

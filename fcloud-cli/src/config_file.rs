//! Config file loading and editing
//!
//! The config is a TOML file with an `[fcloud]` section (service, main
//! folder, link extension) and one section per provider holding its auth
//! payload. All parsing and validation happens here; the core only ever
//! receives the validated `Config` value object and a constructed backend.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use fcloud_core::config::DEFAULT_CFL_EXTENSION;
use fcloud_core::{Config, FcloudError, FcloudResult, RemotePath};
use fcloud_providers::{DropboxAuth, ProviderAuth, YandexAuth, AVAILABLE_PROVIDERS};

/// Environment override for the config file location.
pub const CONFIG_ENV: &str = "FCLOUD_CONFIG";

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    pub fcloud: FcloudSection,
    pub dropbox: Option<DropboxSection>,
    pub yandex: Option<YandexSection>,
}

#[derive(Debug, Deserialize)]
pub struct FcloudSection {
    pub service: String,
    pub main_folder: String,
    #[serde(default = "default_extension")]
    pub cfl_extension: String,
    pub chunk_size: Option<usize>,
}

fn default_extension() -> String {
    DEFAULT_CFL_EXTENSION.to_string()
}

#[derive(Debug, Deserialize)]
pub struct DropboxSection {
    pub refresh_token: String,
    pub app_key: String,
    pub app_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct YandexSection {
    pub token: String,
}

/// Config file location: `$FCLOUD_CONFIG` when set, otherwise the platform
/// config directory.
pub fn config_path() -> FcloudResult<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    directories::ProjectDirs::from("", "", "fcloud")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .ok_or_else(|| {
            FcloudError::InvalidArgument(
                format!("no config directory available; set ${CONFIG_ENV}"),
            )
        })
}

pub fn load(path: &Path) -> FcloudResult<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FcloudError::FileNotFound(format!(
                "config file {}; create it or set ${CONFIG_ENV}",
                path.display()
            ))
        } else {
            FcloudError::from_io(e, path)
        }
    })?;
    toml::from_str(&content)
        .map_err(|e| FcloudError::InvalidArgument(format!("{}: {e}", path.display())))
}

/// Validate the parsed file into the engine config plus the auth payload
/// for the selected provider.
pub fn resolve(file: FileConfig) -> FcloudResult<(Config, ProviderAuth)> {
    let service = file.fcloud.service.trim().to_lowercase();
    if !AVAILABLE_PROVIDERS.contains(&service.as_str()) {
        return Err(FcloudError::InvalidArgument(format!(
            "unknown service '{service}'; available: {}",
            AVAILABLE_PROVIDERS.join(", ")
        )));
    }

    let main_folder = file.fcloud.main_folder.trim();
    if main_folder.is_empty() || main_folder == "." {
        return Err(FcloudError::InvalidArgument(
            "main_folder is empty; use 'fcloud config set fcloud main_folder <value>'".into(),
        ));
    }

    if file.fcloud.cfl_extension.is_empty() {
        return Err(FcloudError::InvalidArgument(
            "cfl_extension is empty; use 'fcloud config set fcloud cfl_extension <value>'".into(),
        ));
    }

    let auth = match service.as_str() {
        "dropbox" => {
            let section = file.dropbox.ok_or_else(|| missing_section("dropbox"))?;
            ProviderAuth::Dropbox(DropboxAuth {
                refresh_token: section.refresh_token,
                app_key: section.app_key,
                app_secret: section.app_secret,
            })
        }
        "yandex" => {
            let section = file.yandex.ok_or_else(|| missing_section("yandex"))?;
            ProviderAuth::Yandex(YandexAuth { token: section.token })
        }
        _ => unreachable!("validated above"),
    };

    let mut config = Config::new(RemotePath::new(main_folder), file.fcloud.cfl_extension);
    if let Some(chunk_size) = file.fcloud.chunk_size {
        config = config.with_chunk_size(chunk_size);
    }
    Ok((config, auth))
}

fn missing_section(section: &str) -> FcloudError {
    FcloudError::InvalidArgument(format!(
        "config has no [{section}] section for the selected service"
    ))
}

/// Read one raw value, for `fcloud config get`.
pub fn get_value(path: &Path, section: &str, key: &str) -> FcloudResult<String> {
    let table = read_table(path)?;
    table
        .get(section)
        .and_then(|s| s.get(key))
        .map(render_value)
        .ok_or_else(|| {
            FcloudError::InvalidArgument(format!("no value for {section}.{key}"))
        })
}

/// Write one value, for `fcloud config set`. Creates the file and section
/// when missing.
pub fn set_value(path: &Path, section: &str, key: &str, value: &str) -> FcloudResult<()> {
    let mut table = if path.exists() {
        read_table(path)?
    } else {
        toml::Table::new()
    };

    let entry = table
        .entry(section.to_string())
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    let toml::Value::Table(section_table) = entry else {
        return Err(FcloudError::InvalidArgument(format!(
            "'{section}' is not a section"
        )));
    };
    section_table.insert(key.to_string(), toml::Value::String(value.to_string()));

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FcloudError::from_io(e, parent))?;
    }
    let rendered = toml::to_string_pretty(&table)
        .map_err(|e| FcloudError::InvalidArgument(e.to_string()))?;
    std::fs::write(path, rendered).map_err(|e| FcloudError::from_io(e, path))
}

fn read_table(path: &Path) -> FcloudResult<toml::Table> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FcloudError::FileNotFound(format!("config file {}", path.display()))
        } else {
            FcloudError::from_io(e, path)
        }
    })?;
    content
        .parse::<toml::Table>()
        .map_err(|e| FcloudError::InvalidArgument(format!("{}: {e}", path.display())))
}

fn render_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use companion_client::{BackendConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, StudentProfile};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use gpui::*;
use gpui_component::{Theme, ThemeMode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::{ResultExt, Snafu};

pub const SETTINGS_DIRECTORY_NAME: &str = "career-companion";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// Environment variables with this prefix override file values.
pub const ENV_PREFIX: &str = "COMPANION_";

/// Persisted widget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(
        default = "default_theme_mode",
        serialize_with = "serialize_theme_mode",
        deserialize_with = "deserialize_theme_mode"
    )]
    pub theme_mode: ThemeMode,
    #[serde(default)]
    pub profile: StudentProfile,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            theme_mode: default_theme_mode(),
            profile: StudentProfile::default(),
        }
    }
}

impl WidgetSettings {
    pub fn normalized(mut self) -> Self {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        self.endpoint = if endpoint.is_empty() {
            default_endpoint()
        } else {
            endpoint.to_string()
        };
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::new(self.endpoint.clone(), self.request_timeout())
    }

    pub fn apply_theme(&self, window: Option<&mut Window>, cx: &mut App) {
        Theme::change(self.theme_mode, window, cx);
    }
}

/// Loads, holds and persists [`WidgetSettings`].
///
/// Reads go through an `ArcSwap` so callers can keep a snapshot while the
/// store is updated.
pub struct SettingsStore {
    settings: Arc<ArcSwap<WidgetSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".career-companion"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    /// Loads from the default location, writing defaults there on first run.
    pub fn load() -> Self {
        let config_path = Self::default_config_path();
        let first_run = !config_path.exists();
        let store = Self::new(config_path);

        if first_run && let Err(error) = store.persist(&WidgetSettings::default()) {
            tracing::warn!("failed to write default settings: {error}");
        }

        store
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<WidgetSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: WidgetSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn load_from_disk(path: &Path) -> WidgetSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }

        let figment = Figment::from(Serialized::defaults(WidgetSettings::default()))
            .merge(Json::file(path))
            .merge(env_overrides());

        match figment.extract::<WidgetSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults with environment overrides",
                    path,
                    error
                );
                Self::load_without_file()
            }
        }
    }

    fn load_without_file() -> WidgetSettings {
        let figment = Figment::from(Serialized::defaults(WidgetSettings::default()))
            .merge(env_overrides());

        match figment.extract::<WidgetSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!("failed to apply environment overrides: {error}. using defaults");
                WidgetSettings::default()
            }
        }
    }

    fn persist(&self, settings: &WidgetSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

fn default_endpoint() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_theme_mode() -> ThemeMode {
    ThemeMode::Light
}

fn serialize_theme_mode<S>(value: &ThemeMode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(if value.is_dark() { "dark" } else { "light" })
}

fn deserialize_theme_mode<'de, D>(deserializer: D) -> Result<ThemeMode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(parse_theme_mode(&value))
}

fn parse_theme_mode(value: &str) -> ThemeMode {
    if value.trim().eq_ignore_ascii_case("dark") {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[::core::prelude::v1::test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let store = SettingsStore::new(jail.directory().join(SETTINGS_FILE_NAME));
            let settings = store.settings();

            assert_eq!(settings.endpoint, "http://localhost:8000");
            assert_eq!(settings.request_timeout_secs, 30);
            assert!(!settings.theme_mode.is_dark());
            assert_eq!(settings.profile, StudentProfile::default());
            Ok(())
        });
    }

    #[::core::prelude::v1::test]
    fn file_values_and_env_overrides_are_merged() {
        Jail::expect_with(|jail| {
            jail.create_file(
                SETTINGS_FILE_NAME,
                r#"{
                    "endpoint": "http://campus.local:9000/",
                    "theme_mode": "dark",
                    "profile": {
                        "student_id": "EC2022042",
                        "name": "Priya",
                        "dept": "ECE",
                        "cgpa": 8.9,
                        "year": 2
                    }
                }"#,
            )?;
            jail.set_env("COMPANION_REQUEST_TIMEOUT_SECS", "5");
            jail.set_env("COMPANION_PROFILE__NAME", "Priya S");

            let store = SettingsStore::new(jail.directory().join(SETTINGS_FILE_NAME));
            let settings = store.settings();

            assert_eq!(settings.endpoint, "http://campus.local:9000");
            assert_eq!(settings.request_timeout_secs, 5);
            assert!(settings.theme_mode.is_dark());
            assert_eq!(settings.profile.student_id, "EC2022042");
            assert_eq!(settings.profile.name, "Priya S");
            // Profile fields absent from the file keep their defaults.
            assert_eq!(settings.profile.skills, "Python, Java");
            assert_eq!(settings.backend_config().port(), 9000);
            Ok(())
        });
    }

    #[::core::prelude::v1::test]
    fn unparsable_file_falls_back_to_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(SETTINGS_FILE_NAME, "{ not json")?;

            let store = SettingsStore::new(jail.directory().join(SETTINGS_FILE_NAME));
            assert_eq!(*store.settings(), WidgetSettings::default());
            Ok(())
        });
    }

    #[::core::prelude::v1::test]
    fn unparsable_file_keeps_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(SETTINGS_FILE_NAME, "{ not json")?;
            jail.set_env("COMPANION_ENDPOINT", "http://campus.local:9000/");

            let store = SettingsStore::new(jail.directory().join(SETTINGS_FILE_NAME));
            let settings = store.settings();

            assert_eq!(settings.endpoint, "http://campus.local:9000");
            assert_eq!(settings.request_timeout_secs, 30);
            assert_eq!(settings.profile, StudentProfile::default());
            Ok(())
        });
    }

    #[::core::prelude::v1::test]
    fn update_persists_and_reloads() {
        Jail::expect_with(|_jail| {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);
            let store = SettingsStore::new(path.clone());

            let updated = WidgetSettings {
                endpoint: "  http://127.0.0.1:8123/  ".to_string(),
                request_timeout_secs: 0,
                theme_mode: ThemeMode::Dark,
                profile: StudentProfile::default().with_arrears(2),
            };
            store.update(updated).expect("settings should persist");

            assert_eq!(store.settings().endpoint, "http://127.0.0.1:8123");
            assert_eq!(store.settings().request_timeout_secs, 1);

            let reloaded = SettingsStore::new(path);
            assert_eq!(*reloaded.settings(), *store.settings());
            assert_eq!(reloaded.settings().profile.arrears_count, Some(2));
            Ok(())
        });
    }

    #[::core::prelude::v1::test]
    fn theme_mode_parsing_is_lenient() {
        assert!(parse_theme_mode(" DARK ").is_dark());
        assert!(!parse_theme_mode("light").is_dark());
        assert!(!parse_theme_mode("sepia").is_dark());
    }
}

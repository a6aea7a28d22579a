use sceneview_common::{Color, Viewport};
use sceneview_input::KeyBindings;
use sceneview_render::CameraConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or writing viewer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Top-level viewer configuration.
///
/// Every section is optional in YAML; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub clear_color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl WindowConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "SceneView".into(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Start with the cursor captured and free-look active.
    pub start_captured: bool,
    /// A `bindings` map in YAML replaces the default table entirely.
    pub bindings: KeyBindings,
}

impl ViewerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded viewer config");
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceneview_common::Key;
    use sceneview_input::Action;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ViewerConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.camera.base_speed, 2.5);
        assert_eq!(config.window.viewport(), Viewport::new(1280, 720));
        assert_eq!(config.clear_color, Color::CORNFLOWER_BLUE);
        assert!(!config.input.start_captured);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "
camera:
  base_speed: 5.0
  normalize_diagonal: false
window:
  title: Test
";
        let config = ViewerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.camera.base_speed, 5.0);
        assert!(!config.camera.normalize_diagonal);
        assert_eq!(config.camera.sensitivity, 0.1);
        assert_eq!(config.window.title, "Test");
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn bindings_override_replaces_table() {
        let yaml = "
input:
  start_captured: true
  bindings:
    Up: MoveForward
    Q: Quit
";
        let config = ViewerConfig::from_yaml_str(yaml).unwrap();
        let bindings = &config.input.bindings;
        assert!(config.input.start_captured);
        assert_eq!(bindings.action_for(Key::Up), Some(Action::MoveForward));
        assert_eq!(bindings.action_for(Key::Q), Some(Action::Quit));
        assert_eq!(bindings.action_for(Key::W), None);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let err = ViewerConfig::from_yaml_str("camera: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn save_and_load_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut config = ViewerConfig::default();
        config.camera.base_speed = 7.5;
        config.save(tmp.path()).unwrap();

        let loaded = ViewerConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ViewerConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_or_default_without_path() {
        assert_eq!(ViewerConfig::load_or_default(None).unwrap(), ViewerConfig::default());
    }
}

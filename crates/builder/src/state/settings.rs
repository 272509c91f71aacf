//! Application settings

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Ground grid settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Show grid
    pub visible: bool,
    /// Side length of the ground and grid
    pub size: f32,
    /// Number of cells along each side
    pub divisions: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            visible: true,
            size: 30.0,
            divisions: 30,
        }
    }
}

/// Viewport colors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Background color (RGB)
    pub background_color: [u8; 3],
    /// Outline color of the selected object (RGB)
    pub selection_color: [u8; 3],
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            background_color: [240, 240, 240],
            selection_color: [255, 170, 0],
        }
    }
}

/// Initial camera
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            position: [0.0, 2.0, 5.0],
            target: [0.0, 0.0, 0.0],
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Exported document settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Page title
    pub title: String,
    /// ES module URL of three.js
    pub three_module_url: String,
    /// ES module URL of OrbitControls
    pub orbit_controls_url: String,
    /// Suggested file name in the save dialog
    pub file_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            title: "My 3D Scene".to_string(),
            three_module_url: "https://cdn.skypack.dev/three@0.152.2".to_string(),
            orbit_controls_url:
                "https://unpkg.com/three@0.152.2/examples/jsm/controls/OrbitControls.js?module"
                    .to_string(),
            file_name: "scene.html".to_string(),
        }
    }
}

/// UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Base font size in points
    pub font_size: f32,
    /// Show the welcome popup on start
    pub show_welcome: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            show_welcome: true,
        }
    }
}

/// All application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub grid: GridSettings,
    pub viewport: ViewportSettings,
    pub camera: CameraSettings,
    pub export: ExportSettings,
    pub ui: UiSettings,
}

impl AppSettings {
    /// Read settings from a JSON file, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring malformed settings {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    #[cfg(feature = "desktop")]
    fn config_path() -> Option<std::path::PathBuf> {
        directories::ProjectDirs::from("com", "scene-builder", "scene-builder")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from the user config directory
    #[cfg(feature = "desktop")]
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Save settings to the user config directory
    #[cfg(feature = "desktop")]
    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                tracing::warn!("Failed to save settings: {e}");
            }
        }
    }
}

use std::path::PathBuf;

const ASSET_DIR_VAR: &str = "NOCTURNE_ASSET_DIR";
const STORE_DIR_VAR: &str = "NOCTURNE_STORE_DIR";
const CAMERA_INDEX_VAR: &str = "NOCTURNE_CAMERA_INDEX";
const PORTRAIT_CAMERA_VAR: &str = "NOCTURNE_PORTRAIT_CAMERA";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a camera index, got {value:?}")]
    CameraIndex { var: &'static str, value: String },
    #[error("{var} must be true or false, got {value:?}")]
    Flag { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoothConfig {
    /// Root of the `frames/` and `overlay/` artwork.
    pub asset_dir: PathBuf,
    /// Where the photo handoff is kept between screens.
    pub store_dir: PathBuf,
    /// Camera to preselect on the frame selection screen.
    pub camera_index: Option<usize>,
    /// The camera is mounted rotated, so vertical templates ask for a
    /// portrait stream.
    pub portrait_mount: bool,
}

impl BoothConfig {
    /// Reads the configuration from the environment, after loading a `.env`
    /// file from the working directory if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded {}", path.display()),
            Err(err) if err.not_found() => {}
            Err(err) => log::warn!("Ignoring .env file: {}", err),
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let asset_dir = lookup(ASSET_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("assets"));
        let store_dir = lookup(STORE_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_store_dir);
        let camera_index = lookup(CAMERA_INDEX_VAR)
            .map(|value| {
                value.trim().parse().map_err(|_| ConfigError::CameraIndex {
                    var: CAMERA_INDEX_VAR,
                    value,
                })
            })
            .transpose()?;
        let portrait_mount = match lookup(PORTRAIT_CAMERA_VAR).as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::Flag {
                    var: PORTRAIT_CAMERA_VAR,
                    value: other.to_string(),
                })
            }
        };

        Ok(BoothConfig {
            asset_dir,
            store_dir,
            camera_index,
            portrait_mount,
        })
    }
}

fn default_store_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("nocturne-booth")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<BoothConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BoothConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.asset_dir, PathBuf::from("assets"));
        assert!(config.store_dir.ends_with("nocturne-booth"));
        assert_eq!(config.camera_index, None);
        assert!(!config.portrait_mount);
    }

    #[test]
    fn overrides() {
        let config = config(&[
            (ASSET_DIR_VAR, "/srv/booth/assets"),
            (STORE_DIR_VAR, "/tmp/booth"),
            (CAMERA_INDEX_VAR, " 2 "),
            (PORTRAIT_CAMERA_VAR, "true"),
        ])
        .unwrap();
        assert_eq!(config.asset_dir, PathBuf::from("/srv/booth/assets"));
        assert_eq!(config.store_dir, PathBuf::from("/tmp/booth"));
        assert_eq!(config.camera_index, Some(2));
        assert!(config.portrait_mount);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config(&[(CAMERA_INDEX_VAR, "front")]),
            Err(ConfigError::CameraIndex { .. })
        ));
        assert!(matches!(
            config(&[(PORTRAIT_CAMERA_VAR, "sideways")]),
            Err(ConfigError::Flag { .. })
        ));
    }
}

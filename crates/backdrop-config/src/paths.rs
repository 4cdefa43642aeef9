//! Where settings and media live on disk.

use std::path::PathBuf;

use color_eyre::eyre::{Result, eyre};
use directories::ProjectDirs;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "BACKDROP_CONFIG";

/// Resolved storage locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// The settings TOML file.
    pub settings_file: PathBuf,
    /// Root for the local store, blob stores and the log file.
    pub data_dir: PathBuf,
}

impl Paths {
    /// Resolve locations, preferring explicit overrides, then
    /// `BACKDROP_CONFIG`, then the platform project directories.
    pub fn resolve(settings_file: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let settings_file =
            settings_file.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        if let (Some(settings_file), Some(data_dir)) = (&settings_file, &data_dir) {
            return Ok(Self {
                settings_file: settings_file.clone(),
                data_dir: data_dir.clone(),
            });
        }

        let dirs = ProjectDirs::from("com", "am2rican5", "backdrop")
            .ok_or_else(|| eyre!("unable to locate a home directory"))?;

        Ok(Self {
            settings_file: settings_file
                .unwrap_or_else(|| dirs.config_dir().join("settings.toml")),
            data_dir: data_dir.unwrap_or_else(|| dirs.data_dir().to_path_buf()),
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("backdrop.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_paths_win() {
        let paths = Paths::resolve(
            Some(PathBuf::from("/tmp/b/settings.toml")),
            Some(PathBuf::from("/tmp/b/data")),
        )
        .unwrap();
        assert_eq!(paths.settings_file, PathBuf::from("/tmp/b/settings.toml"));
        assert_eq!(paths.log_file(), PathBuf::from("/tmp/b/data/backdrop.log"));
    }
}

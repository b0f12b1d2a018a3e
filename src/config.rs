use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Path to the user config file: `$HOME/.config/sub-rename.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// Get the user config file path if the home directory is known.
#[must_use]
pub fn config_path() -> Option<&'static Path> {
    CONFIG_PATH.as_deref()
}

/// Read the content of the given config file.
///
/// A missing file is not an error and returns `None`.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn read_config_file(path: &Path) -> anyhow::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(anyhow::anyhow!(
            "Failed to read config file {}: {error}",
            path.display()
        )),
    }
}

#[cfg(test)]
mod config_file_tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn missing_file_is_none() {
        let dir = tempdir().unwrap();
        let content = read_config_file(&dir.path().join("missing.toml")).unwrap();
        assert!(content.is_none());
    }

    #[test]
    fn reads_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[subrename]\nverbose = true\n").unwrap();
        let content = read_config_file(&path).unwrap();
        assert_eq!(content.as_deref(), Some("[subrename]\nverbose = true\n"));
    }

    #[test]
    fn directory_is_read_error() {
        let dir = tempdir().unwrap();
        assert!(read_config_file(dir.path()).is_err());
    }

    #[test]
    fn config_path_uses_package_name() {
        if let Some(path) = config_path() {
            assert!(path.ends_with(".config/sub-rename.toml"));
        }
    }
}

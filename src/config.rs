//! Run configuration.
//!
//! Values come from an optional `config.toml` (platform config dir, or an
//! explicit `--config` path) and are then overridden by CLI flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::archive::ArchiveWriter;
use crate::error::ConfigError;
use crate::fetch::fetcher::Fetcher;
use crate::fetch::file::JsonFileFetcher;
use crate::platform::Platform;
use crate::store::sqlite::DB_FILE_NAME;

const DEFAULT_OUTPUT_DIR: &str = "site";
const DEFAULT_IMAGE_EXTENSION: &str = "webp";
const DEFAULT_LIST_LIMIT: usize = 60;

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub history_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub image_extension: Option<String>,
    pub list_limit: Option<usize>,
    pub epic: Option<PathBuf>,
    pub steam: Option<PathBuf>,
    pub psn: Option<PathBuf>,
}

impl FileConfig {
    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub history_dir: PathBuf,
    pub output_dir: PathBuf,
    pub image_extension: String,
    pub list_limit: usize,
    pub epic_input: Option<PathBuf>,
    pub steam_input: Option<PathBuf>,
    pub psn_input: Option<PathBuf>,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "freebies")
}

/// `~/.config/freebies/config.toml` or platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// `~/.local/share/freebies/history` or platform equivalent.
pub fn default_history_dir() -> Result<PathBuf, ConfigError> {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("history"))
        .ok_or(ConfigError::NoProjectDirs("data"))
}

impl Config {
    /// Load from an explicit path (must exist) or from the default location
    /// (used only when present).
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) => FileConfig::read(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => FileConfig::read(&path)?,
                None => FileConfig::default(),
            },
        };
        Self::from_file(file)
    }

    pub fn from_file(file: FileConfig) -> Result<Self, ConfigError> {
        let history_dir = match file.history_dir {
            Some(dir) => dir,
            None => default_history_dir()?,
        };

        Ok(Config {
            history_dir,
            output_dir: file.output_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            image_extension: file
                .image_extension
                .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string()),
            list_limit: file.list_limit.unwrap_or(DEFAULT_LIST_LIMIT),
            epic_input: file.epic,
            steam_input: file.steam,
            psn_input: file.psn,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.history_dir.join(DB_FILE_NAME)
    }

    /// Where the raw dump for `platform` is read from. Defaults to the file
    /// the scraper writes into the output directory.
    pub fn input_path(&self, platform: Platform) -> PathBuf {
        let configured = match platform {
            Platform::Epic => &self.epic_input,
            Platform::Steam => &self.steam_input,
            Platform::Psn => &self.psn_input,
        };
        configured
            .clone()
            .unwrap_or_else(|| self.output_dir.join(platform.dump_file_name()))
    }

    pub fn fetchers(&self) -> Vec<Box<dyn Fetcher>> {
        Platform::ALL
            .into_iter()
            .map(|platform| {
                let fetcher = JsonFileFetcher::new(platform, self.input_path(platform));
                Box::new(fetcher) as Box<dyn Fetcher>
            })
            .collect()
    }

    pub fn archive_writer(&self) -> ArchiveWriter {
        ArchiveWriter::new(&self.history_dir, &self.image_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(text: &str) -> Config {
        Config::from_file(FileConfig::parse(text, Path::new("config.toml")).unwrap()).unwrap()
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let cfg = config("history_dir = \"/srv/freebies/history\"");
        assert_eq!(cfg.history_dir, PathBuf::from("/srv/freebies/history"));
        assert_eq!(cfg.output_dir, PathBuf::from("site"));
        assert_eq!(cfg.image_extension, "webp");
        assert_eq!(cfg.list_limit, 60);
        assert_eq!(cfg.db_path(), PathBuf::from("/srv/freebies/history/history.db"));
    }

    #[test]
    fn input_paths_default_to_output_dir() {
        let cfg = config(
            r#"
            history_dir = "history"
            output_dir = "public"
            psn = "/tmp/psn-dump.json"
            "#,
        );
        assert_eq!(cfg.input_path(Platform::Epic), PathBuf::from("public/EPIC.json"));
        assert_eq!(cfg.input_path(Platform::Steam), PathBuf::from("public/STEAM.json"));
        assert_eq!(cfg.input_path(Platform::Psn), PathBuf::from("/tmp/psn-dump.json"));
        assert_eq!(cfg.fetchers().len(), 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FileConfig::parse("histroy_dir = \"x\"", Path::new("config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let text = "history_dir = \"h\"\nimage_extension = \"png\"\nlist_limit = 5\n";
        fs::write(&path, text).unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.image_extension, "png");
        assert_eq!(cfg.list_limit, 5);
    }
}

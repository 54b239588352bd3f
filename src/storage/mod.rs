use std::fmt::Display;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

mod format;
mod pattern;

pub use pattern::SectionPattern;

pub const DEFAULT_STORE_FILE: &str = "position.ini";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write store file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed store content at line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn set(&mut self, key: &str, value: String) {
        match self.entries.iter_mut().find(|(name, _)| name == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }
}

/// Sectioned, insertion-ordered key/value store backing `position.ini`.
///
/// Values are kept as strings; typed access parses on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Store {
    sections: Vec<Section>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path`, yielding an empty store when the file does not exist.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "store file absent; starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let store = Self::parse(&contents)?;
        tracing::debug!(
            path = %path.display(),
            sections = store.sections.len(),
            "loaded store file"
        );
        Ok(store)
    }

    pub fn parse(contents: &str) -> StoreResult<Self> {
        let mut store = Self::new();
        for entry in format::parse_lines(contents)? {
            match entry {
                format::Line::Section(name) => {
                    store.section_mut(&name);
                }
                format::Line::Entry {
                    section,
                    key,
                    value,
                } => store.section_mut(&section).set(&key, value),
            }
        }
        Ok(store)
    }

    /// Writes the store atomically, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let write_error = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).map_err(write_error)?;
        file.write_all(self.render().as_bytes())
            .map_err(write_error)?;
        file.sync_all().map_err(write_error)?;
        fs::rename(&tmp, path).map_err(write_error)?;

        tracing::debug!(
            path = %path.display(),
            sections = self.sections.len(),
            "saved store file"
        );
        Ok(())
    }

    pub fn render(&self) -> String {
        format::render(
            self.sections
                .iter()
                .map(|section| (section.name.as_str(), section.entries.as_slice())),
        )
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    pub fn get_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key).unwrap_or(default)
    }

    /// Parses a stored value; `None` when absent, `Some(Err)` when malformed.
    pub fn get_parsed<T: FromStr>(&self, section: &str, key: &str) -> Option<Result<T, T::Err>> {
        self.get(section, key).map(str::parse)
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Display) {
        self.section_mut(section).set(key, value.to_string());
    }

    pub fn remove(&mut self, section: &str, key: &str) -> Option<String> {
        let section = self.sections.iter_mut().find(|s| s.name == section)?;
        let index = section.entries.iter().position(|(name, _)| name == key)?;
        Some(section.entries.remove(index).1)
    }

    pub fn remove_section(&mut self, section: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != section);
        before != self.sections.len()
    }

    pub fn contains_section(&self, section: &str) -> bool {
        self.section(section).is_some()
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.name.as_str())
    }

    pub fn entries(&self, section: &str) -> impl Iterator<Item = (&str, &str)> {
        self.section(section)
            .into_iter()
            .flat_map(|section| section.entries.iter())
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn keys(&self, section: &str) -> impl Iterator<Item = &str> {
        self.entries(section).map(|(key, _)| key)
    }

    /// Removes every section whose name matches `pattern` (`*` and `?`
    /// wildcards) and returns how many were removed.
    pub fn delete_sections(&mut self, pattern: &str) -> usize {
        let pattern = SectionPattern::new(pattern);
        let before = self.sections.len();
        self.sections.retain(|section| !pattern.matches(&section.name));
        before - self.sections.len()
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    fn section_mut(&mut self, name: &str) -> &mut Section {
        let index = match self.sections.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }
}

pub fn store_path(settings_dir: &Path) -> PathBuf {
    settings_dir.join(DEFAULT_STORE_FILE)
}

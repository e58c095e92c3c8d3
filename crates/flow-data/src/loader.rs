//! Locating and parsing the four files of a catalog directory, and the
//! per-file name index used to resolve cross references.
//!
//! Each file may be RON, TOML, or JSON, chosen by extension. TOML has no
//! top-level arrays, so list files keep their entries under the file's base
//! name (`[[items]]`, `[[machines]]`, `[[recipes]]`).

use crate::schema::GameData;
use flow_core::item::CatalogError;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Errors raised while loading a catalog directory.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// The same catalog file exists in two formats.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A number, time, or version is out of range or unrepresentable.
    #[error("invalid value in {file}: {detail}")]
    InvalidValue { file: PathBuf, detail: String },

    /// The entry parsed but the core catalog types rejected it.
    #[error("invalid catalog entry in {file}: {source}")]
    Catalog {
        file: PathBuf,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Catalog files
// ---------------------------------------------------------------------------

/// One of the files making up a catalog directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFile {
    Game,
    Items,
    Machines,
    Recipes,
}

impl DataFile {
    /// File name without extension.
    pub fn base_name(self) -> &'static str {
        match self {
            DataFile::Game => "game",
            DataFile::Items => "items",
            DataFile::Machines => "machines",
            DataFile::Recipes => "recipes",
        }
    }

    /// Key holding the entry array in a TOML list file. The game file is a
    /// single table.
    fn toml_key(self) -> Option<&'static str> {
        match self {
            DataFile::Game => None,
            other => Some(other.base_name()),
        }
    }
}

/// Encoding of a catalog file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    pub fn of(path: &Path) -> Result<Format, DataLoadError> {
        let ext = path.extension().and_then(|e| e.to_str());
        Format::ALL
            .into_iter()
            .find(|format| Some(format.extension()) == ext)
            .ok_or_else(|| DataLoadError::UnsupportedFormat {
                file: path.to_path_buf(),
            })
    }
}

/// Path of `file` in `dir`. Exactly one format must be present.
pub fn locate(dir: &Path, file: DataFile) -> Result<PathBuf, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for format in Format::ALL {
        let candidate = dir.join(format!("{}.{}", file.base_name(), format.extension()));
        if !candidate.is_file() {
            continue;
        }
        if let Some(a) = found.take() {
            return Err(DataLoadError::ConflictingFormats { a, b: candidate });
        }
        found = Some(candidate);
    }
    found.ok_or_else(|| DataLoadError::MissingRequired {
        file: file.base_name(),
        dir: dir.to_path_buf(),
    })
}

/// Locate and parse the game metadata file.
pub fn read_game(dir: &Path) -> Result<(PathBuf, GameData), DataLoadError> {
    let path = locate(dir, DataFile::Game)?;
    let game = parse(&path, DataFile::Game.toml_key())?;
    Ok((path, game))
}

/// Locate and parse one of the list files.
pub fn read_entries<T: DeserializeOwned>(
    dir: &Path,
    file: DataFile,
) -> Result<(PathBuf, Vec<T>), DataLoadError> {
    let path = locate(dir, file)?;
    let entries = parse(&path, file.toml_key())?;
    Ok((path, entries))
}

fn parse<T: DeserializeOwned>(path: &Path, toml_key: Option<&str>) -> Result<T, DataLoadError> {
    let format = Format::of(path)?;
    let content = std::fs::read_to_string(path)?;
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match (format, toml_key) {
        (Format::Ron, _) => ron::from_str(&content).map_err(|e| parse_error(e.to_string())),
        (Format::Json, _) => {
            serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))
        }
        (Format::Toml, None) => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
        (Format::Toml, Some(key)) => {
            let mut table: toml::Table =
                toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
            table
                .remove(key)
                .ok_or_else(|| parse_error(format!("missing key '{key}'")))?
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(e.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Name index
// ---------------------------------------------------------------------------

/// Entries of one catalog file keyed by identifier. Reports duplicates and
/// unknown references against that file.
#[derive(Debug)]
pub struct NameIndex<'f, T> {
    file: &'f Path,
    kind: &'static str,
    entries: HashMap<String, T>,
}

impl<'f, T> NameIndex<'f, T> {
    pub fn new(file: &'f Path, kind: &'static str) -> Self {
        Self {
            file,
            kind,
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, value: T) -> Result<(), DataLoadError> {
        if self.entries.contains_key(name) {
            return Err(DataLoadError::DuplicateName {
                file: self.file.to_path_buf(),
                name: name.to_string(),
            });
        }
        self.entries.insert(name.to_string(), value);
        Ok(())
    }

    /// Look up a reference made from `from` (usually another file).
    pub fn resolve(&self, name: &str, from: &Path) -> Result<&T, DataLoadError> {
        self.entries
            .get(name)
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                file: from.to_path_buf(),
                name: name.to_string(),
                expected_kind: self.kind,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

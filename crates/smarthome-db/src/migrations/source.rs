use std::path::PathBuf;

use include_dir::{Dir, include_dir};
use sha2::{Digest, Sha256};
use smarthome_common::{Error, Result};

static BUNDLED: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/migrations");

pub const SCRIPT_EXTENSION: &str = ".sql";
const SEPARATOR: char = '_';

/// One versioned SQL script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub version: String,
    pub name: String,
    pub filename: String,
    pub content: String,
    pub checksum: String,
}

/// Where migration scripts come from.
#[derive(Debug, Clone)]
pub enum MigrationSource {
    /// Scripts compiled into the binary from `migrations/`.
    Bundled(&'static Dir<'static>),
    /// Scripts read from a directory at load time.
    Directory(PathBuf),
    /// `(filename, contents)` pairs supplied by the caller.
    Files(Vec<(String, Vec<u8>)>),
}

impl Default for MigrationSource {
    fn default() -> Self {
        Self::bundled()
    }
}

impl MigrationSource {
    pub fn bundled() -> Self {
        Self::Bundled(&BUNDLED)
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }

    pub fn from_files<I, N, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<Vec<u8>>,
    {
        Self::Files(
            files
                .into_iter()
                .map(|(name, contents)| (name.into(), contents.into()))
                .collect(),
        )
    }

    /// Every script in the source, ordered by version string.
    pub fn load(&self) -> Result<Vec<MigrationScript>> {
        let mut scripts = Vec::new();
        for (filename, bytes) in self.read_files()? {
            if !filename.ends_with(SCRIPT_EXTENSION) {
                continue;
            }
            scripts.push(MigrationScript::from_file(filename, &bytes)?);
        }

        // Plain string order: "10" sorts before "2" unless versions are zero-padded.
        scripts.sort_by(|a, b| a.version.cmp(&b.version));

        if let Some(pair) = scripts.windows(2).find(|w| w[0].version == w[1].version) {
            return Err(Error::Load(format!(
                "duplicate migration version {}: {} and {}",
                pair[0].version, pair[0].filename, pair[1].filename
            )));
        }

        Ok(scripts)
    }

    fn read_files(&self) -> Result<Vec<(String, Vec<u8>)>> {
        match self {
            Self::Bundled(dir) => Ok(dir
                .files()
                .filter_map(|file| {
                    let name = file.path().file_name()?.to_str()?;
                    Some((name.to_string(), file.contents().to_vec()))
                })
                .collect()),
            Self::Directory(path) => {
                let entries = std::fs::read_dir(path).map_err(|e| {
                    Error::Load(format!(
                        "failed to read migrations directory {}: {e}",
                        path.display()
                    ))
                })?;

                let mut files = Vec::new();
                for entry in entries {
                    let entry = entry
                        .map_err(|e| Error::Load(format!("failed to read directory entry: {e}")))?;
                    let entry_path = entry.path();
                    if !entry_path.is_file() {
                        continue;
                    }
                    let Some(name) = entry_path.file_name().and_then(|n| n.to_str()) else {
                        continue;
                    };
                    let bytes = std::fs::read(&entry_path).map_err(|e| {
                        Error::Load(format!("failed to read {}: {e}", entry_path.display()))
                    })?;
                    files.push((name.to_string(), bytes));
                }
                Ok(files)
            }
            Self::Files(files) => Ok(files.clone()),
        }
    }
}

impl MigrationScript {
    pub fn from_file(filename: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let filename = filename.into();
        let (version, name) = parse_filename(&filename)?;
        let content = String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Load(format!("migration {filename} is not valid UTF-8: {e}")))?;

        Ok(Self {
            version,
            name,
            checksum: checksum(bytes),
            filename,
            content,
        })
    }
}

/// Split `<version>_<name>.sql` into its version and name.
pub fn parse_filename(filename: &str) -> Result<(String, String)> {
    let Some((version, rest)) = filename.split_once(SEPARATOR) else {
        return Err(Error::Load(format!(
            "invalid migration filename format: {filename}"
        )));
    };
    if version.is_empty() {
        return Err(Error::Load(format!(
            "migration filename has an empty version: {filename}"
        )));
    }

    let name = rest.strip_suffix(SCRIPT_EXTENSION).unwrap_or(rest);
    Ok((version.to_string(), name.to_string()))
}

/// Lowercase hex SHA-256 of the raw script bytes.
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

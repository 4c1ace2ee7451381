//! On-disk model registry: one JSON artifact per (region, item) series.
//!
//! Artifact names follow `prophet_model_{region}_{TOKEN}.json`, where TOKEN is
//! the item's canonical token. Training and inference deployments share only
//! this naming rule, so it must not change.

use foodcast_core::domain::{Item, SeriesKey};
use foodcast_core::model::TrainedModel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Envelope version written into every artifact.
pub const FORMAT_VERSION: u32 = 1;

const ARTIFACT_PREFIX: &str = "prophet_model_";
const ARTIFACT_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no trained model for {key} (expected {})", path.display())]
    ModelNotFound { key: SeriesKey, path: PathBuf },

    #[error("registry I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {} is not a valid model: {reason}", path.display())]
    Serialization { path: PathBuf, reason: String },

    #[error("artifact {} has format version {found}, expected {expected}", path.display())]
    IncompatibleFormat {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("model for {model_key} does not match series {key}")]
    KeyMismatch { key: SeriesKey, model_key: SeriesKey },

    #[error("series {key} has an empty region name")]
    EmptyRegion { key: SeriesKey },
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    model: &'a TrainedModel,
}

#[derive(Deserialize)]
struct Envelope {
    format_version: u32,
    model: serde_json::Value,
}

/// File name for a series artifact.
///
/// Path separators and `%` in the region are percent-escaped, so the artifact
/// lands directly in the registry directory and distinct regions never share
/// a file name.
pub fn artifact_name(key: &SeriesKey) -> String {
    format!(
        "{ARTIFACT_PREFIX}{}_{}.{ARTIFACT_EXTENSION}",
        escape_region(&key.region),
        key.item.canonical_token()
    )
}

fn escape_region(region: &str) -> String {
    let mut out = String::with_capacity(region.len());
    for c in region.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_region`]. `None` for an escape it never produces.
fn unescape_region(escaped: &str) -> Option<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3)?;
        out.push(match code {
            "25" => '%',
            "2F" => '/',
            "5C" => '\\',
            _ => return None,
        });
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Some(out)
}

/// Recover the series key from an artifact file name.
///
/// Regions may contain underscores, so the item is matched as the longest
/// canonical token suffix.
pub fn parse_artifact_name(name: &str) -> Option<SeriesKey> {
    let stem = name
        .strip_prefix(ARTIFACT_PREFIX)?
        .strip_suffix(ARTIFACT_EXTENSION)?
        .strip_suffix('.')?;

    Item::ALL
        .into_iter()
        .filter_map(|item| {
            let region = stem.strip_suffix(item.canonical_token())?.strip_suffix('_')?;
            (!region.is_empty()).then_some((item, region))
        })
        .max_by_key(|(item, _)| item.canonical_token().len())
        .and_then(|(item, region)| Some(SeriesKey::new(unescape_region(region)?, item)))
}

/// Persists trained models under a directory.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    dir: PathBuf,
}

impl ModelRegistry {
    /// Opens a registry rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| RegistryError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, key: &SeriesKey) -> PathBuf {
        self.dir.join(artifact_name(key))
    }

    pub fn contains(&self, key: &SeriesKey) -> bool {
        self.artifact_path(key).is_file()
    }

    /// Write the model for `key`, replacing any previous artifact.
    ///
    /// Writes are atomic: the envelope goes to a `.tmp` file that is then
    /// renamed into place.
    pub fn save(&self, key: &SeriesKey, model: &TrainedModel) -> Result<PathBuf, RegistryError> {
        if key.region.is_empty() {
            return Err(RegistryError::EmptyRegion { key: key.clone() });
        }
        if model.key() != key {
            return Err(RegistryError::KeyMismatch {
                key: key.clone(),
                model_key: model.key().clone(),
            });
        }

        let path = self.artifact_path(key);
        let envelope = EnvelopeRef {
            format_version: FORMAT_VERSION,
            model,
        };
        let json = serde_json::to_vec(&envelope).map_err(|e| RegistryError::Serialization {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|source| RegistryError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            RegistryError::Io {
                path: path.clone(),
                source,
            }
        })?;

        tracing::debug!(%key, path = %path.display(), "model saved");
        Ok(path)
    }

    /// Read the model for `key`. A missing artifact is `ModelNotFound`; an
    /// artifact holding another series' model is `KeyMismatch`.
    pub fn load(&self, key: &SeriesKey) -> Result<TrainedModel, RegistryError> {
        let path = self.artifact_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RegistryError::ModelNotFound {
                    key: key.clone(),
                    path,
                });
            }
            Err(source) => return Err(RegistryError::Io { path, source }),
        };

        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|e| RegistryError::Serialization {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(RegistryError::IncompatibleFormat {
                path,
                found: envelope.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let model: TrainedModel =
            serde_json::from_value(envelope.model).map_err(|e| RegistryError::Serialization {
                path,
                reason: e.to_string(),
            })?;
        if model.key() != key {
            return Err(RegistryError::KeyMismatch {
                key: key.clone(),
                model_key: model.key().clone(),
            });
        }
        Ok(model)
    }

    /// Delete the artifact for `key`. Returns whether one existed.
    pub fn remove(&self, key: &SeriesKey) -> Result<bool, RegistryError> {
        let path = self.artifact_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(RegistryError::Io { path, source }),
        }
    }

    /// Every series with an artifact in the directory, sorted.
    pub fn list(&self) -> Result<Vec<SeriesKey>, RegistryError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| RegistryError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut keys: Vec<SeriesKey> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| parse_artifact_name(&entry.file_name().to_string_lossy()))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

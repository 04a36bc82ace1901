//! Endpoint store
//!
//! Reads and writes endpoint-group files and the index that lists them, all
//! inside one directory. File names are reduced to their base name before
//! any filesystem access.
//!
//! Every group write is checked against the `EndpointGroup` model first, but
//! the submitted JSON is what lands on disk, so fields the model does not
//! name survive.
//!
//! Writes to the same file name are serialized inside this process; separate
//! processes editing the same directory can still race (last writer wins).
//! A file's lock entry is dropped again once no writer holds it.

mod model;

pub use model::{generate_id, Endpoint, EndpointGroup, HeaderField, ParamField, ResponseExample};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::fs;

use crate::logger;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid file name '{name}': {reason}")]
    InvalidFileName { name: String, reason: &'static str },

    #[error("Invalid endpoint group for {file}: {reason}")]
    InvalidGroup { file: String, reason: String },

    #[error("Failed to serialize {file}: {source}")]
    Serialize {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Whether the caller sent a bad name or group, as opposed to a server-side failure
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFileName { .. } | Self::InvalidGroup { .. }
        )
    }
}

/// File-backed store for endpoint groups and the index
pub struct EndpointStore {
    dir: PathBuf,
    index_file: String,
    write_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl EndpointStore {
    pub fn new(dir: impl Into<PathBuf>, index_file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            index_file: index_file.into(),
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a group file; missing or unparseable files are `None`
    pub async fn read_group(&self, file_name: &str) -> Option<EndpointGroup> {
        let name = base_name(file_name)?;
        let content = fs::read(self.dir.join(name)).await.ok()?;
        match serde_json::from_slice(&content) {
            Ok(group) => Some(group),
            Err(e) => {
                logger::log_warning(&format!("Ignoring unparseable group file '{name}': {e}"));
                None
            }
        }
    }

    /// Overwrite a group file with 2-space indented JSON
    ///
    /// `group` must decode as an `EndpointGroup` with unique endpoint ids.
    /// Returns the sanitized file name actually written.
    pub async fn write_group<T: Serialize + ?Sized>(
        &self,
        file_name: &str,
        group: &T,
    ) -> Result<String, StoreError> {
        let name = sanitize_group_name(file_name, &self.index_file)?;
        let serialize_err = |source| StoreError::Serialize {
            file: name.clone(),
            source,
        };
        let value = serde_json::to_value(group).map_err(serialize_err)?;
        validate_group(&name, &value)?;
        let content = serde_json::to_string_pretty(&value).map_err(serialize_err)?;

        let lock = self.lock_for(&name);
        let result = {
            let _guard = lock.lock().await;
            self.write_file(&name, content).await
        };
        self.release_lock(&name, lock);
        result.map(|()| name)
    }

    /// Current index; missing or unparseable index is empty
    pub async fn read_index(&self) -> Vec<String> {
        let Ok(content) = fs::read(self.dir.join(&self.index_file)).await else {
            return Vec::new();
        };
        serde_json::from_slice(&content).unwrap_or_else(|e| {
            logger::log_warning(&format!("Index file is not a JSON string array: {e}"));
            Vec::new()
        })
    }

    /// Append a file name to the index unless it is already listed
    pub async fn append_index(&self, file_name: &str) -> Result<Vec<String>, StoreError> {
        let name = base_name(file_name)
            .ok_or_else(|| StoreError::InvalidFileName {
                name: file_name.to_string(),
                reason: "file name is empty",
            })?
            .to_string();

        let lock = self.lock_for(&self.index_file);
        let result = {
            let _guard = lock.lock().await;
            self.append_locked(name).await
        };
        self.release_lock(&self.index_file, lock);
        result
    }

    async fn append_locked(&self, name: String) -> Result<Vec<String>, StoreError> {
        let mut index = self.read_index().await;
        if !index.contains(&name) {
            index.push(name);
        }

        let content = serde_json::to_string_pretty(&index).map_err(|source| {
            StoreError::Serialize {
                file: self.index_file.clone(),
                source,
            }
        })?;
        self.write_file(&self.index_file, content).await?;
        Ok(index)
    }

    async fn write_file(&self, name: &str, content: String) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            file: name.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        fs::write(self.dir.join(name), content).await.map_err(io_err)
    }

    fn lock_for(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(locks.entry(name.to_string()).or_default())
    }

    /// Give back a lock from `lock_for`, forgetting it when nobody else holds it
    fn release_lock(&self, name: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        drop(lock);
        if locks.get(name).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(name);
        }
    }
}

/// Decode against the model and reject repeated endpoint ids
fn validate_group(file: &str, value: &Value) -> Result<(), StoreError> {
    let invalid = |reason: String| StoreError::InvalidGroup {
        file: file.to_string(),
        reason,
    };
    let group = EndpointGroup::deserialize(value).map_err(|e| invalid(e.to_string()))?;
    if let Some(id) = group.duplicate_id() {
        return Err(invalid(format!("duplicate endpoint id '{id}'")));
    }
    Ok(())
}

/// Last path component, treating both separators as directory breaks
fn base_name(file_name: &str) -> Option<&str> {
    let name = file_name.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." => None,
        n => Some(n),
    }
}

fn sanitize_group_name(file_name: &str, index_file: &str) -> Result<String, StoreError> {
    let invalid = |reason| StoreError::InvalidFileName {
        name: file_name.to_string(),
        reason,
    };
    let name = base_name(file_name).ok_or_else(|| invalid("file name is empty"))?;
    if !name.ends_with(".json") {
        return Err(invalid("fileName must end with .json"));
    }
    if name == index_file {
        return Err(invalid("the index file cannot be saved as a group"));
    }
    Ok(name.to_string())
}

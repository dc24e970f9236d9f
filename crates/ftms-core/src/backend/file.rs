//! JSON fixture backend for offline use and tests
//!
//! Each resource is one JSON array under the data directory. A missing file
//! is an empty list. Mutations are written back to disk.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{Backend, FetchParams, Resource};
use crate::{CoreError, CoreResult};

pub struct FileBackend {
    data_dir: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, resource: Resource) -> PathBuf {
        self.data_dir.join(resource.file_name())
    }

    async fn read_all(&self, resource: Resource) -> CoreResult<Vec<Value>> {
        let path = self.path_for(resource);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!(target: "ftms::backend", "{} not found, treating as empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(CoreError::IoError {
                    message: format!("{}: {}", path.display(), e),
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| CoreError::Decode {
            message: format!("{}: {}", path.display(), e),
        })
    }

    async fn write_all(&self, resource: Resource, items: &[Value]) -> CoreResult<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let content = serde_json::to_string_pretty(items)?;
        tokio::fs::write(self.path_for(resource), content).await?;
        Ok(())
    }

    fn not_found(resource: Resource, id: &str) -> CoreError {
        CoreError::NotFound {
            resource: resource.title().to_string(),
            id: id.to_string(),
        }
    }
}

fn id_of(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

#[async_trait]
impl Backend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn fetch(&self, resource: Resource, params: &FetchParams) -> CoreResult<Value> {
        let items = self.read_all(resource).await?;
        if !resource.is_server_paginated() {
            return Ok(Value::Array(items));
        }

        // Emulate a paginating server; filters are left to the client pipeline
        let total = items.len();
        let (page, limit) = params.page().unwrap_or((1, total.max(1)));
        let data: Vec<Value> = items.into_iter().skip((page - 1) * limit).take(limit).collect();
        Ok(serde_json::json!({
            "data": data,
            "pagination": { "total": total, "page": page, "limit": limit }
        }))
    }

    async fn create(&self, resource: Resource, mut body: Value) -> CoreResult<Value> {
        let _guard = self.write_lock.lock().await;
        let Some(object) = body.as_object_mut() else {
            return Err(CoreError::Rejected {
                status: 400,
                message: "Request body must be a JSON object".to_string(),
            });
        };
        let has_id = object.get("id").and_then(Value::as_str).map_or(false, |s| !s.is_empty());
        if !has_id {
            object.insert("id".to_string(), Value::String(ftms_utils::generate_id(resource.id_prefix())));
        }

        let mut items = self.read_all(resource).await?;
        if let Some(id) = id_of(&body) {
            if items.iter().any(|item| id_of(item) == Some(id)) {
                return Err(CoreError::Rejected {
                    status: 409,
                    message: format!("{} {} already exists", resource.title(), id),
                });
            }
        }
        items.push(body.clone());
        self.write_all(resource, &items).await?;
        log::info!(target: "ftms::backend", "Created {} {}", resource, id_of(&body).unwrap_or_default());
        Ok(body)
    }

    async fn update(&self, resource: Resource, id: &str, body: Value) -> CoreResult<Value> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read_all(resource).await?;
        let existing = items
            .iter_mut()
            .find(|item| id_of(item) == Some(id))
            .ok_or_else(|| Self::not_found(resource, id))?;

        if let (Some(target), Value::Object(fields)) = (existing.as_object_mut(), body) {
            for (key, value) in fields {
                if key != "id" && !value.is_null() {
                    target.insert(key, value);
                }
            }
        }
        let updated = existing.clone();
        self.write_all(resource, &items).await?;
        log::info!(target: "ftms::backend", "Updated {} {}", resource, id);
        Ok(updated)
    }

    async fn delete(&self, resource: Resource, id: &str) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read_all(resource).await?;
        let before = items.len();
        items.retain(|item| id_of(item) != Some(id));
        if items.len() == before {
            return Err(Self::not_found(resource, id));
        }
        self.write_all(resource, &items).await?;
        log::info!(target: "ftms::backend", "Deleted {} {}", resource, id);
        Ok(())
    }
}

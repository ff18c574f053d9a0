//! In-process record store.
//!
//! Holds the whole tree as one `serde_json::Value` behind a lock and mirrors
//! the Realtime Database rules that handlers rely on: missing nodes read as
//! `None`, writing `null` deletes, and parents left empty disappear.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};

use skillx_core::RecordPath;

use super::{RecordStore, StoreError};

/// Record store backed by process memory.
#[derive(Clone)]
pub struct MemoryStore {
    root: Arc<RwLock<Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(Value::Object(Map::new()))),
        }
    }

    /// Snapshot of the whole tree, mainly for assertions in tests.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the lock was poisoned.
    pub fn snapshot(&self) -> Result<Value, StoreError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Value>, StoreError> {
        self.root
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Value>, StoreError> {
        self.root
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup<'a>(root: &'a Value, path: &RecordPath) -> Option<&'a Value> {
    path.segments()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Walk to `path`, creating intermediate objects, and return the node slot.
fn slot<'a>(root: &'a mut Value, path: &RecordPath) -> &'a mut Value {
    path.segments().fold(root, |node, segment| {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        match node {
            Value::Object(map) => map.entry(segment.to_owned()).or_insert(Value::Null),
            other => other,
        }
    })
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Drop null children recursively and report whether the node itself is empty.
fn prune(value: &mut Value) -> bool {
    if let Value::Object(map) = value {
        map.retain(|_, child| !prune(child));
    }
    is_empty(value)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, path: &RecordPath) -> Result<Option<Value>, StoreError> {
        let root = self.read()?;
        Ok(lookup(&root, path).filter(|v| !is_empty(v)).cloned())
    }

    async fn set(&self, path: &RecordPath, value: Value) -> Result<(), StoreError> {
        let mut root = self.write()?;
        *slot(&mut root, path) = value;
        prune(&mut root);
        Ok(())
    }

    async fn update(
        &self,
        path: &RecordPath,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut root = self.write()?;
        let node = slot(&mut root, path);
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        if let Value::Object(map) = node {
            map.extend(fields);
        }
        prune(&mut root);
        Ok(())
    }

    async fn delete(&self, path: &RecordPath) -> Result<(), StoreError> {
        self.set(path, Value::Null).await
    }

    async fn query_equal(
        &self,
        path: &RecordPath,
        child: &str,
        value: &Value,
    ) -> Result<Map<String, Value>, StoreError> {
        let root = self.read()?;
        let Some(Value::Object(children)) = lookup(&root, path) else {
            return Ok(Map::new());
        };

        Ok(children
            .iter()
            .filter(|(_, record)| record.get(child) == Some(value))
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use skillx_core::Collection;

    use super::*;

    fn user(uid: &str) -> RecordPath {
        RecordPath::record(Collection::Users, uid).unwrap()
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        assert!(store.get(&user("u1")).await.unwrap().is_none());

        store.set(&user("u1"), json!({ "name": "Rina" })).await.unwrap();
        assert_eq!(
            store.get(&user("u1")).await.unwrap(),
            Some(json!({ "name": "Rina" }))
        );

        store.delete(&user("u1")).await.unwrap();
        assert!(store.get(&user("u1")).await.unwrap().is_none());
        assert_eq!(store.snapshot().unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_update_merges_children() {
        let store = MemoryStore::new();
        store
            .set(&user("u1"), json!({ "name": "Rina", "language": "id" }))
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("language".into(), json!("en"));
        fields.insert("organization".into(), json!("UGM"));
        store.update(&user("u1"), fields).await.unwrap();

        assert_eq!(
            store.get(&user("u1")).await.unwrap(),
            Some(json!({ "name": "Rina", "language": "en", "organization": "UGM" }))
        );
    }

    #[tokio::test]
    async fn test_null_in_update_removes_child() {
        let store = MemoryStore::new();
        store.set(&user("u1"), json!({ "a": 1, "b": 2 })).await.unwrap();
        let mut fields = Map::new();
        fields.insert("b".into(), Value::Null);
        store.update(&user("u1"), fields).await.unwrap();
        assert_eq!(store.get(&user("u1")).await.unwrap(), Some(json!({ "a": 1 })));
    }

    #[tokio::test]
    async fn test_query_equal() {
        let store = MemoryStore::new();
        store.set(&user("u1"), json!({ "email": "a@x.io" })).await.unwrap();
        store.set(&user("u2"), json!({ "email": "b@x.io" })).await.unwrap();

        let hits = store
            .query_equal(
                &RecordPath::collection(Collection::Users),
                "email",
                &json!("b@x.io"),
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits.contains_key("u2"));
    }
}

//! Shared in-memory fakes for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use tfshift::domain::entities::retry_manifest::RetryManifest;
use tfshift::domain::entities::state_snapshot::{StateMetadata, StateSnapshot};
use tfshift::domain::entities::workspace::{Workspace, WorkspaceQuery};
use tfshift::domain::errors::{ObjectStoreError, RemoteStateError};
use tfshift::domain::repositories::manifest_repository::ManifestRepository;
use tfshift::domain::repositories::object_store_repository::ObjectStoreRepository;
use tfshift::domain::repositories::remote_state_repository::RemoteStateRepository;

pub const ORG: &str = "petstore-testing";
pub const BUCKET: &str = "petstore-terraform-states";

pub fn workspace(name: &str) -> Workspace {
    Workspace::new(format!("ws-{name}"), name, ORG)
}

pub fn state_payload(serial: i64) -> Vec<u8> {
    format!(r#"{{"version":4,"serial":{serial},"lineage":"abc","resources":[]}}"#).into_bytes()
}

/// Remote state service with recorded calls and per-workspace failures
#[derive(Default)]
pub struct FakeRemoteState {
    workspaces: Vec<Workspace>,
    states: HashMap<String, Vec<u8>>,
    lock_failures: HashMap<String, RemoteStateError>,
    fetch_failures: HashMap<String, RemoteStateError>,
    held: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRemoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a workspace with a valid state payload
    pub fn with_workspace(mut self, name: &str) -> Self {
        self.states.insert(name.to_string(), state_payload(1));
        self.workspaces.push(workspace(name));
        self
    }

    pub fn with_workspaces(self, names: &[&str]) -> Self {
        names.iter().fold(self, |fake, name| fake.with_workspace(name))
    }

    pub fn failing_lock(mut self, name: &str, error: RemoteStateError) -> Self {
        self.lock_failures.insert(name.to_string(), error);
        self
    }

    pub fn failing_fetch(mut self, name: &str, error: RemoteStateError) -> Self {
        self.fetch_failures.insert(name.to_string(), error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, name: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.ends_with(&format!(" {name}")))
            .collect()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(&format!("{verb} ")))
            .count()
    }

    /// Workspaces still locked at this point
    pub fn held_locks(&self) -> HashSet<String> {
        self.held.lock().unwrap().clone()
    }

    fn record(&self, verb: &str, name: &str) {
        self.calls.lock().unwrap().push(format!("{verb} {name}"));
    }
}

#[async_trait]
impl RemoteStateRepository for FakeRemoteState {
    async fn list_workspaces(
        &self,
        query: &WorkspaceQuery,
    ) -> Result<Vec<Workspace>, RemoteStateError> {
        Ok(self
            .workspaces
            .iter()
            .filter(|w| w.organization == query.organization)
            .filter(|w| query.name.as_deref().map_or(true, |n| w.name.contains(n)))
            .cloned()
            .collect())
    }

    async fn lock(&self, workspace: &Workspace, _reason: &str) -> Result<(), RemoteStateError> {
        self.record("lock", &workspace.name);
        if let Some(err) = self.lock_failures.get(&workspace.name) {
            return Err(err.clone());
        }
        self.held.lock().unwrap().insert(workspace.name.clone());
        Ok(())
    }

    async fn unlock(&self, workspace: &Workspace) -> Result<(), RemoteStateError> {
        self.record("unlock", &workspace.name);
        self.held.lock().unwrap().remove(&workspace.name);
        Ok(())
    }

    async fn get_state(&self, workspace: &Workspace) -> Result<StateSnapshot, RemoteStateError> {
        self.record("get_state", &workspace.name);
        if let Some(err) = self.fetch_failures.get(&workspace.name) {
            return Err(err.clone());
        }
        let payload = self
            .states
            .get(&workspace.name)
            .cloned()
            .ok_or_else(|| RemoteStateError::NotFound(workspace.name.clone()))?;
        Ok(StateSnapshot::new(
            payload,
            StateMetadata {
                state_version_id: format!("sv-{}", workspace.name),
                serial: Some(1),
                terraform_version: Some("1.5.7".to_string()),
                created_at: None,
            },
        ))
    }
}

/// Object store that keeps written objects in memory
#[derive(Default)]
pub struct FakeObjectStore {
    objects: Mutex<Vec<(String, String, Vec<u8>)>>,
    failures: HashMap<String, ObjectStoreError>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every write to `key`
    pub fn failing(mut self, key: &str, error: ObjectStoreError) -> Self {
        self.failures.insert(key.to_string(), error);
        self
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(_, key, _)| key.clone())
            .collect()
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(_, k, _)| k == key)
            .map(|(_, _, body)| body.clone())
    }
}

#[async_trait]
impl ObjectStoreRepository for FakeObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        payload: &[u8],
    ) -> Result<(), ObjectStoreError> {
        if let Some(err) = self.failures.get(key) {
            return Err(err.clone());
        }
        self.objects
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Manifest repository backed by a map of path to manifest
#[derive(Default)]
pub struct InMemoryManifestRepository {
    files: Mutex<HashMap<String, RetryManifest>>,
}

impl InMemoryManifestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<RetryManifest> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl ManifestRepository for InMemoryManifestRepository {
    async fn load(&self, path: &str) -> Result<RetryManifest> {
        self.get(path)
            .ok_or_else(|| anyhow!("Failed to read retry manifest file: {}", path))
    }

    async fn save(&self, path: &str, manifest: &RetryManifest) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), manifest.clone());
        Ok(())
    }
}

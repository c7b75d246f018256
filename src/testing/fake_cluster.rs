use crate::services::backends::kubernetes::apply_engine::apply_error::{ApplyError, WriteOperation};
use crate::services::backends::kubernetes::apply_engine::dynamic_resource_manager::DynamicResourceManager;
use crate::services::backends::kubernetes::manifest_decoder::UnstructuredObject;
use crate::services::backends::kubernetes::resource_resolver::{ResourceMapper, ResourceMapping, ResourceScope};
use async_trait::async_trait;
use kube::core::{ApiResource, ErrorResponse, GroupVersionKind};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    Get { path: String, name: String },
    Create { path: String, name: String },
    Replace { path: String, name: String },
}

pub fn default_resources() -> Vec<(ApiResource, ResourceScope)> {
    let resource = |group: &str, version: &str, kind: &str, plural: &str| {
        ApiResource::from_gvk_with_plural(&GroupVersionKind::gvk(group, version, kind), plural)
    };
    vec![
        (resource("", "v1", "ConfigMap", "configmaps"), ResourceScope::Namespaced),
        (resource("", "v1", "Namespace", "namespaces"), ResourceScope::Cluster),
        (resource("apps", "v1", "Deployment", "deployments"), ResourceScope::Namespaced),
        (
            resource("rbac.authorization.k8s.io", "v1", "ClusterRole", "clusterroles"),
            ResourceScope::Cluster,
        ),
    ]
}

pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{} ({})", reason, code),
        reason: reason.to_string(),
        code,
    })
}

/// In-memory API server recording every call it receives.
pub struct FakeCluster {
    resources: Vec<(ApiResource, ResourceScope)>,
    objects: Mutex<BTreeMap<(String, String), UnstructuredObject>>,
    calls: Mutex<Vec<RecordedCall>>,
    read_failure: Mutex<Option<u16>>,
    next_version: AtomicU64,
}

impl FakeCluster {
    pub fn new() -> Self {
        FakeCluster {
            resources: default_resources(),
            objects: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            read_failure: Mutex::new(None),
            next_version: AtomicU64::new(1),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, RecordedCall::Get { .. }))
            .collect()
    }

    pub fn object(&self, path: &str, name: &str) -> Option<UnstructuredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(path.to_string(), name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Makes every following `get` fail with the given HTTP status
    pub fn fail_reads_with(&self, code: u16) {
        *self.read_failure.lock().unwrap() = Some(code);
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn stamp(&self, object: &UnstructuredObject) -> UnstructuredObject {
        let mut stored = object.clone();
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        stored.metadata.resource_version = Some(version.to_string());
        stored
    }
}

#[async_trait]
impl DynamicResourceManager for FakeCluster {
    async fn discover(&self) -> Result<ResourceMapper, ApplyError> {
        Ok(ResourceMapper::new(self.resources.clone()))
    }

    async fn get(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<UnstructuredObject>, ApplyError> {
        let path = mapping.collection_path(namespace);
        self.record(RecordedCall::Get {
            path: path.clone(),
            name: name.to_string(),
        });
        if let Some(code) = *self.read_failure.lock().unwrap() {
            return Err(ApplyError::Read {
                name: name.to_string(),
                source: api_error(code, "InternalError"),
            });
        }
        Ok(self.object(&path, name))
    }

    async fn create(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        object: &UnstructuredObject,
    ) -> Result<UnstructuredObject, ApplyError> {
        let path = mapping.collection_path(namespace);
        let name = object.metadata.name.clone().unwrap_or_default();
        self.record(RecordedCall::Create {
            path: path.clone(),
            name: name.clone(),
        });
        let mut objects = self.objects.lock().unwrap();
        let key = (path, name.clone());
        if objects.contains_key(&key) {
            return Err(ApplyError::Write {
                operation: WriteOperation::Create,
                name,
                source: api_error(409, "AlreadyExists"),
            });
        }
        let stored = self.stamp(object);
        objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn replace(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        name: &str,
        object: &UnstructuredObject,
    ) -> Result<UnstructuredObject, ApplyError> {
        let path = mapping.collection_path(namespace);
        self.record(RecordedCall::Replace {
            path: path.clone(),
            name: name.to_string(),
        });
        let mut objects = self.objects.lock().unwrap();
        let key = (path, name.to_string());
        let current_version = match objects.get(&key) {
            Some(current) => current.metadata.resource_version.clone(),
            None => {
                return Err(ApplyError::Write {
                    operation: WriteOperation::Replace,
                    name: name.to_string(),
                    source: api_error(404, "NotFound"),
                });
            }
        };
        if object.metadata.resource_version != current_version {
            return Err(ApplyError::Write {
                operation: WriteOperation::Replace,
                name: name.to_string(),
                source: api_error(409, "Conflict"),
            });
        }
        let stored = self.stamp(object);
        objects.insert(key, stored.clone());
        Ok(stored)
    }
}

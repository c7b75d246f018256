pub mod apply_error;
pub mod dynamic_resource_manager;


use crate::configuration::models::apply_settings::ApplySettings;
use crate::services::backends::kubernetes::apply_engine::apply_error::ApplyError;
use crate::services::backends::kubernetes::apply_engine::dynamic_resource_manager::{
    DynamicResourceManager, KubernetesDynamicResourceManager,
};
use crate::services::backends::kubernetes::cluster_handle::ClusterHandle;
use crate::services::backends::kubernetes::manifest_decoder::{UnstructuredObject, decode_all};
use crate::services::backends::kubernetes::resource_resolver::{ResourceMapper, ResourceMapping};
use log::{debug, error, info, warn};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Replaced,
}

/// An object whose endpoint and identity were resolved, ready to be written.
#[derive(Debug)]
pub struct PlannedObject<'a> {
    pub mapping: &'a ResourceMapping,
    pub namespace: Option<String>,
    pub name: String,
    pub object: UnstructuredObject,
}

/// Applies manifest files to the cluster with create-or-replace semantics.
///
/// Files and the objects inside them are processed strictly in order and the first
/// error aborts the call. Objects written before the failure stay applied.
pub struct ManifestApplier<M>
where
    M: DynamicResourceManager,
{
    manager: M,
    settings: ApplySettings,
}

impl ManifestApplier<KubernetesDynamicResourceManager> {
    pub fn for_cluster(cluster: &ClusterHandle, settings: ApplySettings) -> Self {
        let manager = KubernetesDynamicResourceManager::new(cluster, &settings);
        ManifestApplier::new(manager, settings)
    }
}

impl<M> ManifestApplier<M>
where
    M: DynamicResourceManager,
{
    pub fn new(manager: M, settings: ApplySettings) -> Self {
        ManifestApplier { manager, settings }
    }

    pub async fn apply<P>(&self, files: &[P]) -> Result<(), ApplyError>
    where
        P: AsRef<Path> + Sync,
    {
        let mapper = self.manager.discover().await?;
        for file in files {
            let path = file.as_ref();
            info!("Applying manifest file {:?}", path);
            let bytes = tokio::fs::read(path).await.map_err(|source| ApplyError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            self.apply_manifest(&mapper, &bytes).await.inspect_err(|e| {
                error!("Failed to apply manifest file {:?}: {}", path, e);
            })?;
        }
        Ok(())
    }

    /// Decodes a whole manifest buffer and applies its objects.
    pub async fn apply_manifest(&self, mapper: &ResourceMapper, bytes: &[u8]) -> Result<(), ApplyError> {
        let objects = decode_all(bytes)?;
        self.apply_objects(mapper, objects).await
    }

    /// Resolves every object first so that an unknown kind or missing name aborts
    /// before anything of the batch is written, then writes them in order.
    pub async fn apply_objects(
        &self,
        mapper: &ResourceMapper,
        objects: Vec<UnstructuredObject>,
    ) -> Result<(), ApplyError> {
        let plans = objects
            .into_iter()
            .map(|object| self.plan(mapper, object))
            .collect::<Result<Vec<_>, _>>()?;

        for plan in plans {
            self.apply_object(plan).await?;
        }
        Ok(())
    }

    pub fn plan<'a>(
        &self,
        mapper: &'a ResourceMapper,
        mut object: UnstructuredObject,
    ) -> Result<PlannedObject<'a>, ApplyError> {
        let types = object.types.clone().unwrap_or_default();
        let mapping = mapper.resolve(&types)?;
        let name = object
            .metadata
            .name
            .clone()
            .ok_or_else(|| ApplyError::MissingMetadata {
                kind: types.kind.clone(),
                field: "name",
            })?;

        let namespace = if mapping.is_namespaced() {
            let namespace = object
                .metadata
                .namespace
                .get_or_insert_with(|| self.settings.default_namespace.clone());
            Some(namespace.clone())
        } else {
            if let Some(namespace) = object.metadata.namespace.take() {
                warn!(
                    "Ignoring namespace {} of cluster-scoped {} {}",
                    namespace, types.kind, name
                );
            }
            None
        };

        Ok(PlannedObject {
            mapping,
            namespace,
            name,
            object,
        })
    }

    /// Creates the object when it does not exist, replaces it unconditionally otherwise.
    pub async fn apply_object(&self, plan: PlannedObject<'_>) -> Result<ApplyOutcome, ApplyError> {
        let PlannedObject {
            mapping,
            namespace,
            name,
            mut object,
        } = plan;
        let namespace = namespace.as_deref();
        let path = mapping.collection_path(namespace);

        match self.manager.get(mapping, namespace, &name).await? {
            None => {
                debug!(name = name.as_str(), path = path.as_str(); "Creating new resource: {}", name);
                self.manager.create(mapping, namespace, &object).await?;
                Ok(ApplyOutcome::Created)
            }
            Some(existing) => {
                if object.metadata.resource_version.is_none() {
                    object.metadata.resource_version = existing.metadata.resource_version;
                }
                debug!(name = name.as_str(), path = path.as_str(); "Replacing existing resource: {}", name);
                self.manager.replace(mapping, namespace, &name, &object).await?;
                Ok(ApplyOutcome::Replaced)
            }
        }
    }
}

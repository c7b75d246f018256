
use crate::services::backends::kubernetes::apply_engine::apply_error::ApplyError;
use kube::Client;
use kube::core::{ApiResource, GroupVersion, GroupVersionKind, TypeMeta};
use kube::discovery::{self, ApiGroup, Scope};
use log::{debug, warn};
use std::collections::HashMap;

const CORE_GROUP: &str = "";
const CORE_API_PATH: &str = "/api";
const GROUP_API_PATH: &str = "/apis";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceScope {
    Namespaced,
    Cluster,
}

impl From<&Scope> for ResourceScope {
    fn from(scope: &Scope) -> Self {
        match scope {
            Scope::Namespaced => ResourceScope::Namespaced,
            Scope::Cluster => ResourceScope::Cluster,
        }
    }
}

/// REST shape of one resource kind.
#[derive(Clone, Debug)]
pub struct ResourceMapping {
    pub api_resource: ApiResource,
    pub scope: ResourceScope,
}

impl ResourceMapping {
    pub fn is_namespaced(&self) -> bool {
        self.scope == ResourceScope::Namespaced
    }

    /// `/api` for the legacy core group, `/apis` for named groups
    pub fn api_path(&self) -> &'static str {
        if self.api_resource.group.is_empty() {
            CORE_API_PATH
        } else {
            GROUP_API_PATH
        }
    }

    pub fn group_version(&self) -> String {
        if self.api_resource.group.is_empty() {
            self.api_resource.version.clone()
        } else {
            format!("{}/{}", self.api_resource.group, self.api_resource.version)
        }
    }

    /// URL of the resource collection, e.g. `/apis/apps/v1/namespaces/default/deployments`
    pub fn collection_path(&self, namespace: Option<&str>) -> String {
        match namespace {
            Some(namespace) if self.is_namespaced() => format!(
                "{}/{}/namespaces/{}/{}",
                self.api_path(),
                self.group_version(),
                namespace,
                self.api_resource.plural
            ),
            _ => format!("{}/{}/{}", self.api_path(), self.group_version(), self.api_resource.plural),
        }
    }
}

/// Discovery outcome of a single group version.
pub type DiscoveredGroupVersion = (GroupVersion, Result<Vec<(ApiResource, ResourceScope)>, kube::Error>);

async fn list_group_versions(client: &Client) -> Result<Vec<GroupVersion>, ApplyError> {
    let core = client.list_core_api_versions().await.map_err(ApplyError::Discovery)?;
    let groups = client.list_api_groups().await.map_err(ApplyError::Discovery)?;

    let core_versions = core
        .versions
        .into_iter()
        .map(|version| GroupVersion::gv(CORE_GROUP, &version));
    let group_versions = groups.groups.into_iter().flat_map(|group| {
        let name = group.name;
        group
            .versions
            .into_iter()
            .map(move |version| GroupVersion::gv(&name, &version.version))
    });
    Ok(core_versions.chain(group_versions).collect())
}

fn served_resources(group: &ApiGroup) -> Vec<(ApiResource, ResourceScope)> {
    group
        .versions()
        .flat_map(|version| group.versioned_resources(version))
        .map(|(api_resource, capabilities)| (api_resource, ResourceScope::from(&capabilities.scope)))
        .collect()
}

/// Splits `apps/v1` into (`apps`, `v1`) and `v1` into (``, `v1`).
pub fn parse_group_version_kind(types: &TypeMeta) -> GroupVersionKind {
    let (group, version) = types.api_version.split_once('/').unwrap_or(("", types.api_version.as_str()));
    GroupVersionKind::gvk(group, version, &types.kind)
}

/// Kind to REST shape lookup built from the cluster discovery document.
#[derive(Debug, Default)]
pub struct ResourceMapper {
    mappings: HashMap<(String, String, String), ResourceMapping>,
}

impl ResourceMapper {
    pub fn new<I>(resources: I) -> Self
    where
        I: IntoIterator<Item = (ApiResource, ResourceScope)>,
    {
        let mappings = resources
            .into_iter()
            .map(|(api_resource, scope)| {
                let key = (
                    api_resource.group.clone(),
                    api_resource.version.clone(),
                    api_resource.kind.clone(),
                );
                (key, ResourceMapping { api_resource, scope })
            })
            .collect();
        ResourceMapper { mappings }
    }

    /// Runs discovery against the cluster and maps every served group version.
    ///
    /// Only the group listing is required. A group version that fails to answer is
    /// skipped, so its kinds resolve to [`ApplyError::KindNotFound`].
    pub async fn discover(client: Client) -> Result<Self, ApplyError> {
        let group_versions = list_group_versions(&client).await?;
        let mut discovered = Vec::with_capacity(group_versions.len());
        for group_version in group_versions {
            let resources = discovery::pinned_group(&client, &group_version)
                .await
                .map(|group| served_resources(&group));
            discovered.push((group_version, resources));
        }
        Ok(Self::from_group_versions(discovered))
    }

    /// Builds the mapping from per group version discovery results, skipping failed ones.
    pub fn from_group_versions<I>(discovered: I) -> Self
    where
        I: IntoIterator<Item = DiscoveredGroupVersion>,
    {
        let resources = discovered
            .into_iter()
            .filter_map(|(group_version, resources)| match resources {
                Ok(resources) => Some(resources),
                Err(e) => {
                    let api_version = group_version.api_version();
                    warn!(
                        group_version = api_version.as_str();
                        "Skipping group version {} that failed discovery: {}", api_version, e);
                    None
                }
            })
            .flatten();
        let mapper = Self::new(resources);
        debug!("Discovered {} resource kinds", mapper.len());
        mapper
    }

    pub fn resolve(&self, types: &TypeMeta) -> Result<&ResourceMapping, ApplyError> {
        let gvk = parse_group_version_kind(types);
        self.mappings
            .get(&(gvk.group.clone(), gvk.version.clone(), gvk.kind.clone()))
            .ok_or(ApplyError::KindNotFound(gvk))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

use crate::configuration::models::apply_settings::ApplySettings;
use crate::services::backends::kubernetes::apply_engine::ManifestApplier;
use crate::testing::fake_cluster::FakeCluster;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use test_context::AsyncTestContext;

pub struct FakeClusterContext {
    pub cluster: Arc<FakeCluster>,
    pub applier: ManifestApplier<Arc<FakeCluster>>,
    directory: TempDir,
}

impl FakeClusterContext {
    /// Writes a manifest file into the temporary directory of the test
    pub fn write_manifest(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.directory.path().join(file_name);
        std::fs::write(&path, content).expect("Failed to write manifest");
        path
    }
}

impl AsyncTestContext for FakeClusterContext {
    async fn setup() -> Self {
        let cluster = Arc::new(FakeCluster::new());
        let applier = ManifestApplier::new(cluster.clone(), ApplySettings::default());
        let directory = TempDir::new().expect("Failed to create manifest directory");
        FakeClusterContext {
            cluster,
            applier,
            directory,
        }
    }
}

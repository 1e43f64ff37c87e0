// src/sources/mod.rs
pub mod fixture;
pub mod http;
pub mod probe;

use anyhow::Result;

use crate::registry::SourceDescriptor;
use crate::snapshot::SourceData;

/// Capability a backend system must satisfy: one fetch returning the
/// source's snapshot shape. Production (`HttpSource`) and test
/// (`FixtureSource`) implementations both live behind this trait.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    fn descriptor(&self) -> &SourceDescriptor;

    async fn fetch(&self) -> Result<SourceData>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }
}

// src/sources/fixture.rs
//! Canned-data sources for tests, demos and local development.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::registry::SourceDescriptor;
use crate::snapshot::SourceData;
use crate::sources::DataSource;

/// Always returns a clone of the configured snapshot.
pub struct FixtureSource {
    descriptor: SourceDescriptor,
    data: SourceData,
    fetches: AtomicUsize,
}

impl FixtureSource {
    pub fn new(descriptor: SourceDescriptor, data: SourceData) -> Self {
        Self {
            descriptor,
            data,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self) -> Result<SourceData> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.clone())
    }
}

/// Fails every fetch with a fixed message. Exercises the fallback-to-cache
/// path without any network.
pub struct FailingSource {
    descriptor: SourceDescriptor,
    message: String,
    fetches: AtomicUsize,
}

impl FailingSource {
    pub fn new(descriptor: SourceDescriptor, message: impl Into<String>) -> Self {
        Self {
            descriptor,
            message: message.into(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for FailingSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self) -> Result<SourceData> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("{}", self.message))
    }
}

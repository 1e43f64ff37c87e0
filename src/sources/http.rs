// src/sources/http.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::registry::{SourceDescriptor, SourceKind};
use crate::snapshot::SourceData;
use crate::sources::DataSource;

/// Production source: GET `{endpoint}{kind.data_path()}`, JSON body parsed
/// into the source's snapshot shape.
pub struct HttpSource {
    descriptor: SourceDescriptor,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(descriptor: SourceDescriptor, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            descriptor,
            client,
            timeout,
        }
    }

    async fn fetch_json(&self) -> Result<SourceData> {
        let url = self.descriptor.data_url();
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("non-success status from {url}"))?;

        let data = match self.descriptor.kind {
            SourceKind::Crm => SourceData::Crm(resp.json().await.context("decoding crm stats")?),
            SourceKind::Appraisals => {
                SourceData::Appraisals(resp.json().await.context("decoding valuations")?)
            }
            SourceKind::Clients => {
                SourceData::Clients(resp.json().await.context("decoding client list")?)
            }
            SourceKind::Training => {
                SourceData::Training(resp.json().await.context("decoding training progress")?)
            }
        };
        Ok(data)
    }
}

#[async_trait]
impl DataSource for HttpSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self) -> Result<SourceData> {
        self.fetch_json().await
    }
}

//! HTTP implementation of the remote store contract.
//!
//! Talks to a PostgREST-style row API: one resource per entity table,
//! owner scoping via an `owner_id` equality filter on every call.
//! Transport failures (DNS, refused connection, timeout) map to
//! [`SyncError::Connectivity`]; any non-2xx response maps to
//! [`SyncError::RemoteRejection`] with the response body as the message.

use async_trait::async_trait;
use loomworks_types::{EntityKind, OwnerId, Record};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;

/// Remote row store client backed by reqwest.
#[derive(Clone)]
pub struct RestRowStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestRowStore {
    pub fn new(config: &SyncConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to build http client");

        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn table_url(&self, kind: EntityKind) -> String {
        format!("{}/rest/v1/{}", self.base_url, kind.table_name())
    }

    fn transport_error(e: reqwest::Error) -> SyncError {
        SyncError::Connectivity(e.to_string())
    }

    /// Maps a non-success response to a rejection carrying the body text.
    async fn check_status(response: Response) -> SyncResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(SyncError::RemoteRejection {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteStore for RestRowStore {
    async fn list(&self, kind: EntityKind, owner: &OwnerId) -> SyncResult<Vec<Record>> {
        debug!(table = kind.table_name(), "listing remote rows");
        let response = self
            .client
            .get(self.table_url(kind))
            .header("apikey", self.api_key.as_str())
            .query(&[("owner_id", format!("eq.{owner}"))])
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        response
            .json::<Vec<Record>>()
            .await
            .map_err(Self::transport_error)
    }

    async fn insert(
        &self,
        kind: EntityKind,
        owner: &OwnerId,
        fields: &Value,
    ) -> SyncResult<Record> {
        debug!(table = kind.table_name(), "inserting remote row");
        let mut body = fields.clone();
        if let Some(map) = body.as_object_mut() {
            map.insert("owner_id".to_string(), Value::String(owner.to_string()));
        }

        let response = self
            .client
            .post(self.table_url(kind))
            .header("apikey", self.api_key.as_str())
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        let mut rows = response
            .json::<Vec<Record>>()
            .await
            .map_err(Self::transport_error)?;

        if rows.is_empty() {
            return Err(SyncError::RemoteRejection {
                status: StatusCode::OK.as_u16(),
                message: "insert returned no representation".to_string(),
            });
        }
        Ok(rows.remove(0))
    }

    async fn update(
        &self,
        kind: EntityKind,
        owner: &OwnerId,
        id: &str,
        patch: &Value,
    ) -> SyncResult<()> {
        debug!(table = kind.table_name(), id, "updating remote row");
        let response = self
            .client
            .patch(self.table_url(kind))
            .header("apikey", self.api_key.as_str())
            .query(&[
                ("id", format!("eq.{id}")),
                ("owner_id", format!("eq.{owner}")),
            ])
            .json(patch)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, owner: &OwnerId, id: &str) -> SyncResult<()> {
        debug!(table = kind.table_name(), id, "deleting remote row");
        let response = self
            .client
            .delete(self.table_url(kind))
            .header("apikey", self.api_key.as_str())
            .query(&[
                ("id", format!("eq.{id}")),
                ("owner_id", format!("eq.{owner}")),
            ])
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::check_status(response).await?;
        Ok(())
    }
}

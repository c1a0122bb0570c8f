//! REST backend speaking the hosted backend's auto-generated, PostgREST-style
//! API: tables exposed as collections, `column=eq.value` filters, embedded
//! child rows via `select=`.

use crate::AdStore;
use adserve_core::config::StoreConfig;
use adserve_core::types::{GlobalAdSettings, MetricEvent, Slot, SlotBinding};
use adserve_core::{AdResult, AdServeError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::form_urlencoded;
use uuid::Uuid;

const SLOTS_TABLE: &str = "ad_slots";
const SETTINGS_TABLE: &str = "ad_settings";
const BINDINGS_TABLE: &str = "campaign_ad_slots";
const METRICS_TABLE: &str = "ad_metrics";

/// Columns pulled for a binding, with the campaign and its assets embedded.
const BINDING_SELECT: &str = "id,slot_id,weight,priority,is_enabled,\
campaign:campaigns(id,name,is_active,start_date,end_date,target_url,\
assets:campaign_assets(id,file_url,alt_text,width,height))";

pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> AdResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| AdServeError::Config(format!("invalid api key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| AdServeError::Config(format!("http client build failed: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, table: &str, query: &str) -> AdResult<Vec<T>> {
        let url = format!("{}/{}?{}", self.base_url, table, query);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify(table, e))?;

        let response = response
            .error_for_status()
            .map_err(|e| AdServeError::Store(format!("{table}: {e}")))?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| AdServeError::Store(format!("{table}: decode failed: {e}")))
    }
}

/// Percent-encode a caller-supplied value before it lands in a filter
/// expression, so a code containing `&` or `=` cannot smuggle in extra
/// filter terms.
fn encode_filter_value(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

fn classify(table: &str, e: reqwest::Error) -> AdServeError {
    if e.is_timeout() {
        AdServeError::Timeout(format!("{table}: {e}"))
    } else {
        AdServeError::Store(format!("{table}: {e}"))
    }
}

#[async_trait]
impl AdStore for RestStore {
    fn backend_tag(&self) -> &'static str {
        "rest"
    }

    async fn slot_by_code(&self, code: &str) -> AdResult<Option<Slot>> {
        let query = format!("code=eq.{}&limit=1", encode_filter_value(code));
        let mut rows: Vec<Slot> = self.fetch_rows(SLOTS_TABLE, &query).await?;
        Ok(rows.pop())
    }

    async fn global_settings(&self) -> AdResult<Option<GlobalAdSettings>> {
        let mut rows: Vec<GlobalAdSettings> =
            self.fetch_rows(SETTINGS_TABLE, "limit=1").await?;
        Ok(rows.pop())
    }

    async fn bindings_for_slot(&self, slot_id: Uuid) -> AdResult<Vec<SlotBinding>> {
        let query = format!("slot_id=eq.{slot_id}&select={BINDING_SELECT}");
        self.fetch_rows(BINDINGS_TABLE, &query).await
    }

    async fn write_metric(&self, event: &MetricEvent) -> AdResult<()> {
        let url = format!("{}/{}", self.base_url, METRICS_TABLE);
        let response = self
            .client
            .post(&url)
            .json(event)
            .send()
            .await
            .map_err(|e| classify(METRICS_TABLE, e))?;

        response
            .error_for_status()
            .map_err(|e| AdServeError::Store(format!("{METRICS_TABLE}: {e}")))?;
        Ok(())
    }
}

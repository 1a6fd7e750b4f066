use anyhow::Context;
use pipeline_core::invalidation::InvalidationHub;
use pipeline_core::opportunity::Opportunity;
use pipeline_core::reconcile::{RecordSource, StageUpdater};
use pipeline_core::types::Taxonomy;
use pipeline_core::{PipelineError, Result};
use std::io::{BufRead, BufReader};
use std::time::Duration;

/// Record source and stage updater backed by a running `pipeline serve`.
#[derive(Clone)]
pub struct HttpBackend {
    base: String,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(base: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .build();
        Self {
            base: base.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub fn get_json(&self, path: &str) -> anyhow::Result<serde_json::Value> {
        let url = self.url(path);
        let resp = self
            .agent
            .get(&url)
            .call()
            .map_err(describe)
            .with_context(|| format!("GET {url}"))?;
        Ok(resp.into_json()?)
    }

    pub fn post_json(&self, path: &str, body: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let url = self.url(path);
        let resp = self
            .agent
            .post(&url)
            .send_json(body)
            .map_err(describe)
            .with_context(|| format!("POST {url}"))?;
        Ok(resp.into_json()?)
    }

    /// Follow the server's event stream on a background thread, turning every
    /// `update` event into a hub signal. The thread ends with the stream.
    pub fn follow_events(&self, hub: InvalidationHub) -> std::thread::JoinHandle<anyhow::Result<()>> {
        let agent = self.agent.clone();
        let url = self.url("/api/events");
        std::thread::spawn(move || {
            let resp = agent
                .get(&url)
                .call()
                .map_err(describe)
                .with_context(|| format!("GET {url}"))?;
            tracing::info!(%url, "following invalidation stream");
            for line in BufReader::new(resp.into_reader()).lines() {
                if line?.trim() == "event: update" {
                    hub.signal();
                }
            }
            tracing::warn!("invalidation stream closed by server");
            Ok(())
        })
    }
}

/// Flatten a ureq error, pulling the server's `{"error": ...}` body out of
/// status responses.
fn describe(err: ureq::Error) -> anyhow::Error {
    match err {
        ureq::Error::Status(code, resp) => {
            let message = resp
                .into_json::<serde_json::Value>()
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or_else(|| "no detail".to_string());
            anyhow::anyhow!("server answered {code}: {message}")
        }
        ureq::Error::Transport(t) => anyhow::anyhow!("{t}"),
    }
}

impl RecordSource for HttpBackend {
    fn fetch_records(&self) -> Result<Vec<Opportunity>> {
        let value = self
            .get_json("/api/opportunities")
            .map_err(|e| PipelineError::Fetch(format!("{e:#}")))?;
        Ok(serde_json::from_value(value)?)
    }
}

impl StageUpdater for HttpBackend {
    fn update_stage(&self, record_id: &str, taxonomy: Taxonomy, stage_id: &str) -> Result<()> {
        let url = self.url(&format!("/api/opportunities/{record_id}"));
        let mut body = serde_json::Map::new();
        body.insert(taxonomy.field().to_string(), stage_id.into());
        self.agent
            .request("PATCH", &url)
            .send_json(serde_json::Value::Object(body))
            .map_err(|e| PipelineError::UpdateRejected(format!("{:#}", describe(e))))?;
        Ok(())
    }
}

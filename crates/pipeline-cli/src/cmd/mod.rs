pub mod agenda;
pub mod bell;
pub mod board;
pub mod config;
pub mod init;
pub mod mv;
pub mod serve;
pub mod watch;

use crate::client::HttpBackend;
use pipeline_core::opportunity::Opportunity;
use pipeline_core::reconcile::{RecordSource, StageUpdater};
use pipeline_core::store::OpportunityStore;
use pipeline_core::types::Taxonomy;
use std::path::Path;

/// Where records come from: the project's file store, or a running server
/// when `--server` is given.
#[derive(Clone)]
pub enum Backend {
    Local(OpportunityStore),
    Remote(HttpBackend),
}

impl Backend {
    pub fn select(root: &Path, server: Option<&str>) -> Self {
        match server {
            Some(url) => Backend::Remote(HttpBackend::new(url)),
            None => Backend::Local(OpportunityStore::new(root)),
        }
    }
}

impl RecordSource for Backend {
    fn fetch_records(&self) -> pipeline_core::Result<Vec<Opportunity>> {
        match self {
            Backend::Local(store) => store.fetch_records(),
            Backend::Remote(http) => http.fetch_records(),
        }
    }
}

impl StageUpdater for Backend {
    fn update_stage(
        &self,
        record_id: &str,
        taxonomy: Taxonomy,
        stage_id: &str,
    ) -> pipeline_core::Result<()> {
        match self {
            Backend::Local(store) => store.update_stage(record_id, taxonomy, stage_id),
            Backend::Remote(http) => http.update_stage(record_id, taxonomy, stage_id),
        }
    }
}

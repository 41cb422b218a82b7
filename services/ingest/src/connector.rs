use async_trait::async_trait;
use serde::Serialize;

use crmsync_common::error::CrmResult;

/// Counts from one entity's fetch-and-mirror run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub source: String,
    pub fetched: usize,
    pub discarded: usize,
    pub staged: u64,
    pub upserted: u64,
    pub pruned: u64,
    pub elapsed_ms: u128,
}

#[async_trait]
pub trait Connector: Send + Sync {
    fn source_name(&self) -> &str;
    async fn sync(&self) -> CrmResult<SyncResult>;
}

/// Totals across every entity in one ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub discarded: usize,
    pub staged: u64,
    pub upserted: u64,
    pub pruned: u64,
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn record(&mut self, result: &SyncResult) {
        self.fetched += result.fetched;
        self.discarded += result.discarded;
        self.staged += result.staged;
        self.upserted += result.upserted;
        self.pruned += result.pruned;
    }

    pub fn record_failure(&mut self, source: &str) {
        self.failed.push(source.to_string());
    }

    pub fn succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_accumulates_results_and_failures() {
        let mut summary = RunSummary::default();
        summary.record(&SyncResult {
            source: "contacts".to_string(),
            fetched: 10,
            discarded: 1,
            staged: 9,
            upserted: 4,
            pruned: 2,
            elapsed_ms: 50,
        });
        summary.record(&SyncResult {
            source: "deals".to_string(),
            fetched: 5,
            staged: 5,
            upserted: 5,
            ..Default::default()
        });
        assert!(summary.succeeded());

        summary.record_failure("leads");

        assert_eq!(summary.fetched, 15);
        assert_eq!(summary.discarded, 1);
        assert_eq!(summary.staged, 14);
        assert_eq!(summary.upserted, 9);
        assert_eq!(summary.pruned, 2);
        assert_eq!(summary.failed, vec!["leads"]);
        assert!(!summary.succeeded());
    }
}

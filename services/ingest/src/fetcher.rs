//! Paginated retrieval of a complete object collection.
//!
//! The fetcher never fails. A source error ends the walk and whatever was
//! accumulated so far is returned, so a partial batch can still be mirrored.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;

use crmsync_config::{FetchMode, MAX_PAGE_SIZE};
use crmsync_db::crm::Properties;

use crate::hubspot::models::{HubSpotObject, ObjectPage};

/// Remote collection endpoint capability.
#[async_trait]
pub trait RecordSource: Send + Sync {
    type Error: Display + Send;

    async fn list_page(
        &self,
        object_type: &str,
        after: Option<&str>,
        limit: usize,
        properties: &[&str],
    ) -> Result<ObjectPage, Self::Error>;

    async fn read_batch(
        &self,
        object_type: &str,
        ids: &[String],
        properties: &[&str],
    ) -> Result<Vec<HubSpotObject>, Self::Error>;
}

/// Keeps only listed objects whose properties pass.
pub type ListFilter = fn(&Properties) -> bool;

/// What to fetch for one entity.
#[derive(Clone, Copy)]
pub struct FetchPlan<'a> {
    pub object_type: &'a str,
    /// Full property selector.
    pub properties: &'a [&'a str],
    /// Properties the filter needs when listing identifiers only.
    pub filter_properties: &'a [&'a str],
    pub filter: Option<ListFilter>,
}

#[derive(Debug, Clone, Copy)]
pub struct FetcherSettings {
    pub page_size: usize,
    pub page_delay: Duration,
    pub mode: FetchMode,
}

pub struct Fetcher<'s, S> {
    source: &'s S,
    settings: FetcherSettings,
}

impl<'s, S: RecordSource> Fetcher<'s, S> {
    pub fn new(source: &'s S, settings: FetcherSettings) -> Self {
        let settings = FetcherSettings {
            page_size: settings.page_size.clamp(1, MAX_PAGE_SIZE),
            ..settings
        };
        Self { source, settings }
    }

    /// Fetch the collection described by `plan`, up to `max_records` objects.
    pub async fn fetch(&self, plan: &FetchPlan<'_>, max_records: Option<usize>) -> Vec<HubSpotObject> {
        match self.settings.mode {
            FetchMode::List => self.walk(plan, plan.properties, max_records).await,
            FetchMode::ListThenRead => {
                let mut selector = vec!["hs_object_id"];
                for p in plan.filter_properties {
                    if !selector.contains(p) {
                        selector.push(*p);
                    }
                }
                let listed = self.walk(plan, &selector, max_records).await;
                let ids: Vec<String> = listed.into_iter().map(|o| o.id).collect();
                self.read_all(plan, &ids).await
            }
        }
    }

    async fn walk(
        &self,
        plan: &FetchPlan<'_>,
        properties: &[&str],
        max_records: Option<usize>,
    ) -> Vec<HubSpotObject> {
        let mut records: Vec<HubSpotObject> = Vec::new();
        let mut after: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let limit = match max_records {
                Some(max) => self.settings.page_size.min(max.saturating_sub(records.len())),
                None => self.settings.page_size,
            };
            if limit == 0 {
                break;
            }

            let page = match self
                .source
                .list_page(plan.object_type, after.as_deref(), limit, properties)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        object_type = plan.object_type,
                        error = %e,
                        fetched = records.len(),
                        "list page failed, returning partial batch"
                    );
                    break;
                }
            };
            pages += 1;

            match plan.filter {
                Some(keep) => records.extend(
                    page.results
                        .into_iter()
                        .filter(|o| keep(&o.properties)),
                ),
                None => records.extend(page.results),
            }

            if let Some(max) = max_records {
                if records.len() >= max {
                    records.truncate(max);
                    break;
                }
            }

            match page.next_after {
                Some(next) => after = Some(next),
                None => break,
            }

            if !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }
        }

        tracing::debug!(
            object_type = plan.object_type,
            pages,
            fetched = records.len(),
            "list walk finished"
        );
        records
    }

    async fn read_all(&self, plan: &FetchPlan<'_>, ids: &[String]) -> Vec<HubSpotObject> {
        let mut records = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_PAGE_SIZE) {
            match self
                .source
                .read_batch(plan.object_type, chunk, plan.properties)
                .await
            {
                Ok(objects) => records.extend(objects),
                Err(e) => {
                    tracing::warn!(
                        object_type = plan.object_type,
                        error = %e,
                        fetched = records.len(),
                        "batch read failed, returning partial batch"
                    );
                    break;
                }
            }
        }

        records
    }
}

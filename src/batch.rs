//! Sequential, paced lookup over a list of ASINs.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::FetchError;
use crate::fetch::HttpClient;
use crate::fetcher::RecordFetcher;
use crate::record::{Asin, ProductRecord, QuotaState};

/// How far the batch has got.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

/// An item whose lookup failed and was replaced by an empty record.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub asin: Asin,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<ProductRecord>,
    pub quota: QuotaState,
    pub failures: Vec<ItemFailure>,
    /// Items that answered but carried no usable rating.
    pub unrated: Vec<Asin>,
}

/// The record stored for an item whose lookup failed: ASIN only, all else empty.
pub fn degrade(asin: &Asin) -> ProductRecord {
    ProductRecord::empty(asin.clone())
}

pub struct BatchRunner<'a, C> {
    fetcher: RecordFetcher<'a, C>,
    pacing: Duration,
}

impl<'a, C: HttpClient> BatchRunner<'a, C> {
    pub fn new(fetcher: RecordFetcher<'a, C>, pacing: Duration) -> Self {
        Self { fetcher, pacing }
    }

    /// Fetches every ASIN in order, one at a time, sleeping `pacing` after each.
    ///
    /// Duplicates are fetched again and produce duplicate records. A failed
    /// item never stops the batch; it is degraded to an empty record and
    /// listed in [`BatchOutcome::failures`].
    #[tracing::instrument(skip_all, fields(total = asins.len()))]
    pub async fn run<F>(&self, asins: &[Asin], mut on_progress: F) -> BatchOutcome
    where
        F: FnMut(Progress),
    {
        let total = asins.len();
        let mut outcome = BatchOutcome {
            records: Vec::with_capacity(total),
            ..Default::default()
        };

        for (i, asin) in asins.iter().enumerate() {
            let result = self.fetcher.fetch(asin, &mut outcome.quota).await;
            if matches!(&result, Ok(record) if !record.has_rating()) {
                outcome.unrated.push(asin.clone());
            }
            outcome.records.push(self.settle(asin, result, &mut outcome.failures));

            on_progress(Progress { done: i + 1, total });

            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        info!(
            total,
            failed = outcome.failures.len(),
            unrated = outcome.unrated.len(),
            credits_used = ?outcome.quota.used,
            credits_remaining = ?outcome.quota.remaining,
            "Batch finished"
        );
        outcome
    }

    fn settle(
        &self,
        asin: &Asin,
        result: Result<ProductRecord, FetchError>,
        failures: &mut Vec<ItemFailure>,
    ) -> ProductRecord {
        match result {
            Ok(record) => record,
            Err(e) => {
                warn!(asin = %asin, error = %e, "Error fetching ASIN");
                failures.push(ItemFailure {
                    asin: asin.clone(),
                    message: e.to_string(),
                });
                degrade(asin)
            }
        }
    }
}

use std::collections::BTreeMap;

use flightdelay_classifier::RejectReason;
use serde::Serialize;

/// Rejected-record counts keyed by [`RejectReason::code`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RejectionTally {
    counts: BTreeMap<&'static str, usize>,
}

impl RejectionTally {
    pub fn record(&mut self, reason: &RejectReason) {
        *self.counts.entry(reason.code()).or_default() += 1;
    }

    pub fn get(&self, code: &str) -> usize {
        self.counts.get(code).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.counts.iter().map(|(code, count)| (*code, *count))
    }
}

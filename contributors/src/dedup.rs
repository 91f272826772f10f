use crate::api::ContributorRecord;
use log::info;
use std::collections::HashSet;

/// Ordered output table admitting a single record per username.
#[derive(Debug, Default)]
pub(crate) struct Deduplicator {
    seen: HashSet<String>,
    records: Vec<ContributorRecord>,
}

impl Deduplicator {
    /// First sighting wins, later ones are dropped without touching the kept record.
    pub(crate) fn admit(&mut self, record: ContributorRecord) -> bool {
        if self.seen.contains(&record.username) {
            info!(
                "Skipping duplicate contributor @{} of {}",
                record.username, record.project_name
            );
            return false;
        }
        self.seen.insert(record.username.clone());
        self.records.push(record);
        true
    }

    pub(crate) fn records(&self) -> &[ContributorRecord] {
        &self.records
    }

    pub(crate) fn into_records(self) -> Vec<ContributorRecord> {
        self.records
    }
}

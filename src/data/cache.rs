use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::data::columnar::Table;
use crate::data::loader::{self, ReportFormat};
use crate::error::Result;

/// Memoized report loading, keyed by the identity of the uploaded bytes.
///
/// Re-running the pipeline after a filter change hands the same upload back
/// in; the cache skips the reparse. Purely an optimization: a miss always
/// falls through to [`loader::load`]. Entries keep their bytes, and a hit
/// requires the bytes to match, so two uploads with the same fingerprint
/// never share a table.
#[derive(Default)]
pub struct ReportCache {
    tables: HashMap<(u64, ReportFormat), Vec<CachedReport>>,
}

struct CachedReport {
    bytes: Vec<u8>,
    table: Table,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, bytes: &[u8], format: ReportFormat) -> Result<Table> {
        let key = (fingerprint(bytes), format);
        let bucket = self.tables.entry(key).or_default();
        if let Some(hit) = bucket.iter().find(|c| c.bytes == bytes) {
            tracing::debug!(rows = hit.table.len(), "report cache hit");
            return Ok(hit.table.clone());
        }
        let table = loader::load(bytes, format)?;
        bucket.push(CachedReport { bytes: bytes.to_vec(), table: table.clone() });
        Ok(table)
    }

    /// Number of cached reports.
    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

fn fingerprint(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_uploads_parse_once() {
        let mut cache = ReportCache::new();
        let csv = b"TransactionName,Run1\nLogin,1\n";
        let first = cache.load(csv, ReportFormat::DelimitedText).unwrap();
        let second = cache.load(csv, ReportFormat::DelimitedText).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);

        cache.load(b"TransactionName,Run1\nLogout,2\n", ReportFormat::DelimitedText).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn colliding_fingerprints_do_not_share_a_table() {
        let mut cache = ReportCache::new();
        let wanted = b"TransactionName,Run1\nLogin,1\n";
        let other = b"TransactionName,Run1\nLogout,2\n";
        let other_table = loader::load(other, ReportFormat::DelimitedText).unwrap();
        // file `other` under the fingerprint of `wanted`
        cache.tables.insert(
            (fingerprint(wanted), ReportFormat::DelimitedText),
            vec![CachedReport { bytes: other.to_vec(), table: other_table }],
        );

        let table = cache.load(wanted, ReportFormat::DelimitedText).unwrap();
        assert_eq!(table.unique_values("TransactionName"), vec!["Login"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let mut cache = ReportCache::new();
        assert!(cache.load(b"", ReportFormat::DelimitedText).is_err());
        assert!(cache.is_empty());
    }
}

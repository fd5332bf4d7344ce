use chrono::NaiveDate;
use thiserror::Error;

use khata_core::{CommittedExpense, ReferenceCatalog, StagedExpense, StagedUpdate, TempId};
use khata_ingest::{expand, ExpandOptions, FieldMapping, ParseError, Role, SourceTable};

use crate::commit::{finalize, CommitError, ExpenseSink};
use crate::store::StagingStore;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("no file loaded")]
    NoFileLoaded,
    #[error("mapping incomplete: map a date (or set a common date) and an amount or breakdown column")]
    MappingIncomplete,
    #[error("a commit is in flight; edits are disabled")]
    CommitInFlight,
    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// One ingestion session, load to commit.
///
/// All pipeline state lives here explicitly — the parsed table, the column
/// mapping, the common-date override, the staged working set — so stages
/// can be unit-tested in isolation and sessions can coexist. Everything is
/// single-threaded and synchronous except [`ImportSession::commit`].
pub struct ImportSession {
    catalog: ReferenceCatalog,
    currency: String,
    table: Option<SourceTable>,
    mapping: FieldMapping,
    common_date: Option<NaiveDate>,
    store: StagingStore,
    committing: bool,
}

impl ImportSession {
    /// The catalog is fetched once, before staging begins, and stays
    /// read-only for the session's lifetime.
    pub fn new(catalog: ReferenceCatalog, currency: &str) -> Self {
        ImportSession {
            catalog,
            currency: currency.to_string(),
            table: None,
            mapping: FieldMapping::default(),
            common_date: None,
            store: StagingStore::default(),
            committing: false,
        }
    }

    /// Parse an uploaded file and infer an initial mapping from its header.
    /// Replaces any previously loaded table and discards staged records.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let table = SourceTable::parse(bytes)?;
        tracing::info!(
            columns = table.headers().len(),
            rows = table.row_count(),
            "file parsed"
        );
        self.mapping = FieldMapping::infer(table.headers());
        self.table = Some(table);
        self.store.clear();
        Ok(())
    }

    pub fn table(&self) -> Option<&SourceTable> {
        self.table.as_ref()
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn set_role(&mut self, role: Role, column: Option<String>) {
        self.mapping.set(role, column);
    }

    pub fn set_common_date(&mut self, date: NaiveDate) {
        self.common_date = Some(date);
    }

    pub fn clear_common_date(&mut self) {
        self.common_date = None;
    }

    /// Whether the mapping-to-review transition is enabled.
    pub fn mapping_ready(&self) -> bool {
        self.mapping.ready(self.common_date.is_some())
    }

    /// Run one expansion pass over the loaded table with the current
    /// mapping, replacing the staged working set. Returns the staged count;
    /// fewer staged records than source rows is the (intentional) signal
    /// that rows were skipped.
    pub fn expand(&mut self) -> Result<usize, SessionError> {
        let table = self.table.as_ref().ok_or(SessionError::NoFileLoaded)?;
        if !self.mapping_ready() {
            return Err(SessionError::MappingIncomplete);
        }

        let opts = ExpandOptions {
            common_date: self.common_date,
            currency: self.currency.clone(),
        };
        let staged = expand(table, &self.mapping, &self.catalog, &opts);
        tracing::info!(
            staged = staged.len(),
            rows = table.row_count(),
            "expansion complete"
        );
        self.store.load(staged);
        Ok(self.store.len())
    }

    pub fn staged(&self) -> &[StagedExpense] {
        self.store.list()
    }

    pub fn staged_total(&self) -> rust_decimal::Decimal {
        self.store.total()
    }

    pub fn update(&mut self, temp_id: &TempId, patch: &StagedUpdate) -> Result<(), SessionError> {
        self.guard_commit()?;
        self.store.update(temp_id, patch);
        Ok(())
    }

    pub fn remove(&mut self, temp_id: &TempId) -> Result<(), SessionError> {
        self.guard_commit()?;
        self.store.remove(temp_id);
        Ok(())
    }

    /// Submit the staged set as one all-or-nothing batch.
    ///
    /// An empty staged set commits to nothing without contacting the sink.
    /// On success the whole pipeline resets — table, mapping, common date,
    /// staged records. On failure everything stays intact and uncommitted,
    /// safe to retry unchanged. Edits are disabled while the call is in
    /// flight so a late edit cannot race the serialized snapshot.
    pub async fn commit<S: ExpenseSink>(
        &mut self,
        sink: &S,
    ) -> Result<Vec<CommittedExpense>, SessionError> {
        self.guard_commit()?;
        if self.store.is_empty() {
            return Ok(Vec::new());
        }

        let records = finalize(self.store.list(), &self.catalog);
        self.committing = true;
        let result = sink.create_batch(&records).await;
        self.committing = false;

        match result {
            Ok(committed) => {
                tracing::info!(count = committed.len(), "batch committed");
                self.reset();
                Ok(committed)
            }
            Err(err) => {
                tracing::warn!(error = %err, "commit failed; staged records preserved");
                Err(err.into())
            }
        }
    }

    /// Discard the whole in-flight session: parser output, mapping,
    /// common-date override, and staged records.
    pub fn reset(&mut self) {
        self.table = None;
        self.mapping = FieldMapping::default();
        self.common_date = None;
        self.store.clear();
    }

    /// Single-flight rule: edits are rejected while a commit is in flight.
    /// With the current API the guard is belt-and-braces — `commit` holds
    /// `&mut self` across its await, so no edit can interleave in safe code
    /// and the flag is never observably set. It stays because it encodes the
    /// rule at the data level, where it would still hold if commit ever
    /// moved to a shared-handle API.
    fn guard_commit(&self) -> Result<(), SessionError> {
        if self.committing {
            return Err(SessionError::CommitInFlight);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use khata_core::{CatalogEntry, NewExpense};
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    const CSV: &[u8] = b"Date,Total,Category,Source\n\
        2024-01-15,$45.50,Food,Swiggy\n\
        2024-01-16,not-a-number,Food,\n\
        17-01-2024,30,,\n";

    fn catalog() -> ReferenceCatalog {
        ReferenceCatalog {
            categories: vec![CatalogEntry::new(3, "Food")],
            people: vec![],
            payment_methods: vec![CatalogEntry::new(1, "Cash")],
            apps: vec![CatalogEntry::new(9, "Swiggy")],
        }
    }

    fn session() -> ImportSession {
        ImportSession::new(catalog(), "INR")
    }

    /// Records every batch it receives; fails on demand.
    #[derive(Default)]
    struct MockSink {
        batches: Mutex<Vec<Vec<NewExpense>>>,
        fail: bool,
    }

    impl ExpenseSink for MockSink {
        async fn create_batch(
            &self,
            records: &[NewExpense],
        ) -> Result<Vec<CommittedExpense>, CommitError> {
            self.batches.lock().unwrap().push(records.to_vec());
            if self.fail {
                return Err(CommitError::Rejected {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(records
                .iter()
                .enumerate()
                .map(|(i, r)| CommittedExpense {
                    id: i as i64 + 1,
                    record: r.clone(),
                })
                .collect())
        }
    }

    #[test]
    fn load_infers_mapping() {
        let mut s = session();
        s.load(CSV).unwrap();
        assert_eq!(s.mapping().date.as_deref(), Some("Date"));
        assert_eq!(s.mapping().amount.as_deref(), Some("Total"));
        assert_eq!(s.mapping().app.as_deref(), Some("Source"));
        assert!(s.mapping_ready());
    }

    #[test]
    fn expand_without_file_errors() {
        let mut s = session();
        assert!(matches!(s.expand(), Err(SessionError::NoFileLoaded)));
    }

    #[test]
    fn expand_with_incomplete_mapping_is_blocked() {
        let mut s = session();
        s.load(CSV).unwrap();
        s.set_role(Role::Amount, None);
        assert!(matches!(s.expand(), Err(SessionError::MappingIncomplete)));

        // The common-date override waives only the date requirement.
        s.set_common_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(matches!(s.expand(), Err(SessionError::MappingIncomplete)));

        s.set_role(Role::Amount, Some("Total".to_string()));
        assert_eq!(s.expand().unwrap(), 2);
    }

    #[test]
    fn expand_skips_unparsable_rows() {
        let mut s = session();
        s.load(CSV).unwrap();
        // 3 source rows, one with an unparsable amount.
        assert_eq!(s.expand().unwrap(), 2);
        assert_eq!(s.staged()[0].category_id, Some(3));
        assert_eq!(s.staged()[1].expense_date.to_string(), "2024-01-17");
    }

    #[test]
    fn staged_edits_flow_through_store() {
        let mut s = session();
        s.load(CSV).unwrap();
        s.expand().unwrap();

        let id = s.staged()[0].temp_id.clone();
        s.update(&id, &StagedUpdate::amount(Decimal::from(100)))
            .unwrap();
        assert_eq!(s.staged()[0].amount_converted, Decimal::from(100));

        s.remove(&id).unwrap();
        assert_eq!(s.staged().len(), 1);
    }

    #[tokio::test]
    async fn commit_empty_session_skips_the_sink() {
        let mut s = session();
        let sink = MockSink::default();
        let committed = s.commit(&sink).await.unwrap();
        assert!(committed.is_empty());
        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_applies_notes_default_and_resets() {
        let mut s = session();
        s.load(CSV).unwrap();
        s.expand().unwrap();

        let sink = MockSink::default();
        let committed = s.commit(&sink).await.unwrap();
        assert_eq!(committed.len(), 2);

        // Row 0 had no notes but a resolved app → app name becomes notes.
        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches[0][0].notes, "Swiggy");
        assert_eq!(batches[0][1].notes, "");

        // Full pipeline reset on success.
        assert!(s.staged().is_empty());
        assert!(s.table().is_none());
        assert_eq!(*s.mapping(), FieldMapping::default());
    }

    #[tokio::test]
    async fn failed_commit_preserves_staged_state() {
        let mut s = session();
        s.load(CSV).unwrap();
        s.expand().unwrap();

        let sink = MockSink {
            fail: true,
            ..Default::default()
        };
        assert!(matches!(
            s.commit(&sink).await,
            Err(SessionError::Commit(CommitError::Rejected { status: 500, .. }))
        ));

        // Intact and safe to retry unchanged.
        assert_eq!(s.staged().len(), 2);
        assert!(s.table().is_some());

        let ok_sink = MockSink::default();
        assert_eq!(s.commit(&ok_sink).await.unwrap().len(), 2);
    }

    #[test]
    fn reset_discards_everything() {
        let mut s = session();
        s.load(CSV).unwrap();
        s.set_common_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        s.expand().unwrap();

        s.reset();
        assert!(s.table().is_none());
        assert!(s.staged().is_empty());
        assert!(!s.mapping_ready());
    }

    #[test]
    fn reload_discards_previous_staging() {
        let mut s = session();
        s.load(CSV).unwrap();
        s.expand().unwrap();
        assert_eq!(s.staged().len(), 2);

        s.load(b"Date,Cost\n2024-02-01,5\n").unwrap();
        assert!(s.staged().is_empty());
        assert_eq!(s.mapping().amount.as_deref(), Some("Cost"));
    }
}

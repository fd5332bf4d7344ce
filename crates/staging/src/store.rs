use rust_decimal::Decimal;

use khata_core::{StagedExpense, StagedUpdate, TempId};

/// The session's working set of staged expenses.
///
/// Owns its records exclusively; callers address them by `tempId` only and
/// read them back through [`StagingStore::list`]. Insertion order is stable
/// across edits, so the displayed order always mirrors the source file.
#[derive(Debug, Default)]
pub struct StagingStore {
    records: Vec<StagedExpense>,
}

impl StagingStore {
    /// Replace the working set with a fresh expansion pass.
    pub fn load(&mut self, records: Vec<StagedExpense>) {
        self.records = records;
    }

    pub fn list(&self) -> &[StagedExpense] {
        &self.records
    }

    pub fn get(&self, temp_id: &TempId) -> Option<&StagedExpense> {
        self.records.iter().find(|e| &e.temp_id == temp_id)
    }

    /// Patch one record in place. A missing `tempId` is a no-op, not an
    /// error: deletion races with display, never with mutation of the same
    /// engine instance, so a late edit against a removed row simply lands
    /// nowhere.
    pub fn update(&mut self, temp_id: &TempId, patch: &StagedUpdate) {
        if let Some(exp) = self.records.iter_mut().find(|e| &e.temp_id == temp_id) {
            patch.apply(exp);
        }
    }

    pub fn remove(&mut self, temp_id: &TempId) {
        self.records.retain(|e| &e.temp_id != temp_id);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn total(&self) -> Decimal {
        self.records.iter().map(|e| e.amount_converted).sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn staged(temp_id: TempId, amount: &str) -> StagedExpense {
        let amount = dec(amount);
        StagedExpense {
            temp_id,
            category_id: None,
            paid_by_person_id: None,
            payment_method_id: 1,
            expense_app_id: None,
            amount_original: amount,
            currency_original: "INR".to_string(),
            amount_converted: amount,
            expense_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            notes: String::new(),
        }
    }

    fn store() -> StagingStore {
        let mut s = StagingStore::default();
        s.load(vec![
            staged(TempId::row(0), "10"),
            staged(TempId::part(1, 0), "20.5"),
            staged(TempId::part(1, 1), "30"),
        ]);
        s
    }

    #[test]
    fn list_keeps_insertion_order() {
        let s = store();
        let ids: Vec<_> = s.list().iter().map(|e| e.temp_id.to_string()).collect();
        assert_eq!(ids, ["row-0", "row-1-part-0", "row-1-part-1"]);
    }

    #[test]
    fn update_amount_syncs_converted() {
        let mut s = store();
        s.update(&TempId::row(0), &StagedUpdate::amount(dec("99.99")));
        let exp = s.get(&TempId::row(0)).unwrap();
        assert_eq!(exp.amount_original, dec("99.99"));
        assert_eq!(exp.amount_converted, dec("99.99"));
    }

    #[test]
    fn update_missing_id_is_noop() {
        let mut s = store();
        s.update(&TempId::row(42), &StagedUpdate::amount(dec("1")));
        assert_eq!(s.len(), 3);
        assert_eq!(s.total(), dec("60.5"));
    }

    #[test]
    fn remove_then_total() {
        let mut s = store();
        s.remove(&TempId::part(1, 0));
        assert_eq!(s.len(), 2);
        assert_eq!(s.total(), dec("40"));
        assert!(s.get(&TempId::part(1, 0)).is_none());
    }

    #[test]
    fn remove_missing_id_is_noop() {
        let mut s = store();
        s.remove(&TempId::row(9));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn clear_empties_the_store() {
        let mut s = store();
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.total(), Decimal::ZERO);
    }

    #[test]
    fn total_sums_converted_amounts() {
        assert_eq!(store().total(), dec("60.5"));
    }
}

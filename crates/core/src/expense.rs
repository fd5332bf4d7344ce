use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a staged record within one staging session. Stable for the
/// session's lifetime and derived from the source position, so re-expanding
/// the same file yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TempId(String);

impl TempId {
    /// Id for a record produced by the primary-amount fallback path.
    pub fn row(row_index: usize) -> Self {
        TempId(format!("row-{row_index}"))
    }

    /// Id for one part of a split breakdown cell.
    pub fn part(row_index: usize, part_index: usize) -> Self {
        TempId(format!("row-{row_index}-part-{part_index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate expense, fully resolved against the reference catalog, held
/// in the staging store pending user review and batch commit.
///
/// `payment_method_id` is the only mandatory foreign reference; everything
/// else may stay unresolved. `amount_converted` always mirrors
/// `amount_original` — no conversion happens at this stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedExpense {
    pub temp_id: TempId,
    pub category_id: Option<i64>,
    pub paid_by_person_id: Option<i64>,
    pub payment_method_id: i64,
    pub expense_app_id: Option<i64>,
    pub amount_original: Decimal,
    pub currency_original: String,
    pub amount_converted: Decimal,
    pub expense_date: NaiveDate,
    pub notes: String,
}

impl StagedExpense {
    /// Set both amount fields at once. The converted amount has no life of
    /// its own before commit.
    pub fn set_amount(&mut self, amount: Decimal) {
        self.amount_original = amount;
        self.amount_converted = amount;
    }

    pub fn to_record(&self) -> NewExpense {
        NewExpense {
            category_id: self.category_id,
            paid_by_person_id: self.paid_by_person_id,
            payment_method_id: self.payment_method_id,
            expense_app_id: self.expense_app_id,
            amount_original: self.amount_original,
            currency_original: self.currency_original.clone(),
            amount_converted: self.amount_converted,
            expense_date: self.expense_date,
            notes: self.notes.clone(),
        }
    }
}

/// Partial field patch applied to a staged record. `None` leaves the field
/// untouched; the double-`Option` on nullable references distinguishes
/// "don't touch" from "clear to null".
#[derive(Debug, Clone, Default)]
pub struct StagedUpdate {
    pub category_id: Option<Option<i64>>,
    pub paid_by_person_id: Option<Option<i64>>,
    pub payment_method_id: Option<i64>,
    pub expense_app_id: Option<Option<i64>>,
    pub amount: Option<Decimal>,
    pub expense_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl StagedUpdate {
    pub fn amount(amount: Decimal) -> Self {
        StagedUpdate {
            amount: Some(amount),
            ..Default::default()
        }
    }

    pub fn notes(notes: &str) -> Self {
        StagedUpdate {
            notes: Some(notes.to_string()),
            ..Default::default()
        }
    }

    pub fn apply(&self, exp: &mut StagedExpense) {
        if let Some(v) = self.category_id {
            exp.category_id = v;
        }
        if let Some(v) = self.paid_by_person_id {
            exp.paid_by_person_id = v;
        }
        if let Some(v) = self.payment_method_id {
            exp.payment_method_id = v;
        }
        if let Some(v) = self.expense_app_id {
            exp.expense_app_id = v;
        }
        if let Some(v) = self.amount {
            exp.set_amount(v);
        }
        if let Some(v) = self.expense_date {
            exp.expense_date = v;
        }
        if let Some(v) = &self.notes {
            exp.notes = v.clone();
        }
    }
}

/// The wire shape the persistence collaborator accepts, one element per
/// finalized expense. Field names follow the collaborator's JSON contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub category_id: Option<i64>,
    pub paid_by_person_id: Option<i64>,
    pub payment_method_id: i64,
    pub expense_app_id: Option<i64>,
    pub amount_original: Decimal,
    pub currency_original: String,
    pub amount_converted: Decimal,
    pub expense_date: NaiveDate,
    pub notes: String,
}

/// A record as echoed back by the persistence collaborator after a
/// successful batch, with its server-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedExpense {
    pub id: i64,
    #[serde(flatten)]
    pub record: NewExpense,
}

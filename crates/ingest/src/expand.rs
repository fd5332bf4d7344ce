use chrono::NaiveDate;
use rust_decimal::Decimal;

use khata_core::{ReferenceCatalog, StagedExpense, TempId};

use crate::dates::normalize;
use crate::mapping::FieldMapping;
use crate::table::SourceTable;

pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// When set, every staged record gets this date and the per-row date
    /// mapping is bypassed entirely.
    pub common_date: Option<NaiveDate>,
    /// Stamped into `currency_original` (and mirrored into the converted
    /// amount — no conversion happens here).
    pub currency: String,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        ExpandOptions {
            common_date: None,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Expand source rows into staged expenses, one pass, best effort.
///
/// Per row: reference names are resolved against the catalog
/// (case-insensitive exact match; the payment method falls back to the
/// catalog's first entry and is the only mandatory reference). A mapped,
/// non-empty breakdown cell is split on `+` into sub-amounts, one staged
/// record each; the primary amount column is consulted only when the
/// breakdown path emitted nothing for the row. Unparsable parts and rows
/// are dropped silently — partial import beats hard failure here, and the
/// staged-record count is the caller's signal that rows were skipped.
///
/// Output preserves source row order, and split parts keep their
/// left-to-right order.
pub fn expand(
    table: &SourceTable,
    mapping: &FieldMapping,
    catalog: &ReferenceCatalog,
    opts: &ExpandOptions,
) -> Vec<StagedExpense> {
    let Some(fallback_method) = catalog.default_payment_method() else {
        tracing::warn!("catalog has no payment methods; nothing can be staged");
        return Vec::new();
    };

    let mut staged = Vec::new();

    for row in 0..table.row_count() {
        let cell = |column: &Option<String>| cell_for(table, row, column);

        let category_id = catalog.category_id(cell(&mapping.category));
        let payment_method_id = catalog
            .payment_method_id(cell(&mapping.payment_method))
            .unwrap_or(fallback_method);
        let paid_by_person_id = catalog.person_id(cell(&mapping.paid_by));
        let expense_app_id = catalog.app_id(cell(&mapping.app));

        let expense_date = opts
            .common_date
            .unwrap_or_else(|| normalize(cell(&mapping.date)));
        let notes = cell(&mapping.notes).to_string();

        let make = |temp_id: TempId, amount: Decimal| StagedExpense {
            temp_id,
            category_id,
            paid_by_person_id,
            payment_method_id,
            expense_app_id,
            amount_original: amount,
            currency_original: opts.currency.clone(),
            amount_converted: amount,
            expense_date,
            notes: notes.clone(),
        };

        let before = staged.len();

        let breakdown_cell = cell(&mapping.breakdown);
        if mapping.breakdown.is_some() && !breakdown_cell.is_empty() {
            for (part_index, part) in breakdown_cell.split('+').enumerate() {
                match parse_amount(part) {
                    Some(amount) => staged.push(make(TempId::part(row, part_index), amount)),
                    None => {
                        tracing::debug!(row, part_index, part, "dropping unparsable breakdown part")
                    }
                }
            }
        }

        // Primary amount only when the breakdown produced nothing.
        if staged.len() == before && mapping.amount.is_some() {
            match parse_amount(cell(&mapping.amount)) {
                Some(amount) if amount > Decimal::ZERO => {
                    staged.push(make(TempId::row(row), amount));
                }
                _ => tracing::debug!(row, "row contributed no staged records"),
            }
        }
    }

    staged
}

fn cell_for<'t>(table: &'t SourceTable, row: usize, column: &Option<String>) -> &'t str {
    column
        .as_deref()
        .and_then(|c| table.cell(row, c))
        .unwrap_or("")
}

/// Strip everything but digits and `.`, then parse. `None` means the part
/// carries no usable number ("abc", "", a stray `+` tail, "1.2.3").
fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    Decimal::from_str_exact(&cleaned).ok()
}

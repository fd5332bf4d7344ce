use serde::{Deserialize, Serialize};
use std::fmt;

/// The eight logical roles a source column can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Date,
    Amount,
    Breakdown,
    Category,
    PaymentMethod,
    Notes,
    PaidBy,
    App,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Date,
        Role::Amount,
        Role::Breakdown,
        Role::Category,
        Role::PaymentMethod,
        Role::Notes,
        Role::PaidBy,
        Role::App,
    ];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Date => "date",
            Role::Amount => "amount",
            Role::Breakdown => "breakdown",
            Role::Category => "category",
            Role::PaymentMethod => "payment_method",
            Role::Notes => "notes",
            Role::PaidBy => "paid_by",
            Role::App => "app",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "date" => Ok(Role::Date),
            "amount" => Ok(Role::Amount),
            "breakdown" => Ok(Role::Breakdown),
            "category" => Ok(Role::Category),
            "payment_method" | "method" => Ok(Role::PaymentMethod),
            "notes" => Ok(Role::Notes),
            "paid_by" | "person" => Ok(Role::PaidBy),
            "app" => Ok(Role::App),
            other => Err(format!("unknown role: '{other}'")),
        }
    }
}

/// Assignment of roles to source column names. An unset role means the role
/// is simply not imported (except `date` and `amount`/`breakdown`, which
/// gate expansion — see [`FieldMapping::ready`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub date: Option<String>,
    pub amount: Option<String>,
    pub breakdown: Option<String>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub paid_by: Option<String>,
    pub app: Option<String>,
}

impl FieldMapping {
    /// Best-effort keyword inference over the header row.
    ///
    /// Headers are visited in order and every rule is tried against each
    /// one, so a later header overwrites an earlier assignment for the same
    /// role (last match wins). Behavior compatibility with the production
    /// heuristic is the contract here — the overlapping substring rules are
    /// deliberately preserved as-is, not "improved".
    pub fn infer(headers: &[String]) -> FieldMapping {
        let mut mapping = FieldMapping::default();

        for header in headers {
            let low = header.trim().to_lowercase();

            if low == "breakdown" {
                mapping.breakdown = Some(header.clone());
            }
            if low == "date" {
                mapping.date = Some(header.clone());
            }
            if (low == "total"
                || low.contains("amount")
                || low.contains("price")
                || low.contains("cost"))
                && low != "breakdown"
            {
                mapping.amount = Some(header.clone());
            }
            if low == "category" || low.contains("type") {
                mapping.category = Some(header.clone());
            }
            if low.contains("method") || low.contains("paid with") {
                mapping.payment_method = Some(header.clone());
            }
            if low.contains("note") || low.contains("desc") {
                mapping.notes = Some(header.clone());
            }
            if low == "person" || low.contains("paid by") || low.contains("spender") {
                mapping.paid_by = Some(header.clone());
            }
            if low == "app" || low.contains("source") {
                mapping.app = Some(header.clone());
            }
        }

        mapping
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Date => self.date.as_deref(),
            Role::Amount => self.amount.as_deref(),
            Role::Breakdown => self.breakdown.as_deref(),
            Role::Category => self.category.as_deref(),
            Role::PaymentMethod => self.payment_method.as_deref(),
            Role::Notes => self.notes.as_deref(),
            Role::PaidBy => self.paid_by.as_deref(),
            Role::App => self.app.as_deref(),
        }
    }

    /// Manual override: assign a column to a role, or clear the role with
    /// `None` (even one the inference filled in).
    pub fn set(&mut self, role: Role, column: Option<String>) {
        let slot = match role {
            Role::Date => &mut self.date,
            Role::Amount => &mut self.amount,
            Role::Breakdown => &mut self.breakdown,
            Role::Category => &mut self.category,
            Role::PaymentMethod => &mut self.payment_method,
            Role::Notes => &mut self.notes,
            Role::PaidBy => &mut self.paid_by,
            Role::App => &mut self.app,
        };
        *slot = column;
    }

    /// Whether expansion may run: an amount source exists (amount or
    /// breakdown), and a date source exists unless the common-date override
    /// is active. A `false` here is the "mapping incomplete" state — a
    /// disabled transition, not an error.
    pub fn ready(&self, common_date_active: bool) -> bool {
        let has_amount = self.amount.is_some() || self.breakdown.is_some();
        let has_date = common_date_active || self.date.is_some();
        has_amount && has_date
    }
}

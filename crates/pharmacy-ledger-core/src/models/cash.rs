//! Other income and expense entries.

use serde::{Deserialize, Serialize};

use super::{now_timestamp, parse_amount, required, ValidationError, ValidationResult};

/// Whether a cash entry adds to or draws from the till.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(EntryKind::Income),
            "expense" => Some(EntryKind::Expense),
            _ => None,
        }
    }
}

/// An income or expense outside patient sales (rent, salaries, lab share).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashEntry {
    pub id: String,
    pub kind: EntryKind,
    pub name: String,
    pub amount: f64,
    pub created_at: String,
}

impl CashEntry {
    /// Validate user input and build an entry. The amount must be positive.
    pub fn new(kind: EntryKind, name: &str, amount: &str) -> ValidationResult<Self> {
        let name = required("name", name)?;
        let value = parse_amount("amount", amount)?;
        if value <= 0.0 {
            return Err(ValidationError::InvalidAmount {
                field: "amount",
                value: amount.to_string(),
            });
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            name,
            amount: value,
            created_at: now_timestamp(),
        })
    }
}

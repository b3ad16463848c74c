//! Analysis query and result values.
//!
//! An [`AnalysisQuery`] is an immutable `(subject, month, year)` triple; a new
//! one is built whenever a selector changes. An [`AnalysisResult`] pairs a
//! query with its status and, once ready, the payload computed for exactly
//! that query.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::identity::SubjectId;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisQuery {
    pub subject: SubjectId,
    month: u32,
    year: i32,
}

impl AnalysisQuery {
    /// Build a query for `month` (1-based) of `year`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMonth`] if `month` is outside `1..=12`.
    pub fn new(subject: SubjectId, month: u32, year: i32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidMonth(month));
        }
        Ok(Self {
            subject,
            month,
            year,
        })
    }

    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// The same subject's query for the preceding month.
    #[must_use]
    pub fn previous(&self) -> Self {
        let (month, year) = if self.month == 1 {
            (12, self.year - 1)
        } else {
            (self.month - 1, self.year)
        };
        Self {
            subject: self.subject.clone(),
            month,
            year,
        }
    }

    /// The same subject's query for the following month.
    #[must_use]
    pub fn next(&self) -> Self {
        let (month, year) = if self.month == 12 {
            (1, self.year + 1)
        } else {
            (self.month + 1, self.year)
        };
        Self {
            subject: self.subject.clone(),
            month,
            year,
        }
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Direction of a transaction as reported by the ingestion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credited,
    Debited,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub source: Option<String>,
    pub account: Option<String>,
}

impl Transaction {
    /// Amount with debits negative, credits positive, unknown as zero.
    #[must_use]
    pub fn signed_amount(&self) -> f64 {
        match self.transaction_type {
            TransactionType::Credited => self.amount,
            TransactionType::Debited => -self.amount,
            TransactionType::Unknown => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub credited: f64,
    pub debited: f64,
}

/// Debited spend for one category. `None` is the uncategorized bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Option<String>,
    pub total: f64,
}

/// Everything computed for one analysis period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub totals: Totals,
    pub categories: Vec<CategoryTotal>,
    pub insights: String,
    pub transactions: Vec<Transaction>,
    /// Informational note from the server (e.g. "no transactions found").
    pub notice: Option<String>,
}

impl AnalysisPayload {
    #[must_use]
    pub fn net(&self) -> f64 {
        self.totals.credited - self.totals.debited
    }

    /// A period with no transactions. This is a normal ready state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "value")]
pub enum AnalysisStatus {
    Pending,
    Ready(AnalysisPayload),
    Error(String),
}

/// The result of one issued query, tagged with the sequence number it was
/// issued under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub query: AnalysisQuery,
    pub seq: u64,
    pub status: AnalysisStatus,
}

impl AnalysisResult {
    #[must_use]
    pub const fn pending(query: AnalysisQuery, seq: u64) -> Self {
        Self {
            query,
            seq,
            status: AnalysisStatus::Pending,
        }
    }

    #[must_use]
    pub const fn payload(&self) -> Option<&AnalysisPayload> {
        match &self.status {
            AnalysisStatus::Ready(payload) => Some(payload),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, AnalysisStatus::Pending)
    }
}

//! Analysis endpoint.

use chrono::NaiveDate;
use fin_core::{
    AnalysisPayload, AnalysisQuery, CategoryTotal, Totals, Transaction, TransactionType,
};
use serde::{Deserialize, Serialize};

use crate::{BackendClient, error::ApiError, http::check_response};

#[derive(Serialize)]
struct AnalysisRequest<'a> {
    uid: &'a str,
    month: u32,
    year: i32,
}

/// Wire shape. Periods without transactions come back as
/// `{message, transactions: [], ai_insights}` with no chart data.
#[derive(Deserialize)]
pub(crate) struct AnalysisResponse {
    #[serde(default)]
    pie_chart_data: Option<PieChartData>,
    #[serde(default)]
    bar_chart_data: Vec<BarEntry>,
    #[serde(default)]
    transactions: Vec<WireTransaction>,
    #[serde(default)]
    ai_insights: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct PieChartData {
    #[serde(default)]
    credited: Option<f64>,
    #[serde(default)]
    debited: Option<f64>,
}

#[derive(Deserialize)]
struct BarEntry {
    category: Option<String>,
    #[serde(default)]
    total: Option<f64>,
}

#[derive(Deserialize)]
struct WireTransaction {
    id: i64,
    date: NaiveDate,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    amount: f64,
    transaction_type: TransactionType,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    account: Option<String>,
}

impl From<AnalysisResponse> for AnalysisPayload {
    fn from(wire: AnalysisResponse) -> Self {
        let totals = wire.pie_chart_data.map_or_else(Totals::default, |pie| Totals {
            credited: pie.credited.unwrap_or_default(),
            debited: pie.debited.unwrap_or_default(),
        });
        Self {
            totals,
            categories: wire
                .bar_chart_data
                .into_iter()
                .map(|entry| CategoryTotal {
                    category: entry.category,
                    total: entry.total.unwrap_or_default(),
                })
                .collect(),
            insights: wire.ai_insights.unwrap_or_default(),
            transactions: wire
                .transactions
                .into_iter()
                .map(|tx| Transaction {
                    id: tx.id,
                    date: tx.date,
                    description: tx.description,
                    category: tx.category,
                    amount: tx.amount,
                    transaction_type: tx.transaction_type,
                    source: tx.source,
                    account: tx.account,
                })
                .collect(),
            notice: wire.message,
        }
    }
}

impl BackendClient {
    /// Fetch the analysis for one `(subject, month, year)` query.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails, the backend returns a
    /// non-success status, or the response cannot be parsed.
    pub async fn get_analysis(&self, query: &AnalysisQuery) -> Result<AnalysisPayload, ApiError> {
        let url = self.endpoint("api/get-analysis/")?;
        let resp = check_response(
            self.http
                .post(url)
                .json(&AnalysisRequest {
                    uid: query.subject.as_str(),
                    month: query.month(),
                    year: query.year(),
                })
                .send()
                .await?,
        )
        .await?;

        let body = resp.text().await?;
        let data: AnalysisResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::Parse(format!("get-analysis: {e}")))?;
        Ok(data.into())
    }
}

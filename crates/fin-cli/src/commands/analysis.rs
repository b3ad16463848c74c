use chrono::Datelike;
use fin_core::{AnalysisPayload, AnalysisQuery, AnalysisStatus, Transaction};
use fin_sync::QueryOutcome;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AnalysisArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Spinner;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Serialize)]
struct CategoryRow {
    category: String,
    total: f64,
}

#[derive(Debug, Serialize)]
struct TransactionRow {
    date: String,
    description: String,
    category: String,
    amount: f64,
    account: Option<String>,
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            date: tx.date.to_string(),
            description: tx.description.clone().unwrap_or_default(),
            category: tx.category.clone().unwrap_or_else(|| UNCATEGORIZED.into()),
            amount: tx.signed_amount(),
            account: tx.account.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AnalysisResponse {
    period: String,
    credited: f64,
    debited: f64,
    net: f64,
    transaction_count: usize,
    insights: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
    categories: Vec<CategoryRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transactions: Option<Vec<TransactionRow>>,
}

impl AnalysisResponse {
    fn new(query: &AnalysisQuery, payload: &AnalysisPayload, with_transactions: bool) -> Self {
        Self {
            period: format!("{}-{:02}", query.year(), query.month()),
            credited: payload.totals.credited,
            debited: payload.totals.debited,
            net: payload.net(),
            transaction_count: payload.transactions.len(),
            insights: payload.insights.clone(),
            notice: payload.notice.clone(),
            categories: payload
                .categories
                .iter()
                .map(|row| CategoryRow {
                    category: row.category.clone().unwrap_or_else(|| UNCATEGORIZED.into()),
                    total: row.total,
                })
                .collect(),
            transactions: with_transactions
                .then(|| payload.transactions.iter().map(TransactionRow::from).collect()),
        }
    }
}

pub async fn handle(
    args: &AnalysisArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let subject = ctx.require_subject()?;
    let today = chrono::Local::now().date_naive();
    let mut query = AnalysisQuery::new(
        subject,
        args.month.unwrap_or_else(|| today.month()),
        args.year.unwrap_or_else(|| today.year()),
    )?;
    if args.previous {
        query = query.previous();
    }

    let spinner = Spinner::start(&format!(
        "Analysing {}-{:02}…",
        query.year(),
        query.month()
    ));
    let ticket = ctx.client.request_analysis(query.month(), query.year())?;
    let outcome = ticket.settled().await;
    spinner.finish_clear();

    let QueryOutcome::Applied(result) = outcome else {
        anyhow::bail!("analysis request was superseded before it completed");
    };
    match &result.status {
        AnalysisStatus::Ready(payload) => output(
            &AnalysisResponse::new(&result.query, payload, args.transactions),
            flags.format,
        ),
        AnalysisStatus::Error(message) => anyhow::bail!("analysis failed: {message}"),
        AnalysisStatus::Pending => anyhow::bail!("analysis did not settle"),
    }
}

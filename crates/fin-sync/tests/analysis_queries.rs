mod support;

use std::sync::Arc;

use fin_core::{AnalysisPayload, AnalysisQuery, AnalysisStatus, CategoryTotal, Totals};
use fin_sync::{ClientError, FinanceClient, QueryOutcome};
use pretty_assertions::assert_eq;
use support::{identity, rejected, scripted, signed_in, subject};

fn payload(insights: &str) -> AnalysisPayload {
    AnalysisPayload {
        totals: Totals {
            credited: 5000.0,
            debited: 1250.5,
        },
        categories: vec![CategoryTotal {
            category: Some("Food".into()),
            total: 1250.5,
        }],
        insights: insights.into(),
        transactions: Vec::new(),
        notice: None,
    }
}

#[tokio::test]
async fn issuing_a_query_shows_pending_immediately() {
    let (backend, _ctl) = scripted();
    let client = FinanceClient::new(Arc::new(signed_in("a")), backend);

    assert!(client.analysis().is_none());
    let ticket = client.request_analysis(3, 2025).expect("query");
    let shown = client.analysis().expect("displayed");
    assert!(shown.is_pending());
    assert_eq!(shown.seq, ticket.seq());
    assert_eq!(shown.query.month(), 3);
}

#[tokio::test]
async fn superseded_response_is_discarded() {
    let (backend, mut ctl) = scripted();
    let client = FinanceClient::new(Arc::new(signed_in("a")), backend);

    let march = client.request_analysis(3, 2025).expect("march");
    let april = client.request_analysis(4, 2025).expect("april");
    assert!(april.seq() > march.seq());

    let first = ctl.next_analysis().await;
    let second = ctl.next_analysis().await;
    let (march_call, april_call) = if first.key.ends_with("03") {
        (first, second)
    } else {
        (second, first)
    };
    assert_eq!(april_call.key, "a:2025-04");

    april_call.resolve(Ok(payload("april")));
    let applied = april.settled().await;
    march_call.resolve(Ok(payload("march")));
    assert_eq!(march.settled().await, QueryOutcome::Superseded);

    let shown = client.analysis().expect("displayed");
    assert_eq!(QueryOutcome::Applied(shown.clone()), applied);
    assert_eq!(shown.query.month(), 4);
    assert_eq!(shown.payload().map(|p| p.insights.as_str()), Some("april"));
}

#[tokio::test]
async fn late_older_response_never_overwrites_newer() {
    let (backend, mut ctl) = scripted();
    let client = FinanceClient::new(Arc::new(signed_in("a")), backend);

    let older = client.request_analysis(1, 2025).expect("jan");
    let newer = client.request_analysis(2, 2025).expect("feb");
    let mut calls = vec![ctl.next_analysis().await, ctl.next_analysis().await];
    calls.sort_by(|a, b| a.key.cmp(&b.key));

    // Resolve the older one first; it still must not be applied.
    for parked in calls {
        let insights = parked.key.clone();
        parked.resolve(Ok(payload(&insights)));
    }
    assert_eq!(older.settled().await, QueryOutcome::Superseded);
    assert!(matches!(newer.settled().await, QueryOutcome::Applied(_)));
    assert_eq!(client.analysis().expect("shown").query.month(), 2);
}

#[tokio::test]
async fn empty_period_is_ready_not_error() {
    let (backend, mut ctl) = scripted();
    let client = FinanceClient::new(Arc::new(signed_in("a")), backend);

    let ticket = client.request_analysis(7, 2024).expect("query");
    ctl.next_analysis().await.resolve(Ok(AnalysisPayload {
        notice: Some("No transactions found for the selected month and year.".into()),
        ..AnalysisPayload::default()
    }));
    ticket.settled().await;

    let shown = client.analysis().expect("shown");
    let AnalysisStatus::Ready(payload) = shown.status else {
        panic!("expected ready, got {:?}", shown.status);
    };
    assert!(payload.is_empty());
    assert!(payload.notice.is_some());
}

#[tokio::test]
async fn backend_failure_becomes_error_status() {
    let (backend, mut ctl) = scripted();
    let client = FinanceClient::new(Arc::new(signed_in("a")), backend);

    let ticket = client.request_analysis(7, 2024).expect("query");
    ctl.next_analysis()
        .await
        .resolve(Err(rejected("User not found.")));
    ticket.settled().await;

    assert_eq!(
        client.analysis().expect("shown").status,
        AnalysisStatus::Error("User not found.".into())
    );
}

#[tokio::test]
async fn identity_change_clears_and_supersedes() {
    let (backend, mut ctl) = scripted();
    let provider = signed_in("a");
    let client = FinanceClient::new(Arc::new(provider.clone()), backend);

    let ticket = client.request_analysis(5, 2025).expect("query");
    let parked = ctl.next_analysis().await;
    provider.sign_in(identity("b"));
    assert!(client.analysis().is_none());

    parked.resolve(Ok(payload("a's data")));
    assert_eq!(ticket.settled().await, QueryOutcome::Superseded);
    assert!(client.analysis().is_none());
}

#[tokio::test]
async fn rejects_invalid_month_and_missing_identity() {
    let (backend, _ctl) = scripted();
    let provider = signed_in("a");
    let client = FinanceClient::new(Arc::new(provider.clone()), backend.clone());

    assert!(matches!(
        client.request_analysis(13, 2025),
        Err(ClientError::InvalidQuery(_))
    ));
    provider.sign_out_now();
    assert!(matches!(
        client.request_analysis(1, 2025),
        Err(ClientError::NotAuthenticated)
    ));
    assert_eq!(backend.analysis_calls(), 0);
}

#[tokio::test]
async fn late_older_failure_never_replaces_newer_result() {
    let (backend, mut ctl) = scripted();
    let client = FinanceClient::new(Arc::new(signed_in("a")), backend);

    let older = client.request_analysis(1, 2025).expect("jan");
    let newer = client.request_analysis(2, 2025).expect("feb");
    let mut calls = vec![ctl.next_analysis().await, ctl.next_analysis().await];
    calls.sort_by(|a, b| a.key.cmp(&b.key));
    let feb = calls.pop().expect("feb call");
    let jan = calls.pop().expect("jan call");

    feb.resolve(Ok(payload("feb")));
    assert!(matches!(newer.settled().await, QueryOutcome::Applied(_)));
    jan.resolve(Err(rejected("User not found.")));
    assert_eq!(older.settled().await, QueryOutcome::Superseded);

    assert_eq!(
        client.analysis().expect("shown").status,
        AnalysisStatus::Ready(payload("feb"))
    );
}

#[tokio::test]
async fn query_built_for_previous_identity_is_ignored() {
    let (backend, _ctl) = scripted();
    let provider = signed_in("a");
    let client = FinanceClient::new(Arc::new(provider.clone()), backend.clone());
    let stale = AnalysisQuery::new(subject("a"), 3, 2025).expect("query");

    provider.sign_in(identity("b"));
    assert!(client.analysis_controller().request(stale).is_none());
    assert!(client.analysis().is_none());
    assert_eq!(backend.analysis_calls(), 0);

    let current = AnalysisQuery::new(subject("b"), 3, 2025).expect("query");
    let ticket = client.analysis_controller().request(current).expect("ticket");
    let shown = client.analysis().expect("shown");
    assert!(shown.is_pending());
    assert_eq!(shown.seq, ticket.seq());
}

//! End-to-end orchestration scenarios over the mock collaborator gateway.

use serde_json::json;
use std::sync::Arc;
use voice_finance_orchestrator::agent::Orchestrator;
use voice_finance_orchestrator::collaborators::{CollaboratorConfig, MockGateway};
use voice_finance_orchestrator::models::{FilingsData, MarketData, ResponseEnvelope, RetrievalData};

fn config() -> CollaboratorConfig {
    CollaboratorConfig {
        stt_url: "stt".into(),
        market_data_url: "market-data".into(),
        filings_url: "filings".into(),
        symbol_search_url: "symbol-search".into(),
        retrieve_url: "retrieve".into(),
        analyze_url: "analyze".into(),
        generate_url: "generate".into(),
        portfolio_url: "portfolio".into(),
        default_chain: vec!["generate".into()],
        route_qa_through_retrieval: true,
    }
}

fn build(gateway: MockGateway, config: CollaboratorConfig) -> (Orchestrator, Arc<MockGateway>) {
    let gateway = Arc::new(gateway);
    (Orchestrator::new(gateway.clone(), config), gateway)
}

#[tokio::test]
async fn audio_price_query_end_to_end() {
    let gateway = MockGateway::new()
        .with_transcript("What is the current stock price of Apple?")
        .with_market(
            "AAPL",
            MarketData {
                ticker: Some("AAPL".into()),
                latest_close: Some(150.25),
                change_pct: Some(1.5),
                volume: Some(42_000_000),
                error: None,
            },
        );
    let (orchestrator, gateway) = build(gateway, config());

    let envelope = orchestrator.handle_audio(vec![0u8; 16]).await;

    assert_eq!(envelope, ResponseEnvelope::answer("AAPL: $150.25, +1.50%"));
    assert_eq!(gateway.calls(), vec!["stt", "market-data:AAPL"]);
}

#[tokio::test]
async fn transcription_failure_is_error_envelope() {
    // No transcript configured: the STT hop fails.
    let (orchestrator, _) = build(MockGateway::new(), config());

    let envelope = orchestrator.handle_audio(vec![0u8; 16]).await;
    assert!(matches!(envelope, ResponseEnvelope::Failure { .. }));
}

#[tokio::test]
async fn empty_filings_clarifies_with_ticker() {
    let gateway = MockGateway::new().with_filings(
        "NFLX",
        FilingsData {
            ticker: Some("NFLX".into()),
            filings: vec![],
            error: None,
        },
    );
    let (orchestrator, _) = build(gateway, config());

    let envelope = orchestrator
        .handle_query("Show me the latest SEC filings for Netflix.")
        .await;

    match envelope {
        ResponseEnvelope::Clarify { clarify_prompt, .. } => {
            assert!(clarify_prompt.contains("NFLX"), "prompt was: {}", clarify_prompt);
        }
        other => panic!("expected clarify, got {:?}", other),
    }
}

#[tokio::test]
async fn filings_answer_lists_at_most_three() {
    let gateway = MockGateway::new().with_filings(
        "AAPL",
        FilingsData {
            ticker: Some("AAPL".into()),
            filings: vec![
                "10-K annual report".into(),
                "10-Q quarterly report".into(),
                "8-K current report".into(),
                "S-8 registration".into(),
            ],
            error: None,
        },
    );
    let (orchestrator, _) = build(gateway, config());

    let envelope = orchestrator.handle_query("latest sec filings for Apple").await;

    assert_eq!(
        envelope,
        ResponseEnvelope::answer(
            "Latest for AAPL:\n- 10-K annual report\n- 10-Q quarterly report\n- 8-K current report"
        )
    );
}

#[tokio::test]
async fn low_confidence_retrieval_clarifies_regardless_of_results() {
    let gateway = MockGateway::new().with_retrieval(RetrievalData {
        results: vec![json!("a relevant looking document")],
        confidence: 0.4,
    });
    let (orchestrator, gateway) = build(gateway, config());

    let envelope = orchestrator
        .handle_query("how did earnings look last quarter")
        .await;

    assert!(envelope.is_clarify());
    // The gate fired before any pipeline hop.
    assert_eq!(
        gateway.calls(),
        vec!["retrieve:how did earnings look last quarter"]
    );
}

#[tokio::test]
async fn confident_retrieval_runs_analysis_chain() {
    let gateway = MockGateway::new()
        .with_retrieval(RetrievalData {
            results: vec![json!("doc one"), json!("doc two")],
            confidence: 0.9,
        })
        .with_step("analyze", json!({"summary": {"risk_exposure": "2.1%"}}))
        .with_step("generate", json!({"text": "Your exposure is 2.1%."}));
    let (orchestrator, gateway) = build(gateway, config());

    let envelope = orchestrator
        .handle_query("historical performance of the fund")
        .await;

    assert_eq!(envelope, ResponseEnvelope::answer("Your exposure is 2.1%."));
    assert_eq!(
        gateway.calls(),
        vec![
            "retrieve:historical performance of the fund",
            "step:analyze",
            "step:generate"
        ]
    );
}

#[tokio::test]
async fn qa_routes_through_retrieval_by_default() {
    let gateway = MockGateway::new().with_retrieval(RetrievalData {
        results: vec![],
        confidence: 0.0,
    });
    let (orchestrator, gateway) = build(gateway, config());

    let envelope = orchestrator.handle_query("tell me something interesting").await;

    assert!(envelope.is_clarify());
    assert_eq!(gateway.calls(), vec!["retrieve:tell me something interesting"]);
}

#[tokio::test]
async fn qa_uses_default_chain_when_retrieval_routing_disabled() {
    let mut cfg = config();
    cfg.route_qa_through_retrieval = false;
    cfg.default_chain = vec!["retrieve-step".into(), "generate".into()];

    let gateway = MockGateway::new()
        .with_step("retrieve-step", json!({"summary": "context"}))
        .with_step("generate", json!({"text": "a general answer"}));
    let (orchestrator, gateway) = build(gateway, cfg);

    let envelope = orchestrator.handle_query("tell me something interesting").await;

    assert_eq!(envelope, ResponseEnvelope::answer("a general answer"));
    assert_eq!(gateway.calls(), vec!["step:retrieve-step", "step:generate"]);
}

#[tokio::test]
async fn portfolio_with_null_allocation_clarifies() {
    let gateway =
        MockGateway::new().with_allocation(json!({"tech": 0.6, "bonds": null}));
    let (orchestrator, gateway) = build(gateway, config());

    let envelope = orchestrator.handle_query("what is my risk exposure").await;

    assert!(envelope.is_clarify());
    // No snapshots were fetched after the malformed allocation.
    assert_eq!(gateway.calls(), vec!["portfolio-allocation"]);
}

#[tokio::test]
async fn portfolio_with_non_object_allocation_clarifies() {
    let gateway = MockGateway::new().with_allocation(json!("not a mapping"));
    let (orchestrator, _) = build(gateway, config());

    let envelope = orchestrator.handle_query("show my allocation").await;
    assert!(envelope.is_clarify());
}

#[tokio::test]
async fn portfolio_plan_assembles_snapshots_into_chain() {
    let gateway = MockGateway::new()
        .with_allocation(json!({"tech": 0.6, "bonds": 0.4}))
        .with_market(
            "TSMC",
            MarketData {
                ticker: Some("TSMC".into()),
                latest_close: Some(98.5),
                change_pct: Some(-0.7),
                volume: Some(9_000_000),
                error: None,
            },
        )
        .with_general_filings(FilingsData {
            ticker: Some("TSM".into()),
            filings: vec!["Capacity expansion announced".into()],
            error: None,
        })
        .with_step("analyze", json!({"summary": {"risk_exposure": "0.7%"}}))
        .with_step("generate", json!({"text": "Asia tech exposure is 0.7%."}));
    let (orchestrator, gateway) = build(gateway, config());

    let envelope = orchestrator.handle_query("analyze my portfolio").await;

    assert_eq!(
        envelope,
        ResponseEnvelope::answer("Asia tech exposure is 0.7%.")
    );
    assert_eq!(
        gateway.calls(),
        vec![
            "portfolio-allocation",
            "market-data:TSMC",
            "filings",
            "step:analyze",
            "step:generate"
        ]
    );
}

#[tokio::test]
async fn pipeline_failure_surfaces_collaborator_message() {
    let gateway = MockGateway::new()
        .with_retrieval(RetrievalData {
            results: vec![json!("doc")],
            confidence: 0.95,
        })
        .with_step("analyze", json!({"summary": {}}))
        .with_failing_step("generate", "language agent unavailable");
    let (orchestrator, gateway) = build(gateway, config());

    let envelope = orchestrator.handle_query("past performance summary").await;

    match envelope {
        ResponseEnvelope::Failure { error } => {
            assert!(error.contains("language agent unavailable"), "error was: {}", error);
        }
        other => panic!("expected error envelope, got {:?}", other),
    }
    // Chain stopped at the failing hop.
    assert_eq!(
        gateway.calls(),
        vec!["retrieve:past performance summary", "step:analyze", "step:generate"]
    );
}

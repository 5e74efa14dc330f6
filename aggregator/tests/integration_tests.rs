//! Integration tests driving the aggregator end to end over nullable
//! collaborators: chain selection → proposal fetch → tally fan-out →
//! wallet binding → vote refresh → vote submission.

use std::sync::Arc;
use std::time::Duration;

use govhub_aggregator::{
    Aggregator, AggregatorError, AggregatorOptions, Refresh, SubmissionState,
};
use govhub_client::{ClientError, Signer};
use govhub_nullables::{fixtures, BroadcastOutcome, NullGovQuery, NullSigner, QueryCall};
use govhub_registry::ChainRegistry;
use govhub_types::{
    Address, ChainId, ProposalId, TallyResult, VoteOption, VotePercentages, VoteRecord,
    VoteStatus,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn registry(ids: &[&str]) -> ChainRegistry {
    ChainRegistry::new(ids.iter().map(|id| fixtures::chain(id)).collect()).unwrap()
}

fn aggregator(query: &Arc<NullGovQuery>, ids: &[&str]) -> Arc<Aggregator> {
    Arc::new(Aggregator::new(
        registry(ids),
        query.clone(),
        AggregatorOptions::default(),
    ))
}

async fn wait_for_call(query: &NullGovQuery, call: QueryCall) {
    while !query.calls().contains(&call) {
        tokio::task::yield_now().await;
    }
}

// ---------------------------------------------------------------------------
// Proposal fetch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_proposals_one_tally_failure() {
    let query = Arc::new(NullGovQuery::new());
    query.set_proposals("c", vec![fixtures::proposal("1"), fixtures::proposal("2")]);
    query.set_tally("c", "1", TallyResult::new(70u32, 30u32, 0u32, 0u32));
    query.fail_tally(
        "c",
        "2",
        ClientError::Status {
            status: 500,
            body: "tally error".into(),
        },
    );
    let agg = aggregator(&query, &["c"]);

    let refresh = agg.select_chain(&ChainId::new("c")).await.unwrap();
    match refresh {
        Refresh::Applied {
            proposals,
            tally_failures,
            ..
        } => {
            assert_eq!(proposals, 2);
            assert!(matches!(
                &tally_failures[..],
                [AggregatorError::TallyUnavailable { proposal_id, .. }] if proposal_id.as_str() == "2"
            ));
        }
        other => panic!("unexpected refresh outcome: {other:?}"),
    }

    let current = agg.cache().current_proposals().await;
    assert_eq!(current.len(), 2);
    assert_eq!(
        current[0].percentages(),
        Some(VotePercentages {
            yes: 70,
            no: 30,
            abstain: 0,
            no_with_veto: 0
        })
    );
    assert!(current[1].tally.is_none());
    assert!(current[1].percentages().is_none());
}

#[tokio::test]
async fn pending_fetch_for_previous_chain_is_discarded() {
    let query = Arc::new(NullGovQuery::new());
    query.set_proposals("a", vec![fixtures::proposal("1"), fixtures::proposal("2")]);
    query.set_proposals("b", vec![fixtures::proposal("9")]);
    let release_a = query.hold_proposals("a");
    let agg = aggregator(&query, &["a", "b"]);

    let slow = tokio::spawn({
        let agg = agg.clone();
        async move { agg.select_chain(&ChainId::new("a")).await }
    });
    wait_for_call(&query, QueryCall::Proposals(ChainId::new("a"))).await;

    let fast = agg.select_chain(&ChainId::new("b")).await.unwrap();
    assert!(matches!(fast, Refresh::Applied { proposals: 1, .. }));

    release_a.send(()).unwrap();
    let slow = slow.await.unwrap().unwrap();
    assert_eq!(
        slow,
        Refresh::Stale {
            chain_id: ChainId::new("a")
        }
    );

    let snapshot = agg.snapshot().await;
    assert_eq!(snapshot.active_chain, Some(ChainId::new("b")));
    assert_eq!(snapshot.proposals.len(), 1);
    assert_eq!(snapshot.proposals[0].id, ProposalId::new("9"));
    assert!(agg.cache().proposals_for(&ChainId::new("a")).await.is_none());
    assert_eq!(agg.metrics().stale_results_discarded.get(), 1);
}

// ---------------------------------------------------------------------------
// Binding and vote status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn partial_binding_and_vote_refresh() {
    let query = Arc::new(NullGovQuery::new());
    query.set_proposals("a", vec![fixtures::proposal("1"), fixtures::proposal("2")]);
    query.set_vote("a", "1", "addr-a", VoteRecord::full(VoteOption::NoWithVeto));
    query.fail_vote("a", "2", "addr-a", ClientError::Transport("timeout".into()));
    let agg = aggregator(&query, &["a", "b", "c"]);
    agg.select_chain(&ChainId::new("a")).await.unwrap();

    let signer = NullSigner::new()
        .with_account("a", "addr-a")
        .with_account("b", "addr-b")
        .with_account("c", "addr-c");
    signer.reject_chain("b", "not enabled in wallet");
    agg.attach_signer(Arc::new(signer)).await;

    let report = agg.connect_wallet().await.unwrap();
    assert_eq!(report.bound.len(), 2);
    assert!(!report.bound.contains_key(&ChainId::new("b")));

    let votes = agg.cache().votes_for(&ChainId::new("a")).await;
    assert_eq!(
        votes[&ProposalId::new("1")],
        VoteStatus::present(VoteRecord::full(VoteOption::NoWithVeto))
    );
    let failed = &votes[&ProposalId::new("2")];
    assert!(failed.is_failed());
    assert_eq!(failed.displayed(), VoteStatus::Absent);
}

#[tokio::test]
async fn no_vote_sentinel_is_absent() {
    let query = Arc::new(NullGovQuery::new());
    query.set_proposals("a", vec![fixtures::proposal("5")]);
    let agg = aggregator(&query, &["a"]);
    agg.attach_signer(Arc::new(NullSigner::new().with_account("a", "addr-a")))
        .await;
    agg.connect_wallet().await.unwrap();

    agg.select_chain(&ChainId::new("a")).await.unwrap();

    let status = agg
        .cache()
        .vote(&ChainId::new("a"), &ProposalId::new("5"))
        .await
        .unwrap();
    assert!(status.is_confirmed_absent());
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submitted_vote_is_visible_before_requery_and_requery_wins() {
    let query = Arc::new(NullGovQuery::new());
    query.set_proposals("a", vec![fixtures::proposal("3")]);
    let null = Arc::new(NullSigner::new().with_account("a", "addr-a"));
    let signer: Arc<dyn Signer> = null.clone();
    let agg = aggregator(&query, &["a"]);
    agg.attach_signer(signer).await;
    agg.connect_wallet().await.unwrap();
    agg.select_chain(&ChainId::new("a")).await.unwrap();
    let mut events = agg.subscribe_submissions();
    query.reset_calls();

    let receipt = agg
        .submit_vote(&ChainId::new("a"), ProposalId::new("3"), VoteOption::Yes)
        .await
        .unwrap();
    assert_eq!(receipt.option, VoteOption::Yes);
    assert_eq!(query.vote_calls(), 0);
    assert_eq!(
        agg.cache()
            .vote(&ChainId::new("a"), &ProposalId::new("3"))
            .await,
        Some(VoteStatus::present(VoteRecord::full(VoteOption::Yes)))
    );

    let broadcast = &null.broadcasts()[0];
    assert_eq!(broadcast.signer, Address::new("addr-a"));
    assert_eq!(broadcast.fee.denom, "ua");
    assert_eq!(broadcast.fee.amount, "1000");
    assert_eq!(broadcast.fee.gas, "200000");

    let mut last = None;
    while let Ok(event) = events.try_recv() {
        last = Some(event.state);
    }
    assert!(matches!(last, Some(SubmissionState::Confirmed { .. })));

    // The chain has not indexed the vote yet: the next query overwrites it.
    agg.refresh_votes().await;
    assert_eq!(
        agg.cache()
            .vote(&ChainId::new("a"), &ProposalId::new("3"))
            .await,
        Some(VoteStatus::Absent)
    );
}

#[tokio::test]
async fn rejected_vote_leaves_status_untouched() {
    let query = Arc::new(NullGovQuery::new());
    query.set_proposals("a", vec![fixtures::proposal("3")]);
    let null = Arc::new(NullSigner::new().with_account("a", "addr-a"));
    null.set_outcome(BroadcastOutcome::Reject {
        code: 5,
        raw_log: "out of gas".into(),
    });
    let agg = aggregator(&query, &["a"]);
    agg.attach_signer(null.clone()).await;
    agg.connect_wallet().await.unwrap();
    agg.select_chain(&ChainId::new("a")).await.unwrap();

    let err = agg
        .submit_vote(&ChainId::new("a"), ProposalId::new("3"), VoteOption::No)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AggregatorError::SubmissionRejected {
            code: 5,
            raw_log: "out of gas".into()
        }
    );
    assert_eq!(
        agg.cache()
            .vote(&ChainId::new("a"), &ProposalId::new("3"))
            .await,
        Some(VoteStatus::Absent)
    );
}

// ---------------------------------------------------------------------------
// Activity ticker
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn ticker_sweeps_on_interval_and_stops() {
    let query = Arc::new(NullGovQuery::new());
    query.set_count("a", 2);
    let agg = Arc::new(Aggregator::new(
        registry(&["a", "b"]),
        query.clone(),
        AggregatorOptions {
            activity_interval: Duration::from_secs(300),
            ..AggregatorOptions::default()
        },
    ));

    agg.start_activity_ticker().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(agg.cache().activity().await[&ChainId::new("a")], 2);

    query.set_count("a", 0);
    query.set_count("b", 7);
    tokio::time::sleep(Duration::from_secs(300)).await;
    let activity = agg.cache().activity().await;
    assert!(!activity.contains_key(&ChainId::new("a")));
    assert_eq!(activity[&ChainId::new("b")], 7);
    assert_eq!(agg.metrics().activity_ticks.get(), 2);

    agg.shutdown().await;
    query.set_count("b", 1);
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(agg.cache().activity().await[&ChainId::new("b")], 7);
}

#[tokio::test(start_paused = true)]
async fn rewatching_replaces_previous_ticker() {
    let query = Arc::new(NullGovQuery::new());
    query.set_count("a", 2);
    query.set_count("b", 5);
    let agg = Arc::new(Aggregator::new(
        registry(&["a", "b"]),
        query.clone(),
        AggregatorOptions {
            activity_interval: Duration::from_secs(300),
            ..AggregatorOptions::default()
        },
    ));

    agg.watch_activity(vec![fixtures::chain("a")]).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(query.calls().contains(&QueryCall::Count(ChainId::new("a"))));

    agg.watch_activity(vec![fixtures::chain("b")]).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    query.reset_calls();

    tokio::time::sleep(Duration::from_secs(301)).await;
    let calls = query.calls();
    assert!(!calls.contains(&QueryCall::Count(ChainId::new("a"))));
    assert!(calls.contains(&QueryCall::Count(ChainId::new("b"))));

    agg.shutdown().await;
}

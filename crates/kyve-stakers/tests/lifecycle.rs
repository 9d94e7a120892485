//! Message validation, atomicity and block processing order

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use kyve_core::{Address, Fraction, Params, StakersError, StakersEvent};
use kyve_stakers::{MsgJoinPool, MsgUpdateCommission, MsgUpdateMetadata};
use kyve_testkit::*;

fn metadata(n: u32) -> MsgUpdateMetadata {
    MsgUpdateMetadata {
        creator: staker(n),
        moniker: "Alice".to_string(),
        website: "https://alice.example".to_string(),
        identity: "0123456789ABCDEF".to_string(),
        security_contact: "sec@alice.example".to_string(),
        details: "validator".to_string(),
    }
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_update_metadata_replaces_record() {
    let mut chain = TestChain::new();
    let alice = chain.create_staker(0, 1_000);
    chain.deliver_ok(metadata(0));

    let record = chain.query(|k, s| k.require_staker(s, &alice)).unwrap();
    assert_eq!(record.metadata.moniker, "Alice");
    assert_eq!(record.metadata.identity, "0123456789ABCDEF");

    chain.deliver_ok(MsgUpdateMetadata {
        moniker: "Alice 2".to_string(),
        identity: String::new(),
        ..metadata(0)
    });
    let record = chain.query(|k, s| k.require_staker(s, &alice)).unwrap();
    assert_eq!(record.metadata.moniker, "Alice 2");
    assert!(record.metadata.identity.is_empty());
}

#[test]
fn test_metadata_limits() {
    let mut chain = TestChain::new();
    chain.create_staker(0, 1_000);

    assert_matches!(
        chain.deliver(MsgUpdateMetadata {
            moniker: "x".repeat(256),
            ..metadata(0)
        }),
        Err(StakersError::StringMaxLengthExceeded { max: 255, .. })
    );
    assert_matches!(
        chain.deliver(MsgUpdateMetadata {
            identity: "0123".to_string(),
            ..metadata(0)
        }),
        Err(StakersError::InvalidIdentity { .. })
    );
    assert_matches!(
        chain.deliver(MsgUpdateMetadata {
            identity: "0123456789ABCDEG".to_string(),
            ..metadata(0)
        }),
        Err(StakersError::InvalidIdentity { .. })
    );
    chain.deliver_ok(MsgUpdateMetadata {
        moniker: "x".repeat(255),
        ..metadata(0)
    });
}

#[test]
fn test_metadata_requires_staker() {
    let mut chain = TestChain::new();
    assert_matches!(chain.deliver(metadata(0)), Err(StakersError::NoStaker { .. }));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_valaddress_must_differ_from_staker() {
    let mut chain = TestChain::new();
    let alice = chain.create_staker(0, 1_000);
    assert_matches!(
        chain.deliver(MsgJoinPool {
            valaddress: alice.clone(),
            ..JoinPoolBuilder::new(0, 0).build()
        }),
        Err(StakersError::ValaddressSameAsStaker { .. })
    );
}

#[test]
fn test_malformed_address_is_rejected() {
    let mut chain = TestChain::new();
    let json = r#"{"type":"leave_pool","creator":"not an address","pool_id":0}"#;
    let msg: kyve_stakers::StakersMsg = serde_json::from_str(json).unwrap();
    assert_matches!(chain.deliver(msg), Err(StakersError::InvalidAddress { .. }));
    assert!(Address::new("").is_err());
}

#[test]
fn test_msg_json_round_trip() {
    let msg = kyve_stakers::StakersMsg::from(update_stake_fraction(3, 2, Fraction::from_percent(40)));
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains(r#""type":"update_stake_fraction""#));
    assert!(json.contains(r#""stake_fraction":"0.400000000000000000""#));
    assert_eq!(serde_json::from_str::<kyve_stakers::StakersMsg>(&json).unwrap(), msg);
}

// ============================================================================
// Atomicity
// ============================================================================

#[test]
fn test_failed_operation_leaves_no_trace() {
    let mut chain = TestChain::new();
    let alice = chain.create_member(0, 1_000, 0);
    chain.commit();

    let result: Result<(), StakersError> = chain.with_keeper(|keeper, ctx| {
        keeper.leave_pool(ctx, &alice, 0)?;
        keeper.leave_pool(ctx, &alice, 0)
    });
    assert_matches!(result, Err(StakersError::NoValaccount { .. }));
    assert!(chain.query(|k, s| Ok(k.is_member(s, 0, &alice))).unwrap());
    assert!(chain.pending_events().is_empty());
    chain.commit();
}

#[test]
fn test_points_track_missed_participation() {
    let mut chain = TestChain::new();
    let alice = chain.create_member(0, 1_000, 0);

    for expected in 1..=3 {
        let points = chain
            .with_keeper(|keeper, ctx| keeper.increment_points(ctx.store_mut(), 0, &alice))
            .unwrap();
        assert_eq!(points, expected);
    }
    let previous = chain
        .with_keeper(|keeper, ctx| keeper.reset_points(ctx.store_mut(), 0, &alice))
        .unwrap();
    assert_eq!(previous, 3);
    let valaccount = chain.query(|k, s| k.require_valaccount(s, 0, &alice)).unwrap();
    assert_eq!(valaccount.points, 0);

    let outsider = staker(9);
    assert_eq!(
        chain
            .with_keeper(|keeper, ctx| keeper.increment_points(ctx.store_mut(), 0, &outsider))
            .unwrap(),
        0
    );
}

#[test]
fn test_valaccount_authorization() {
    let mut chain = TestChain::new();
    let alice = chain.create_member(0, 1_000, 0);

    chain
        .query(|k, s| k.assert_valaccount_authorized(s, 0, &alice, &valaddress(0)))
        .unwrap();
    assert_matches!(
        chain.query(|k, s| k.assert_valaccount_authorized(s, 0, &alice, &valaddress(1))),
        Err(StakersError::ValaccountUnauthorized { .. })
    );
    assert_matches!(
        chain.query(|k, s| k.assert_valaccount_authorized(s, 1, &alice, &valaddress(0))),
        Err(StakersError::NoValaccount { .. })
    );
}

// ============================================================================
// End block
// ============================================================================

#[test]
fn test_queues_drain_in_fixed_order() {
    let mut chain = TestChain::with_params(Params {
        commission_change_time: 10,
        leave_pool_time: 10,
        stake_fraction_change_time: 10,
        ..Params::default()
    });
    let alice = chain.create_member(0, 1_000, 0);
    let bob = chain.create_member(1, 1_000, 0);

    chain.deliver_ok(update_stake_fraction(0, 0, Fraction::from_percent(50)));
    chain.deliver_ok(leave_pool(1, 0));
    chain.deliver_ok(MsgUpdateCommission {
        creator: alice.clone(),
        pool_id: 0,
        commission: Fraction::from_percent(5),
    });
    chain.commit_after_seconds(10);

    let events = chain.commit();
    assert_eq!(
        events,
        vec![
            StakersEvent::UpdateCommission {
                staker: alice.clone(),
                commission: Fraction::from_percent(5),
            },
            StakersEvent::LeavePool {
                pool_id: 0,
                staker: bob,
            },
            StakersEvent::UpdateStakeFraction {
                staker: alice,
                pool_id: 0,
                stake_fraction: Fraction::from_percent(50),
            },
        ]
    );
}

#[test]
fn test_restart_resumes_from_committed_state() {
    let mut chain = TestChain::with_params(Params {
        leave_pool_time: 10,
        ..Params::default()
    });
    let alice = chain.create_member(0, 1_000, 0);
    chain.deliver_ok(leave_pool(0, 0));
    chain.restart();

    assert_eq!(chain.query(|k, s| k.params(s)).unwrap().leave_pool_time, 10);
    assert!(chain.query(|k, s| Ok(k.is_member(s, 0, &alice))).unwrap());
    assert!(chain.pending_events().is_empty());

    chain.commit_after_seconds(10);
    let events = chain.commit();
    assert!(events.contains(&StakersEvent::LeavePool {
        pool_id: 0,
        staker: alice,
    }));
}

#[test]
fn test_params_round_trip_through_store() {
    let params = Params {
        leave_pool_time: 42,
        vote_slash: Fraction::from_percent(3),
        ..Params::default()
    };
    let chain = TestChain::with_params(params.clone());
    assert_eq!(chain.query(|k, s| k.params(s)).unwrap(), params);
}

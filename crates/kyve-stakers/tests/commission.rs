//! Commission changes and the commission rewards ledger

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use kyve_core::{Address, Coins, Fraction, Params, StakersError, StakersEvent};
use kyve_stakers::{MsgClaimCommissionRewards, MsgUpdateCommission, QueueId};
use kyve_testkit::*;

const CHANGE_TIME: u64 = 100;

fn chain() -> TestChain {
    TestChain::with_params(Params {
        commission_change_time: CHANGE_TIME,
        ..Params::default()
    })
}

fn update_commission(n: u32, pool_id: u64, percent: u64) -> MsgUpdateCommission {
    MsgUpdateCommission {
        creator: staker(n),
        pool_id,
        commission: Fraction::from_percent(percent),
    }
}

fn commission_of(chain: &TestChain, staker: &Address) -> Fraction {
    chain
        .query(|k, s| k.require_staker(s, staker))
        .unwrap()
        .commission
}

// ============================================================================
// Commission changes
// ============================================================================

#[test]
fn test_commission_change_applies_after_delay() {
    let mut chain = chain();
    let alice = chain.create_member(0, 1_000, 0);
    chain.deliver_ok(update_commission(0, 0, 20));

    chain.commit_after_seconds(CHANGE_TIME - 1);
    chain.commit_after_seconds(1);
    assert_eq!(commission_of(&chain, &alice), Fraction::from_percent(10));

    let events = chain.commit();
    assert!(events.contains(&StakersEvent::UpdateCommission {
        staker: alice.clone(),
        commission: Fraction::from_percent(20),
    }));
    assert_eq!(commission_of(&chain, &alice), Fraction::from_percent(20));
}

#[test]
fn test_commission_change_is_staker_wide() {
    let mut chain = chain();
    chain.pools.add_pool(1, Fraction::one());
    let alice = chain.create_member(0, 1_000, 0);
    chain.deliver_ok(JoinPoolBuilder::new(0, 1).valaddress(valaddress(50)).build());

    chain.deliver_ok(update_commission(0, 0, 20));
    chain.commit_after_seconds(10);
    // a request sent for another pool replaces the pending one
    chain.deliver_ok(update_commission(0, 1, 30));

    let entries = chain
        .query(|k, s| k.get_all_commission_change_entries(s))
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].pool_id, 1);
    assert_eq!(entries[0].commission, Fraction::from_percent(30));

    chain.commit_after_seconds(CHANGE_TIME - 10);
    chain.commit();
    assert_eq!(commission_of(&chain, &alice), Fraction::from_percent(10));

    chain.commit_after_seconds(10);
    chain.commit();
    assert_eq!(commission_of(&chain, &alice), Fraction::from_percent(30));
    let state = chain
        .query(|k, s| k.get_queue_state(s, QueueId::Commission))
        .unwrap();
    assert_eq!((state.low_index, state.high_index), (2, 2));
}

#[test]
fn test_commission_change_requires_staker() {
    let mut chain = chain();
    assert_matches!(
        chain.deliver(update_commission(0, 0, 20)),
        Err(StakersError::NoStaker { .. })
    );
}

#[test]
fn test_commission_above_one_is_rejected() {
    assert_matches!(
        Fraction::parse_commission("1.5"),
        Err(StakersError::InvalidCommission { .. })
    );

    let expected = StakersError::InvalidCommission {
        message: r#""1.5": value must lie in [0, 1]"#.to_string(),
    };
    for json in [
        r#"{"type":"update_commission","creator":"kyve1staker000","pool_id":0,"commission":"1.5"}"#,
        r#"{"type":"join_pool","creator":"kyve1staker000","pool_id":0,"valaddress":"kyve1val000","amount":0,"commission":"1.5"}"#,
        r#"{"type":"create_staker","creator":"kyve1staker000","amount":100,"commission":"1.5"}"#,
    ] {
        let err = serde_json::from_str::<kyve_stakers::StakersMsg>(json).unwrap_err();
        assert!(
            err.to_string().starts_with(&expected.to_string()),
            "unexpected error: {err}"
        );
    }
}

#[test]
fn test_stake_fraction_above_one_is_rejected() {
    let json = r#"{"type":"update_stake_fraction","creator":"kyve1staker000","pool_id":0,"stake_fraction":"1.5"}"#;
    let err = serde_json::from_str::<kyve_stakers::StakersMsg>(json).unwrap_err();
    assert!(err.to_string().starts_with("invalid stake fraction"), "unexpected error: {err}");
}

#[test]
fn test_optional_fractions_may_be_omitted() {
    let json = r#"{"type":"create_staker","creator":"kyve1staker000","amount":100}"#;
    assert_matches!(
        serde_json::from_str::<kyve_stakers::StakersMsg>(json).unwrap(),
        kyve_stakers::StakersMsg::CreateStaker(kyve_stakers::MsgCreateStaker { commission: None, .. })
    );
}

#[test]
fn test_full_staker_reports_pending_change() {
    let mut chain = chain();
    let alice = chain.create_member(0, 1_000, 0);
    chain.deliver_ok(update_commission(0, 0, 20));

    let full = chain
        .query(|k, s| k.get_full_staker(s, &alice))
        .unwrap()
        .unwrap();
    assert_eq!(full.bonded_stake, 1_000);
    assert_eq!(full.valaccounts.len(), 1);
    assert_eq!(
        full.pending_commission_change.map(|entry| entry.commission),
        Some(Fraction::from_percent(20))
    );
}

// ============================================================================
// Rewards ledger
// ============================================================================

fn credit(chain: &mut TestChain, staker: &Address, amount: u64) {
    chain.fund(&payer(), amount);
    chain
        .with_keeper(|keeper, ctx| {
            keeper.payout_additional_commission_rewards(ctx, staker, &payer(), &Coins::native(amount))
        })
        .unwrap();
}

#[test]
fn test_payout_and_claim_commission_rewards() {
    let mut chain = chain();
    let alice = chain.create_staker(0, 1_000);
    credit(&mut chain, &alice, 300);

    let module_account = chain.query(|k, _| Ok(k.module_account().clone())).unwrap();
    assert_eq!(chain.bank.balance(&module_account), Coins::native(300));
    let record = chain.query(|k, s| k.require_staker(s, &alice)).unwrap();
    assert_eq!(record.commission_rewards, Coins::native(300));

    let response = chain.deliver_ok(MsgClaimCommissionRewards {
        creator: alice.clone(),
        amount: Coins::native(120),
    });
    assert_eq!(
        response.events,
        vec![StakersEvent::ClaimCommissionRewards {
            staker: alice.clone(),
            amount: Coins::native(120),
        }]
    );
    assert_eq!(chain.bank.balance(&alice), Coins::native(120));
    assert_eq!(chain.bank.balance(&module_account), Coins::native(180));
    let record = chain.query(|k, s| k.require_staker(s, &alice)).unwrap();
    assert_eq!(record.commission_rewards, Coins::native(180));
    chain.commit();
}

#[test]
fn test_claim_more_than_earned_fails() {
    let mut chain = chain();
    let alice = chain.create_staker(0, 1_000);
    credit(&mut chain, &alice, 50);

    assert_matches!(
        chain.deliver(MsgClaimCommissionRewards {
            creator: alice.clone(),
            amount: Coins::native(51),
        }),
        Err(StakersError::NotEnoughRewards { .. })
    );
    assert_matches!(
        chain.deliver(MsgClaimCommissionRewards {
            creator: alice.clone(),
            amount: Coins::coin("acoin", 1),
        }),
        Err(StakersError::NotEnoughRewards { .. })
    );
    let record = chain.query(|k, s| k.require_staker(s, &alice)).unwrap();
    assert_eq!(record.commission_rewards, Coins::native(50));
}

#[test]
fn test_payout_without_funds_rolls_back() {
    let mut chain = chain();
    let alice = chain.create_staker(0, 1_000);
    assert_matches!(
        chain.with_keeper(|keeper, ctx| {
            keeper.payout_additional_commission_rewards(ctx, &alice, &payer(), &Coins::native(10))
        }),
        Err(StakersError::Bank { .. })
    );
    let record = chain.query(|k, s| k.require_staker(s, &alice)).unwrap();
    assert!(record.commission_rewards.is_zero());
    assert!(chain.pending_events().iter().all(|event| !matches!(
        event,
        StakersEvent::PayoutCommissionRewards { .. }
    )));
}

#[test]
fn test_payout_to_unknown_staker_fails() {
    let mut chain = chain();
    chain.fund(&payer(), 10);
    assert_matches!(
        chain.with_keeper(|keeper, ctx| {
            keeper.payout_additional_commission_rewards(ctx, &staker(7), &payer(), &Coins::native(10))
        }),
        Err(StakersError::NoStaker { .. })
    );
    assert_eq!(chain.bank.balance(&payer()), Coins::native(10));
}

#[test]
fn test_payout_rewards_forwards_to_validator_set() {
    let mut chain = chain();
    let alice = chain.create_staker(0, 1_000);
    chain
        .with_keeper(|keeper, ctx| keeper.payout_rewards(ctx, &alice, &payer(), &Coins::native(40)))
        .unwrap();
    let rewards = chain.validators.rewards();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].validator, alice);
    assert_eq!(rewards[0].amount, Coins::native(40));

    assert_matches!(
        chain.with_keeper(|keeper, ctx| {
            keeper.payout_rewards(ctx, &staker(9), &payer(), &Coins::native(40))
        }),
        Err(StakersError::NoStaker { .. })
    );
}

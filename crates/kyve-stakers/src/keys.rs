//! Store key layout
//!
//! Every record lives under a short byte prefix. Composite keys concatenate a
//! big-endian pool id and one-byte length-prefixed addresses, so prefix scans
//! over `staker` never match a longer address that merely starts the same way.

use kyve_core::{Address, PoolId, Result, StakersError};

/// Module parameters
pub const PARAMS_KEY: &[u8] = &[0x00];
/// `staker -> Staker`
pub const STAKER_PREFIX: &[u8] = &[0x01];
/// `pool | staker -> Valaccount`
pub const VALACCOUNT_PREFIX: &[u8] = &[0x02, 0x00];
/// `staker | pool -> ()`
pub const VALACCOUNT_BY_STAKER_PREFIX: &[u8] = &[0x02, 0x01];
/// `valaddress -> (staker, pool)`
pub const VALADDRESS_PREFIX: &[u8] = &[0x02, 0x02];
/// `pool -> member count`
pub const POOL_STAKER_COUNT_PREFIX: &[u8] = &[0x03];
/// `index -> CommissionChangeEntry`
pub const COMMISSION_ENTRY_PREFIX: &[u8] = &[0x04, 0x00];
/// `staker -> index`
pub const COMMISSION_SUBJECT_PREFIX: &[u8] = &[0x04, 0x01];
/// `index -> LeavePoolEntry`
pub const LEAVE_ENTRY_PREFIX: &[u8] = &[0x05, 0x00];
/// `staker | pool -> index`
pub const LEAVE_SUBJECT_PREFIX: &[u8] = &[0x05, 0x01];
/// `staker -> number of pools`
pub const ACTIVE_STAKER_PREFIX: &[u8] = &[0x06];
/// `index -> StakeFractionChangeEntry`
pub const STAKE_FRACTION_ENTRY_PREFIX: &[u8] = &[0x07, 0x00];
/// `staker | pool -> index`
pub const STAKE_FRACTION_SUBJECT_PREFIX: &[u8] = &[0x07, 0x01];
/// `queue id -> QueueState`
pub const QUEUE_STATE_PREFIX: &[u8] = &[0x1e];

/// Build `prefix | parts...`
pub fn compose(prefix: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut key = prefix.to_vec();
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

/// Length-prefixed address segment
pub fn address_segment(address: &Address) -> Vec<u8> {
    let bytes = address.as_bytes();
    let mut segment = Vec::with_capacity(bytes.len() + 1);
    // Address::new bounds the length to one byte
    segment.push(bytes.len() as u8);
    segment.extend_from_slice(bytes);
    segment
}

/// Big-endian pool segment
pub fn pool_segment(pool_id: PoolId) -> [u8; 8] {
    pool_id.to_be_bytes()
}

/// Key of a staker record
pub fn staker_key(staker: &Address) -> Vec<u8> {
    compose(STAKER_PREFIX, &[&address_segment(staker)])
}

/// Key of a membership
pub fn valaccount_key(pool_id: PoolId, staker: &Address) -> Vec<u8> {
    compose(
        VALACCOUNT_PREFIX,
        &[&pool_segment(pool_id), &address_segment(staker)],
    )
}

/// Prefix of all memberships of a pool
pub fn valaccount_pool_prefix(pool_id: PoolId) -> Vec<u8> {
    compose(VALACCOUNT_PREFIX, &[&pool_segment(pool_id)])
}

/// Key of the staker-to-pool index
pub fn valaccount_by_staker_key(staker: &Address, pool_id: PoolId) -> Vec<u8> {
    compose(
        VALACCOUNT_BY_STAKER_PREFIX,
        &[&address_segment(staker), &pool_segment(pool_id)],
    )
}

/// Prefix of all staker-to-pool index entries of a staker
pub fn valaccount_by_staker_prefix(staker: &Address) -> Vec<u8> {
    compose(VALACCOUNT_BY_STAKER_PREFIX, &[&address_segment(staker)])
}

/// Recover the pool id from a staker-to-pool index key
pub fn pool_from_index_key(key: &[u8]) -> Result<PoolId> {
    let tail = key
        .len()
        .checked_sub(8)
        .and_then(|start| key.get(start..))
        .ok_or_else(|| StakersError::corrupted("staker index key shorter than a pool id"))?;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(tail);
    Ok(PoolId::from_be_bytes(bytes))
}

/// Key of the global valaddress index
pub fn valaddress_key(valaddress: &Address) -> Vec<u8> {
    compose(VALADDRESS_PREFIX, &[&address_segment(valaddress)])
}

/// Key of a pool's member counter
pub fn pool_staker_count_key(pool_id: PoolId) -> Vec<u8> {
    compose(POOL_STAKER_COUNT_PREFIX, &[&pool_segment(pool_id)])
}

/// Key of a staker's active-pool counter
pub fn active_staker_key(staker: &Address) -> Vec<u8> {
    compose(ACTIVE_STAKER_PREFIX, &[&address_segment(staker)])
}

/// Subject key identifying one membership
pub fn membership_subject(staker: &Address, pool_id: PoolId) -> Vec<u8> {
    compose(&address_segment(staker), &[&pool_segment(pool_id)])
}

/// Key of a queue entry
pub fn queue_entry_key(prefix: &[u8], index: u64) -> Vec<u8> {
    compose(prefix, &[&index.to_be_bytes()])
}

/// Key of a queue's cursor pair
pub fn queue_state_key(queue_id: u8) -> Vec<u8> {
    compose(QUEUE_STATE_PREFIX, &[&[queue_id]])
}

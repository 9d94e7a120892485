//! Generic deferred change queue
//!
//! Commission changes, pool leaves and stake fraction decreases share one
//! mechanism: an entry is appended at `high_index + 1` with the block time it
//! was requested at, and an end-block drain walks forward from `low_index + 1`
//! applying every entry whose delay has passed. Each subject (a staker, or a
//! staker in one pool) has at most one live entry, located through a subject
//! index so an override can remove its predecessor in constant time.
//!
//! Removing an entry leaves a hole at its index. The drain treats holes as
//! resolved and steps over them; it stops at the first live entry that is not
//! due yet, which keeps the drain proportional to the work actually done.

use crate::keys;
use crate::types::{CommissionChangeEntry, LeavePoolEntry, QueueState, StakeFractionChangeEntry};
use kyve_core::store::{get_value, scan_values, set_value};
use kyve_core::{Context, KvStore, Result, StakersError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Queue identifiers, also the last byte of the queue state key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueId {
    /// Commission changes
    Commission,
    /// Pool leaves
    Leave,
    /// Stake fraction decreases
    StakeFraction,
}

impl QueueId {
    /// Byte identifying the queue state record
    pub fn id(self) -> u8 {
        match self {
            Self::Commission => 2,
            Self::Leave => 3,
            Self::StakeFraction => 4,
        }
    }

    fn entry_prefix(self) -> &'static [u8] {
        match self {
            Self::Commission => keys::COMMISSION_ENTRY_PREFIX,
            Self::Leave => keys::LEAVE_ENTRY_PREFIX,
            Self::StakeFraction => keys::STAKE_FRACTION_ENTRY_PREFIX,
        }
    }

    fn subject_prefix(self) -> &'static [u8] {
        match self {
            Self::Commission => keys::COMMISSION_SUBJECT_PREFIX,
            Self::Leave => keys::LEAVE_SUBJECT_PREFIX,
            Self::StakeFraction => keys::STAKE_FRACTION_SUBJECT_PREFIX,
        }
    }

    /// Short name used in logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Commission => "commission",
            Self::Leave => "leave",
            Self::StakeFraction => "stake_fraction",
        }
    }
}

/// A record that can live in a deferred queue
pub trait QueueEntry: Serialize + DeserializeOwned + Clone {
    /// Queue the entry type belongs to
    const QUEUE: QueueId;

    /// Index assigned at enqueue
    fn index(&self) -> u64;

    /// Block time the change was requested at
    fn creation_date(&self) -> i64;

    /// Key of the subject the entry changes
    fn subject(&self) -> Vec<u8>;
}

impl QueueEntry for CommissionChangeEntry {
    const QUEUE: QueueId = QueueId::Commission;

    fn index(&self) -> u64 {
        self.index
    }

    fn creation_date(&self) -> i64 {
        self.creation_date
    }

    fn subject(&self) -> Vec<u8> {
        keys::address_segment(&self.staker)
    }
}

impl QueueEntry for LeavePoolEntry {
    const QUEUE: QueueId = QueueId::Leave;

    fn index(&self) -> u64 {
        self.index
    }

    fn creation_date(&self) -> i64 {
        self.creation_date
    }

    fn subject(&self) -> Vec<u8> {
        keys::membership_subject(&self.staker, self.pool_id)
    }
}

impl QueueEntry for StakeFractionChangeEntry {
    const QUEUE: QueueId = QueueId::StakeFraction;

    fn index(&self) -> u64 {
        self.index
    }

    fn creation_date(&self) -> i64 {
        self.creation_date
    }

    fn subject(&self) -> Vec<u8> {
        keys::membership_subject(&self.staker, self.pool_id)
    }
}

/// Whether an entry created at `creation_date` is due at `now` after `delay` seconds
pub fn is_due(creation_date: i64, delay: u64, now: i64) -> bool {
    let delay = i64::try_from(delay).unwrap_or(i64::MAX);
    creation_date.saturating_add(delay) <= now
}

/// Store operations of the queue holding `E`
pub struct DeferredQueue<E> {
    _entry: PhantomData<E>,
}

impl<E: QueueEntry> DeferredQueue<E> {
    /// Current cursor pair
    pub fn state(store: &dyn KvStore) -> Result<QueueState> {
        let key = keys::queue_state_key(E::QUEUE.id());
        Ok(get_value(store, &key)?.unwrap_or_default())
    }

    fn set_state(store: &mut dyn KvStore, state: QueueState) -> Result<()> {
        set_value(store, &keys::queue_state_key(E::QUEUE.id()), &state)
    }

    /// Append an entry built for the next free index
    ///
    /// Any previous entry for the same subject must be removed first.
    pub fn enqueue(store: &mut dyn KvStore, build: impl FnOnce(u64) -> E) -> Result<E> {
        let mut state = Self::state(store)?;
        state.high_index = state
            .high_index
            .checked_add(1)
            .ok_or_else(|| StakersError::corrupted("queue index overflow"))?;
        let entry = build(state.high_index);
        if entry.index() != state.high_index {
            return Err(StakersError::corrupted(format!(
                "{} entry built with index {} instead of {}",
                E::QUEUE.name(),
                entry.index(),
                state.high_index
            )));
        }
        let subject_key = keys::compose(E::QUEUE.subject_prefix(), &[&entry.subject()]);
        if store.has(&subject_key) {
            return Err(StakersError::corrupted(format!(
                "{} queue already holds an entry for subject {}",
                E::QUEUE.name(),
                kyve_core::codec::display_key(&entry.subject())
            )));
        }

        set_value(
            store,
            &keys::queue_entry_key(E::QUEUE.entry_prefix(), entry.index()),
            &entry,
        )?;
        set_value(store, &subject_key, &entry.index())?;
        Self::set_state(store, state)?;
        debug!(queue = E::QUEUE.name(), index = entry.index(), "queue entry added");
        Ok(entry)
    }

    /// Entry at `index`
    pub fn get(store: &dyn KvStore, index: u64) -> Result<Option<E>> {
        get_value(store, &keys::queue_entry_key(E::QUEUE.entry_prefix(), index))
    }

    /// Live entry for `subject`
    pub fn get_by_subject(store: &dyn KvStore, subject: &[u8]) -> Result<Option<E>> {
        let subject_key = keys::compose(E::QUEUE.subject_prefix(), &[subject]);
        match get_value::<u64>(store, &subject_key)? {
            Some(index) => Self::get(store, index),
            None => Ok(None),
        }
    }

    /// Whether `subject` has a live entry
    pub fn contains_subject(store: &dyn KvStore, subject: &[u8]) -> bool {
        store.has(&keys::compose(E::QUEUE.subject_prefix(), &[subject]))
    }

    /// Delete an entry and its subject index
    pub fn remove(store: &mut dyn KvStore, entry: &E) -> Result<()> {
        store.delete(&keys::queue_entry_key(E::QUEUE.entry_prefix(), entry.index()));
        let subject_key = keys::compose(E::QUEUE.subject_prefix(), &[&entry.subject()]);
        if get_value::<u64>(store, &subject_key)? == Some(entry.index()) {
            store.delete(&subject_key);
        }
        debug!(queue = E::QUEUE.name(), index = entry.index(), "queue entry removed");
        Ok(())
    }

    /// Delete the live entry for `subject`, returning it
    pub fn remove_subject(store: &mut dyn KvStore, subject: &[u8]) -> Result<Option<E>> {
        let entry = Self::get_by_subject(store, subject)?;
        if let Some(entry) = &entry {
            Self::remove(store, entry)?;
        }
        Ok(entry)
    }

    /// Every live entry in index order
    pub fn all(store: &dyn KvStore) -> Result<Vec<E>> {
        scan_values(store, E::QUEUE.entry_prefix())
    }

    /// Apply entries from the front of the queue while they are due
    ///
    /// Each due entry is removed before `apply` runs. Returns the number of
    /// entries applied.
    pub fn drain_due<D, A>(ctx: &mut Context<'_>, is_due: D, mut apply: A) -> Result<usize>
    where
        D: Fn(&E) -> bool,
        A: FnMut(&mut Context<'_>, E) -> Result<()>,
    {
        let mut applied = 0;
        loop {
            let mut state = Self::state(ctx.store())?;
            let cursor = state.low_index.saturating_add(1);
            let resolved = match Self::get(ctx.store(), cursor)? {
                None => true,
                Some(entry) if is_due(&entry) => {
                    Self::remove(ctx.store_mut(), &entry)?;
                    apply(ctx, entry)?;
                    applied += 1;
                    true
                }
                Some(_) => false,
            };
            if !resolved {
                break;
            }
            // apply may have touched the queue state
            state.high_index = Self::state(ctx.store())?.high_index;
            if state.low_index >= state.high_index {
                break;
            }
            state.low_index += 1;
            Self::set_state(ctx.store_mut(), state)?;
        }
        if applied > 0 {
            trace!(queue = E::QUEUE.name(), applied, "queue drained");
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyve_core::{Address, BlockHeader, EventManager, Fraction, MemoryStore};

    type LeaveQueue = DeferredQueue<LeavePoolEntry>;

    fn leave(index: u64, staker: &'static str, creation_date: i64) -> LeavePoolEntry {
        LeavePoolEntry {
            index,
            staker: Address::from_static(staker),
            pool_id: 0,
            creation_date,
        }
    }

    fn drain(store: &mut MemoryStore, now: i64, delay: u64) -> Vec<Address> {
        let mut events = EventManager::new();
        let mut ctx = Context::new(BlockHeader::new(1, now), store, &mut events);
        let mut applied = Vec::new();
        LeaveQueue::drain_due(
            &mut ctx,
            |entry| is_due(entry.creation_date, delay, now),
            |_, entry| {
                applied.push(entry.staker);
                Ok(())
            },
        )
        .unwrap();
        applied
    }

    #[test]
    fn test_enqueue_assigns_increasing_indices() {
        let mut store = MemoryStore::new();
        let a = LeaveQueue::enqueue(&mut store, |i| leave(i, "a", 0)).unwrap();
        let b = LeaveQueue::enqueue(&mut store, |i| leave(i, "b", 0)).unwrap();
        assert_eq!((a.index, b.index), (1, 2));
        assert_eq!(
            LeaveQueue::state(&store).unwrap(),
            QueueState {
                low_index: 0,
                high_index: 2
            }
        );
    }

    #[test]
    fn test_duplicate_subject_is_rejected() {
        let mut store = MemoryStore::new();
        LeaveQueue::enqueue(&mut store, |i| leave(i, "a", 0)).unwrap();
        assert!(LeaveQueue::enqueue(&mut store, |i| leave(i, "a", 1)).is_err());
    }

    #[test]
    fn test_drain_stops_at_first_entry_not_due() {
        let mut store = MemoryStore::new();
        LeaveQueue::enqueue(&mut store, |i| leave(i, "a", 0)).unwrap();
        LeaveQueue::enqueue(&mut store, |i| leave(i, "b", 50)).unwrap();
        LeaveQueue::enqueue(&mut store, |i| leave(i, "c", 0)).unwrap();

        let applied = drain(&mut store, 100, 100);
        assert_eq!(applied, vec![Address::from_static("a")]);
        assert_eq!(LeaveQueue::state(&store).unwrap().low_index, 1);

        let applied = drain(&mut store, 150, 100);
        assert_eq!(
            applied,
            vec![Address::from_static("b"), Address::from_static("c")]
        );
        assert_eq!(LeaveQueue::state(&store).unwrap().low_index, 3);
        assert!(LeaveQueue::all(&store).unwrap().is_empty());
    }

    #[test]
    fn test_drain_steps_over_holes() {
        let mut store = MemoryStore::new();
        let a = LeaveQueue::enqueue(&mut store, |i| leave(i, "a", 0)).unwrap();
        LeaveQueue::enqueue(&mut store, |i| leave(i, "b", 0)).unwrap();
        LeaveQueue::remove(&mut store, &a).unwrap();

        let applied = drain(&mut store, 10, 10);
        assert_eq!(applied, vec![Address::from_static("b")]);
        let state = LeaveQueue::state(&store).unwrap();
        assert_eq!(state.low_index, state.high_index);
    }

    #[test]
    fn test_empty_queue_drain_is_noop() {
        let mut store = MemoryStore::new();
        assert!(drain(&mut store, 1_000, 0).is_empty());
        assert_eq!(LeaveQueue::state(&store).unwrap(), QueueState::default());
    }

    #[test]
    fn test_subject_lookup_and_override() {
        let mut store = MemoryStore::new();
        let first = DeferredQueue::<CommissionChangeEntry>::enqueue(&mut store, |index| {
            CommissionChangeEntry {
                index,
                staker: Address::from_static("a"),
                pool_id: 0,
                commission: Fraction::from_percent(5),
                creation_date: 0,
            }
        })
        .unwrap();
        let subject = first.subject();
        let removed =
            DeferredQueue::<CommissionChangeEntry>::remove_subject(&mut store, &subject).unwrap();
        assert_eq!(removed, Some(first));
        assert!(!DeferredQueue::<CommissionChangeEntry>::contains_subject(
            &store, &subject
        ));
    }

    #[test]
    fn test_is_due_boundary() {
        assert!(is_due(100, 10, 110));
        assert!(!is_due(100, 10, 109));
        assert!(is_due(0, u64::MAX, i64::MAX));
    }
}

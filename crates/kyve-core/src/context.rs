//! Execution context for state transitions
//!
//! A [`Context`] bundles what a handler may touch while it runs: the current
//! block header, the (usually cached) store and the event sink.

use crate::events::{EventManager, StakersEvent};
use crate::store::KvStore;
use serde::{Deserialize, Serialize};

/// Height and wall-clock time of the block being executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height
    pub height: u64,
    /// Block time in unix seconds
    pub time: i64,
}

impl BlockHeader {
    /// Header at `height` with time `time`
    pub fn new(height: u64, time: i64) -> Self {
        Self { height, time }
    }
}

/// Mutable view of engine state for one transition
pub struct Context<'a> {
    header: BlockHeader,
    store: &'a mut dyn KvStore,
    events: &'a mut EventManager,
}

impl<'a> Context<'a> {
    /// Context over `store` emitting into `events`
    pub fn new(header: BlockHeader, store: &'a mut dyn KvStore, events: &'a mut EventManager) -> Self {
        Self {
            header,
            store,
            events,
        }
    }

    /// Current block header
    pub fn header(&self) -> BlockHeader {
        self.header
    }

    /// Current block time in unix seconds
    pub fn block_time(&self) -> i64 {
        self.header.time
    }

    /// Current block height
    pub fn block_height(&self) -> u64 {
        self.header.height
    }

    /// Read access to the store
    pub fn store(&self) -> &dyn KvStore {
        &*self.store
    }

    /// Write access to the store
    pub fn store_mut(&mut self) -> &mut dyn KvStore {
        &mut *self.store
    }

    /// Record an event
    pub fn emit(&mut self, event: StakersEvent) {
        self.events.emit(event);
    }

    /// Events recorded so far in this context
    pub fn events(&self) -> &[StakersEvent] {
        self.events.events()
    }
}

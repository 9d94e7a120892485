//! Block-driven runtime of the stakers module
//!
//! [`StakersModule`] owns the store and sequences work the way a host chain
//! does: `begin_block` fixes the header, each `deliver` runs one message
//! atomically, and `end_block` drains the deferred queues and hands back the
//! block's events.

use crate::keeper::StakersKeeper;
use crate::msgs::StakersMsg;
use kyve_core::{
    Address, BlockHeader, CacheStore, Context, EventManager, KvStore, MemoryStore, Params,
    Result, StakersEvent, ValidatorSetObserver,
};
use tracing::{debug, error, info, trace};

/// Outcome of a delivered message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgResponse {
    /// Events emitted by the message
    pub events: Vec<StakersEvent>,
}

/// Stakers state machine over a store
pub struct StakersModule<S: KvStore = MemoryStore> {
    store: S,
    keeper: StakersKeeper,
    header: BlockHeader,
    block_events: Vec<StakersEvent>,
}

impl<S: KvStore> StakersModule<S> {
    /// Module over `store`, writing `params` at genesis
    pub fn new(mut store: S, keeper: StakersKeeper, params: Params) -> Result<Self> {
        keeper.set_params(&mut store, &params)?;
        Ok(Self {
            store,
            keeper,
            header: BlockHeader::default(),
            block_events: Vec::new(),
        })
    }

    /// Module over a store that already holds state
    pub fn resume(store: S, keeper: StakersKeeper) -> Self {
        Self {
            store,
            keeper,
            header: BlockHeader::default(),
            block_events: Vec::new(),
        }
    }

    /// Start a block
    pub fn begin_block(&mut self, header: BlockHeader) {
        debug!(height = header.height, time = header.time, "begin block");
        self.header = header;
        self.block_events.clear();
    }

    /// Header of the current block
    pub fn header(&self) -> BlockHeader {
        self.header
    }

    /// Run `f` against a cached context, committing only on success
    pub fn execute<T>(
        &mut self,
        f: impl FnOnce(&StakersKeeper, &mut Context<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut cache = CacheStore::new(&mut self.store);
        let mut events = EventManager::new();
        let result = {
            let mut ctx = Context::new(self.header, &mut cache, &mut events);
            f(&self.keeper, &mut ctx)
        };
        match result {
            Ok(value) => {
                trace!(writes = cache.pending(), "committing transition");
                cache.commit();
                self.block_events.extend(events.into_events());
                Ok(value)
            }
            Err(err) => {
                debug!(code = err.code(), error = %err, "transition rolled back");
                Err(err)
            }
        }
    }

    /// Deliver one transaction message
    pub fn deliver(&mut self, msg: StakersMsg) -> Result<MsgResponse> {
        let before = self.block_events.len();
        self.execute(|keeper, ctx| keeper.handle(ctx, msg))?;
        Ok(MsgResponse {
            events: self.block_events[before..].to_vec(),
        })
    }

    /// Drain the deferred queues and return the block's events
    ///
    /// An error here means the store is corrupted and the block must not be
    /// committed.
    pub fn end_block(&mut self) -> Result<Vec<StakersEvent>> {
        let height = self.header.height;
        let applied = self
            .execute(|keeper, ctx| {
                let commission = keeper.process_commission_change_queue(ctx)?;
                let leave = keeper.process_leave_pool_queue(ctx)?;
                let stake_fraction = keeper.process_stake_fraction_change_queue(ctx)?;
                Ok((commission, leave, stake_fraction))
            })
            .inspect_err(|err| error!(height, error = %err, "end block failed"))?;
        if applied != (0, 0, 0) {
            info!(
                height,
                commission = applied.0,
                leave = applied.1,
                stake_fraction = applied.2,
                "deferred changes applied"
            );
        }
        Ok(std::mem::take(&mut self.block_events))
    }

    /// Validator set hook: `validator` left the active set
    pub fn on_validator_removed_from_active_set(&mut self, validator: &Address) -> Result<()> {
        self.execute(|keeper, ctx| keeper.on_validator_removed_from_active_set(ctx, validator))
    }

    /// Validator set hook: `validator` was slashed by consensus
    pub fn on_validator_slashed(&mut self, validator: &Address) -> Result<()> {
        self.execute(|keeper, ctx| keeper.on_validator_slashed(ctx, validator))
    }

    /// Run an exposed keeper operation for a collaborating module
    pub fn with_keeper<T>(
        &mut self,
        f: impl FnOnce(&StakersKeeper, &mut Context<'_>) -> Result<T>,
    ) -> Result<T> {
        self.execute(f)
    }

    /// Read-only access for queries
    pub fn query<T>(&self, f: impl FnOnce(&StakersKeeper, &dyn KvStore) -> Result<T>) -> Result<T> {
        f(&self.keeper, &self.store)
    }

    /// Events committed so far in the current block
    pub fn events(&self) -> &[StakersEvent] {
        &self.block_events
    }

    /// Keeper handle
    pub fn keeper(&self) -> &StakersKeeper {
        &self.keeper
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }
}

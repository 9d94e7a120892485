//! Block-by-block chain harness
//!
//! [`TestChain`] wires a [`StakersModule`] to the in-memory fakes and drives
//! it like a host chain: messages are delivered into the current block,
//! [`TestChain::commit_after_seconds`] ends the block, checks every store
//! invariant and opens the next block with the clock advanced.

use crate::fixtures;
use crate::mocks::{MockBank, MockPoolRegistry, MockValidatorSet};
use kyve_core::{
    Address, BlockHeader, BondStatus, Coins, Context, Fraction, KvStore, MemoryStore, Params,
    PoolId, Result, StakersEvent,
};
use kyve_stakers::{MsgResponse, StakersKeeper, StakersModule, StakersMsg};
use std::sync::Arc;

/// Genesis block time used by every chain
pub const GENESIS_TIME: i64 = 1_700_000_000;

/// In-memory chain running the stakers module
pub struct TestChain {
    /// Bank fake
    pub bank: Arc<MockBank>,
    /// Pool registry fake
    pub pools: Arc<MockPoolRegistry>,
    /// Validator set fake
    pub validators: Arc<MockValidatorSet>,
    module: StakersModule,
    header: BlockHeader,
    committed: Vec<StakersEvent>,
}

impl TestChain {
    /// Chain with default params and pool 0 at full voting power
    pub fn new() -> Self {
        Self::with_params(Params::default())
    }

    /// Chain with `params` and pool 0 at full voting power
    pub fn with_params(params: Params) -> Self {
        crate::init_test_tracing();
        let bank = Arc::new(MockBank::new());
        let pools = Arc::new(MockPoolRegistry::new());
        let validators = Arc::new(MockValidatorSet::new());
        pools.add_pool(0, Fraction::one());

        let keeper = StakersKeeper::new(bank.clone(), pools.clone(), validators.clone());
        let mut module = StakersModule::new(MemoryStore::new(), keeper, params).unwrap();
        let header = BlockHeader::new(1, GENESIS_TIME);
        module.begin_block(header);
        Self {
            bank,
            pools,
            validators,
            module,
            header,
            committed: Vec::new(),
        }
    }

    /// Header of the open block
    pub fn header(&self) -> BlockHeader {
        self.header
    }

    /// Time of the open block
    pub fn now(&self) -> i64 {
        self.header.time
    }

    /// Deliver a message into the open block
    pub fn deliver(&mut self, msg: impl Into<StakersMsg>) -> Result<MsgResponse> {
        self.module.deliver(msg.into())
    }

    /// Deliver a message that must succeed
    pub fn deliver_ok(&mut self, msg: impl Into<StakersMsg>) -> MsgResponse {
        let msg = msg.into();
        let name = msg.name();
        match self.module.deliver(msg) {
            Ok(response) => response,
            Err(err) => panic!("{name} failed: {err}"),
        }
    }

    /// End the open block, check invariants and open the next one `seconds` later
    pub fn commit_after_seconds(&mut self, seconds: u64) -> Vec<StakersEvent> {
        let events = self.module.end_block().unwrap();
        self.check_invariants();
        self.committed.extend(events.iter().cloned());
        self.header = BlockHeader::new(
            self.header.height + 1,
            self.header.time + i64::try_from(seconds).unwrap(),
        );
        self.module.begin_block(self.header);
        events
    }

    /// End the open block and open the next one at the same time
    pub fn commit(&mut self) -> Vec<StakersEvent> {
        self.commit_after_seconds(0)
    }

    /// Rebuild the module from the committed store, as after a node restart
    ///
    /// Ends the open block first.
    pub fn restart(&mut self) {
        self.commit();
        let store = self.module.store().clone();
        let keeper = self.module.keeper().clone();
        self.module = StakersModule::resume(store, keeper);
        self.module.begin_block(self.header);
    }

    /// Assert every structural invariant of the store
    pub fn check_invariants(&self) {
        self.query(|keeper, store| keeper.check_invariants(store))
            .unwrap_or_else(|err| panic!("invariant broken: {err}"));
    }

    /// Run a read-only query
    pub fn query<T>(&self, f: impl FnOnce(&StakersKeeper, &dyn KvStore) -> Result<T>) -> Result<T> {
        self.module.query(f)
    }

    /// Run an exposed keeper operation atomically in the open block
    pub fn with_keeper<T>(
        &mut self,
        f: impl FnOnce(&StakersKeeper, &mut Context<'_>) -> Result<T>,
    ) -> Result<T> {
        self.module.with_keeper(f)
    }

    /// Events committed in the open block so far
    pub fn pending_events(&self) -> &[StakersEvent] {
        self.module.events()
    }

    /// Every event of every ended block
    pub fn committed_events(&self) -> &[StakersEvent] {
        &self.committed
    }

    /// Validator-set hook: validator left the active set
    pub fn remove_from_active_set(&mut self, validator: &Address) -> Result<()> {
        self.validators.set_status(validator, BondStatus::Unbonding);
        self.module.on_validator_removed_from_active_set(validator)
    }

    /// Validator-set hook: validator slashed by consensus
    pub fn slash_validator(&mut self, validator: &Address) -> Result<()> {
        self.module.on_validator_slashed(validator)
    }

    /// Bonded validator `n` registered as a staker
    pub fn create_staker(&mut self, n: u32, bonded: u64) -> Address {
        let address = fixtures::staker(n);
        self.validators.add_validator(&address, bonded);
        self.deliver_ok(fixtures::create_staker(n));
        address
    }

    /// Bonded staker `n` that joined `pool_id` with its full stake
    pub fn create_member(&mut self, n: u32, bonded: u64, pool_id: PoolId) -> Address {
        let address = self.create_staker(n, bonded);
        self.deliver_ok(fixtures::JoinPoolBuilder::new(n, pool_id).build());
        address
    }

    /// Fund an account in the bank fake
    pub fn fund(&self, account: &Address, amount: u64) {
        self.bank.fund(account, &Coins::native(amount));
    }
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new()
    }
}

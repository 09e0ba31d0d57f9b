pub mod assets;
pub mod chain;
pub mod engine;
pub mod liba;
pub mod polc;

pub use {
    assets::{AssetTransfer, Balances},
    chain::{BlockNo, Chain, DAY},
    engine::Protocol,
};
use {
    model::events::Event,
    winner_selection::{Address, U256},
};

/// The sender of a call and the native value attached to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tx {
    pub from: Address,
    pub value: U256,
}

impl Tx {
    /// A call without attached value.
    pub fn new(from: Address) -> Self {
        Self {
            from,
            value: U256::ZERO,
        }
    }

    pub fn with_value(self, value: U256) -> Self {
        Self { value, ..self }
    }
}

/// Everything a call can observe or affect outside of the component it is
/// addressed to.
pub struct Env<'a> {
    pub tx: Tx,
    pub chain: Chain,
    pub assets: &'a mut dyn AssetTransfer,
    pub events: &'a mut Vec<Event>,
}

impl Env<'_> {
    /// The environment of a call one component makes into another. The
    /// calling component becomes the sender and no value is attached.
    pub fn nested(&mut self, from: Address) -> Env<'_> {
        Env {
            tx: Tx::new(from),
            chain: self.chain,
            assets: &mut *self.assets,
            events: &mut *self.events,
        }
    }

    pub fn sender(&self) -> Address {
        self.tx.from
    }

    pub fn emit(&mut self, event: Event) {
        tracing::debug!(event = event.name(), ?event, "emitted");
        self.events.push(event);
    }
}

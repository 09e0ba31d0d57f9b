use {
    super::{
        period::{Durations, Period, Periods},
        settlement::Settlement,
    },
    crate::domain::{BlockNo, DAY},
    model::{AuctionId, TokenAddress},
    winner_selection::{Address, U256},
};

/// Parameters an asker opens an auction with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    /// Token to borrow.
    pub token: TokenAddress,
    pub durations: Durations,
    /// Requested loan value.
    pub value: U256,
    /// Loan term in days.
    pub duration: u64,
    /// Highest acceptable rate, in per-mille per day.
    pub max_rate: U256,
    /// Smallest acceptable bid value.
    pub min_value: U256,
    pub collateral_token: TokenAddress,
    pub collateral_value: U256,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Auction {
    pub asker: Address,
    pub token: TokenAddress,
    pub value: U256,
    pub duration: u64,
    pub max_rate: U256,
    pub min_value: U256,
    pub collateral_token: TokenAddress,
    pub collateral_value: U256,
    pub periods: Periods,
    /// Stake token deposit posted at creation.
    pub deposit: U256,
    /// Whether the deposit went to the treasury or back to the asker.
    pub deposit_settled: bool,
    /// Bidders in order of their first bid.
    pub bidders: Vec<Address>,
    pub settlement: Settlement,
    pub finalized: bool,
    /// Timestamp the loan started at.
    pub finance_start: Option<u64>,
    /// Winners that lent something, in fill order.
    pub lenders: Vec<Address>,
    pub lent_value: U256,
    /// Rate every lender is paid.
    pub clearing_rate: U256,
    pub repaid: bool,
    /// Collateral already paid out to lenders of the defaulted loan.
    pub collateral_collected: U256,
    /// Whether the remaining collateral went back to the asker.
    pub collateral_returned: bool,
}

impl Auction {
    pub fn new(
        asker: Address,
        params: Params,
        start: BlockNo,
        deposit: U256,
    ) -> Result<Self, super::Error> {
        Ok(Self {
            asker,
            token: params.token,
            value: params.value,
            duration: params.duration,
            max_rate: params.max_rate,
            min_value: params.min_value,
            collateral_token: params.collateral_token,
            collateral_value: params.collateral_value,
            periods: Periods::new(start, params.durations)?,
            deposit,
            deposit_settled: false,
            bidders: Vec::new(),
            settlement: Settlement::Unclaimed,
            finalized: false,
            finance_start: None,
            lenders: Vec::new(),
            lent_value: U256::ZERO,
            clearing_rate: U256::ZERO,
            repaid: false,
            collateral_collected: U256::ZERO,
            collateral_returned: false,
        })
    }

    pub fn period(&self, block: BlockNo) -> Period {
        if self.finalized {
            return Period::Finalized;
        }
        self.periods.at(block)
    }

    pub fn is_expired(&self, block: BlockNo) -> bool {
        self.period(block) == Period::Expired
    }

    pub fn is_lender(&self, bidder: &Address) -> bool {
        self.lenders.contains(bidder)
    }

    /// Timestamp from which lenders can collect collateral.
    pub fn lending_end(&self) -> Option<u64> {
        self.finance_start
            .map(|start| start.saturating_add(self.duration.saturating_mul(DAY)))
    }
}

/// Auctions indexed by their sequential id.
#[derive(Clone, Debug, Default)]
pub struct Store {
    auctions: Vec<Auction>,
}

impl Store {
    pub fn next_id(&self) -> AuctionId {
        AuctionId(self.auctions.len() as u64)
    }

    pub fn insert(&mut self, auction: Auction) -> AuctionId {
        let id = self.next_id();
        self.auctions.push(auction);
        id
    }

    pub fn get(&self, id: AuctionId) -> Option<&Auction> {
        usize::try_from(id.0)
            .ok()
            .and_then(|index| self.auctions.get(index))
    }

    pub fn get_mut(&mut self, id: AuctionId) -> Option<&mut Auction> {
        usize::try_from(id.0)
            .ok()
            .and_then(|index| self.auctions.get_mut(index))
    }

    pub fn len(&self) -> usize {
        self.auctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auctions.is_empty()
    }
}

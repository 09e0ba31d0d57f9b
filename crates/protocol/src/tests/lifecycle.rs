//! Complete auctions, from opening to settlement.

use {
    super::*,
    crate::domain::{
        engine,
        liba::{Error, Settlement, WinnerSet},
        polc::Commitment,
    },
    model::events::Event,
};

fn commitment_of<'a>(protocol: &'a Protocol, id: AuctionId, bidder: Address) -> &'a Commitment {
    let reveal = protocol.bid(bidder, id).unwrap().revealed.unwrap();
    protocol.commitment(bidder, reveal.commitment_id).unwrap()
}

fn uniform_bids(count: u8) -> Vec<(Address, Plaintext)> {
    bidders(count)
        .into_iter()
        .map(|bidder| (bidder, plaintext(RATE, BID_VALUE)))
        .collect()
}

#[test]
fn lends_every_bid_when_under_subscribed() {
    let mut protocol = protocol();
    let id = run_to_finalize(&mut protocol, params(600), &uniform_bids(5));

    let auction = protocol.auction(id).unwrap();
    assert_eq!(auction.settlement.winners(), bidders(5));
    assert_eq!(auction.settlement.top_loser(), Some(bidder(4)));

    let lent = protocol.finalize_auction(Tx::new(ASKER), id).unwrap();
    assert_eq!(lent, u(500));
    assert_eq!(protocol.period(id), Some(Period::Finalized));
    assert_eq!(protocol.balance_of(NATIVE, ASKER), u(FUNDS + 500));
    for bidder in bidders(5) {
        let commitment = commitment_of(&protocol, id, bidder);
        assert_eq!(commitment.available_value, U256::ZERO);
        assert_eq!(commitment.lending_value, u(BID_VALUE));
    }
    assert_balanced(&protocol);

    end_loan(&mut protocol, id);
    let repaid = protocol
        .repay_auction(Tx::new(ASKER).with_value(u(505)), id)
        .unwrap();
    assert_eq!(repaid, u(505));

    for bidder in bidders(5) {
        assert_eq!(protocol.payments(bidder, NATIVE), u(1));
        let commitment = commitment_of(&protocol, id, bidder);
        assert_eq!(commitment.available_value, u(BID_VALUE));
        assert_eq!(commitment.lending_value, U256::ZERO);
        // Stakes come back with the repayment.
        assert_eq!(protocol.balance_of(CELR, bidder), u(FUNDS));
    }
    assert_balanced(&protocol);

    protocol.transfer_fee_deposit(Tx::new(OWNER), id).unwrap();
    assert_eq!(protocol.balance_of(CELR, TREASURY), u(AUCTION_DEPOSIT));

    let paid = protocol
        .withdraw_payments(Tx::new(bidder(0)), NATIVE)
        .unwrap();
    assert_eq!(paid, u(1));
    assert_eq!(
        protocol.withdraw_payments(Tx::new(bidder(0)), NATIVE),
        Err(Error::NothingToWithdraw.into())
    );
}

#[test]
fn unrevealed_bids_are_left_out() {
    let mut protocol = protocol();
    let id = init(&mut protocol, params(600));
    for bidder in bidders(5) {
        place(&mut protocol, id, bidder, plaintext(RATE, BID_VALUE));
    }
    advance_to(&mut protocol, id, Period::Reveal);
    for bidder in bidders(4) {
        reveal(&mut protocol, id, bidder, plaintext(RATE, BID_VALUE));
    }
    assert_eq!(
        protocol.finalize_bid(Tx::new(bidder(4)), id),
        Err(Error::StakeLocked.into())
    );

    advance_to(&mut protocol, id, Period::Claim);
    // A bid that was never revealed can't win anymore.
    let refund = protocol.finalize_bid(Tx::new(bidder(4)), id).unwrap();
    assert_eq!(refund, u(STAKE));
    assert_eq!(protocol.balance_of(CELR, bidder(4)), u(FUNDS));

    let ranking = protocol.compute_winners(id).unwrap();
    assert_eq!(ranking.winner_addresses(), bidders(4));
    assert_eq!(ranking.top_loser(), Some(bidder(3)));
    protocol
        .claim_winners(Tx::new(ASKER), id, bidders(4), bidder(3))
        .unwrap();

    advance_to(&mut protocol, id, Period::Finalize);
    assert_eq!(
        protocol.finalize_auction(Tx::new(ASKER), id).unwrap(),
        u(400)
    );

    end_loan(&mut protocol, id);
    protocol
        .repay_auction(Tx::new(ASKER).with_value(u(404)), id)
        .unwrap();
    for bidder in bidders(4) {
        assert_eq!(protocol.payments(bidder, NATIVE), u(1));
        assert_eq!(
            commitment_of(&protocol, id, bidder).available_value,
            u(BID_VALUE)
        );
    }
    assert_eq!(protocol.payments(bidder(4), NATIVE), U256::ZERO);
    assert_balanced(&protocol);
}

#[test]
fn boundary_winner_is_partially_filled() {
    let mut protocol = protocol();
    let bids = vec![
        (bidder(0), plaintext(RATE, BID_VALUE)),
        (bidder(1), plaintext(RATE, BID_VALUE)),
        (bidder(2), plaintext(RATE, BID_VALUE)),
        (bidder(3), plaintext(RATE, 200)),
        (bidder(4), plaintext(10, BID_VALUE)),
    ];
    let id = run_to_finalize(&mut protocol, params(400), &bids);
    assert_eq!(
        protocol.auction(id).unwrap().settlement,
        Settlement::Claimed(WinnerSet {
            winners: bidders(4),
            top_loser: bidder(4),
        })
    );

    protocol.finalize_auction(Tx::new(ASKER), id).unwrap();
    let auction = protocol.auction(id).unwrap();
    assert_eq!(auction.lent_value, u(400));
    assert_eq!(auction.clearing_rate, u(10));
    assert_eq!(auction.lenders, bidders(4));

    let boundary = commitment_of(&protocol, id, bidder(3));
    assert_eq!(boundary.available_value, u(100));
    assert_eq!(boundary.lending_value, u(100));
    assert_eq!(boundary.reserved_value, U256::ZERO);
    let loser = commitment_of(&protocol, id, bidder(4));
    assert_eq!(loser.available_value, u(BID_VALUE));
    assert_eq!(loser.reserved_value, U256::ZERO);
    assert_balanced(&protocol);

    // The top loser gets their stake back right away, lenders only once the
    // loan settles.
    assert_eq!(
        protocol.finalize_bid(Tx::new(bidder(4)), id).unwrap(),
        u(STAKE)
    );
    assert_eq!(
        protocol.finalize_bid(Tx::new(bidder(0)), id),
        Err(Error::StakeLocked.into())
    );

    end_loan(&mut protocol, id);
    protocol
        .repay_auction(Tx::new(ASKER).with_value(u(408)), id)
        .unwrap();
    for bidder in bidders(4) {
        assert_eq!(protocol.payments(bidder, NATIVE), u(2));
    }
    assert_eq!(commitment_of(&protocol, id, bidder(3)).available_value, u(200));
    assert_eq!(commitment_of(&protocol, id, bidder(0)).available_value, u(100));
    assert_eq!(
        protocol.finalize_bid(Tx::new(bidder(0)), id),
        Err(Error::NothingToWithdraw.into())
    );
    assert_balanced(&protocol);
}

#[test]
fn overpaid_repayments_are_refunded() {
    let mut protocol = protocol();
    let id = run_to_finalize(&mut protocol, params(100), &uniform_bids(1));
    protocol.finalize_auction(Tx::new(ASKER), id).unwrap();
    end_loan(&mut protocol, id);

    let before = protocol.balance_of(NATIVE, ASKER);
    let repaid = protocol
        .repay_auction(Tx::new(ASKER).with_value(u(1_000)), id)
        .unwrap();
    assert_eq!(repaid, u(101));
    assert_eq!(protocol.balance_of(NATIVE, ASKER), before - u(101));
    assert_eq!(
        protocol.repay_auction(Tx::new(ASKER).with_value(u(101)), id),
        Err(Error::AlreadyRepaid.into())
    );
}

#[test]
fn short_repayments_revert_without_side_effects() {
    let mut protocol = protocol();
    let id = run_to_finalize(&mut protocol, params(100), &uniform_bids(1));
    protocol.finalize_auction(Tx::new(ASKER), id).unwrap();
    end_loan(&mut protocol, id);

    let balance = protocol.balance_of(NATIVE, ASKER);
    let events = protocol.events().len();
    assert_eq!(
        protocol.repay_auction(Tx::new(ASKER).with_value(u(100)), id),
        Err(Error::InsufficientRepayment {
            required: u(101),
            provided: u(100),
        }
        .into())
    );
    assert_eq!(protocol.balance_of(NATIVE, ASKER), balance);
    assert_eq!(protocol.balance_of(NATIVE, REGISTRY), U256::ZERO);
    assert_eq!(protocol.events().len(), events);
    assert!(!protocol.auction(id).unwrap().repaid);
}

#[test]
fn auctions_finalize_once() {
    let mut protocol = protocol();
    let id = run_to_finalize(&mut protocol, params(100), &uniform_bids(2));

    protocol.finalize_auction(Tx::new(bidder(1)), id).unwrap();
    assert_eq!(
        protocol.finalize_auction(Tx::new(ASKER), id),
        Err(Error::AlreadyFinalized.into())
    );
    let finalized = protocol
        .events()
        .iter()
        .filter(|event| matches!(event, Event::FinalizeAuction { .. }))
        .count();
    assert_eq!(finalized, 1);
}

#[test]
fn challenge_replaces_a_wrong_claim() {
    let mut protocol = protocol();
    let id = init(&mut protocol, params(100));
    let bids = [
        (bidder(0), plaintext(5, BID_VALUE)),
        (bidder(1), plaintext(7, BID_VALUE)),
        (bidder(2), plaintext(9, BID_VALUE)),
    ];
    for (bidder, plaintext) in bids {
        place(&mut protocol, id, bidder, plaintext);
    }
    advance_to(&mut protocol, id, Period::Reveal);
    for (bidder, plaintext) in bids {
        reveal(&mut protocol, id, bidder, plaintext);
    }

    advance_to(&mut protocol, id, Period::Claim);
    assert_eq!(
        protocol.claim_winners(Tx::new(bidder(0)), id, vec![bidder(0)], bidder(1)),
        Err(Error::NotAsker.into())
    );
    protocol
        .claim_winners(Tx::new(ASKER), id, vec![bidder(1)], bidder(2))
        .unwrap();
    assert_eq!(
        protocol.challenge_winners(Tx::new(bidder(0)), id, bidder(0), vec![bidder(0)], bidder(1)),
        Err(Error::NotInChallengePeriod.into())
    );

    advance_to(&mut protocol, id, Period::Challenge);
    protocol
        .challenge_winners(Tx::new(bidder(0)), id, bidder(0), vec![bidder(0)], bidder(1))
        .unwrap();
    assert_eq!(
        protocol.auction(id).unwrap().settlement,
        Settlement::Challenged {
            challenger: bidder(0),
            winners: WinnerSet {
                winners: vec![bidder(0)],
                top_loser: bidder(1),
            },
        }
    );
    // The corrected set can't be challenged back.
    assert_eq!(
        protocol.challenge_winners(Tx::new(bidder(1)), id, bidder(1), vec![bidder(1)], bidder(2)),
        Err(Error::InvalidChallenger.into())
    );

    advance_to(&mut protocol, id, Period::Finalize);
    protocol.finalize_auction(Tx::new(ASKER), id).unwrap();
    let auction = protocol.auction(id).unwrap();
    assert_eq!(auction.lenders, vec![bidder(0)]);
    assert_eq!(auction.clearing_rate, u(7));
    assert_eq!(commitment_of(&protocol, id, bidder(1)).available_value, u(BID_VALUE));
    assert_eq!(commitment_of(&protocol, id, bidder(1)).lending_value, U256::ZERO);

    end_loan(&mut protocol, id);
    // 100 lent at 7 per-mille for two days.
    assert_eq!(
        protocol
            .repay_auction(Tx::new(ASKER).with_value(u(101)), id)
            .unwrap(),
        u(101)
    );
    assert_eq!(protocol.payments(bidder(0), NATIVE), u(1));
    assert_eq!(protocol.payments(bidder(1), NATIVE), U256::ZERO);
    assert!(
        protocol
            .events()
            .iter()
            .any(|event| matches!(
                event,
                Event::ChallengeWinners { challenger, .. } if *challenger == bidder(0)
            ))
    );
}

#[test]
fn challenges_can_be_repeated_until_the_window_closes() {
    let mut protocol = protocol();
    let bids = [
        (bidder(0), plaintext(4, BID_VALUE)),
        (bidder(1), plaintext(5, BID_VALUE)),
        (bidder(2), plaintext(7, BID_VALUE)),
    ];
    let id = init(&mut protocol, params(100));
    for (bidder, plaintext) in bids {
        place(&mut protocol, id, bidder, plaintext);
    }
    advance_to(&mut protocol, id, Period::Reveal);
    for (bidder, plaintext) in bids {
        reveal(&mut protocol, id, bidder, plaintext);
    }
    advance_to(&mut protocol, id, Period::Claim);
    protocol
        .claim_winners(Tx::new(ASKER), id, vec![bidder(2)], bidder(1))
        .unwrap();

    advance_to(&mut protocol, id, Period::Challenge);
    protocol
        .challenge_winners(Tx::new(bidder(1)), id, bidder(1), vec![bidder(1)], bidder(2))
        .unwrap();
    // The first correction is still not the best set.
    protocol
        .challenge_winners(Tx::new(bidder(0)), id, bidder(0), vec![bidder(0)], bidder(1))
        .unwrap();
    assert_eq!(
        protocol.auction(id).unwrap().settlement,
        Settlement::Challenged {
            challenger: bidder(0),
            winners: WinnerSet {
                winners: vec![bidder(0)],
                top_loser: bidder(1),
            },
        }
    );
    assert_eq!(
        protocol.challenge_winners(Tx::new(bidder(1)), id, bidder(1), vec![bidder(1)], bidder(0)),
        Err(Error::InvalidChallenger.into())
    );

    advance_to(&mut protocol, id, Period::Finalize);
    assert_eq!(
        protocol.challenge_winners(Tx::new(bidder(1)), id, bidder(1), vec![bidder(1)], bidder(2)),
        Err(Error::NotInChallengePeriod.into())
    );
    protocol.finalize_auction(Tx::new(ASKER), id).unwrap();
    let auction = protocol.auction(id).unwrap();
    assert_eq!(auction.lenders, vec![bidder(0)]);
    assert_eq!(auction.clearing_rate, u(5));
    assert_eq!(
        protocol
            .events()
            .iter()
            .filter(|event| matches!(event, Event::ChallengeWinners { .. }))
            .count(),
        2
    );

    end_loan(&mut protocol, id);
    assert_eq!(
        protocol
            .repay_auction(Tx::new(ASKER).with_value(u(101)), id)
            .unwrap(),
        u(101)
    );
    assert_eq!(protocol.payments(bidder(0), NATIVE), u(1));
    assert_balanced(&protocol);
}

#[test]
fn lenders_collect_collateral_after_default() {
    let mut protocol = protocol();
    let params = Params {
        collateral_token: TOKEN,
        collateral_value: u(300),
        ..params(200)
    };
    let id = run_to_finalize(&mut protocol, params, &uniform_bids(2));
    assert_eq!(protocol.balance_of(TOKEN, ASKER), u(FUNDS - 300));
    assert_eq!(protocol.balance_of(TOKEN, REGISTRY), u(300));

    protocol.finalize_auction(Tx::new(ASKER), id).unwrap();
    assert_eq!(
        protocol.collect_collateral(Tx::new(bidder(0)), id),
        Err(Error::LendingNotEnded.into())
    );

    end_loan(&mut protocol, id);
    assert_eq!(
        protocol.collect_collateral(Tx::new(bidder(2)), id),
        Err(Error::NotAWinner.into())
    );
    assert_eq!(
        protocol.collect_collateral(Tx::new(bidder(0)), id).unwrap(),
        u(150)
    );
    assert_eq!(
        protocol.collect_collateral(Tx::new(bidder(0)), id),
        Err(Error::AlreadyCollected.into())
    );
    assert_eq!(
        protocol.collect_collateral(Tx::new(bidder(1)), id).unwrap(),
        u(150)
    );
    assert_eq!(protocol.auction(id).unwrap().collateral_collected, u(300));

    for bidder in bidders(2) {
        assert_eq!(protocol.balance_of(TOKEN, bidder), u(FUNDS + 150));
        assert_eq!(protocol.balance_of(CELR, bidder), u(FUNDS));
        // The defaulted principal stays lent out.
        assert_eq!(commitment_of(&protocol, id, bidder).lending_value, u(BID_VALUE));
    }
    assert_eq!(protocol.balance_of(TOKEN, REGISTRY), U256::ZERO);
    assert_balanced(&protocol);
}

#[test]
fn repayment_after_a_partial_collection_settles_the_rest() {
    let mut protocol = protocol();
    let params = Params {
        collateral_token: TOKEN,
        collateral_value: u(300),
        ..params(200)
    };
    let id = run_to_finalize(&mut protocol, params, &uniform_bids(2));
    protocol.finalize_auction(Tx::new(ASKER), id).unwrap();
    end_loan(&mut protocol, id);

    assert_eq!(
        protocol.collect_collateral(Tx::new(bidder(0)), id).unwrap(),
        u(150)
    );
    // Only the lender that did not collect is owed 100 plus 1 interest.
    assert_eq!(
        protocol.repay_auction(Tx::new(ASKER).with_value(u(100)), id),
        Err(Error::InsufficientRepayment {
            required: u(101),
            provided: u(100),
        }
        .into())
    );
    assert_eq!(
        protocol
            .repay_auction(Tx::new(ASKER).with_value(u(101)), id)
            .unwrap(),
        u(101)
    );

    assert_eq!(commitment_of(&protocol, id, bidder(0)).lending_value, u(BID_VALUE));
    assert_eq!(commitment_of(&protocol, id, bidder(1)).lending_value, U256::ZERO);
    assert_eq!(commitment_of(&protocol, id, bidder(1)).available_value, u(BID_VALUE));
    assert_eq!(protocol.payments(bidder(0), NATIVE), U256::ZERO);
    assert_eq!(protocol.payments(bidder(1), NATIVE), u(1));
    // The uncollected half of the collateral goes back to the asker.
    assert_eq!(protocol.balance_of(TOKEN, ASKER), u(FUNDS - 150));
    assert_eq!(protocol.balance_of(TOKEN, REGISTRY), U256::ZERO);
    for bidder in bidders(2) {
        assert_eq!(protocol.balance_of(CELR, bidder), u(FUNDS));
    }
    assert_eq!(
        protocol.collect_collateral(Tx::new(bidder(1)), id),
        Err(Error::AlreadyRepaid.into())
    );
    assert_balanced(&protocol);
}

#[test]
fn loans_without_collateral_have_nothing_to_collect() {
    let mut protocol = protocol();
    let id = run_to_finalize(&mut protocol, params(200), &uniform_bids(2));
    protocol.finalize_auction(Tx::new(ASKER), id).unwrap();
    end_loan(&mut protocol, id);

    assert_eq!(
        protocol.collect_collateral(Tx::new(bidder(0)), id),
        Err(Error::NothingToCollect.into())
    );
    // The lender keeps its stake at risk and the asker can still repay.
    assert_eq!(protocol.bid(bidder(0), id).unwrap().lent_value, u(BID_VALUE));
    assert_eq!(
        protocol
            .repay_auction(Tx::new(ASKER).with_value(u(202)), id)
            .unwrap(),
        u(202)
    );
    for bidder in bidders(2) {
        assert_eq!(commitment_of(&protocol, id, bidder).lending_value, U256::ZERO);
        assert_eq!(protocol.payments(bidder, NATIVE), u(1));
    }
    assert_balanced(&protocol);
}

#[test]
fn repayment_returns_the_collateral() {
    let mut protocol = protocol();
    let params = Params {
        collateral_token: NATIVE,
        collateral_value: u(50),
        ..params(100)
    };
    let id = protocol
        .init_auction(Tx::new(ASKER).with_value(u(50)), params)
        .unwrap();
    place(&mut protocol, id, bidder(0), plaintext(RATE, BID_VALUE));
    advance_to(&mut protocol, id, Period::Reveal);
    reveal(&mut protocol, id, bidder(0), plaintext(RATE, BID_VALUE));
    advance_to(&mut protocol, id, Period::Claim);
    protocol
        .claim_winners(Tx::new(ASKER), id, vec![bidder(0)], bidder(0))
        .unwrap();
    advance_to(&mut protocol, id, Period::Finalize);
    protocol.finalize_auction(Tx::new(ASKER), id).unwrap();
    assert_eq!(protocol.balance_of(NATIVE, ASKER), u(FUNDS - 50 + 100));

    end_loan(&mut protocol, id);
    protocol
        .repay_auction(Tx::new(ASKER).with_value(u(101)), id)
        .unwrap();
    assert_eq!(protocol.balance_of(NATIVE, ASKER), u(FUNDS - 1));
    assert_eq!(protocol.balance_of(NATIVE, REGISTRY), u(1));
    assert_eq!(
        protocol.collect_collateral(Tx::new(bidder(0)), id),
        Err(Error::AlreadyRepaid.into())
    );
}

#[test]
fn expired_auctions_release_everything() {
    let mut protocol = protocol();
    let params = Params {
        collateral_token: NATIVE,
        collateral_value: u(50),
        ..params(200)
    };
    let id = protocol
        .init_auction(Tx::new(ASKER).with_value(u(50)), params)
        .unwrap();
    for bidder in bidders(2) {
        place(&mut protocol, id, bidder, plaintext(RATE, BID_VALUE));
    }
    advance_to(&mut protocol, id, Period::Reveal);
    for bidder in bidders(2) {
        reveal(&mut protocol, id, bidder, plaintext(RATE, BID_VALUE));
    }
    assert_eq!(
        protocol.transfer_fee_deposit(Tx::new(ASKER), id),
        Err(Error::NotFinalized.into())
    );

    advance_to(&mut protocol, id, Period::Expired);
    assert_eq!(
        protocol.finalize_auction(Tx::new(ASKER), id),
        Err(Error::NotInFinalizePeriod.into())
    );
    for bidder in bidders(2) {
        assert_eq!(
            commitment_of(&protocol, id, bidder).reserved_value,
            u(BID_VALUE)
        );
        protocol.finalize_bid(Tx::new(bidder), id).unwrap();
        let commitment = commitment_of(&protocol, id, bidder);
        assert_eq!(commitment.available_value, u(BID_VALUE));
        assert_eq!(commitment.reserved_value, U256::ZERO);
        assert_eq!(protocol.balance_of(CELR, bidder), u(FUNDS));
    }
    assert_balanced(&protocol);

    protocol.transfer_fee_deposit(Tx::new(bidder(0)), id).unwrap();
    assert_eq!(protocol.balance_of(CELR, TREASURY), u(AUCTION_DEPOSIT));
    assert_eq!(protocol.balance_of(NATIVE, ASKER), u(FUNDS));
    assert_eq!(
        protocol.transfer_fee_deposit(Tx::new(bidder(0)), id),
        Err(Error::AlreadyTransferred.into())
    );
}

#[test]
fn empty_auctions_refund_the_deposit() {
    let mut protocol = protocol();
    let id = init(&mut protocol, params(100));
    assert_eq!(
        protocol.balance_of(CELR, ASKER),
        u(FUNDS - AUCTION_DEPOSIT)
    );

    advance_to(&mut protocol, id, Period::Finalize);
    assert_eq!(
        protocol.finalize_auction(Tx::new(ASKER), id).unwrap(),
        U256::ZERO
    );
    assert_eq!(protocol.balance_of(CELR, ASKER), u(FUNDS));
    assert_eq!(
        protocol.transfer_fee_deposit(Tx::new(ASKER), id),
        Err(Error::AlreadyTransferred.into())
    );
}

#[test]
fn reverted_calls_leave_no_trace() {
    let mut protocol = protocol();
    let params = Params {
        collateral_token: NATIVE,
        collateral_value: u(50),
        ..params(100)
    };

    assert_eq!(
        protocol.init_auction(Tx::new(ASKER).with_value(u(49)), params),
        Err(Error::InvalidAmount.into())
    );
    assert_eq!(protocol.registry().auction_count(), 0);
    assert_eq!(protocol.balance_of(NATIVE, ASKER), u(FUNDS));
    assert_eq!(protocol.balance_of(CELR, ASKER), u(FUNDS));
    assert!(protocol.events().is_empty());

    assert_eq!(
        protocol.finalize_auction(Tx::new(ASKER).with_value(u(1)), AuctionId(0)),
        Err(engine::Error::NotPayable)
    );
    assert_eq!(protocol.balance_of(NATIVE, ASKER), u(FUNDS));
}

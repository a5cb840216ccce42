extern crate std;

use soroban_sdk::{testutils::Address as _, vec, Address};

use crate::invariants::{
    assert_credit_conservation, assert_order_transition, assert_payment_solvency,
};
use crate::testutils::{Fixture, START_TIME};
use crate::{Error, ORDER_LIFETIME_SECS};

const CARBON: i128 = 500_000;
const LISTED: i128 = 300;
const UNIT_PRICE: i128 = 1_000;
const TOTAL: i128 = LISTED * UNIT_PRICE;
const FEE: i128 = TOTAL * 120 / 10_000;

/// An audited project and a seller listing 300 of its credits.
fn listed(fx: &Fixture) -> (u64, Address, u64) {
    let project_id = fx.audited_project(CARBON, "VCS-MKT");
    let seller = fx.seller_with_credits(project_id, 1_000);
    let order_id = fx
        .client
        .create_sell_order(&seller, &project_id, &LISTED, &UNIT_PRICE);
    (project_id, seller, order_id)
}

// ── listing ──────────────────────────────────────────────────────────

#[test]
fn test_create_sell_order_escrows_credits() {
    let fx = Fixture::new();
    let (project_id, seller, order_id) = listed(&fx);

    let order = fx.client.get_sell_order(&order_id).unwrap();
    assert_eq!(order.order_id, 0);
    assert_eq!(order.seller, seller);
    assert_eq!(order.project_id, project_id);
    assert_eq!(order.credits_amount, LISTED);
    assert_eq!(order.total_price, TOTAL);
    assert_eq!(order.expiration_timestamp, START_TIME + ORDER_LIFETIME_SECS);
    assert!(order.is_active);

    assert_eq!(fx.client.balance_of(&seller, &project_id), 700);
    assert_eq!(fx.client.balance_of(&fx.client.address, &project_id), LISTED);
    assert_eq!(fx.client.order_count(), 1);
    assert_credit_conservation(&fx.client, project_id, &[seller]);
}

#[test]
fn test_order_ids_are_sequential() {
    let fx = Fixture::new();
    let (project_id, seller, first) = listed(&fx);
    let second = fx.client.create_sell_order(&seller, &project_id, &10, &1);
    assert_eq!((first, second), (0, 1));
    assert_eq!(fx.client.order_count(), 2);
}

#[test]
fn test_create_requires_marketplace_approval() {
    let fx = Fixture::new();
    let project_id = fx.audited_project(CARBON, "VCS-NOAPP");
    let buyer = Address::generate(&fx.env);
    assert_eq!(
        fx.client
            .try_create_sell_order(&buyer, &project_id, &LISTED, &UNIT_PRICE),
        Err(Ok(Error::TransferNotApproved))
    );
}

#[test]
fn test_create_for_unheld_project_fails_on_balance() {
    let fx = Fixture::new();
    let project_id = fx.audited_project(CARBON, "VCS-UNHELD");
    let seller = fx.seller_with_credits(project_id, 1_000);
    assert_eq!(
        fx.client.try_create_sell_order(&seller, &99, &LISTED, &UNIT_PRICE),
        Err(Ok(Error::InsufficientBalance))
    );
    assert_eq!(
        fx.client
            .try_create_sell_order(&seller, &project_id, &1_001, &UNIT_PRICE),
        Err(Ok(Error::InsufficientBalance))
    );
    assert_eq!(fx.client.order_count(), 0);
}

#[test]
fn test_price_checked_before_amount() {
    let fx = Fixture::new();
    let project_id = fx.audited_project(CARBON, "VCS-PRICE");
    let seller = fx.seller_with_credits(project_id, 10);
    assert_eq!(
        fx.client
            .try_create_sell_order(&seller, &project_id, &1_000_000, &0),
        Err(Ok(Error::InvalidPrice))
    );
    assert_eq!(
        fx.client.try_create_sell_order(&seller, &project_id, &0, &5),
        Err(Ok(Error::InvalidAmount))
    );
}

// ── pause ────────────────────────────────────────────────────────────

#[test]
fn test_pause_blocks_listing_and_trading() {
    let fx = Fixture::new();
    let (project_id, seller, order_id) = listed(&fx);
    let buyer = fx.funded_account(TOTAL);

    assert!(fx.client.toggle_marketplace_pause(&fx.admin));
    assert!(fx.client.marketplace_paused());

    assert_eq!(
        fx.client
            .try_create_sell_order(&seller, &project_id, &10, &UNIT_PRICE),
        Err(Ok(Error::TradingPaused))
    );
    assert_eq!(
        fx.client.try_execute_trade(&buyer, &order_id, &TOTAL),
        Err(Ok(Error::TradingPaused))
    );

    assert!(!fx.client.toggle_marketplace_pause(&fx.admin));
    fx.client.execute_trade(&buyer, &order_id, &TOTAL);
    assert_eq!(fx.client.balance_of(&buyer, &project_id), LISTED);
}

#[test]
fn test_seller_can_close_while_paused() {
    let fx = Fixture::new();
    let (project_id, seller, order_id) = listed(&fx);
    fx.client.toggle_marketplace_pause(&fx.admin);

    fx.client.close_sell_order(&seller, &order_id);
    assert_eq!(fx.client.balance_of(&seller, &project_id), 1_000);
}

#[test]
fn test_pause_requires_admin() {
    let fx = Fixture::new();
    assert_eq!(
        fx.client.try_toggle_marketplace_pause(&fx.project_owner),
        Err(Ok(Error::NotAuthorized))
    );
    assert!(!fx.client.marketplace_paused());
}

// ── closing ──────────────────────────────────────────────────────────

#[test]
fn test_close_sell_order_returns_escrow() {
    let fx = Fixture::new();
    let (project_id, seller, order_id) = listed(&fx);
    let before = fx.client.get_sell_order(&order_id).unwrap();

    fx.client.close_sell_order(&seller, &order_id);

    let after = fx.client.get_sell_order(&order_id).unwrap();
    assert_order_transition(&before, &after);
    assert!(!after.is_active);
    assert_eq!(fx.client.balance_of(&seller, &project_id), 1_000);
    assert_eq!(fx.client.balance_of(&fx.client.address, &project_id), 0);
    assert_credit_conservation(&fx.client, project_id, &[seller]);
}

#[test]
fn test_close_sell_order_errors() {
    let fx = Fixture::new();
    let (_, seller, order_id) = listed(&fx);
    let stranger = Address::generate(&fx.env);

    assert_eq!(
        fx.client.try_close_sell_order(&stranger, &order_id),
        Err(Ok(Error::NotOrderOwner))
    );
    assert_eq!(
        fx.client.try_close_sell_order(&seller, &42),
        Err(Ok(Error::NotOrderOwner))
    );

    fx.client.close_sell_order(&seller, &order_id);
    assert_eq!(
        fx.client.try_close_sell_order(&seller, &order_id),
        Err(Ok(Error::InactiveOrder))
    );
}

// ── trading ──────────────────────────────────────────────────────────

#[test]
fn test_execute_trade_settles_through_account_balances() {
    let fx = Fixture::new();
    let (project_id, seller, order_id) = listed(&fx);
    let buyer = fx.funded_account(TOTAL);
    let before = fx.client.get_sell_order(&order_id).unwrap();

    fx.client.execute_trade(&buyer, &order_id, &TOTAL);

    let after = fx.client.get_sell_order(&order_id).unwrap();
    assert_order_transition(&before, &after);
    assert!(!after.is_active);

    assert_eq!(fx.client.balance_of(&buyer, &project_id), LISTED);
    assert_eq!(fx.client.balance_of(&fx.client.address, &project_id), 0);
    assert_eq!(fx.client.account_balance(&seller), TOTAL - FEE);
    assert_eq!(fx.client.operating_balance(), FEE);
    assert_eq!(fx.client.account_balance(&buyer), 0);

    // Nothing is pushed: the contract holds the whole payment.
    assert_eq!(fx.payment.balance(&buyer), 0);
    assert_eq!(fx.payment.balance(&seller), 0);
    assert_eq!(fx.payment.balance(&fx.client.address), TOTAL);
    assert_payment_solvency(
        fx.payment.balance(&fx.client.address),
        &[fx.client.account_balance(&seller), fx.client.operating_balance()],
    );
    assert_credit_conservation(&fx.client, project_id, &[seller, buyer]);
}

#[test]
fn test_overpayment_is_refunded_to_account_balance() {
    let fx = Fixture::new();
    let (_, seller, order_id) = listed(&fx);
    let buyer = fx.funded_account(TOTAL + 5_000);

    fx.client.execute_trade(&buyer, &order_id, &(TOTAL + 5_000));

    assert_eq!(fx.client.account_balance(&buyer), 5_000);
    assert_eq!(fx.client.account_balance(&seller), TOTAL - FEE);

    fx.client.withdraw_account_balance(&buyer, &5_000);
    assert_eq!(fx.payment.balance(&buyer), 5_000);
    assert_eq!(fx.client.account_balance(&buyer), 0);
}

#[test]
fn test_underpayment_rejected() {
    let fx = Fixture::new();
    let (_, _, order_id) = listed(&fx);
    let buyer = fx.funded_account(TOTAL);

    assert_eq!(
        fx.client.try_execute_trade(&buyer, &order_id, &(TOTAL - 1)),
        Err(Ok(Error::InsufficientPayment))
    );
    assert!(fx.client.get_sell_order(&order_id).unwrap().is_active);
    assert_eq!(fx.payment.balance(&buyer), TOTAL);
}

#[test]
fn test_filled_or_unknown_order_is_inactive() {
    let fx = Fixture::new();
    let (_, _, order_id) = listed(&fx);
    let buyer = fx.funded_account(2 * TOTAL);

    fx.client.execute_trade(&buyer, &order_id, &TOTAL);
    assert_eq!(
        fx.client.try_execute_trade(&buyer, &order_id, &TOTAL),
        Err(Ok(Error::InactiveOrder))
    );
    assert_eq!(
        fx.client.try_execute_trade(&buyer, &99, &TOTAL),
        Err(Ok(Error::InactiveOrder))
    );
}

#[test]
fn test_trade_one_second_before_expiry() {
    let fx = Fixture::new();
    let (project_id, _, order_id) = listed(&fx);
    let buyer = fx.funded_account(TOTAL);

    fx.set_time(START_TIME + ORDER_LIFETIME_SECS - 1);
    fx.client.execute_trade(&buyer, &order_id, &TOTAL);
    assert_eq!(fx.client.balance_of(&buyer, &project_id), LISTED);
}

#[test]
fn test_trade_one_second_after_expiry() {
    let fx = Fixture::new();
    let (_, _, order_id) = listed(&fx);
    let buyer = fx.funded_account(TOTAL);

    fx.set_time(START_TIME + ORDER_LIFETIME_SECS + 1);
    assert_eq!(
        fx.client.try_execute_trade(&buyer, &order_id, &TOTAL),
        Err(Ok(Error::ExpiredOrder))
    );
}

#[test]
fn test_trade_uses_updated_fee() {
    let fx = Fixture::new();
    fx.client.update_platform_fee(&fx.admin, &130);
    assert_eq!(fx.client.platform_fee_bps(), 130);

    let (_, seller, order_id) = listed(&fx);
    let buyer = fx.funded_account(TOTAL);
    fx.client.execute_trade(&buyer, &order_id, &TOTAL);

    let fee = TOTAL * 130 / 10_000;
    assert_eq!(fx.client.account_balance(&seller), TOTAL - fee);
    assert_eq!(fx.client.operating_balance(), fee);
}

#[test]
fn test_platform_fee_bounds_and_role() {
    let fx = Fixture::new();
    assert_eq!(
        fx.client.try_update_platform_fee(&fx.admin, &1_001),
        Err(Ok(Error::InvalidPlatformFee))
    );
    assert_eq!(
        fx.client.try_update_platform_fee(&fx.project_owner, &10),
        Err(Ok(Error::NotAuthorized))
    );
    fx.client.update_platform_fee(&fx.admin, &1_000);
    assert_eq!(fx.client.platform_fee_bps(), 1_000);
}

// ── withdrawals ──────────────────────────────────────────────────────

#[test]
fn test_seller_withdraws_in_parts() {
    let fx = Fixture::new();
    let (_, seller, order_id) = listed(&fx);
    let buyer = fx.funded_account(TOTAL);
    fx.client.execute_trade(&buyer, &order_id, &TOTAL);

    let proceeds = TOTAL - FEE;
    fx.client.withdraw_account_balance(&seller, &(proceeds / 2));
    assert_eq!(fx.payment.balance(&seller), proceeds / 2);
    assert_eq!(fx.client.account_balance(&seller), proceeds - proceeds / 2);

    assert_eq!(
        fx.client.try_withdraw_account_balance(&seller, &proceeds),
        Err(Ok(Error::InsufficientBalance))
    );
    assert_eq!(
        fx.client.try_withdraw_account_balance(&seller, &0),
        Err(Ok(Error::InvalidAmount))
    );
    assert_payment_solvency(
        fx.payment.balance(&fx.client.address),
        &[fx.client.account_balance(&seller), fx.client.operating_balance()],
    );
}

// ── expiry ───────────────────────────────────────────────────────────

#[test]
fn test_close_expired_order_pays_reward() {
    let fx = Fixture::new();
    let (project_id, seller, order_id) = listed(&fx);
    let funder = fx.funded_account(100_000);
    fx.client.deposit_operating_funds(&funder, &100_000);
    let closer = Address::generate(&fx.env);

    fx.set_time(START_TIME + ORDER_LIFETIME_SECS + 1);
    assert!(fx.client.close_expired_order(&closer, &order_id));

    // 10 bps of 300_000
    let reward = 300;
    assert_eq!(fx.client.account_balance(&closer), reward);
    assert_eq!(fx.client.operating_balance(), 100_000 - reward);
    assert_eq!(fx.client.balance_of(&seller, &project_id), 1_000);

    let order = fx.client.get_sell_order(&order_id).unwrap();
    assert!(!order.is_active);
    assert_eq!(order.expiration_timestamp, 0);
    assert_credit_conservation(&fx.client, project_id, &[seller]);
}

#[test]
fn test_close_expired_order_is_idempotent() {
    let fx = Fixture::new();
    let (project_id, seller, order_id) = listed(&fx);
    let funder = fx.funded_account(100_000);
    fx.client.deposit_operating_funds(&funder, &100_000);
    let closer = Address::generate(&fx.env);

    fx.set_time(START_TIME + ORDER_LIFETIME_SECS + 1);
    assert!(fx.client.close_expired_order(&closer, &order_id));
    let operating = fx.client.operating_balance();

    assert!(!fx.client.close_expired_order(&closer, &order_id));
    assert_eq!(fx.client.operating_balance(), operating);
    assert_eq!(fx.client.account_balance(&closer), 300);
    assert_eq!(fx.client.balance_of(&seller, &project_id), 1_000);
}

#[test]
fn test_close_expired_order_with_empty_operating_balance() {
    let fx = Fixture::new();
    let (project_id, seller, order_id) = listed(&fx);
    let closer = Address::generate(&fx.env);

    fx.set_time(START_TIME + ORDER_LIFETIME_SECS + 1);
    assert!(fx.client.close_expired_order(&closer, &order_id));

    assert_eq!(fx.client.account_balance(&closer), 0);
    assert_eq!(fx.client.balance_of(&seller, &project_id), 1_000);
    assert!(!fx.client.get_sell_order(&order_id).unwrap().is_active);
}

#[test]
fn test_close_expired_order_reward_is_capped() {
    let fx = Fixture::new();
    let (_, _, order_id) = listed(&fx);
    let funder = fx.funded_account(120);
    fx.client.fallback(&funder, &120, &fx.no_data());
    let closer = Address::generate(&fx.env);

    fx.set_time(START_TIME + ORDER_LIFETIME_SECS + 1);
    fx.client.close_expired_order(&closer, &order_id);

    assert_eq!(fx.client.account_balance(&closer), 120);
    assert_eq!(fx.client.operating_balance(), 0);
}

#[test]
fn test_live_order_is_left_alone() {
    let fx = Fixture::new();
    let (_, _, order_id) = listed(&fx);
    let closer = Address::generate(&fx.env);

    fx.set_time(START_TIME + ORDER_LIFETIME_SECS);
    assert!(!fx.client.close_expired_order(&closer, &order_id));
    assert!(fx.client.get_sell_order(&order_id).unwrap().is_active);
    assert!(!fx.client.close_expired_order(&closer, &1234));
}

#[test]
fn test_batch_close_mixed_orders() {
    let fx = Fixture::new();
    let project_id = fx.audited_project(CARBON, "VCS-BATCH");
    let seller = fx.seller_with_credits(project_id, 1_000);
    let funder = fx.funded_account(100_000);
    fx.client.deposit_operating_funds(&funder, &100_000);

    let old_a = fx.client.create_sell_order(&seller, &project_id, &100, &10);
    let old_b = fx.client.create_sell_order(&seller, &project_id, &100, &10);
    fx.advance(4 * 24 * 60 * 60);
    let fresh = fx.client.create_sell_order(&seller, &project_id, &100, &10);
    fx.set_time(START_TIME + ORDER_LIFETIME_SECS + 1);

    let closer = Address::generate(&fx.env);
    let closed = fx
        .client
        .batch_close_expired_orders(&closer, &vec![&fx.env, old_a, fresh, old_b, 77]);

    assert_eq!(closed, 2);
    assert!(!fx.client.get_sell_order(&old_a).unwrap().is_active);
    assert!(!fx.client.get_sell_order(&old_b).unwrap().is_active);
    assert!(fx.client.get_sell_order(&fresh).unwrap().is_active);
    assert_eq!(fx.client.balance_of(&seller, &project_id), 900);
    // 10 bps of 1_000 is 1, twice.
    assert_eq!(fx.client.account_balance(&closer), 2);
    assert_credit_conservation(&fx.client, project_id, &[seller]);
}

// ── funding ──────────────────────────────────────────────────────────

#[test]
fn test_fallback_and_deposit_fund_operations() {
    let fx = Fixture::new();
    let sender = fx.funded_account(1_000);

    fx.client.deposit_operating_funds(&sender, &400);
    fx.client.fallback(&sender, &600, &fx.no_data());

    assert_eq!(fx.client.operating_balance(), 1_000);
    assert_eq!(fx.payment.balance(&fx.client.address), 1_000);
    assert_eq!(fx.payment.balance(&sender), 0);

    assert_eq!(
        fx.client.try_deposit_operating_funds(&sender, &0),
        Err(Ok(Error::InvalidAmount))
    );
}

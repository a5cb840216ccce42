//! # Marketplace
//!
//! Fixed-price sell orders backed by escrow, settled in the configured
//! payment token through a pull-payment ledger.
//!
//! ```text
//!          close_sell_order        (Closed)
//!        ┌───────────────────────►
//! Active ┼── execute_trade ──────► (Filled)
//!        └── close_expired_order ► (ExpiredClosed)
//! ```
//!
//! Sale proceeds, platform fees, overpayment refunds and expiry rewards are
//! never pushed to their recipients. They are credited to internal account
//! balances and released only by `withdraw_account_balance`. The contract's
//! own entry is the operating balance that funds expiry rewards.
//!
//! Every value-moving function validates first, then writes internal state,
//! and only then calls the payment token.

use soroban_sdk::{log, token, Address, Bytes, Env, Vec};

use crate::events;
use crate::ledger;
use crate::rbac::{self, Role};
use crate::storage;
use crate::types::SellOrder;
use crate::Error;

/// How long a new order stays fillable.
pub const ORDER_LIFETIME_SECS: u64 = 7 * 24 * 60 * 60;

/// Hard ceiling on the platform fee: 10%.
pub const MAX_PLATFORM_FEE_BPS: u32 = 1_000;

pub const BPS_DENOMINATOR: u32 = 10_000;

/// `amount × bps / 10_000`, truncated, for `bps <= 10_000`.
///
/// Split into quotient and remainder so the product never exceeds `amount`.
pub fn bps_of(amount: i128, bps: u32) -> i128 {
    let denominator = BPS_DENOMINATOR as i128;
    let bps = bps as i128;
    (amount / denominator) * bps + (amount % denominator) * bps / denominator
}

fn payment_client(env: &Env) -> Result<token::Client<'_>, Error> {
    let payment_token = storage::payment_token(env).ok_or(Error::NotInitialized)?;
    Ok(token::Client::new(env, &payment_token))
}

fn credit_account(env: &Env, account: &Address, amount: i128) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    let balance = storage::account_balance(env, account)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::set_account_balance(env, account, balance);
    Ok(())
}

fn require_trading(env: &Env) -> Result<(), Error> {
    if storage::is_paused(env) {
        log!(env, "Trading is paused");
        return Err(Error::TradingPaused);
    }
    Ok(())
}

/// Move an order into its terminal state and hand its escrow to `recipient`.
fn settle(env: &Env, order: &mut SellOrder, recipient: &Address) -> Result<(), Error> {
    order.is_active = false;
    order.expiration_timestamp = 0;
    storage::save_order(env, order);
    ledger::move_credits(
        env,
        &env.current_contract_address(),
        recipient,
        order.project_id,
        order.credits_amount,
    )
}

pub fn create_sell_order(
    env: &Env,
    seller: &Address,
    project_id: u64,
    amount: i128,
    price_per_unit: i128,
) -> Result<u64, Error> {
    seller.require_auth();
    require_trading(env)?;

    if price_per_unit <= 0 {
        log!(env, "invalid price", price_per_unit);
        return Err(Error::InvalidPrice);
    }
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let marketplace = env.current_contract_address();
    if !ledger::is_approved_for_all(env, seller, &marketplace) {
        return Err(Error::TransferNotApproved);
    }
    if ledger::balance_of(env, seller, project_id) < amount {
        log!(env, "insufficient balance", amount);
        return Err(Error::InsufficientBalance);
    }
    let total_price = amount.checked_mul(price_per_unit).ok_or(Error::Overflow)?;
    let expiration_timestamp = env
        .ledger()
        .timestamp()
        .checked_add(ORDER_LIFETIME_SECS)
        .ok_or(Error::Overflow)?;

    let order = SellOrder {
        order_id: storage::get_and_increment_order_id(env),
        seller: seller.clone(),
        project_id,
        credits_amount: amount,
        total_price,
        expiration_timestamp,
        is_active: true,
    };
    ledger::move_credits(env, seller, &marketplace, project_id, amount)?;
    storage::save_order(env, &order);

    events::emit_order_created(env, &order);
    Ok(order.order_id)
}

pub fn close_sell_order(env: &Env, seller: &Address, order_id: u64) -> Result<(), Error> {
    seller.require_auth();

    let mut order = storage::load_order(env, order_id).ok_or(Error::NotOrderOwner)?;
    if order.seller != *seller {
        return Err(Error::NotOrderOwner);
    }
    if !order.is_active {
        return Err(Error::InactiveOrder);
    }

    settle(env, &mut order, seller)?;

    events::emit_order_closed(env, &order);
    Ok(())
}

pub fn execute_trade(
    env: &Env,
    buyer: &Address,
    order_id: u64,
    payment: i128,
) -> Result<(), Error> {
    buyer.require_auth();
    require_trading(env)?;

    let mut order = storage::load_order(env, order_id).ok_or(Error::InactiveOrder)?;
    if !order.is_active {
        return Err(Error::InactiveOrder);
    }
    if env.ledger().timestamp() > order.expiration_timestamp {
        log!(env, "expired order", order_id);
        return Err(Error::ExpiredOrder);
    }
    if payment < order.total_price {
        return Err(Error::InsufficientPayment);
    }

    let fee = bps_of(order.total_price, storage::platform_fee(env));
    let seller = order.seller.clone();

    settle(env, &mut order, buyer)?;
    credit_account(env, &seller, order.total_price - fee)?;
    credit_account(env, &env.current_contract_address(), fee)?;
    credit_account(env, buyer, payment - order.total_price)?;

    payment_client(env)?.transfer(buyer, &env.current_contract_address(), &payment);

    events::emit_order_filled(env, &order, buyer.clone());
    Ok(())
}

/// Close `order_id` if it is active and past its expiration, paying
/// `closer` a reward capped at the operating balance. Anything else is a
/// no-op that only emits `ord_live`.
fn close_if_expired(env: &Env, closer: &Address, order_id: u64) -> Result<bool, Error> {
    let now = env.ledger().timestamp();
    let mut order = match storage::load_order(env, order_id) {
        Some(order) if order.is_active && now > order.expiration_timestamp => order,
        _ => {
            events::emit_order_not_expired(env, order_id);
            return Ok(false);
        }
    };

    let seller = order.seller.clone();
    settle(env, &mut order, &seller)?;

    let config = storage::load_config(env).ok_or(Error::NotInitialized)?;
    let nominal = bps_of(order.total_price, config.close_reward_bps);
    let marketplace = env.current_contract_address();
    let available = storage::account_balance(env, &marketplace);
    let reward = nominal.min(available).max(0);
    if reward < nominal {
        log!(env, "expiry reward capped", nominal, reward);
    }
    if reward > 0 {
        storage::set_account_balance(env, &marketplace, available - reward);
        credit_account(env, closer, reward)?;
    }

    events::emit_expired_order_closed(env, &order, closer.clone(), reward);
    Ok(true)
}

pub fn close_expired_order(env: &Env, closer: &Address, order_id: u64) -> Result<bool, Error> {
    closer.require_auth();
    close_if_expired(env, closer, order_id)
}

/// Apply [`close_expired_order`] to each id independently. Returns how many
/// orders were actually closed.
pub fn batch_close_expired_orders(
    env: &Env,
    closer: &Address,
    order_ids: Vec<u64>,
) -> Result<u32, Error> {
    closer.require_auth();
    let mut closed = 0u32;
    for order_id in order_ids.iter() {
        if close_if_expired(env, closer, order_id)? {
            closed += 1;
        }
    }
    Ok(closed)
}

pub fn withdraw_account_balance(env: &Env, account: &Address, amount: i128) -> Result<(), Error> {
    account.require_auth();

    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let balance = storage::account_balance(env, account);
    if amount > balance {
        log!(env, "insufficient balance", amount);
        return Err(Error::InsufficientBalance);
    }

    storage::set_account_balance(env, account, balance - amount);
    payment_client(env)?.transfer(&env.current_contract_address(), account, &amount);

    events::emit_balance_withdrawn(env, account.clone(), amount);
    Ok(())
}

pub fn toggle_pause(env: &Env, caller: &Address) -> Result<bool, Error> {
    caller.require_auth();
    rbac::require_role(env, caller, Role::Admin)?;

    let paused = !storage::is_paused(env);
    storage::set_paused(env, paused);

    events::emit_pause_status_changed(env, paused);
    Ok(paused)
}

pub fn update_platform_fee(env: &Env, caller: &Address, fee_bps: u32) -> Result<(), Error> {
    caller.require_auth();
    rbac::require_role(env, caller, Role::Admin)?;

    if fee_bps > MAX_PLATFORM_FEE_BPS {
        log!(env, "platform fee above ceiling", fee_bps);
        return Err(Error::InvalidPlatformFee);
    }
    storage::set_platform_fee(env, fee_bps);

    events::emit_platform_fee_updated(env, fee_bps);
    Ok(())
}

/// Credit `amount` paid by `sender` to the operating balance.
pub fn deposit_operating_funds(env: &Env, sender: &Address, amount: i128) -> Result<(), Error> {
    sender.require_auth();
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    let marketplace = env.current_contract_address();
    credit_account(env, &marketplace, amount)?;
    payment_client(env)?.transfer(sender, &marketplace, &amount);
    Ok(())
}

/// Catch-all for payments that match no entry point: the funds go to the
/// operating balance and the raw payload is published for off-chain review.
pub fn fallback(env: &Env, sender: &Address, amount: i128, payload: Bytes) -> Result<(), Error> {
    deposit_operating_funds(env, sender, amount)?;
    events::emit_fallback_called(env, sender.clone(), amount, payload);
    Ok(())
}

pub fn operating_balance(env: &Env) -> i128 {
    storage::account_balance(env, &env.current_contract_address())
}

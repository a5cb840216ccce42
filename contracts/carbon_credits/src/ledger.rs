//! # Credit Ledger
//!
//! A multi-project fungible ledger in the shape of ERC-1155: one balance
//! axis per project id. Minting is capped per project by the ceiling the
//! registry fixed at audit time; the ledger keeps its own cumulative
//! `minted` counter to enforce that ceiling across many mint calls.
//!
//! Escrowed credits are ordinary balances held by the contract's own
//! address, so for every project
//! `Σ balances + retired == minted ≤ credits_issued`.

use soroban_sdk::{log, Address, Bytes, Env, Map, String, Vec};

use crate::events;
use crate::rbac::{self, Role};
use crate::registry;
use crate::storage;
use crate::types::RetirementRecord;
use crate::Error;

/// Validate minting `amount` more credits of `project_id` when
/// `already_minted` are out, returning the new cumulative total.
fn checked_mint_total(
    env: &Env,
    project_id: u64,
    already_minted: i128,
    amount: i128,
) -> Result<i128, Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    if !registry::is_audited(env, project_id) {
        return Err(Error::ProjectNotFound);
    }
    let total = already_minted.checked_add(amount).ok_or(Error::Overflow)?;
    if total > registry::issued_credits(env, project_id) {
        return Err(Error::MintExceedsIssuedCredits);
    }
    Ok(total)
}

fn credit(env: &Env, account: &Address, project_id: u64, amount: i128) -> Result<(), Error> {
    let balance = storage::balance(env, account, project_id)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::set_balance(env, account, project_id, balance);
    Ok(())
}

fn debit(env: &Env, account: &Address, project_id: u64, amount: i128) -> Result<(), Error> {
    let balance = storage::balance(env, account, project_id);
    if amount > balance {
        log!(env, "insufficient balance", amount);
        return Err(Error::InsufficientBalance);
    }
    storage::set_balance(env, account, project_id, balance - amount);
    Ok(())
}

/// Move credits between two accounts without any authorization check.
/// Callers are responsible for deciding who may move `from`'s balance.
pub(crate) fn move_credits(
    env: &Env,
    from: &Address,
    to: &Address,
    project_id: u64,
    amount: i128,
) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    debit(env, from, project_id, amount)?;
    credit(env, to, project_id, amount)
}

pub fn mint_credits(
    env: &Env,
    manager: &Address,
    to: &Address,
    project_id: u64,
    amount: i128,
    _data: Bytes,
) -> Result<(), Error> {
    manager.require_auth();
    rbac::require_role(env, manager, Role::TokenManager)?;

    let total = checked_mint_total(env, project_id, storage::minted(env, project_id), amount)?;

    storage::set_minted(env, project_id, total);
    credit(env, to, project_id, amount)?;

    events::emit_credits_minted(env, to.clone(), project_id, amount);
    Ok(())
}

/// Mint several projects' credits to `to` as one unit: every entry is
/// validated before anything is written.
pub fn mint_credits_batch(
    env: &Env,
    manager: &Address,
    to: &Address,
    project_ids: Vec<u64>,
    amounts: Vec<i128>,
    _data: Bytes,
) -> Result<(), Error> {
    manager.require_auth();
    rbac::require_role(env, manager, Role::TokenManager)?;

    if project_ids.len() != amounts.len() {
        return Err(Error::MismatchingArrayLengths);
    }

    // Running totals, so a project listed twice is checked against its
    // combined amount.
    let mut totals: Map<u64, i128> = Map::new(env);
    for (project_id, amount) in project_ids.iter().zip(amounts.iter()) {
        let already = match totals.get(project_id) {
            Some(total) => total,
            None => storage::minted(env, project_id),
        };
        let total = checked_mint_total(env, project_id, already, amount)?;
        totals.set(project_id, total);
    }

    for (project_id, total) in totals.iter() {
        storage::set_minted(env, project_id, total);
    }
    for (project_id, amount) in project_ids.iter().zip(amounts.iter()) {
        credit(env, to, project_id, amount)?;
    }

    events::emit_credits_minted_batch(env, to.clone(), project_ids, amounts);
    Ok(())
}

pub fn balance_of(env: &Env, account: &Address, project_id: u64) -> i128 {
    storage::balance(env, account, project_id)
}

pub fn balance_of_batch(
    env: &Env,
    accounts: Vec<Address>,
    project_ids: Vec<u64>,
) -> Result<Vec<i128>, Error> {
    if accounts.len() != project_ids.len() {
        return Err(Error::MismatchingArrayLengths);
    }
    let mut balances = Vec::new(env);
    for (account, project_id) in accounts.iter().zip(project_ids.iter()) {
        balances.push_back(storage::balance(env, &account, project_id));
    }
    Ok(balances)
}

pub fn retire_credits(
    env: &Env,
    owner: &Address,
    project_id: u64,
    amount: i128,
    description: String,
) -> Result<(), Error> {
    owner.require_auth();

    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    debit(env, owner, project_id, amount)?;

    let retired = storage::retired(env, project_id)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::set_retired(env, project_id, retired);

    let timestamp = env.ledger().timestamp();
    storage::push_retirement(
        env,
        &RetirementRecord {
            retiree: owner.clone(),
            project_id,
            amount,
            timestamp,
            description: description.clone(),
        },
    );

    events::emit_credit_retired(env, owner.clone(), project_id, amount, timestamp, description);
    Ok(())
}

pub fn retirement_history(env: &Env, account: &Address) -> Vec<RetirementRecord> {
    storage::retirement_page(env, account, 0, u32::MAX)
}

pub fn retirement_history_page(
    env: &Env,
    account: &Address,
    offset: u32,
    limit: u32,
) -> Vec<RetirementRecord> {
    storage::retirement_page(env, account, offset, limit)
}

pub fn retirement_count(env: &Env, account: &Address) -> u32 {
    storage::retirement_count(env, account)
}

pub fn project_total_retirements(env: &Env, project_id: u64) -> i128 {
    storage::retired(env, project_id)
}

pub fn total_minted(env: &Env, project_id: u64) -> i128 {
    storage::minted(env, project_id)
}

pub fn set_approval_for_all(env: &Env, owner: &Address, operator: &Address, approved: bool) {
    owner.require_auth();
    storage::set_approval(env, owner, operator, approved);
    events::emit_approval_for_all(env, owner.clone(), operator.clone(), approved);
}

pub fn is_approved_for_all(env: &Env, owner: &Address, operator: &Address) -> bool {
    storage::is_approved(env, owner, operator)
}

/// Transfer `amount` credits of `project_id` from `from` to `to`.
/// `operator` is either `from` itself or an approved operator of `from`.
pub fn safe_transfer_from(
    env: &Env,
    operator: &Address,
    from: &Address,
    to: &Address,
    project_id: u64,
    amount: i128,
    _data: Bytes,
) -> Result<(), Error> {
    operator.require_auth();
    if operator != from && !storage::is_approved(env, from, operator) {
        return Err(Error::TransferNotApproved);
    }

    move_credits(env, from, to, project_id, amount)?;

    events::emit_transfer_single(
        env,
        operator.clone(),
        from.clone(),
        to.clone(),
        project_id,
        amount,
    );
    Ok(())
}

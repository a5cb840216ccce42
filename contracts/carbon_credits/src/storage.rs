//! # Storage
//!
//! The single state-owning module. Every other module reads and writes the
//! world state through the typed helpers below; none of them touches
//! `env.storage()` directly except [`crate::rbac`], which keeps its own key
//! space.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key            | Type             | Description                          |
//! |----------------|------------------|--------------------------------------|
//! | `Config`       | `ProtocolConfig` | Deployment parameters                |
//! | `PaymentToken` | `Address`        | Token used to pay for credits        |
//! | `ProjectCount` | `u64`            | Auto-increment project ID counter    |
//! | `OrderCount`   | `u64`            | Auto-increment order ID counter      |
//! | `Paused`       | `bool`           | Marketplace trading gate             |
//! | `PlatformFee`  | `u32`            | Current platform fee (basis points)  |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                      | Type               | Description                         |
//! |--------------------------|--------------------|-------------------------------------|
//! | `ProjConfig(id)`         | `ProjectConfig`    | Immutable project configuration     |
//! | `ProjState(id)`          | `ProjectState`     | Mutable project state               |
//! | `VerificationId(vid)`    | `u64`              | Project that claimed a verification id |
//! | `Balance(account, id)`   | `i128`             | Credit balance                      |
//! | `Minted(id)`             | `i128`             | Cumulative credits minted           |
//! | `Retired(id)`            | `i128`             | Cumulative credits retired          |
//! | `RetireCount(account)`   | `u32`              | Length of an account's history      |
//! | `Retirement(account, n)` | `RetirementRecord` | n-th retirement of an account       |
//! | `Approval(owner, op)`    | `bool`             | Operator approval                   |
//! | `Order(id)`              | `SellOrder`        | Sell order                          |
//! | `AccountBalance(account)`| `i128`             | Pull-payment balance                |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//! Reads of absent keys return defaults and never touch TTLs.

use soroban_sdk::{
    contracttype, Address, Env, IntoVal, String, TryFromVal, Val, Vec,
};

use crate::types::{
    Project, ProjectConfig, ProjectState, ProtocolConfig, RetirementRecord, SellOrder,
};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
pub(crate) const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub(crate) const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Config,
    PaymentToken,
    ProjectCount,
    OrderCount,
    Paused,
    PlatformFee,
    ProjConfig(u64),
    ProjState(u64),
    VerificationId(String),
    Balance(Address, u64),
    Minted(u64),
    Retired(u64),
    RetireCount(Address),
    Retirement(Address, u32),
    Approval(Address, Address),
    Order(u64),
    AccountBalance(Address),
}

// ── Generic helpers ──────────────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
pub(crate) fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

fn read_persistent<K, V>(env: &Env, key: &K) -> Option<V>
where
    K: IntoVal<Env, Val>,
    V: TryFromVal<Env, Val>,
{
    let value = env.storage().persistent().get(key);
    if value.is_some() {
        env.storage()
            .persistent()
            .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }
    value
}

fn write_persistent<K, V>(env: &Env, key: &K, value: &V)
where
    K: IntoVal<Env, Val>,
    V: IntoVal<Env, Val>,
{
    env.storage().persistent().set(key, value);
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

fn next_counter(env: &Env, key: &DataKey) -> u64 {
    bump_instance(env);
    let current: u64 = env.storage().instance().get(key).unwrap_or(0);
    env.storage().instance().set(key, &(current + 1));
    current
}

// ── Configuration ────────────────────────────────────────────────────

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn save_config(env: &Env, config: &ProtocolConfig, payment_token: &Address) {
    let instance = env.storage().instance();
    instance.set(&DataKey::Config, config);
    instance.set(&DataKey::PaymentToken, payment_token);
    instance.set(&DataKey::PlatformFee, &config.platform_fee_bps);
    instance.set(&DataKey::Paused, &false);
    bump_instance(env);
}

pub fn load_config(env: &Env) -> Option<ProtocolConfig> {
    bump_instance(env);
    env.storage().instance().get(&DataKey::Config)
}

pub fn payment_token(env: &Env) -> Option<Address> {
    bump_instance(env);
    env.storage().instance().get(&DataKey::PaymentToken)
}

pub fn is_paused(env: &Env) -> bool {
    env.storage().instance().get(&DataKey::Paused).unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
    bump_instance(env);
}

pub fn platform_fee(env: &Env) -> u32 {
    env.storage().instance().get(&DataKey::PlatformFee).unwrap_or(0)
}

pub fn set_platform_fee(env: &Env, fee_bps: u32) {
    env.storage().instance().set(&DataKey::PlatformFee, &fee_bps);
    bump_instance(env);
}

// ── Projects ─────────────────────────────────────────────────────────

/// Atomically reads, increments, and stores the project counter.
/// Returns the ID to use for the *current* project (pre-increment value).
pub fn get_and_increment_project_id(env: &Env) -> u64 {
    next_counter(env, &DataKey::ProjectCount)
}

pub fn project_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::ProjectCount)
        .unwrap_or(0)
}

/// Save both the immutable config and the initial mutable state for a new project.
pub fn save_project(env: &Env, project: &Project) {
    let config = ProjectConfig {
        id: project.id,
        owner: project.owner.clone(),
        verification_id: project.verification_id.clone(),
        carbon_reduced: project.carbon_reduced,
    };
    let state = ProjectState {
        auditor: project.auditor.clone(),
        metadata_ref: project.metadata_ref.clone(),
        status: project.status,
        credits_issued: project.credits_issued,
        authentication_date: project.authentication_date,
    };
    write_persistent(env, &DataKey::ProjConfig(project.id), &config);
    write_persistent(env, &DataKey::ProjState(project.id), &state);
}

pub fn load_project_config(env: &Env, id: u64) -> Option<ProjectConfig> {
    read_persistent(env, &DataKey::ProjConfig(id))
}

pub fn load_project_state(env: &Env, id: u64) -> Option<ProjectState> {
    read_persistent(env, &DataKey::ProjState(id))
}

/// Load the full `Project` by combining config and state.
pub fn load_project(env: &Env, id: u64) -> Option<Project> {
    let config = load_project_config(env, id)?;
    let state = load_project_state(env, id)?;
    Some(Project::from_parts(config, state))
}

/// Save only the mutable project state.
pub fn save_project_state(env: &Env, id: u64, state: &ProjectState) {
    write_persistent(env, &DataKey::ProjState(id), state);
}

pub fn verification_id_owner(env: &Env, verification_id: &String) -> Option<u64> {
    read_persistent(env, &DataKey::VerificationId(verification_id.clone()))
}

pub fn claim_verification_id(env: &Env, verification_id: &String, project_id: u64) {
    write_persistent(
        env,
        &DataKey::VerificationId(verification_id.clone()),
        &project_id,
    );
}

// ── Credit ledger ────────────────────────────────────────────────────

pub fn balance(env: &Env, account: &Address, project_id: u64) -> i128 {
    read_persistent(env, &DataKey::Balance(account.clone(), project_id)).unwrap_or(0)
}

pub fn set_balance(env: &Env, account: &Address, project_id: u64, amount: i128) {
    write_persistent(env, &DataKey::Balance(account.clone(), project_id), &amount);
}

pub fn minted(env: &Env, project_id: u64) -> i128 {
    read_persistent(env, &DataKey::Minted(project_id)).unwrap_or(0)
}

pub fn set_minted(env: &Env, project_id: u64, amount: i128) {
    write_persistent(env, &DataKey::Minted(project_id), &amount);
}

pub fn retired(env: &Env, project_id: u64) -> i128 {
    read_persistent(env, &DataKey::Retired(project_id)).unwrap_or(0)
}

pub fn set_retired(env: &Env, project_id: u64, amount: i128) {
    write_persistent(env, &DataKey::Retired(project_id), &amount);
}

/// Append a record to the retiree's history.
pub fn push_retirement(env: &Env, record: &RetirementRecord) {
    let count_key = DataKey::RetireCount(record.retiree.clone());
    let index: u32 = read_persistent(env, &count_key).unwrap_or(0);
    write_persistent(
        env,
        &DataKey::Retirement(record.retiree.clone(), index),
        record,
    );
    write_persistent(env, &count_key, &(index + 1));
}

pub fn retirement_count(env: &Env, account: &Address) -> u32 {
    read_persistent(env, &DataKey::RetireCount(account.clone())).unwrap_or(0)
}

/// Return up to `limit` of the account's retirement records starting at
/// `offset`, in insertion order.
pub fn retirement_page(
    env: &Env,
    account: &Address,
    offset: u32,
    limit: u32,
) -> Vec<RetirementRecord> {
    let end = offset
        .saturating_add(limit)
        .min(retirement_count(env, account));
    let mut page = Vec::new(env);
    for index in offset..end {
        if let Some(record) = read_persistent(env, &DataKey::Retirement(account.clone(), index)) {
            page.push_back(record);
        }
    }
    page
}

pub fn is_approved(env: &Env, owner: &Address, operator: &Address) -> bool {
    read_persistent(env, &DataKey::Approval(owner.clone(), operator.clone())).unwrap_or(false)
}

pub fn set_approval(env: &Env, owner: &Address, operator: &Address, approved: bool) {
    let key = DataKey::Approval(owner.clone(), operator.clone());
    if approved {
        write_persistent(env, &key, &true);
    } else {
        env.storage().persistent().remove(&key);
    }
}

// ── Marketplace ──────────────────────────────────────────────────────

/// Atomically reads, increments, and stores the order counter.
pub fn get_and_increment_order_id(env: &Env) -> u64 {
    next_counter(env, &DataKey::OrderCount)
}

pub fn order_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::OrderCount)
        .unwrap_or(0)
}

pub fn load_order(env: &Env, order_id: u64) -> Option<SellOrder> {
    read_persistent(env, &DataKey::Order(order_id))
}

pub fn save_order(env: &Env, order: &SellOrder) {
    write_persistent(env, &DataKey::Order(order.order_id), order);
}

pub fn account_balance(env: &Env, account: &Address) -> i128 {
    read_persistent(env, &DataKey::AccountBalance(account.clone())).unwrap_or(0)
}

pub fn set_account_balance(env: &Env, account: &Address, amount: i128) {
    write_persistent(env, &DataKey::AccountBalance(account.clone()), &amount);
}

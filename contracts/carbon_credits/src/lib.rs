//! # Carbon Credit Protocol Contract
//!
//! Issues, tracks and trades carbon credits tied to audited emission
//! reduction projects. The single Soroban contract `CarbonCreditProtocol`
//! exposes three cooperating components over one world state:
//!
//! | Component    | Entry Point(s)                                                        |
//! |--------------|-----------------------------------------------------------------------|
//! | Bootstrap    | [`CarbonCreditProtocol::init`]                                        |
//! | Role admin   | `grant_role`, `revoke_role`, `has_role`                               |
//! | Registry     | `add_project`, `accept_project`, `reject_project`, `update_project_metadata` |
//! | Ledger       | `mint_credits`, `mint_credits_batch`, `retire_credits`, `set_approval_for_all`, `safe_transfer_from` |
//! | Marketplace  | `create_sell_order`, `close_sell_order`, `execute_trade`, `close_expired_order`, `batch_close_expired_orders`, `withdraw_account_balance` |
//! | Market admin | `toggle_marketplace_pause`, `update_platform_fee`                     |
//! | Funding      | `deposit_operating_funds`, `fallback`                                 |
//!
//! ## Architecture
//!
//! Authorization is delegated to [`rbac`]. Storage access is delegated to
//! [`storage`]. Business rules live in [`registry`], [`ledger`] and
//! [`marketplace`]; this file contains only the public entry points.
//!
//! Every fallible entry point returns `Result<_, Error>`. A returned error
//! rolls back every write and token transfer of the invocation.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Bytes, Env, String, Vec};

pub mod events;
mod ledger;
mod marketplace;
pub mod rbac;
mod registry;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_marketplace;

pub use marketplace::{MAX_PLATFORM_FEE_BPS, ORDER_LIFETIME_SECS};
pub use rbac::Role;
pub use types::{Project, ProjectStatus, ProtocolConfig, RetirementRecord, SellOrder};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotAuthorized            = 1,
    AlreadyInitialized       = 2,
    NotInitialized           = 3,
    InvalidConfig            = 4,
    InvalidReductionAmount   = 5,
    ProjectAlreadyExists     = 6,
    ProjectNotFound          = 7,
    ProjectAlreadyAudited    = 8,
    NotProjectOwner          = 9,
    InsufficientBalance      = 10,
    MintExceedsIssuedCredits = 11,
    MismatchingArrayLengths  = 12,
    InvalidAmount            = 13,
    InactiveOrder            = 14,
    InvalidPrice             = 15,
    TransferNotApproved      = 16,
    NotOrderOwner            = 17,
    InsufficientPayment      = 18,
    ExpiredOrder             = 19,
    TradingPaused            = 20,
    InvalidPlatformFee       = 21,
    Overflow                 = 22,
}

#[contract]
pub struct CarbonCreditProtocol;

#[contractimpl]
impl CarbonCreditProtocol {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract.
    ///
    /// Must be called exactly once immediately after deployment; later calls
    /// fail with `Error::AlreadyInitialized`.
    ///
    /// - `admin` is granted `Admin` and `Auditor` and must sign the transaction.
    /// - `project_owner` is granted `ProjectOwner`, `token_manager` `TokenManager`.
    /// - `payment_token` is the token buyers pay in and sellers withdraw.
    pub fn init(
        env: Env,
        admin: Address,
        project_owner: Address,
        token_manager: Address,
        payment_token: Address,
        config: ProtocolConfig,
    ) -> Result<(), Error> {
        admin.require_auth();
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        if config.mint_percentage > 100
            || config.platform_fee_bps > MAX_PLATFORM_FEE_BPS
            || config.close_reward_bps > marketplace::BPS_DENOMINATOR
        {
            return Err(Error::InvalidConfig);
        }

        storage::save_config(&env, &config, &payment_token);
        rbac::bootstrap(&env, &admin, &project_owner, &token_manager);
        Ok(())
    }

    pub fn get_config(env: Env) -> Result<ProtocolConfig, Error> {
        storage::load_config(&env).ok_or(Error::NotInitialized)
    }

    // ─────────────────────────────────────────────────────────
    // Role management
    // ─────────────────────────────────────────────────────────

    /// Grant `role` to `target`. `caller` must hold `Admin`.
    pub fn grant_role(env: Env, caller: Address, target: Address, role: Role) -> Result<(), Error> {
        rbac::grant_role(&env, &caller, &target, role)
    }

    /// Revoke `role` from `target`. `caller` must hold `Admin` and cannot
    /// revoke its own `Admin` role.
    pub fn revoke_role(
        env: Env,
        caller: Address,
        target: Address,
        role: Role,
    ) -> Result<(), Error> {
        rbac::revoke_role(&env, &caller, &target, role)
    }

    pub fn has_role(env: Env, address: Address, role: Role) -> bool {
        rbac::has_role(&env, &address, role)
    }

    // ─────────────────────────────────────────────────────────
    // Project registry
    // ─────────────────────────────────────────────────────────

    /// Register a project claim. `owner` must hold `ProjectOwner`.
    ///
    /// Returns the new project id. `verification_id` may never be reused,
    /// whatever happened to the project that first claimed it.
    pub fn add_project(
        env: Env,
        owner: Address,
        carbon_reduced: i128,
        metadata_ref: String,
        verification_id: String,
    ) -> Result<u64, Error> {
        registry::add_project(&env, &owner, carbon_reduced, metadata_ref, verification_id)
    }

    /// Accept a pending or rejected project and fix its credit ceiling at
    /// `carbon_reduced × mint_percentage / 100`.
    pub fn accept_project(env: Env, auditor: Address, project_id: u64) -> Result<(), Error> {
        registry::accept_project(&env, &auditor, project_id)
    }

    pub fn reject_project(env: Env, auditor: Address, project_id: u64) -> Result<(), Error> {
        registry::reject_project(&env, &auditor, project_id)
    }

    /// Replace the metadata of a project that is not audited yet.
    /// Rejected projects return to `Pending`.
    pub fn update_project_metadata(
        env: Env,
        owner: Address,
        project_id: u64,
        new_metadata_ref: String,
    ) -> Result<(), Error> {
        registry::update_project_metadata(&env, &owner, project_id, new_metadata_ref)
    }

    pub fn get_project(env: Env, project_id: u64) -> Result<Project, Error> {
        registry::get_project(&env, project_id)
    }

    pub fn get_project_owner(env: Env, project_id: u64) -> Option<Address> {
        registry::project_owner(&env, project_id)
    }

    /// Credit ceiling of the project; 0 unless it is audited.
    pub fn get_project_issued_credits(env: Env, project_id: u64) -> i128 {
        registry::issued_credits(&env, project_id)
    }

    pub fn is_project_audited(env: Env, project_id: u64) -> bool {
        registry::is_audited(&env, project_id)
    }

    pub fn project_exists(env: Env, project_id: u64) -> bool {
        registry::exists(&env, project_id)
    }

    pub fn project_count(env: Env) -> u64 {
        storage::project_count(&env)
    }

    pub fn mint_percentage(env: Env) -> Result<u32, Error> {
        Ok(Self::get_config(env)?.mint_percentage)
    }

    // ─────────────────────────────────────────────────────────
    // Credit ledger
    // ─────────────────────────────────────────────────────────

    /// Mint `amount` credits of an audited project to `to`.
    /// `manager` must hold `TokenManager`.
    pub fn mint_credits(
        env: Env,
        manager: Address,
        to: Address,
        project_id: u64,
        amount: i128,
        data: Bytes,
    ) -> Result<(), Error> {
        ledger::mint_credits(&env, &manager, &to, project_id, amount, data)
    }

    /// All-or-nothing variant of [`Self::mint_credits`] over paired arrays.
    pub fn mint_credits_batch(
        env: Env,
        manager: Address,
        to: Address,
        project_ids: Vec<u64>,
        amounts: Vec<i128>,
        data: Bytes,
    ) -> Result<(), Error> {
        ledger::mint_credits_batch(&env, &manager, &to, project_ids, amounts, data)
    }

    pub fn balance_of(env: Env, account: Address, project_id: u64) -> i128 {
        ledger::balance_of(&env, &account, project_id)
    }

    /// Balance of `accounts[i]` in `project_ids[i]`, for every `i`.
    pub fn balance_of_batch(
        env: Env,
        accounts: Vec<Address>,
        project_ids: Vec<u64>,
    ) -> Result<Vec<i128>, Error> {
        ledger::balance_of_batch(&env, accounts, project_ids)
    }

    pub fn total_minted(env: Env, project_id: u64) -> i128 {
        ledger::total_minted(&env, project_id)
    }

    /// Permanently remove `amount` of the caller's credits from circulation.
    pub fn retire_credits(
        env: Env,
        owner: Address,
        project_id: u64,
        amount: i128,
        description: String,
    ) -> Result<(), Error> {
        ledger::retire_credits(&env, &owner, project_id, amount, description)
    }

    /// Every retirement of `account`. Reads one entry per record; long
    /// histories should be read with [`Self::get_user_retirement_history_page`].
    pub fn get_user_retirement_history(env: Env, account: Address) -> Vec<RetirementRecord> {
        ledger::retirement_history(&env, &account)
    }

    /// Up to `limit` retirements of `account` starting at `offset`. Empty
    /// once `offset` passes the end of the history.
    pub fn get_user_retirement_history_page(
        env: Env,
        account: Address,
        offset: u32,
        limit: u32,
    ) -> Vec<RetirementRecord> {
        ledger::retirement_history_page(&env, &account, offset, limit)
    }

    pub fn get_user_retirement_count(env: Env, account: Address) -> u32 {
        ledger::retirement_count(&env, &account)
    }

    pub fn get_project_total_retirements(env: Env, project_id: u64) -> i128 {
        ledger::project_total_retirements(&env, project_id)
    }

    /// Let `operator` move all of `owner`'s credits. The marketplace itself
    /// (this contract's address) must be approved before listing.
    pub fn set_approval_for_all(env: Env, owner: Address, operator: Address, approved: bool) {
        ledger::set_approval_for_all(&env, &owner, &operator, approved)
    }

    pub fn is_approved_for_all(env: Env, owner: Address, operator: Address) -> bool {
        ledger::is_approved_for_all(&env, &owner, &operator)
    }

    pub fn safe_transfer_from(
        env: Env,
        operator: Address,
        from: Address,
        to: Address,
        project_id: u64,
        amount: i128,
        data: Bytes,
    ) -> Result<(), Error> {
        ledger::safe_transfer_from(&env, &operator, &from, &to, project_id, amount, data)
    }

    // ─────────────────────────────────────────────────────────
    // Marketplace
    // ─────────────────────────────────────────────────────────

    /// List `amount` credits at `price_per_unit` for seven days.
    /// The credits move into escrow immediately.
    pub fn create_sell_order(
        env: Env,
        seller: Address,
        project_id: u64,
        amount: i128,
        price_per_unit: i128,
    ) -> Result<u64, Error> {
        marketplace::create_sell_order(&env, &seller, project_id, amount, price_per_unit)
    }

    pub fn close_sell_order(env: Env, seller: Address, order_id: u64) -> Result<(), Error> {
        marketplace::close_sell_order(&env, &seller, order_id)
    }

    /// Fill an order, paying `payment` of the payment token. Any excess over
    /// the order price is credited back to the buyer's account balance.
    pub fn execute_trade(
        env: Env,
        buyer: Address,
        order_id: u64,
        payment: i128,
    ) -> Result<(), Error> {
        marketplace::execute_trade(&env, &buyer, order_id, payment)
    }

    /// Close an expired order and reward `closer`. Returns `false`, without
    /// failing, when there is nothing to close.
    pub fn close_expired_order(env: Env, closer: Address, order_id: u64) -> Result<bool, Error> {
        marketplace::close_expired_order(&env, &closer, order_id)
    }

    pub fn batch_close_expired_orders(
        env: Env,
        closer: Address,
        order_ids: Vec<u64>,
    ) -> Result<u32, Error> {
        marketplace::batch_close_expired_orders(&env, &closer, order_ids)
    }

    pub fn withdraw_account_balance(env: Env, account: Address, amount: i128) -> Result<(), Error> {
        marketplace::withdraw_account_balance(&env, &account, amount)
    }

    pub fn toggle_marketplace_pause(env: Env, caller: Address) -> Result<bool, Error> {
        marketplace::toggle_pause(&env, &caller)
    }

    pub fn update_platform_fee(env: Env, caller: Address, fee_bps: u32) -> Result<(), Error> {
        marketplace::update_platform_fee(&env, &caller, fee_bps)
    }

    pub fn deposit_operating_funds(env: Env, sender: Address, amount: i128) -> Result<(), Error> {
        marketplace::deposit_operating_funds(&env, &sender, amount)
    }

    /// Accept a payment that matches no other entry point.
    pub fn fallback(env: Env, sender: Address, amount: i128, payload: Bytes) -> Result<(), Error> {
        marketplace::fallback(&env, &sender, amount, payload)
    }

    pub fn get_sell_order(env: Env, order_id: u64) -> Option<SellOrder> {
        storage::load_order(&env, order_id)
    }

    pub fn order_count(env: Env) -> u64 {
        storage::order_count(&env)
    }

    pub fn account_balance(env: Env, account: Address) -> i128 {
        storage::account_balance(&env, &account)
    }

    pub fn operating_balance(env: Env) -> i128 {
        marketplace::operating_balance(&env)
    }

    pub fn marketplace_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    pub fn platform_fee_bps(env: Env) -> u32 {
        storage::platform_fee(&env)
    }

    pub fn close_expired_order_reward_bps(env: Env) -> Result<u32, Error> {
        Ok(Self::get_config(env)?.close_reward_bps)
    }

    pub fn payment_token(env: Env) -> Result<Address, Error> {
        storage::payment_token(&env).ok_or(Error::NotInitialized)
    }
}

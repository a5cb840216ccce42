//! # Events
//!
//! Every state change the off-chain indexer needs is published here. Topics
//! are `(symbol, key)` where `key` is the project id, order id or account the
//! event is about; the data is one of the `#[contracttype]` structs below or
//! a scalar.
//!
//! | Topic       | Key          | Data                     |
//! |-------------|--------------|--------------------------|
//! | `proj_add`  | project id   | [`ProjectAdded`]         |
//! | `proj_stat` | project id   | [`ProjectStatusChanged`] |
//! | `proj_upd`  | project id   | [`ProjectMetadataUpdated`] |
//! | `minted`    | project id   | [`CreditsMinted`]        |
//! | `mint_bat`  | recipient    | [`CreditsMintedBatch`]   |
//! | `retired`   | project id   | [`CreditRetired`]        |
//! | `approval`  | owner        | [`ApprovalForAll`]       |
//! | `transfer`  | project id   | [`TransferSingle`]       |
//! | `ord_new`   | order id     | [`OrderCreated`]         |
//! | `ord_close` | order id     | [`OrderClosed`]          |
//! | `ord_fill`  | order id     | [`OrderFilled`]          |
//! | `ord_exp`   | order id     | [`ExpiredOrderClosed`]   |
//! | `ord_live`  | order id     | `u64` order id           |
//! | `withdrawn` | account      | `i128` amount            |
//! | `paused`    | none         | `bool` new state         |
//! | `fee_upd`   | none         | `u32` new fee (bps)      |
//! | `fallback`  | none         | [`FallbackCalled`]       |

use soroban_sdk::{contracttype, symbol_short, Address, Bytes, Env, String, Symbol, Vec};

use crate::types::{ProjectStatus, SellOrder};

pub const PROJECT_ADDED: Symbol = symbol_short!("proj_add");
pub const PROJECT_STATUS_CHANGED: Symbol = symbol_short!("proj_stat");
pub const PROJECT_UPDATED: Symbol = symbol_short!("proj_upd");
pub const CREDITS_MINTED: Symbol = symbol_short!("minted");
pub const CREDITS_MINTED_BATCH: Symbol = symbol_short!("mint_bat");
pub const CREDIT_RETIRED: Symbol = symbol_short!("retired");
pub const APPROVAL_FOR_ALL: Symbol = symbol_short!("approval");
pub const TRANSFER_SINGLE: Symbol = symbol_short!("transfer");
pub const ORDER_CREATED: Symbol = symbol_short!("ord_new");
pub const ORDER_CLOSED: Symbol = symbol_short!("ord_close");
pub const ORDER_FILLED: Symbol = symbol_short!("ord_fill");
pub const EXPIRED_ORDER_CLOSED: Symbol = symbol_short!("ord_exp");
pub const ORDER_NOT_EXPIRED: Symbol = symbol_short!("ord_live");
pub const BALANCE_WITHDRAWN: Symbol = symbol_short!("withdrawn");
pub const PAUSE_STATUS_CHANGED: Symbol = symbol_short!("paused");
pub const PLATFORM_FEE_UPDATED: Symbol = symbol_short!("fee_upd");
pub const FALLBACK_CALLED: Symbol = symbol_short!("fallback");

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectAdded {
    pub project_id: u64,
    pub owner: Address,
    pub verification_id: String,
    pub status: ProjectStatus,
    pub carbon_reduced: i128,
    pub metadata_ref: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectStatusChanged {
    pub project_id: u64,
    pub new_status: ProjectStatus,
    pub auditor: Address,
    pub credits_issued: i128,
    pub change_timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectMetadataUpdated {
    pub project_id: u64,
    pub metadata_ref: String,
    pub status: ProjectStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreditsMinted {
    pub to: Address,
    pub project_id: u64,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreditsMintedBatch {
    pub to: Address,
    pub project_ids: Vec<u64>,
    pub amounts: Vec<i128>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreditRetired {
    pub retiree: Address,
    pub project_id: u64,
    pub amount: i128,
    pub timestamp: u64,
    pub description: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApprovalForAll {
    pub owner: Address,
    pub operator: Address,
    pub approved: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransferSingle {
    pub operator: Address,
    pub from: Address,
    pub to: Address,
    pub project_id: u64,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderCreated {
    pub order_id: u64,
    pub seller: Address,
    pub project_id: u64,
    pub credits_amount: i128,
    pub total_price: i128,
    pub expiration_timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderClosed {
    pub order_id: u64,
    pub seller: Address,
    pub project_id: u64,
    pub credits_amount: i128,
    pub total_price: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderFilled {
    pub order_id: u64,
    pub project_id: u64,
    pub buyer: Address,
    pub seller: Address,
    pub credits_amount: i128,
    pub total_price: i128,
}

/// Emitted when an expired order is closed; `reward` is what `closer`
/// actually received, which may be less than the nominal reward.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpiredOrderClosed {
    pub order_id: u64,
    pub seller: Address,
    pub project_id: u64,
    pub credits_amount: i128,
    pub total_price: i128,
    pub closer: Address,
    pub reward: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FallbackCalled {
    pub sender: Address,
    pub amount: i128,
    pub payload: Bytes,
}

// ── Registry ─────────────────────────────────────────────────────────

pub fn emit_project_added(
    env: &Env,
    project_id: u64,
    owner: Address,
    verification_id: String,
    carbon_reduced: i128,
    metadata_ref: String,
) {
    env.events().publish(
        (PROJECT_ADDED, project_id),
        ProjectAdded {
            project_id,
            owner,
            verification_id,
            status: ProjectStatus::Pending,
            carbon_reduced,
            metadata_ref,
        },
    );
}

pub fn emit_project_status_changed(
    env: &Env,
    project_id: u64,
    new_status: ProjectStatus,
    auditor: Address,
    credits_issued: i128,
) {
    env.events().publish(
        (PROJECT_STATUS_CHANGED, project_id),
        ProjectStatusChanged {
            project_id,
            new_status,
            auditor,
            credits_issued,
            change_timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn emit_project_updated(
    env: &Env,
    project_id: u64,
    metadata_ref: String,
    status: ProjectStatus,
) {
    env.events().publish(
        (PROJECT_UPDATED, project_id),
        ProjectMetadataUpdated {
            project_id,
            metadata_ref,
            status,
        },
    );
}

// ── Ledger ───────────────────────────────────────────────────────────

pub fn emit_credits_minted(env: &Env, to: Address, project_id: u64, amount: i128) {
    env.events().publish(
        (CREDITS_MINTED, project_id),
        CreditsMinted {
            to,
            project_id,
            amount,
        },
    );
}

pub fn emit_credits_minted_batch(
    env: &Env,
    to: Address,
    project_ids: Vec<u64>,
    amounts: Vec<i128>,
) {
    env.events().publish(
        (CREDITS_MINTED_BATCH, to.clone()),
        CreditsMintedBatch {
            to,
            project_ids,
            amounts,
        },
    );
}

pub fn emit_credit_retired(
    env: &Env,
    retiree: Address,
    project_id: u64,
    amount: i128,
    timestamp: u64,
    description: String,
) {
    env.events().publish(
        (CREDIT_RETIRED, project_id),
        CreditRetired {
            retiree,
            project_id,
            amount,
            timestamp,
            description,
        },
    );
}

pub fn emit_approval_for_all(env: &Env, owner: Address, operator: Address, approved: bool) {
    env.events().publish(
        (APPROVAL_FOR_ALL, owner.clone()),
        ApprovalForAll {
            owner,
            operator,
            approved,
        },
    );
}

pub fn emit_transfer_single(
    env: &Env,
    operator: Address,
    from: Address,
    to: Address,
    project_id: u64,
    amount: i128,
) {
    env.events().publish(
        (TRANSFER_SINGLE, project_id),
        TransferSingle {
            operator,
            from,
            to,
            project_id,
            amount,
        },
    );
}

// ── Marketplace ──────────────────────────────────────────────────────

pub fn emit_order_created(env: &Env, order: &SellOrder) {
    env.events().publish(
        (ORDER_CREATED, order.order_id),
        OrderCreated {
            order_id: order.order_id,
            seller: order.seller.clone(),
            project_id: order.project_id,
            credits_amount: order.credits_amount,
            total_price: order.total_price,
            expiration_timestamp: order.expiration_timestamp,
        },
    );
}

pub fn emit_order_closed(env: &Env, order: &SellOrder) {
    env.events().publish(
        (ORDER_CLOSED, order.order_id),
        OrderClosed {
            order_id: order.order_id,
            seller: order.seller.clone(),
            project_id: order.project_id,
            credits_amount: order.credits_amount,
            total_price: order.total_price,
        },
    );
}

pub fn emit_order_filled(env: &Env, order: &SellOrder, buyer: Address) {
    env.events().publish(
        (ORDER_FILLED, order.order_id),
        OrderFilled {
            order_id: order.order_id,
            project_id: order.project_id,
            buyer,
            seller: order.seller.clone(),
            credits_amount: order.credits_amount,
            total_price: order.total_price,
        },
    );
}

pub fn emit_expired_order_closed(env: &Env, order: &SellOrder, closer: Address, reward: i128) {
    env.events().publish(
        (EXPIRED_ORDER_CLOSED, order.order_id),
        ExpiredOrderClosed {
            order_id: order.order_id,
            seller: order.seller.clone(),
            project_id: order.project_id,
            credits_amount: order.credits_amount,
            total_price: order.total_price,
            closer,
            reward,
        },
    );
}

pub fn emit_order_not_expired(env: &Env, order_id: u64) {
    env.events().publish((ORDER_NOT_EXPIRED, order_id), order_id);
}

pub fn emit_balance_withdrawn(env: &Env, account: Address, amount: i128) {
    env.events().publish((BALANCE_WITHDRAWN, account), amount);
}

pub fn emit_pause_status_changed(env: &Env, paused: bool) {
    env.events().publish((PAUSE_STATUS_CHANGED,), paused);
}

pub fn emit_platform_fee_updated(env: &Env, fee_bps: u32) {
    env.events().publish((PLATFORM_FEE_UPDATED,), fee_bps);
}

pub fn emit_fallback_called(env: &Env, sender: Address, amount: i128, payload: Bytes) {
    env.events().publish(
        (FALLBACK_CALLED,),
        FallbackCalled {
            sender,
            amount,
            payload,
        },
    );
}

//! Canonical event types emitted by the carbon credit contract.
//!
//! These mirror the topics published by `contracts/carbon_credits/src/events.rs`
//! and `contracts/carbon_credits/src/rbac.rs`. Every contract event carries a
//! leading symbol topic; most carry a second topic naming the project, order
//! or account the event is about.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the carbon credit contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `proj_add`
    ProjectAdded,
    /// `proj_stat`: accepted or rejected by an auditor.
    ProjectStatusChanged,
    /// `proj_upd`
    ProjectUpdated,
    /// `minted`
    CreditsMinted,
    /// `mint_bat`
    CreditsMintedBatch,
    /// `retired`
    CreditRetired,
    /// `approval`
    ApprovalForAll,
    /// `transfer`
    TransferSingle,
    /// `ord_new`
    OrderCreated,
    /// `ord_close`
    OrderClosed,
    /// `ord_fill`
    OrderFilled,
    /// `ord_exp`
    ExpiredOrderClosed,
    /// `ord_live`: a close-expired request found nothing to close.
    OrderNotExpired,
    /// `withdrawn`
    BalanceWithdrawn,
    /// `paused`
    MarketplacePauseChanged,
    /// `fee_upd`
    PlatformFeeUpdated,
    /// `fallback`
    FallbackCalled,
    /// `role_set`
    RoleSet,
    /// `role_del`
    RoleDel,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

/// What the second topic of an event identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKey {
    Project,
    Order,
    Account,
    None,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "proj_add" => Self::ProjectAdded,
            "proj_stat" => Self::ProjectStatusChanged,
            "proj_upd" => Self::ProjectUpdated,
            "minted" => Self::CreditsMinted,
            "mint_bat" => Self::CreditsMintedBatch,
            "retired" => Self::CreditRetired,
            "approval" => Self::ApprovalForAll,
            "transfer" => Self::TransferSingle,
            "ord_new" => Self::OrderCreated,
            "ord_close" => Self::OrderClosed,
            "ord_fill" => Self::OrderFilled,
            "ord_exp" => Self::ExpiredOrderClosed,
            "ord_live" => Self::OrderNotExpired,
            "withdrawn" => Self::BalanceWithdrawn,
            "paused" => Self::MarketplacePauseChanged,
            "fee_upd" => Self::PlatformFeeUpdated,
            "fallback" => Self::FallbackCalled,
            "role_set" => Self::RoleSet,
            "role_del" => Self::RoleDel,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectAdded => "project_added",
            Self::ProjectStatusChanged => "project_status_changed",
            Self::ProjectUpdated => "project_updated",
            Self::CreditsMinted => "credits_minted",
            Self::CreditsMintedBatch => "credits_minted_batch",
            Self::CreditRetired => "credit_retired",
            Self::ApprovalForAll => "approval_for_all",
            Self::TransferSingle => "transfer_single",
            Self::OrderCreated => "order_created",
            Self::OrderClosed => "order_closed",
            Self::OrderFilled => "order_filled",
            Self::ExpiredOrderClosed => "expired_order_closed",
            Self::OrderNotExpired => "order_not_expired",
            Self::BalanceWithdrawn => "balance_withdrawn",
            Self::MarketplacePauseChanged => "marketplace_pause_changed",
            Self::PlatformFeeUpdated => "platform_fee_updated",
            Self::FallbackCalled => "fallback_called",
            Self::RoleSet => "role_set",
            Self::RoleDel => "role_del",
            Self::Unknown => "unknown",
        }
    }

    pub fn topic_key(&self) -> TopicKey {
        match self {
            Self::ProjectAdded
            | Self::ProjectStatusChanged
            | Self::ProjectUpdated
            | Self::CreditsMinted
            | Self::CreditRetired
            | Self::TransferSingle => TopicKey::Project,
            Self::OrderCreated
            | Self::OrderClosed
            | Self::OrderFilled
            | Self::ExpiredOrderClosed
            | Self::OrderNotExpired => TopicKey::Order,
            Self::CreditsMintedBatch
            | Self::ApprovalForAll
            | Self::BalanceWithdrawn
            | Self::RoleSet
            | Self::RoleDel => TopicKey::Account,
            Self::MarketplacePauseChanged
            | Self::PlatformFeeUpdated
            | Self::FallbackCalled
            | Self::Unknown => TopicKey::None,
        }
    }
}

/// A fully decoded contract event, ready to be stored in the database.
///
/// `actor` is the account the event is primarily about (owner, buyer,
/// retiree, closer, role target) and `amount` its main quantity, both as
/// decimal strings so `i128` values survive SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarbonEvent {
    pub event_type: String,
    pub project_id: Option<String>,
    pub order_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub project_id: Option<String>,
    pub order_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

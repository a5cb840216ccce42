//! # Types
//!
//! Shared data structures used across the registry, ledger and marketplace.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! A `Project` is internally stored as two separate ledger entries:
//!
//! - [`ProjectConfig`]: written once by `add_project`; never mutated.
//! - [`ProjectState`]: written on audit decisions and metadata updates.
//!
//! The public API exposes the reconstructed [`Project`] struct for convenience.
//!
//! ### Status as a Finite-State Machine
//!
//! ```text
//! Pending ──► Audited
//!    │  ▲
//!    ▼  │ (metadata update / re-audit)
//! Rejected ──► Audited
//! ```
//!
//! `Audited` is terminal: it can be neither rejected nor edited.
//!
//! ### Sell orders
//!
//! An order is `Active` while `is_active` is set. Filling, closing and
//! expiry-closing all clear `is_active` and zero `expiration_timestamp`;
//! no entry point sets `is_active` back to `true`.

use soroban_sdk::{contracttype, Address, String};

/// Lifecycle status of a project.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ProjectStatus {
    /// Awaiting an audit decision.
    Pending = 0,
    /// Accepted by an auditor; credits may be minted up to `credits_issued`.
    Audited = 1,
    /// Rejected by an auditor; the owner may resubmit via a metadata update.
    Rejected = 2,
}

/// Immutable project configuration, written once at registration.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectConfig {
    pub id: u64,
    pub owner: Address,
    pub verification_id: String,
    pub carbon_reduced: i128,
}

/// Mutable project state, updated by auditors and the project owner.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectState {
    pub auditor: Option<Address>,
    pub metadata_ref: String,
    pub status: ProjectStatus,
    pub credits_issued: i128,
    pub authentication_date: u64,
}

/// Full on-chain representation of an emission-reduction project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    /// Unique identifier (auto-incremented from 0).
    pub id: u64,
    /// Address that registered the project.
    pub owner: Address,
    /// Auditor that last decided on the project, if any.
    pub auditor: Option<Address>,
    /// External registry identifier; unique among all projects ever added.
    pub verification_id: String,
    /// Content pointer to the project documentation (e.g. an IPFS CID).
    pub metadata_ref: String,
    /// Tons of CO2e reduced, as claimed at registration.
    pub carbon_reduced: i128,
    /// Current lifecycle status.
    pub status: ProjectStatus,
    /// Mint ceiling fixed at audit time; 0 unless audited.
    pub credits_issued: i128,
    /// Ledger timestamp of the accepting audit; 0 unless audited.
    pub authentication_date: u64,
}

impl Project {
    pub(crate) fn from_parts(config: ProjectConfig, state: ProjectState) -> Self {
        Project {
            id: config.id,
            owner: config.owner,
            auditor: state.auditor,
            verification_id: config.verification_id,
            metadata_ref: state.metadata_ref,
            carbon_reduced: config.carbon_reduced,
            status: state.status,
            credits_issued: state.credits_issued,
            authentication_date: state.authentication_date,
        }
    }
}

/// A permanent removal of credits from circulation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetirementRecord {
    pub retiree: Address,
    pub project_id: u64,
    pub amount: i128,
    pub timestamp: u64,
    pub description: String,
}

/// A fixed-price listing whose credits are held in escrow by the contract.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SellOrder {
    pub order_id: u64,
    pub seller: Address,
    pub project_id: u64,
    pub credits_amount: i128,
    /// `credits_amount × price_per_unit`, in payment-token units.
    pub total_price: i128,
    /// Last ledger timestamp at which the order can be filled; 0 once terminal.
    pub expiration_timestamp: u64,
    pub is_active: bool,
}

/// Deployment-time parameters, validated by `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProtocolConfig {
    /// Share of `carbon_reduced` issued as credits on audit, 0–100.
    pub mint_percentage: u32,
    /// Initial platform fee in basis points, at most 1000.
    pub platform_fee_bps: u32,
    /// Reward paid for closing an expired order, in basis points of its price.
    pub close_reward_bps: u32,
}

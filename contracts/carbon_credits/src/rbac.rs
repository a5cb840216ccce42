//! # Role-Based Access Control
//!
//! A capability registry: the set of `(account, role)` pairs currently
//! granted. An account may hold several roles at once (the deployment admin
//! is also an auditor, for instance).
//!
//! | Role           | Gates                                                  |
//! |----------------|--------------------------------------------------------|
//! | `Admin`        | role management, marketplace pause, platform fee       |
//! | `Auditor`      | `accept_project`, `reject_project`                     |
//! | `ProjectOwner` | `add_project`                                          |
//! | `TokenManager` | `mint_credits`, `mint_credits_batch`                   |
//!
//! Role flags live under their own [`RbacKey`] namespace in persistent
//! storage, separate from [`crate::storage::DataKey`].

use soroban_sdk::{contracttype, symbol_short, Address, Env};

use crate::storage::{PERSISTENT_BUMP_AMOUNT, PERSISTENT_LIFETIME_THRESHOLD};
use crate::Error;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Admin,
    Auditor,
    ProjectOwner,
    TokenManager,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RbacKey {
    Role(Address, Role),
}

/// Return `true` if `account` currently holds `role`.
pub fn has_role(env: &Env, account: &Address, role: Role) -> bool {
    let key = RbacKey::Role(account.clone(), role);
    let granted = env.storage().persistent().has(&key);
    if granted {
        env.storage()
            .persistent()
            .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }
    granted
}

/// Fail with `NotAuthorized` unless `account` holds `role`.
///
/// Callers are expected to have run `require_auth` on `account` already.
pub fn require_role(env: &Env, account: &Address, role: Role) -> Result<(), Error> {
    if has_role(env, account, role) {
        Ok(())
    } else {
        Err(Error::NotAuthorized)
    }
}

fn set_role(env: &Env, account: &Address, role: Role) {
    let key = RbacKey::Role(account.clone(), role);
    env.storage().persistent().set(&key, &true);
    env.storage()
        .persistent()
        .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Seed the initial role holders. Only called from `init`.
pub fn bootstrap(env: &Env, admin: &Address, project_owner: &Address, token_manager: &Address) {
    set_role(env, admin, Role::Admin);
    set_role(env, admin, Role::Auditor);
    set_role(env, project_owner, Role::ProjectOwner);
    set_role(env, token_manager, Role::TokenManager);
}

/// Grant `role` to `target`. `caller` must hold `Admin`.
pub fn grant_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    caller.require_auth();
    require_role(env, caller, Role::Admin)?;

    set_role(env, target, role);
    env.events()
        .publish((symbol_short!("role_set"), target.clone()), (role, caller.clone()));
    Ok(())
}

/// Revoke `role` from `target`. `caller` must hold `Admin`.
///
/// An admin cannot drop its own `Admin` role; another admin has to do it.
pub fn revoke_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    caller.require_auth();
    require_role(env, caller, Role::Admin)?;
    if caller == target && role == Role::Admin {
        return Err(Error::NotAuthorized);
    }

    env.storage()
        .persistent()
        .remove(&RbacKey::Role(target.clone(), role));
    env.events()
        .publish((symbol_short!("role_del"), target.clone()), (role, caller.clone()));
    Ok(())
}

//! # Project Registry
//!
//! Owns project records and the `Pending → Audited | Rejected` lifecycle.
//! The ledger reads audit state only through [`issued_credits`].

use soroban_sdk::{log, Address, Env, String};

use crate::events;
use crate::rbac::{self, Role};
use crate::storage::{
    claim_verification_id, get_and_increment_project_id, load_config, load_project,
    load_project_config, load_project_state, save_project, save_project_state,
    verification_id_owner,
};
use crate::types::{Project, ProjectStatus};
use crate::Error;

/// Credits issued for `carbon_reduced` tons at `mint_percentage` percent,
/// truncated toward zero.
pub fn credits_for(carbon_reduced: i128, mint_percentage: u32) -> Result<i128, Error> {
    carbon_reduced
        .checked_mul(mint_percentage as i128)
        .map(|scaled| scaled / 100)
        .ok_or(Error::Overflow)
}

pub fn add_project(
    env: &Env,
    owner: &Address,
    carbon_reduced: i128,
    metadata_ref: String,
    verification_id: String,
) -> Result<u64, Error> {
    owner.require_auth();
    rbac::require_role(env, owner, Role::ProjectOwner)?;

    if carbon_reduced <= 0 {
        log!(env, "invalid reduction amount", carbon_reduced);
        return Err(Error::InvalidReductionAmount);
    }
    if verification_id_owner(env, &verification_id).is_some() {
        log!(env, "project already exists", verification_id);
        return Err(Error::ProjectAlreadyExists);
    }

    let id = get_and_increment_project_id(env);
    let project = Project {
        id,
        owner: owner.clone(),
        auditor: None,
        verification_id: verification_id.clone(),
        metadata_ref: metadata_ref.clone(),
        carbon_reduced,
        status: ProjectStatus::Pending,
        credits_issued: 0,
        authentication_date: 0,
    };
    save_project(env, &project);
    claim_verification_id(env, &verification_id, id);

    events::emit_project_added(
        env,
        id,
        owner.clone(),
        verification_id,
        carbon_reduced,
        metadata_ref,
    );
    Ok(id)
}

pub fn accept_project(env: &Env, auditor: &Address, project_id: u64) -> Result<(), Error> {
    auditor.require_auth();
    rbac::require_role(env, auditor, Role::Auditor)?;

    let config = load_project_config(env, project_id).ok_or(Error::ProjectNotFound)?;
    let mut state = load_project_state(env, project_id).ok_or(Error::ProjectNotFound)?;
    if state.status == ProjectStatus::Audited {
        return Err(Error::ProjectAlreadyAudited);
    }

    let mint_percentage = load_config(env).ok_or(Error::NotInitialized)?.mint_percentage;
    let credits_issued = credits_for(config.carbon_reduced, mint_percentage)?;
    if credits_issued <= 0 {
        log!(env, "audit would issue no credits", project_id, config.carbon_reduced);
        return Err(Error::InvalidReductionAmount);
    }

    state.status = ProjectStatus::Audited;
    state.auditor = Some(auditor.clone());
    state.credits_issued = credits_issued;
    state.authentication_date = env.ledger().timestamp();
    save_project_state(env, project_id, &state);

    events::emit_project_status_changed(
        env,
        project_id,
        ProjectStatus::Audited,
        auditor.clone(),
        credits_issued,
    );
    Ok(())
}

pub fn reject_project(env: &Env, auditor: &Address, project_id: u64) -> Result<(), Error> {
    auditor.require_auth();
    rbac::require_role(env, auditor, Role::Auditor)?;

    let mut state = load_project_state(env, project_id).ok_or(Error::ProjectNotFound)?;
    if state.status == ProjectStatus::Audited {
        return Err(Error::ProjectAlreadyAudited);
    }

    state.status = ProjectStatus::Rejected;
    state.auditor = Some(auditor.clone());
    state.credits_issued = 0;
    state.authentication_date = 0;
    save_project_state(env, project_id, &state);

    events::emit_project_status_changed(
        env,
        project_id,
        ProjectStatus::Rejected,
        auditor.clone(),
        0,
    );
    Ok(())
}

/// Replace the metadata pointer of a pending or rejected project.
/// A rejected project goes back to `Pending` for another audit.
pub fn update_project_metadata(
    env: &Env,
    owner: &Address,
    project_id: u64,
    new_metadata_ref: String,
) -> Result<(), Error> {
    owner.require_auth();

    let config = load_project_config(env, project_id).ok_or(Error::ProjectNotFound)?;
    if config.owner != *owner {
        return Err(Error::NotProjectOwner);
    }
    let mut state = load_project_state(env, project_id).ok_or(Error::ProjectNotFound)?;
    if state.status == ProjectStatus::Audited {
        return Err(Error::ProjectAlreadyAudited);
    }

    state.metadata_ref = new_metadata_ref.clone();
    state.status = ProjectStatus::Pending;
    save_project_state(env, project_id, &state);

    events::emit_project_updated(env, project_id, new_metadata_ref, ProjectStatus::Pending);
    Ok(())
}

pub fn get_project(env: &Env, project_id: u64) -> Result<Project, Error> {
    load_project(env, project_id).ok_or(Error::ProjectNotFound)
}

pub fn project_owner(env: &Env, project_id: u64) -> Option<Address> {
    load_project_config(env, project_id).map(|config| config.owner)
}

/// Mint ceiling of an audited project; 0 for anything else, including
/// unknown ids.
pub fn issued_credits(env: &Env, project_id: u64) -> i128 {
    match load_project_state(env, project_id) {
        Some(state) if state.status == ProjectStatus::Audited => state.credits_issued,
        _ => 0,
    }
}

pub fn is_audited(env: &Env, project_id: u64) -> bool {
    load_project_state(env, project_id)
        .map(|state| state.status == ProjectStatus::Audited)
        .unwrap_or(false)
}

pub fn exists(env: &Env, project_id: u64) -> bool {
    load_project_config(env, project_id).is_some()
}

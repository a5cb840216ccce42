#![allow(dead_code)]

extern crate std;

use soroban_sdk::Address;

use crate::types::{Project, ProjectStatus, SellOrder};
use crate::CarbonCreditProtocolClient;

/// Every unit ever minted for a project is either held by someone (escrow
/// included) or retired, and nothing beyond the ceiling was ever minted.
///
/// `holders` must list every account that may hold credits of the project;
/// the contract's own address is added automatically.
pub fn assert_credit_conservation(
    client: &CarbonCreditProtocolClient,
    project_id: u64,
    holders: &[Address],
) {
    let escrow = client.balance_of(&client.address, &project_id);
    let held: i128 = holders
        .iter()
        .map(|holder| client.balance_of(holder, &project_id))
        .sum::<i128>()
        + escrow;
    let retired = client.get_project_total_retirements(&project_id);
    let minted = client.total_minted(&project_id);

    assert_eq!(
        held + retired,
        minted,
        "conservation violated for project {}: held {} + retired {} != minted {}",
        project_id,
        held,
        retired,
        minted
    );
    assert!(
        minted <= client.get_project_issued_credits(&project_id),
        "ceiling violated for project {}: minted {} above issued credits",
        project_id,
        minted
    );
}

/// Only an audited project carries a non-zero credit ceiling.
pub fn assert_issuance_matches_status(project: &Project) {
    match project.status {
        ProjectStatus::Audited => {
            assert!(
                project.credits_issued > 0,
                "audited project {} issues no credits",
                project.id
            );
            assert!(project.auditor.is_some(), "audited project {} has no auditor", project.id);
            assert!(
                project.authentication_date > 0,
                "audited project {} has no authentication date",
                project.id
            );
        }
        _ => assert_eq!(
            project.credits_issued, 0,
            "project {} issues credits while {:?}",
            project.id, project.status
        ),
    }
}

/// Project ids are sequential starting from 0.
pub fn assert_sequential_ids(projects: &[Project]) {
    for (i, project) in projects.iter().enumerate() {
        assert_eq!(project.id, i as u64, "expected id {}, got {}", i, project.id);
    }
}

/// `Audited` is terminal; every other move is allowed.
pub fn assert_valid_status_transition(from: &ProjectStatus, to: &ProjectStatus) {
    let valid = matches!(
        (from, to),
        (ProjectStatus::Pending, ProjectStatus::Audited)
            | (ProjectStatus::Pending, ProjectStatus::Rejected)
            | (ProjectStatus::Rejected, ProjectStatus::Audited)
            | (ProjectStatus::Rejected, ProjectStatus::Rejected)
            | (ProjectStatus::Rejected, ProjectStatus::Pending)
    );
    assert!(valid, "invalid status transition from {:?} to {:?}", from, to);
}

/// Fields fixed at registration never change.
pub fn assert_project_immutable_fields(original: &Project, current: &Project) {
    assert_eq!(original.id, current.id, "project id changed");
    assert_eq!(original.owner, current.owner, "project owner changed");
    assert_eq!(
        original.verification_id, current.verification_id,
        "project verification id changed"
    );
    assert_eq!(
        original.carbon_reduced, current.carbon_reduced,
        "project carbon reduction changed"
    );
}

/// A closed order stays closed with its expiration cleared, and its terms
/// never change.
pub fn assert_order_transition(before: &SellOrder, after: &SellOrder) {
    assert!(
        before.is_active || !after.is_active,
        "order {} was reactivated",
        before.order_id
    );
    if !after.is_active {
        assert_eq!(
            after.expiration_timestamp, 0,
            "inactive order {} keeps an expiration",
            after.order_id
        );
    }
    assert_eq!(before.seller, after.seller, "order seller changed");
    assert_eq!(before.project_id, after.project_id, "order project changed");
    assert_eq!(
        before.credits_amount, after.credits_amount,
        "order amount changed"
    );
    assert_eq!(before.total_price, after.total_price, "order price changed");
}

/// Payment tokens held by the contract cover every internal account balance.
pub fn assert_payment_solvency(contract_token_balance: i128, account_balances: &[i128]) {
    let owed: i128 = account_balances.iter().sum();
    assert!(
        contract_token_balance >= owed,
        "contract holds {} but owes {}",
        contract_token_balance,
        owed
    );
}

/// Run all single-project checks at once.
pub fn assert_all_project_invariants(project: &Project) {
    assert_issuance_matches_status(project);
    assert!(
        project.carbon_reduced > 0,
        "project {} has non-positive carbon reduction",
        project.id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::Fixture;
    use soroban_sdk::testutils::Address as _;

    #[test]
    fn test_fresh_project_satisfies_invariants() {
        let fx = Fixture::new();
        let id = fx.add_project(1_000, "VCS-INV-1");
        assert_all_project_invariants(&fx.client.get_project(&id));
    }

    #[test]
    fn test_sequential_ids_across_registrations() {
        let fx = Fixture::new();
        let a = fx.add_project(10, "VCS-SEQ-A");
        let b = fx.add_project(20, "VCS-SEQ-B");
        let c = fx.add_project(30, "VCS-SEQ-C");
        let projects = [
            fx.client.get_project(&a),
            fx.client.get_project(&b),
            fx.client.get_project(&c),
        ];
        assert_sequential_ids(&projects);
    }

    #[test]
    #[should_panic(expected = "issues no credits")]
    fn test_audited_without_credits_is_caught() {
        let fx = Fixture::new();
        let id = fx.audited_project(1_000, "VCS-INV-2");
        let mut project = fx.client.get_project(&id);
        project.credits_issued = 0;
        assert_issuance_matches_status(&project);
    }

    #[test]
    #[should_panic(expected = "invalid status transition")]
    fn test_audited_is_terminal() {
        assert_valid_status_transition(&ProjectStatus::Audited, &ProjectStatus::Rejected);
    }

    #[test]
    fn test_conservation_through_retire_and_escrow() {
        let fx = Fixture::new();
        let id = fx.audited_project(1_000, "VCS-CONS");
        let seller = fx.seller_with_credits(id, 600);
        let other = soroban_sdk::Address::generate(&fx.env);

        fx.client
            .retire_credits(&seller, &id, &100, &fx.string("offset"));
        fx.client.create_sell_order(&seller, &id, &200, &5);
        fx.client
            .safe_transfer_from(&seller, &seller, &other, &id, &50, &fx.no_data());

        assert_credit_conservation(&fx.client, id, &[seller, other]);
    }

    #[test]
    #[should_panic(expected = "contract holds")]
    fn test_solvency_detects_shortfall() {
        assert_payment_solvency(10, &[6, 5]);
    }
}

// src/services/eligibility.rs
//
// O motor de elegibilidade: decide sob qual papel (se algum) um ator pode
// agir sobre uma solicitação. Tudo aqui é puro e síncrono, sem I/O e sem
// erro: dado ausente ou malformado sempre falha para o lado "não elegível".

use uuid::Uuid;

use crate::models::finance::{ApprovalRole, FinanceRequest, RequestStatus};
use crate::models::person::{
    normalize_group, FinanceDesk, FinanceRoleAssignment, GroupMembership, GroupRole, PrivilegeSet,
};

/// Deriva o conjunto de privilégios do ator a partir dos dados de
/// referência. Recalculado a cada carga; nunca persistido.
///
/// Regras:
/// - `lead`  <=> lidera pelo menos um grupo
/// - `rep`   <=> lidera o grupo distinguido dos representantes
/// - `committee` <=> tem qualquer vínculo de líder/vice, ou é rep,
///   ou é vice do grupo dos representantes
/// - `accounting` / `cashier` / `auditor` <=> vínculo no financeiro
pub fn derive_privileges(
    person_id: Option<Uuid>,
    email: &str,
    memberships: &[GroupMembership],
    finance_roles: &[FinanceRoleAssignment],
    rep_group_id: &str,
) -> PrivilegeSet {
    let rep_group = normalize_group(rep_group_id);

    let mut lead_groups: Vec<String> = Vec::new();
    let mut deputy_groups: Vec<String> = Vec::new();

    // Vínculos de grupo só existem para quem já está no roster (tem id).
    if let Some(person_id) = person_id {
        for membership in memberships.iter().filter(|m| m.person_id == person_id) {
            let group = normalize_group(&membership.group_id);
            if group.is_empty() {
                continue;
            }
            match membership.role_in_group {
                GroupRole::Lead => lead_groups.push(group),
                GroupRole::Deputy => deputy_groups.push(group),
                GroupRole::Member => {}
            }
        }
    }

    lead_groups.sort();
    lead_groups.dedup();
    deputy_groups.sort();
    deputy_groups.dedup();

    let lead = !lead_groups.is_empty();
    let rep = lead_groups.iter().any(|g| *g == rep_group);
    let deputy_of_rep = deputy_groups.iter().any(|g| *g == rep_group);
    let committee = lead || !deputy_groups.is_empty() || rep || deputy_of_rep;

    let mut privileges = PrivilegeSet {
        lead,
        rep,
        committee,
        lead_groups,
        deputy_groups,
        ..PrivilegeSet::default()
    };

    for assignment in finance_roles {
        if !assignment.belongs_to(person_id, email) {
            continue;
        }
        match assignment.desk {
            FinanceDesk::Accounting => privileges.accounting = true,
            FinanceDesk::Cashier => privileges.cashier = true,
            FinanceDesk::Auditor => privileges.auditor = true,
        }
    }

    privileges
}

/// Resolve o papel sob o qual o ator pode agir AGORA nesta solicitação.
///
/// Política de primeiro-que-casa: percorre os privilégios na ordem fixa
/// de prioridade (lead, rep, committee, accounting, cashier) e devolve o
/// primeiro cujo status exigido bate com o status atual. Um ator age em
/// exatamente uma capacidade por solicitação, mesmo que mais de um
/// privilégio pudesse valer. Auditor nunca entra na resolução.
///
/// `lead` carrega uma checagem extra: o departamento do solicitante
/// precisa estar entre os grupos que o ator lidera ou vice-lidera.
pub fn resolve_role(request: &FinanceRequest, privileges: &PrivilegeSet) -> Option<ApprovalRole> {
    for role in ApprovalRole::PRIORITY {
        if !privileges.holds(role) {
            continue;
        }
        if request.status != role.required_status() {
            continue;
        }
        if role == ApprovalRole::Lead {
            let department = normalize_group(&request.applicant_department);
            if !privileges.covers_department(&department) {
                continue;
            }
        }
        return Some(role);
    }
    None
}

/// Predicado de relevância da fila de concluídas: este ator teria
/// plausivelmente passado pela cadeia de aprovação desta solicitação?
///
/// Papéis de alcance total da cadeia (rep, contabilidade, caixa e o
/// auditor, que observa tudo) são relevantes incondicionalmente. Quem só
/// tem vínculo de líder/vice precisa do casamento de departamento, a
/// mesma regra de escopo que `resolve_role` aplica ao `lead`.
pub fn relevant_when_closed(request: &FinanceRequest, privileges: &PrivilegeSet) -> bool {
    if request.status != RequestStatus::Closed {
        return false;
    }
    if privileges.rep || privileges.accounting || privileges.cashier || privileges.auditor {
        return true;
    }
    let department = normalize_group(&request.applicant_department);
    privileges.covers_department(&department)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::finance::RequestKind;

    const REP_GROUP: &str = "representantes";

    fn request(status: RequestStatus, department: &str) -> FinanceRequest {
        FinanceRequest {
            id: Uuid::new_v4(),
            kind: RequestKind::Purchase,
            status,
            title: "Material de laboratório".to_string(),
            applicant_id: None,
            applicant_email: "aluno@escola.example".to_string(),
            applicant_name: "Aluno Teste".to_string(),
            applicant_department: department.to_string(),
            amount_estimated: Decimal::new(35000, 2),
            amount_actual: None,
            attachments: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    fn membership(person_id: Uuid, group_id: &str, role: GroupRole) -> GroupMembership {
        GroupMembership {
            id: Uuid::new_v4(),
            person_id,
            group_id: group_id.to_string(),
            role_in_group: role,
        }
    }

    fn desk_assignment(person_id: Option<Uuid>, email: Option<&str>, desk: FinanceDesk) -> FinanceRoleAssignment {
        FinanceRoleAssignment {
            id: Uuid::new_v4(),
            person_id,
            person_email: email.map(String::from),
            desk,
        }
    }

    // --- Derivação de privilégios ---

    #[test]
    fn leading_any_group_grants_lead_and_committee() {
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, "Turma-B", GroupRole::Lead)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        assert!(privileges.lead);
        assert!(privileges.committee);
        assert!(!privileges.rep);
        assert_eq!(privileges.lead_groups, vec!["turma-b"]);
    }

    #[test]
    fn leading_the_rep_group_grants_rep() {
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, "Representantes", GroupRole::Lead)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        assert!(privileges.rep);
        assert!(privileges.committee);
    }

    #[test]
    fn deputy_of_rep_group_grants_committee_but_not_rep() {
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, REP_GROUP, GroupRole::Deputy)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        assert!(!privileges.rep);
        assert!(!privileges.lead);
        assert!(privileges.committee);
    }

    #[test]
    fn plain_member_derives_nothing() {
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, "turma-b", GroupRole::Member)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        assert_eq!(privileges, PrivilegeSet::default());
    }

    #[test]
    fn finance_desk_matches_by_email_fallback() {
        // Vínculo registrado só por e-mail, ator ainda sem id no roster
        let roles = [desk_assignment(None, Some("  Caixa@Escola.example "), FinanceDesk::Cashier)];
        let privileges = derive_privileges(None, "caixa@escola.example", &[], &roles, REP_GROUP);

        assert!(privileges.cashier);
        assert!(!privileges.accounting);
        assert!(!privileges.committee);
    }

    #[test]
    fn unresolved_actor_gets_no_group_privileges() {
        let someone_else = Uuid::new_v4();
        let memberships = [membership(someone_else, "turma-b", GroupRole::Lead)];
        let privileges = derive_privileges(None, "x@y.z", &memberships, &[], REP_GROUP);

        assert!(!privileges.lead);
        assert!(privileges.lead_groups.is_empty());
    }

    // --- resolve_role ---

    #[test]
    fn scenario_a_lead_resolves_own_department() {
        // Ator lidera o grupo "B"; solicitação do departamento "B" em PENDING_LEAD
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, "B", GroupRole::Lead)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        let role = resolve_role(&request(RequestStatus::PendingLead, "B"), &privileges);
        assert_eq!(role, Some(ApprovalRole::Lead));
    }

    #[test]
    fn scenario_b_lead_never_resolves_foreign_department() {
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, "B", GroupRole::Lead)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        let role = resolve_role(&request(RequestStatus::PendingLead, "C"), &privileges);
        assert_eq!(role, None);
    }

    #[test]
    fn deputy_groups_also_satisfy_the_lead_department_check() {
        let pid = Uuid::new_v4();
        let memberships = [
            membership(pid, "B", GroupRole::Lead),
            membership(pid, "C", GroupRole::Deputy),
        ];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        let role = resolve_role(&request(RequestStatus::PendingLead, "C"), &privileges);
        assert_eq!(role, Some(ApprovalRole::Lead));
    }

    #[test]
    fn rep_resolves_pending_rep_regardless_of_department() {
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, REP_GROUP, GroupRole::Lead)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        let role = resolve_role(&request(RequestStatus::PendingRep, "qualquer-turma"), &privileges);
        assert_eq!(role, Some(ApprovalRole::Rep));

        // Mas não resolve nada em outro degrau da cadeia que não cubra
        let role = resolve_role(&request(RequestStatus::PendingAccounting, "qualquer-turma"), &privileges);
        assert_eq!(role, None);
    }

    #[test]
    fn auditor_only_actor_never_resolves_a_role() {
        let roles = [desk_assignment(None, Some("a@y.z"), FinanceDesk::Auditor)];
        let privileges = derive_privileges(None, "a@y.z", &[], &roles, REP_GROUP);

        for status in [
            RequestStatus::PendingLead,
            RequestStatus::PendingRep,
            RequestStatus::PendingCommittee,
            RequestStatus::PendingAccounting,
            RequestStatus::PendingCashier,
            RequestStatus::Closed,
            RequestStatus::Returned,
            RequestStatus::Draft,
        ] {
            assert_eq!(resolve_role(&request(status, "b"), &privileges), None);
        }
    }

    #[test]
    fn resolved_role_is_always_one_the_actor_holds() {
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, REP_GROUP, GroupRole::Lead)];
        let desks = [desk_assignment(Some(pid), None, FinanceDesk::Cashier)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &desks, REP_GROUP);

        for status in [
            RequestStatus::PendingLead,
            RequestStatus::PendingRep,
            RequestStatus::PendingCommittee,
            RequestStatus::PendingAccounting,
            RequestStatus::PendingCashier,
        ] {
            if let Some(role) = resolve_role(&request(status, REP_GROUP), &privileges) {
                assert!(privileges.holds(role));
            }
        }
    }

    #[test]
    fn first_match_wins_lead_takes_priority_over_committee() {
        // Líder do grupo B também é committee por derivação. Numa
        // solicitação PENDING_LEAD do próprio grupo, vale lead.
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, "b", GroupRole::Lead)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        assert!(privileges.committee);
        let role = resolve_role(&request(RequestStatus::PendingLead, "b"), &privileges);
        assert_eq!(role, Some(ApprovalRole::Lead));
    }

    #[test]
    fn draft_and_terminal_statuses_resolve_to_none() {
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, "b", GroupRole::Lead)];
        let desks = [
            desk_assignment(Some(pid), None, FinanceDesk::Accounting),
            desk_assignment(Some(pid), None, FinanceDesk::Cashier),
        ];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &desks, REP_GROUP);

        for status in [RequestStatus::Draft, RequestStatus::Closed, RequestStatus::Returned] {
            assert_eq!(resolve_role(&request(status, "b"), &privileges), None);
        }
    }

    #[test]
    fn empty_department_fails_toward_not_eligible() {
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, "b", GroupRole::Lead)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        assert_eq!(resolve_role(&request(RequestStatus::PendingLead, "   "), &privileges), None);
    }

    // --- Predicado de relevância ---

    #[test]
    fn cashier_is_chain_wide_for_completed_view() {
        let roles = [desk_assignment(None, Some("c@y.z"), FinanceDesk::Cashier)];
        let privileges = derive_privileges(None, "c@y.z", &[], &roles, REP_GROUP);

        assert!(relevant_when_closed(&request(RequestStatus::Closed, "qualquer"), &privileges));
    }

    #[test]
    fn lead_relevance_requires_department_match() {
        let pid = Uuid::new_v4();
        let memberships = [membership(pid, "b", GroupRole::Lead)];
        let privileges = derive_privileges(Some(pid), "x@y.z", &memberships, &[], REP_GROUP);

        assert!(relevant_when_closed(&request(RequestStatus::Closed, "B"), &privileges));
        assert!(!relevant_when_closed(&request(RequestStatus::Closed, "C"), &privileges));
    }

    #[test]
    fn relevance_only_applies_to_closed_requests() {
        let roles = [desk_assignment(None, Some("c@y.z"), FinanceDesk::Cashier)];
        let privileges = derive_privileges(None, "c@y.z", &[], &roles, REP_GROUP);

        assert!(!relevant_when_closed(&request(RequestStatus::PendingCashier, "b"), &privileges));
    }
}

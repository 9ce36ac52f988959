// src/services/queue_service.rs

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FinanceRepository, PortalRepository},
    models::finance::{FinanceAction, FinanceRequest, RequestStatus},
    models::person::{normalize_email, ActorIdentity, PrivilegeSet},
    models::queues::{ApprovalQueues, CompletedView, QueuesResponse},
    services::eligibility::{derive_privileges, relevant_when_closed, resolve_role},
};

/// Particiona o snapshot de solicitações nas quatro filas da tela.
///
/// Função pura: dois chamados com as mesmas entradas produzem a mesma
/// saída, na mesma ordem. As filas saem ordenadas da mais nova para a
/// mais antiga.
///
/// Invariante: uma solicitação aparece no máximo em uma das filas
/// pending/in_progress. A exclusão é explícita (else-if), porque só a
/// partição por status não bastaria: a solicitação do próprio ator pode
/// estar pendente para OUTRA pessoa, e não pode aparecer duplicada.
pub fn partition(
    requests: &[FinanceRequest],
    identity: &ActorIdentity,
    privileges: &PrivilegeSet,
    own_actions: &[FinanceAction],
    completed_view: CompletedView,
) -> ApprovalQueues {
    // Solicitações em que o ator já agiu (casadas pelo id da solicitação)
    let acted_on: HashSet<Uuid> = own_actions.iter().map(|a| a.request_id).collect();

    let mut queues = ApprovalQueues::default();

    for request in requests {
        if resolve_role(request, privileges).is_some() {
            // 1. Pendente para mim: tenho um papel que trava esta solicitação
            queues.pending.push(request.clone());
        } else if request.status.is_pending()
            && (identity.is_applicant(request) || acted_on.contains(&request.id))
        {
            // 2. Em andamento: sou o solicitante ou já agi, mas não travo mais.
            //    De propósito NÃO olhamos ações de terceiros: um caixa que
            //    nunca agiu não vê a solicitação no meio da cadeia.
            queues.in_progress.push(request.clone());
        } else if request.status == RequestStatus::Closed {
            // 3. Concluídas, conforme o modo de exibição
            let visible = match completed_view {
                CompletedView::All => true,
                CompletedView::Relevant => relevant_when_closed(request, privileges),
            };
            if visible {
                queues.completed.push(request.clone());
            }
        } else if request.status == RequestStatus::Returned && identity.is_applicant(request) {
            // 4. Devolvidas ao solicitante
            queues.returned.push(request.clone());
        }
    }

    for queue in [
        &mut queues.pending,
        &mut queues.in_progress,
        &mut queues.completed,
        &mut queues.returned,
    ] {
        // sort estável: empates preservam a ordem de chegada
        queue.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    queues
}

// O serviço que monta a resposta da tela: carrega o snapshot, deriva os
// privilégios e particiona. Nada aqui guarda estado entre chamadas.
#[derive(Clone)]
pub struct QueueService {
    portal_repo: PortalRepository,
    finance_repo: FinanceRepository,
    rep_group_id: String,
}

impl QueueService {
    pub fn new(
        portal_repo: PortalRepository,
        finance_repo: FinanceRepository,
        rep_group_id: String,
    ) -> Self {
        Self {
            portal_repo,
            finance_repo,
            rep_group_id,
        }
    }

    pub async fn build_queues(
        &self,
        identity: ActorIdentity,
        completed_view: CompletedView,
    ) -> Result<QueuesResponse, AppError> {
        // 1. As três cargas não dependem entre si; disparamos em paralelo
        //    e só recomputamos depois que todas resolverem.
        let (bootstrap, requests, own_actions) = tokio::join!(
            self.portal_repo.fetch_bootstrap(),
            self.finance_repo.fetch_requests(),
            self.load_own_actions(&identity),
        );

        // Bootstrap e lista de solicitações são fatais se falharem
        let bootstrap = bootstrap?;
        let requests = requests?;

        // 2. Resolução tardia: se a identidade ainda não tem id, tenta
        //    casar o e-mail com o roster que acabou de chegar.
        let roster_hit = bootstrap
            .people
            .iter()
            .find(|p| normalize_email(&p.email) == identity.email());
        let identity = match roster_hit {
            Some(person) => identity.enriched_with(person),
            None => identity,
        };

        // 3. Privilégios derivados deste snapshot
        let privileges = derive_privileges(
            identity.person_id(),
            identity.email(),
            &bootstrap.memberships,
            &bootstrap.finance_roles,
            &self.rep_group_id,
        );

        // 4. Partição pura
        let queues = partition(&requests, &identity, &privileges, &own_actions, completed_view);

        // 5. Resumo da última ação por solicitação visível (melhor esforço)
        let visible_ids: Vec<Uuid> = queues
            .pending
            .iter()
            .chain(queues.in_progress.iter())
            .map(|r| r.id)
            .collect();
        let latest_actions = self.load_latest_actions(&visible_ids).await;

        Ok(QueuesResponse {
            identity,
            privileges,
            queues,
            latest_actions,
        })
    }

    // O histórico do próprio ator é um enriquecimento opcional: se a
    // consulta falhar, seguimos com lista vazia e a tela continua de pé.
    async fn load_own_actions(&self, identity: &ActorIdentity) -> Vec<FinanceAction> {
        match self
            .finance_repo
            .actions_by_actor_names(&identity.known_names())
            .await
        {
            Ok(actions) => actions,
            Err(e) => {
                tracing::warn!("Histórico de ações indisponível, seguindo sem ele: {}", e);
                Vec::new()
            }
        }
    }

    async fn load_latest_actions(&self, request_ids: &[Uuid]) -> HashMap<Uuid, FinanceAction> {
        match self.finance_repo.latest_actions_summary(request_ids).await {
            Ok(actions) => actions.into_iter().map(|a| (a.request_id, a)).collect(),
            Err(e) => {
                tracing::warn!("Resumo de ações indisponível, seguindo sem ele: {}", e);
                HashMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::finance::{ActionKind, ApprovalRole, RequestKind};
    use crate::models::person::{FinanceDesk, FinanceRoleAssignment, GroupMembership, GroupRole};

    const REP_GROUP: &str = "representantes";

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, minute, 0).unwrap()
    }

    fn request(
        status: RequestStatus,
        department: &str,
        applicant_email: &str,
        minute: u32,
    ) -> FinanceRequest {
        FinanceRequest {
            id: Uuid::new_v4(),
            kind: RequestKind::Purchase,
            status,
            title: "Solicitação de teste".to_string(),
            applicant_id: None,
            applicant_email: applicant_email.to_string(),
            applicant_name: "Solicitante".to_string(),
            applicant_department: department.to_string(),
            amount_estimated: Decimal::new(10000, 2),
            amount_actual: None,
            attachments: Vec::new(),
            created_at: ts(minute),
            updated_at: None,
        }
    }

    fn actor(person_id: Uuid) -> ActorIdentity {
        ActorIdentity::Resolved {
            person_id,
            email: "ator@escola.example".to_string(),
            display_name: "Ator Teste".to_string(),
        }
    }

    fn lead_of(person_id: Uuid, group: &str) -> PrivilegeSet {
        let memberships = [GroupMembership {
            id: Uuid::new_v4(),
            person_id,
            group_id: group.to_string(),
            role_in_group: GroupRole::Lead,
        }];
        derive_privileges(Some(person_id), "ator@escola.example", &memberships, &[], REP_GROUP)
    }

    fn cashier_only() -> PrivilegeSet {
        let roles = [FinanceRoleAssignment {
            id: Uuid::new_v4(),
            person_id: None,
            person_email: Some("ator@escola.example".to_string()),
            desk: FinanceDesk::Cashier,
        }];
        derive_privileges(None, "ator@escola.example", &[], &roles, REP_GROUP)
    }

    fn own_action(request_id: Uuid) -> FinanceAction {
        FinanceAction {
            id: Uuid::new_v4(),
            request_id,
            actor_role: ApprovalRole::Cashier,
            actor_name: "Ator Teste".to_string(),
            action: ActionKind::Approve,
            note: None,
            created_at: ts(0),
        }
    }

    fn ids(queue: &[FinanceRequest]) -> Vec<Uuid> {
        queue.iter().map(|r| r.id).collect()
    }

    #[test]
    fn pending_and_in_progress_are_disjoint_by_id() {
        // O ator lidera "b" e é solicitante de uma PENDING_LEAD do próprio
        // grupo: ele trava a solicitação, então ela vai para pending e
        // NÃO pode duplicar em in_progress.
        let pid = Uuid::new_v4();
        let privileges = lead_of(pid, "b");
        let identity = actor(pid);

        let own_pending = request(RequestStatus::PendingLead, "b", "ator@escola.example", 1);
        let own_downstream = request(RequestStatus::PendingCashier, "b", "ator@escola.example", 2);
        let requests = vec![own_pending.clone(), own_downstream.clone()];

        let queues = partition(&requests, &identity, &privileges, &[], CompletedView::Relevant);

        assert_eq!(ids(&queues.pending), vec![own_pending.id]);
        assert_eq!(ids(&queues.in_progress), vec![own_downstream.id]);

        let pending_ids: HashSet<Uuid> = ids(&queues.pending).into_iter().collect();
        let in_progress_ids: HashSet<Uuid> = ids(&queues.in_progress).into_iter().collect();
        assert!(pending_ids.is_disjoint(&in_progress_ids));
    }

    #[test]
    fn scenario_c_applicant_without_privilege_sees_in_progress() {
        // Solicitante de uma PENDING_ACCOUNTING sem privilégio de
        // contabilidade: aparece em andamento, nunca em pendentes.
        let identity = ActorIdentity::Unresolved {
            email: "ator@escola.example".to_string(),
            display_name: "Ator Teste".to_string(),
        };
        let privileges = PrivilegeSet::default();

        let req = request(RequestStatus::PendingAccounting, "b", "ator@escola.example", 1);
        let queues = partition(
            &[req.clone()],
            &identity,
            &privileges,
            &[],
            CompletedView::Relevant,
        );

        assert!(queues.pending.is_empty());
        assert_eq!(ids(&queues.in_progress), vec![req.id]);
    }

    #[test]
    fn prior_approver_keeps_visibility_via_own_action_history() {
        // O ator já agiu nesta solicitação (consta no próprio histórico);
        // ela seguiu adiante na cadeia, mas continua visível em andamento.
        let identity = actor(Uuid::new_v4());
        let privileges = cashier_only();

        let req = request(RequestStatus::PendingCommittee, "b", "outro@escola.example", 1);
        let history = [own_action(req.id)];

        let queues = partition(
            &[req.clone()],
            &identity,
            &privileges,
            &history,
            CompletedView::Relevant,
        );
        assert_eq!(ids(&queues.in_progress), vec![req.id]);

        // Sem o histórico, o mesmo ator não vê nada: ações de terceiros
        // não contam (visibilidade mínima, de propósito).
        let queues = partition(&[req], &identity, &privileges, &[], CompletedView::Relevant);
        assert!(queues.in_progress.is_empty());
    }

    #[test]
    fn scenario_d_completed_relevant_vs_all() {
        let identity = actor(Uuid::new_v4());
        let privileges = cashier_only();

        let closed_a = request(RequestStatus::Closed, "b", "x@y.z", 1);
        let closed_b = request(RequestStatus::Closed, "c", "x@y.z", 2);
        let requests = vec![closed_a.clone(), closed_b.clone()];

        // Caixa tem alcance total da cadeia: vê tudo já no modo relevante
        let relevant = partition(&requests, &identity, &privileges, &[], CompletedView::Relevant);
        assert_eq!(relevant.completed.len(), 2);

        // Um líder de departamento alheio só vê as dele no modo relevante...
        let pid = Uuid::new_v4();
        let lead_privileges = lead_of(pid, "b");
        let relevant = partition(
            &requests,
            &actor(pid),
            &lead_privileges,
            &[],
            CompletedView::Relevant,
        );
        assert_eq!(ids(&relevant.completed), vec![closed_a.id]);

        // ...e todas no modo "all"
        let all = partition(&requests, &actor(pid), &lead_privileges, &[], CompletedView::All);
        assert_eq!(all.completed.len(), 2);
    }

    #[test]
    fn scenario_e_returned_matches_applicant_email_case_insensitive() {
        let identity = ActorIdentity::Unresolved {
            email: "ator@escola.example".to_string(),
            display_name: "Ator Teste".to_string(),
        };
        let privileges = PrivilegeSet::default();

        let mine = request(RequestStatus::Returned, "b", "  Ator@Escola.Example ", 1);
        let someone_elses = request(RequestStatus::Returned, "b", "outra@escola.example", 2);

        let queues = partition(
            &[mine.clone(), someone_elses],
            &identity,
            &privileges,
            &[],
            CompletedView::Relevant,
        );

        assert_eq!(ids(&queues.returned), vec![mine.id]);
    }

    #[test]
    fn queues_are_sorted_newest_first() {
        let pid = Uuid::new_v4();
        let privileges = lead_of(pid, "b");
        let identity = actor(pid);

        // Entrada propositalmente fora de ordem
        let requests = vec![
            request(RequestStatus::PendingLead, "b", "x@y.z", 5),
            request(RequestStatus::PendingLead, "b", "x@y.z", 30),
            request(RequestStatus::PendingLead, "b", "x@y.z", 12),
        ];

        let queues = partition(&requests, &identity, &privileges, &[], CompletedView::Relevant);

        assert_eq!(queues.pending.len(), 3);
        for pair in queues.pending.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[test]
    fn partition_is_idempotent_and_order_preserving() {
        let pid = Uuid::new_v4();
        let privileges = lead_of(pid, "b");
        let identity = actor(pid);

        let requests = vec![
            request(RequestStatus::PendingLead, "b", "x@y.z", 3),
            request(RequestStatus::PendingCashier, "b", "ator@escola.example", 7),
            request(RequestStatus::Closed, "b", "x@y.z", 9),
            request(RequestStatus::Returned, "b", "ator@escola.example", 11),
        ];

        let first = partition(&requests, &identity, &privileges, &[], CompletedView::Relevant);
        let second = partition(&requests, &identity, &privileges, &[], CompletedView::Relevant);

        assert_eq!(ids(&first.pending), ids(&second.pending));
        assert_eq!(ids(&first.in_progress), ids(&second.in_progress));
        assert_eq!(ids(&first.completed), ids(&second.completed));
        assert_eq!(ids(&first.returned), ids(&second.returned));
    }

    #[test]
    fn returned_requests_of_others_stay_hidden() {
        let identity = actor(Uuid::new_v4());
        let privileges = PrivilegeSet::default();

        let req = request(RequestStatus::Returned, "b", "outra@escola.example", 1);
        let queues = partition(&[req], &identity, &privileges, &[], CompletedView::All);

        assert!(queues.returned.is_empty());
        assert!(queues.pending.is_empty());
        assert!(queues.in_progress.is_empty());
    }
}

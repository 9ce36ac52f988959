// src/services/approval_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FinanceRepository, PortalRepository},
    models::finance::{ActionKind, FinanceAction, FinanceRequest, RequestKind, RequestStatus},
    models::person::{ActorIdentity, PrivilegeSet},
    services::eligibility::{derive_privileges, resolve_role},
};

// A única operação que muda estado no sistema inteiro: registrar uma
// aprovação/devolução e avançar o status. Tudo dentro de uma transação;
// nunca fica mutação parcial para trás.
#[derive(Clone)]
pub struct ApprovalService {
    finance_repo: FinanceRepository,
    portal_repo: PortalRepository,
    pool: PgPool,
    rep_group_id: String,
}

impl ApprovalService {
    pub fn new(
        finance_repo: FinanceRepository,
        portal_repo: PortalRepository,
        pool: PgPool,
        rep_group_id: String,
    ) -> Self {
        Self {
            finance_repo,
            portal_repo,
            pool,
            rep_group_id,
        }
    }

    /// Privilégios do ator, derivados na hora dos dados de referência.
    pub async fn privileges_for(
        &self,
        identity: &ActorIdentity,
    ) -> Result<PrivilegeSet, AppError> {
        let memberships = match identity.person_id() {
            Some(person_id) => self.portal_repo.memberships_for(person_id).await?,
            None => Vec::new(),
        };
        let finance_roles = self
            .portal_repo
            .finance_roles_for(identity.person_id(), identity.email())
            .await?;
        Ok(derive_privileges(
            identity.person_id(),
            identity.email(),
            &memberships,
            &finance_roles,
            &self.rep_group_id,
        ))
    }

    pub async fn submit(
        &self,
        request_id: Uuid,
        identity: &ActorIdentity,
        action: ActionKind,
        note: Option<String>,
    ) -> Result<FinanceRequest, AppError> {
        // 1. Deriva os privilégios atuais do ator (fora da transação:
        //    são dados de referência, somente leitura)
        let privileges = self.privileges_for(identity).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 2. Recarrega a solicitação com lock. Duas submissões
        //    concorrentes se serializam aqui: a segunda vai reavaliar
        //    contra o status que a primeira deixou.
        let request = self
            .finance_repo
            .find_request_for_update(&mut *tx, request_id)
            .await?
            .ok_or(AppError::RequestNotFound)?;

        // 3. Porta de elegibilidade, reavaliada contra o status ATUAL
        let Some(role) = resolve_role(&request, &privileges) else {
            // Distingue "perdeu a corrida" de "nunca teve alçada"
            return if request.status.is_pending() {
                Err(AppError::NotEligible)
            } else {
                Err(AppError::RequestNotActionable)
            };
            // O rollback é automático quando `tx` sai de escopo
        };

        // 4. Registra a ação e avança o status, na mesma transação
        self.finance_repo
            .insert_action(
                &mut *tx,
                request_id,
                role,
                identity.display_name(),
                action,
                note.as_deref(),
            )
            .await?;

        let new_status = match action {
            ActionKind::Approve => request
                .status
                .next_on_approve()
                .ok_or(AppError::RequestNotActionable)?,
            ActionKind::Return => RequestStatus::Returned,
        };
        self.finance_repo
            .update_status(&mut *tx, request_id, new_status)
            .await?;

        // 5. Commit
        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(
            "✅ Ação {:?} registrada em {} como {:?} (valor efetivo: {})",
            action,
            request_id,
            role,
            request.effective_amount()
        );

        Ok(FinanceRequest {
            status: new_status,
            ..request
        })
    }

    /// Trilha completa de uma solicitação. Falha aqui é fatal para a
    /// tela de detalhe (diferente dos resumos, que são melhor-esforço).
    pub async fn actions_for_request(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<FinanceAction>, AppError> {
        self.finance_repo.actions_for_request(request_id).await
    }

    // Criação de solicitação: nasce no primeiro degrau da cadeia com o
    // ator como solicitante.
    pub async fn create_request(
        &self,
        identity: &ActorIdentity,
        kind: RequestKind,
        title: &str,
        department: &str,
        amount_estimated: Decimal,
        attachments: &[String],
    ) -> Result<FinanceRequest, AppError> {
        let request = self
            .finance_repo
            .create_request(
                &self.pool,
                kind,
                title,
                identity.person_id(),
                identity.email(),
                identity.display_name(),
                department,
                amount_estimated,
                attachments,
            )
            .await?;

        tracing::info!("📄 Solicitação {} criada por {}", request.id, identity.email());
        Ok(request)
    }
}

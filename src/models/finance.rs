// src/models/finance.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    Purchase, // Compra (o orçamento estimado manda)
    Expense,  // Reembolso / despesa (o valor real manda)
}

// O ciclo de vida da solicitação. A cadeia de aprovação é monotônica:
// PendingLead -> PendingRep -> PendingCommittee -> PendingAccounting
// -> PendingCashier -> Closed. Returned é alcançável de qualquer
// status pendente e é terminal aqui (reenvio fica fora deste módulo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Draft, // Rascunho: nenhum papel atua sobre ele
    PendingLead,
    PendingRep,
    PendingCommittee,
    PendingAccounting,
    PendingCashier,
    Closed,
    Returned,
}

impl RequestStatus {
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            RequestStatus::PendingLead
                | RequestStatus::PendingRep
                | RequestStatus::PendingCommittee
                | RequestStatus::PendingAccounting
                | RequestStatus::PendingCashier
        )
    }

    /// Próximo passo da cadeia ao aprovar. Mapeamento total: status
    /// terminais (e rascunho) devolvem None em vez de cair num "default"
    /// acidental.
    pub fn next_on_approve(self) -> Option<RequestStatus> {
        match self {
            RequestStatus::PendingLead => Some(RequestStatus::PendingRep),
            RequestStatus::PendingRep => Some(RequestStatus::PendingCommittee),
            RequestStatus::PendingCommittee => Some(RequestStatus::PendingAccounting),
            RequestStatus::PendingAccounting => Some(RequestStatus::PendingCashier),
            RequestStatus::PendingCashier => Some(RequestStatus::Closed),
            RequestStatus::Draft | RequestStatus::Closed | RequestStatus::Returned => None,
        }
    }
}

// Papel sob o qual um ator pode agir. Auditor não aparece aqui:
// auditoria observa, nunca aprova.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalRole {
    Lead,
    Rep,
    Committee,
    Accounting,
    Cashier,
}

impl ApprovalRole {
    /// Ordem fixa de prioridade da resolução. O primeiro papel que casar
    /// vence: um ator age numa única capacidade por solicitação.
    pub const PRIORITY: [ApprovalRole; 5] = [
        ApprovalRole::Lead,
        ApprovalRole::Rep,
        ApprovalRole::Committee,
        ApprovalRole::Accounting,
        ApprovalRole::Cashier,
    ];

    /// Mapeamento total papel -> status exigido da solicitação.
    pub fn required_status(self) -> RequestStatus {
        match self {
            ApprovalRole::Lead => RequestStatus::PendingLead,
            ApprovalRole::Rep => RequestStatus::PendingRep,
            ApprovalRole::Committee => RequestStatus::PendingCommittee,
            ApprovalRole::Accounting => RequestStatus::PendingAccounting,
            ApprovalRole::Cashier => RequestStatus::PendingCashier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "action_kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Approve,
    Return,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceRequest {
    pub id: Uuid,

    pub kind: RequestKind,
    pub status: RequestStatus,

    #[schema(example = "Material para a feira de ciências")]
    pub title: String,

    // Solicitante. O id pode estar ausente (formulário preenchido antes
    // de a pessoa entrar no roster); o e-mail é o fallback de identidade.
    pub applicant_id: Option<Uuid>,
    pub applicant_email: String,
    pub applicant_name: String,

    #[schema(example = "turma-b")]
    pub applicant_department: String,

    // Valores
    #[schema(example = "350.00")]
    pub amount_estimated: Decimal,
    #[schema(example = "342.90")]
    pub amount_actual: Option<Decimal>,

    pub attachments: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FinanceRequest {
    /// Qual valor vale para esta solicitação depende do tipo dela.
    /// Compra: o orçamento estimado é o autoritativo. Despesa: o valor
    /// real, com fallback para a estimativa enquanto ele não existe.
    pub fn effective_amount(&self) -> Decimal {
        match self.kind {
            RequestKind::Purchase => self.amount_estimated,
            RequestKind::Expense => self.amount_actual.unwrap_or(self.amount_estimated),
        }
    }
}

// Registro imutável de auditoria. Criado a cada aprovação/devolução,
// nunca editado nem apagado por este sistema.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceAction {
    pub id: Uuid,
    pub request_id: Uuid,
    pub actor_role: ApprovalRole,

    #[schema(example = "Maria Souza")]
    pub actor_name: String,

    pub action: ActionKind,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_chain_is_monotonic_until_closed() {
        // Partindo do primeiro status pendente, a cadeia tem que chegar
        // em Closed sem repetir status.
        let mut seen = vec![RequestStatus::PendingLead];
        let mut status = RequestStatus::PendingLead;
        while let Some(next) = status.next_on_approve() {
            assert!(!seen.contains(&next), "cadeia repetiu o status {:?}", next);
            seen.push(next);
            status = next;
        }
        assert_eq!(status, RequestStatus::Closed);
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn terminal_statuses_have_no_next_step() {
        assert_eq!(RequestStatus::Draft.next_on_approve(), None);
        assert_eq!(RequestStatus::Closed.next_on_approve(), None);
        assert_eq!(RequestStatus::Returned.next_on_approve(), None);
    }

    #[test]
    fn every_role_requires_a_pending_status() {
        for role in ApprovalRole::PRIORITY {
            assert!(role.required_status().is_pending());
        }
    }
}

// src/models/person.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::finance::{ApprovalRole, FinanceRequest};

// --- Normalização ---
// Toda comparação de e-mail e de grupo no sistema passa por aqui.
// Dados vindos de planilha chegam com espaços e caixa inconsistente.

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn normalize_group(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "group_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupRole {
    Lead,   // Líder do grupo
    Deputy, // Vice-líder
    Member, // Membro comum
}

// Papéis do setor financeiro. Auditor observa tudo mas nunca trava
// uma solicitação na fila "pendente para mim".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "finance_desk", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinanceDesk {
    Accounting,
    Cashier,
    Auditor,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "maria@escola.example")]
    pub email: String,

    #[schema(example = "Maria Souza")]
    pub display_name: String,

    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub id: Uuid,
    pub person_id: Uuid,

    #[schema(example = "turma-b")]
    pub group_id: String,

    pub role_in_group: GroupRole,
}

// O vínculo com o financeiro pode vir por id ou, como fallback, por e-mail.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceRoleAssignment {
    pub id: Uuid,
    pub person_id: Option<Uuid>,
    pub person_email: Option<String>,
    pub desk: FinanceDesk,
}

impl FinanceRoleAssignment {
    /// Verifica se este vínculo pertence ao ator (id primeiro, e-mail como fallback).
    pub fn belongs_to(&self, person_id: Option<Uuid>, email: &str) -> bool {
        if let (Some(mine), Some(theirs)) = (self.person_id, person_id) {
            if mine == theirs {
                return true;
            }
        }
        self.person_email
            .as_deref()
            .map(|e| normalize_email(e) == email)
            .unwrap_or(false)
    }
}

// ---
// Identidade do ator em dois estágios
// ---
// O provedor de login entrega no mínimo um e-mail. A resolução contra o
// roster enriquece a identidade com o id da pessoa, no máximo uma vez.
// A transição Unresolved -> Resolved nunca é revertida; ficar sem id
// não é erro, é só um estado degradado (o ator vê menos filas).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ActorIdentity {
    Unresolved {
        email: String,
        display_name: String,
    },
    Resolved {
        person_id: Uuid,
        email: String,
        display_name: String,
    },
}

impl ActorIdentity {
    pub fn person_id(&self) -> Option<Uuid> {
        match self {
            ActorIdentity::Unresolved { .. } => None,
            ActorIdentity::Resolved { person_id, .. } => Some(*person_id),
        }
    }

    /// E-mail já normalizado (os construtores garantem isso).
    pub fn email(&self) -> &str {
        match self {
            ActorIdentity::Unresolved { email, .. } => email,
            ActorIdentity::Resolved { email, .. } => email,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ActorIdentity::Unresolved { display_name, .. } => display_name,
            ActorIdentity::Resolved { display_name, .. } => display_name,
        }
    }

    /// Transição de mão única: um ator sem id ganha o registro do roster.
    /// Se a identidade já estava resolvida, nada muda.
    pub fn enriched_with(self, person: &Person) -> ActorIdentity {
        match self {
            ActorIdentity::Unresolved { email, .. } => ActorIdentity::Resolved {
                person_id: person.id,
                email,
                display_name: person.display_name.clone(),
            },
            resolved => resolved,
        }
    }

    /// Nomes pelos quais o ator pode aparecer na trilha de auditoria.
    /// A trilha guarda o nome de exibição da época, então buscamos pelos dois.
    pub fn known_names(&self) -> Vec<String> {
        let mut names = vec![self.display_name().to_string()];
        if self.display_name() != self.email() {
            names.push(self.email().to_string());
        }
        names
    }

    /// O ator é o solicitante? Primeiro por id, depois por e-mail
    /// (case-insensitive). Campos ausentes falham para "não".
    pub fn is_applicant(&self, request: &FinanceRequest) -> bool {
        if let (Some(mine), Some(theirs)) = (self.person_id(), request.applicant_id) {
            if mine == theirs {
                return true;
            }
        }
        !request.applicant_email.trim().is_empty()
            && normalize_email(&request.applicant_email) == self.email()
    }
}

// ---
// Conjunto de privilégios derivado por carga
// ---
// Nunca é persistido. Recalculado a cada snapshot a partir de
// GroupMembership + FinanceRoleAssignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeSet {
    pub lead: bool,
    pub rep: bool,
    pub committee: bool,
    pub accounting: bool,
    pub cashier: bool,
    pub auditor: bool,

    /// Grupos que o ator lidera (já normalizados)
    pub lead_groups: Vec<String>,
    /// Grupos em que o ator é vice (já normalizados)
    pub deputy_groups: Vec<String>,
}

impl PrivilegeSet {
    /// Auditor fica de fora de propósito: ele nunca trava solicitação.
    pub fn holds(&self, role: ApprovalRole) -> bool {
        match role {
            ApprovalRole::Lead => self.lead,
            ApprovalRole::Rep => self.rep,
            ApprovalRole::Committee => self.committee,
            ApprovalRole::Accounting => self.accounting,
            ApprovalRole::Cashier => self.cashier,
        }
    }

    /// O departamento está no escopo do ator (liderança ou vice)?
    pub fn covers_department(&self, department: &str) -> bool {
        !department.is_empty()
            && (self.lead_groups.iter().any(|g| g == department)
                || self.deputy_groups.iter().any(|g| g == department))
    }
}

// src/models/queues.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::finance::{FinanceAction, FinanceRequest};
use crate::models::person::{ActorIdentity, PrivilegeSet};

/// Modo de exibição da fila de concluídas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CompletedView {
    /// Só o que plausivelmente passou pela alçada do ator
    #[default]
    Relevant,
    /// Todas as solicitações fechadas
    All,
}

// As quatro filas da tela de aprovações. Todas ordenadas da mais nova
// para a mais antiga. Uma solicitação aparece no máximo em uma das duas
// primeiras (exclusão explícita, não só partição por status).
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalQueues {
    /// Pendentes para o ator agir agora
    pub pending: Vec<FinanceRequest>,
    /// Em andamento: o ator é solicitante ou já agiu, mas não trava mais
    pub in_progress: Vec<FinanceRequest>,
    /// Fechadas (filtradas conforme CompletedView)
    pub completed: Vec<FinanceRequest>,
    /// Devolvidas ao ator (ele é o solicitante)
    pub returned: Vec<FinanceRequest>,
}

/// Resposta completa da rota de filas.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueuesResponse {
    pub identity: ActorIdentity,
    pub privileges: PrivilegeSet,
    pub queues: ApprovalQueues,

    /// Última ação registrada por solicitação visível. Melhor esforço:
    /// se a consulta falhar, o mapa vem vazio e a tela segue funcionando.
    pub latest_actions: HashMap<Uuid, FinanceAction>,
}

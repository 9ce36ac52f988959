// src/db/finance_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::finance::{
        ActionKind, ApprovalRole, FinanceAction, FinanceRequest, RequestKind, RequestStatus,
    },
};

const REQUEST_COLUMNS: &str = r#"
    id, kind, status, title,
    applicant_id, applicant_email, applicant_name, applicant_department,
    amount_estimated, amount_actual, attachments,
    created_at, updated_at
"#;

#[derive(Clone)]
pub struct FinanceRepository {
    pool: PgPool,
}

impl FinanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  SOLICITAÇÕES
    // =========================================================================

    pub async fn fetch_requests(&self) -> Result<Vec<FinanceRequest>, AppError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM finance_requests WHERE status <> 'DRAFT' ORDER BY created_at DESC"
        );
        let requests = sqlx::query_as::<_, FinanceRequest>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(requests)
    }

    // Recarrega a linha com lock pessimista. É o que serializa duas
    // submissões concorrentes sobre a mesma solicitação.
    pub async fn find_request_for_update<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Option<FinanceRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM finance_requests WHERE id = $1 FOR UPDATE");
        let request = sqlx::query_as::<_, FinanceRequest>(&sql)
            .bind(request_id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    pub async fn create_request<'e, E>(
        &self,
        executor: E,
        kind: RequestKind,
        title: &str,
        applicant_id: Option<Uuid>,
        applicant_email: &str,
        applicant_name: &str,
        applicant_department: &str,
        amount_estimated: Decimal,
        attachments: &[String],
    ) -> Result<FinanceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Toda solicitação nasce no primeiro degrau da cadeia
        let sql = format!(
            r#"
            INSERT INTO finance_requests (
                kind, title,
                applicant_id, applicant_email, applicant_name, applicant_department,
                amount_estimated, attachments, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'PENDING_LEAD')
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let request = sqlx::query_as::<_, FinanceRequest>(&sql)
            .bind(kind)
            .bind(title)
            .bind(applicant_id)
            .bind(applicant_email)
            .bind(applicant_name)
            .bind(applicant_department)
            .bind(amount_estimated)
            .bind(attachments)
            .fetch_one(executor)
            .await?;
        Ok(request)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE finance_requests SET status = $2, updated_at = now() WHERE id = $1")
            .bind(request_id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  TRILHA DE AUDITORIA (append-only)
    // =========================================================================

    pub async fn insert_action<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        actor_role: ApprovalRole,
        actor_name: &str,
        action: ActionKind,
        note: Option<&str>,
    ) -> Result<FinanceAction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let inserted = sqlx::query_as::<_, FinanceAction>(
            r#"
            INSERT INTO finance_actions (request_id, actor_role, actor_name, action, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, request_id, actor_role, actor_name, action, note, created_at
            "#,
        )
        .bind(request_id)
        .bind(actor_role)
        .bind(actor_name)
        .bind(action)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(inserted)
    }

    pub async fn actions_for_request(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<FinanceAction>, AppError> {
        let actions = sqlx::query_as::<_, FinanceAction>(
            r#"
            SELECT id, request_id, actor_role, actor_name, action, note, created_at
            FROM finance_actions
            WHERE request_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(actions)
    }

    // Histórico do próprio ator. A trilha guarda o nome de exibição da
    // época, por isso a busca aceita uma lista de nomes possíveis.
    pub async fn actions_by_actor_names(
        &self,
        names: &[String],
    ) -> Result<Vec<FinanceAction>, AppError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let actions = sqlx::query_as::<_, FinanceAction>(
            r#"
            SELECT id, request_id, actor_role, actor_name, action, note, created_at
            FROM finance_actions
            WHERE actor_name = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await?;
        Ok(actions)
    }

    /// Última ação de cada solicitação da lista, em uma consulta só.
    pub async fn latest_actions_summary(
        &self,
        request_ids: &[Uuid],
    ) -> Result<Vec<FinanceAction>, AppError> {
        if request_ids.is_empty() {
            return Ok(Vec::new());
        }
        let actions = sqlx::query_as::<_, FinanceAction>(
            r#"
            SELECT DISTINCT ON (request_id)
                id, request_id, actor_role, actor_name, action, note, created_at
            FROM finance_actions
            WHERE request_id = ANY($1)
            ORDER BY request_id, created_at DESC
            "#,
        )
        .bind(request_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(actions)
    }
}

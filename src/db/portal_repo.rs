// src/db/portal_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::person::{FinanceRoleAssignment, GroupMembership, Person},
};

/// Snapshot dos dados de referência que o motor de elegibilidade consome.
/// É recarregado inteiro a cada ciclo; não há atualização incremental.
#[derive(Debug, Clone)]
pub struct BootstrapData {
    pub people: Vec<Person>,
    pub memberships: Vec<GroupMembership>,
    pub finance_roles: Vec<FinanceRoleAssignment>,
}

// O repositório dos dados de referência do portal: roster, grupos e
// papéis do financeiro. Tudo aqui é somente leitura para este sistema.
#[derive(Clone)]
pub struct PortalRepository {
    pool: PgPool,
}

impl PortalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// As três listas não dependem uma da outra, então disparamos as
    /// consultas em paralelo. Se qualquer uma falhar, o bootstrap inteiro
    /// falha (erro fatal para a tela, sem retry automático).
    pub async fn fetch_bootstrap(&self) -> Result<BootstrapData, AppError> {
        let (people, memberships, finance_roles) = tokio::try_join!(
            self.fetch_people(),
            self.fetch_memberships(),
            self.fetch_finance_roles(),
        )?;

        Ok(BootstrapData {
            people,
            memberships,
            finance_roles,
        })
    }

    async fn fetch_people(&self) -> Result<Vec<Person>, AppError> {
        let people = sqlx::query_as::<_, Person>(
            "SELECT id, email, display_name, created_at FROM people ORDER BY display_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(people)
    }

    async fn fetch_memberships(&self) -> Result<Vec<GroupMembership>, AppError> {
        let memberships = sqlx::query_as::<_, GroupMembership>(
            "SELECT id, person_id, group_id, role_in_group FROM group_memberships",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    async fn fetch_finance_roles(&self) -> Result<Vec<FinanceRoleAssignment>, AppError> {
        let roles = sqlx::query_as::<_, FinanceRoleAssignment>(
            "SELECT id, person_id, person_email, desk FROM finance_role_assignments",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    // Busca no roster pelo e-mail normalizado (o índice é em lower(email))
    pub async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>, AppError> {
        let maybe_person = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, email, display_name, created_at
            FROM people
            WHERE lower(email) = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_person)
    }

    pub async fn memberships_for(
        &self,
        person_id: Uuid,
    ) -> Result<Vec<GroupMembership>, AppError> {
        let memberships = sqlx::query_as::<_, GroupMembership>(
            r#"
            SELECT id, person_id, group_id, role_in_group
            FROM group_memberships
            WHERE person_id = $1
            "#,
        )
        .bind(person_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    // O vínculo com o financeiro pode estar registrado por id ou só por
    // e-mail, então a consulta cobre os dois caminhos.
    pub async fn finance_roles_for(
        &self,
        person_id: Option<Uuid>,
        email: &str,
    ) -> Result<Vec<FinanceRoleAssignment>, AppError> {
        let roles = sqlx::query_as::<_, FinanceRoleAssignment>(
            r#"
            SELECT id, person_id, person_email, desk
            FROM finance_role_assignments
            WHERE ($1::uuid IS NOT NULL AND person_id = $1)
               OR lower(person_email) = $2
            "#,
        )
        .bind(person_id)
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }
}

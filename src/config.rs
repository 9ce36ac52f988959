// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{FinanceRepository, IdentityRepository, PortalRepository},
    services::{
        approval_service::ApprovalService, identity_service::IdentityService,
        queue_service::QueueService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,

    // Os serviços ficam no estado, montados uma vez na subida
    pub identity_service: IdentityService,
    pub queue_service: QueueService,
    pub approval_service: ApprovalService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // O grupo distinguido dos representantes. É um id fixo da
        // organização; configurável só para não ficar cravado no código.
        let rep_group_id =
            env::var("REP_GROUP_ID").unwrap_or_else(|_| "representantes".to_string());

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let portal_repo = PortalRepository::new(db_pool.clone());
        let finance_repo = FinanceRepository::new(db_pool.clone());
        let identity_repo = IdentityRepository::new(db_pool.clone());

        let identity_service = IdentityService::new(portal_repo.clone(), identity_repo);
        let queue_service = QueueService::new(
            portal_repo.clone(),
            finance_repo.clone(),
            rep_group_id.clone(),
        );
        let approval_service =
            ApprovalService::new(finance_repo, portal_repo, db_pool.clone(), rep_group_id);

        Ok(Self {
            db_pool,
            jwt_secret,
            identity_service,
            queue_service,
            approval_service,
        })
    }
}

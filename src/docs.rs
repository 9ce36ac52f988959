// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Users ---
        handlers::identity::get_me,

        // --- Approvals ---
        handlers::approvals::get_queues,
        handlers::approvals::create_request,
        handlers::approvals::list_request_actions,
        handlers::approvals::submit_action,
    ),
    components(
        schemas(
            // --- Person / Identidade ---
            models::person::GroupRole,
            models::person::FinanceDesk,
            models::person::Person,
            models::person::GroupMembership,
            models::person::FinanceRoleAssignment,
            models::person::ActorIdentity,
            models::person::PrivilegeSet,

            // --- Finance ---
            models::finance::RequestKind,
            models::finance::RequestStatus,
            models::finance::ApprovalRole,
            models::finance::ActionKind,
            models::finance::FinanceRequest,
            models::finance::FinanceAction,

            // --- Filas ---
            models::queues::CompletedView,
            models::queues::ApprovalQueues,
            models::queues::QueuesResponse,

            // --- Payloads ---
            handlers::approvals::CreateRequestPayload,
            handlers::approvals::SubmitActionPayload,
            handlers::identity::ProfileResponse,
        )
    ),
    tags(
        (name = "Users", description = "Identidade do Ator e Privilégios"),
        (name = "Approvals", description = "Filas e Ações de Aprovação Financeira")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

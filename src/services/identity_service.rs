// src/services/identity_service.rs

use crate::{
    db::{IdentityRepository, PortalRepository},
    middleware::auth::SignedInActor,
    models::person::{normalize_email, ActorIdentity},
};

// Resolve a identidade assinada (e-mail + id opcional do provedor) para
// o registro canônico do roster. Uma tentativa por chamada, sem retry:
// ficar sem id não é erro, é um estado degradado mas funcional (o ator
// simplesmente enxerga menos filas).
#[derive(Clone)]
pub struct IdentityService {
    portal_repo: PortalRepository,
    identity_repo: IdentityRepository,
}

impl IdentityService {
    pub fn new(portal_repo: PortalRepository, identity_repo: IdentityRepository) -> Self {
        Self {
            portal_repo,
            identity_repo,
        }
    }

    pub async fn resolve(&self, actor: &SignedInActor) -> ActorIdentity {
        let email = normalize_email(&actor.email);

        // 1. O provedor já mandou o id? Resolvido.
        if let Some(person_id) = actor.person_id {
            return ActorIdentity::Resolved {
                person_id,
                email,
                display_name: actor.display_name.clone(),
            };
        }

        let unresolved = ActorIdentity::Unresolved {
            email: email.clone(),
            display_name: actor.display_name.clone(),
        };

        // 2. Cache: um enriquecimento anterior já resolveu este e-mail?
        //    Leitura melhor-esforço: falha aqui não derruba nada.
        match self.identity_repo.load(&email).await {
            Ok(Some(cached)) => {
                return ActorIdentity::Resolved {
                    person_id: cached.person_id,
                    email,
                    display_name: cached.display_name,
                };
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Cache de identidade indisponível: {}", e);
            }
        }

        // 3. Uma busca no roster, melhor esforço. Sucesso grava o cache
        //    (transição de mão única); falha segue só com o e-mail.
        match self.portal_repo.find_person_by_email(&email).await {
            Ok(Some(person)) => {
                if let Err(e) = self.identity_repo.save(&email, &person).await {
                    tracing::warn!("Falha ao gravar o cache de identidade: {}", e);
                }
                unresolved.enriched_with(&person)
            }
            Ok(None) => unresolved,
            Err(e) => {
                tracing::warn!(
                    "Busca no roster falhou, seguindo com identidade de e-mail: {}",
                    e
                );
                unresolved
            }
        }
    }
}

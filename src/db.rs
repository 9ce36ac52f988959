pub mod finance_repo;
pub use finance_repo::FinanceRepository;
pub mod identity_repo;
pub use identity_repo::IdentityRepository;
pub mod portal_repo;
pub use portal_repo::PortalRepository;

pub mod approval_service;
pub mod eligibility;
pub mod identity_service;
pub mod queue_service;

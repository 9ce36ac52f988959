pub mod approvals;
pub mod identity;

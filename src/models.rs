pub mod finance;
pub mod person;
pub mod queues;

pub mod adoptions;
pub mod catalog;
pub mod health;
pub mod metrics;
pub mod payments;
pub mod wallet;

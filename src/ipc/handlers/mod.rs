pub mod audit;
pub mod core;
pub mod courses;
pub mod packages;
pub mod purchases;
pub mod students;
pub mod videos;
pub mod withdrawals;

pub mod contract;
pub mod metrics;
pub mod ranked;
pub mod stock;
pub mod verdict;

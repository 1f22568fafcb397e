pub mod kernel;
pub mod robustness;
pub mod tiers;

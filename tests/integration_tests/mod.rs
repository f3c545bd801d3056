pub mod config;
pub mod export;
pub mod match_chains;
pub mod show;

pub mod algorithm;
pub mod common;
pub mod config;
pub mod grid;
pub mod simulation;
pub mod stat;
pub mod strategy;

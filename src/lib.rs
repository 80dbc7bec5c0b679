//! Library crate for stagecast-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod raffle;
pub mod roster;
pub mod routes;
pub mod services;
pub mod state;

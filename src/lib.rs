//! Distributes numbered stones across containers so that every container's
//! total mass lands inside its tolerance window.
//!
//! The engine lives in [`distributor`] and [`combinations`]; [`session`] and
//! [`api`] wrap it into the interactive HTTP service.

pub mod api;
pub mod combinations;
pub mod config;
pub mod distributor;
pub mod generator;
pub mod logging;
pub mod model;
pub mod session;
pub mod types;

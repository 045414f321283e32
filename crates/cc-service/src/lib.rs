//! Conference Controller: multi-tenant meeting backend.
//!
//! Owns tenants, users, meetings, participants and chat messages in
//! Postgres, and orchestrates an external video-session provider that holds
//! the actual media sessions. Remote resources are created before local
//! rows; failed local writes trigger compensating provider deletes, and
//! failed compensations are dead-lettered for the session reaper.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod tasks;

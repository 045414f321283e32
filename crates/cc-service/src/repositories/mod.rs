//! Repository modules for database access.
//!
//! One module per table. All queries are parameterized; repositories return
//! `sqlx::Error` and leave domain error mapping to the service layer.

pub mod chat_messages;
pub mod dead_letters;
pub mod meetings;
pub mod participants;
pub mod tenants;
pub mod users;

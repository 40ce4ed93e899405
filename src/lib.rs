use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub mod arenas;
pub mod auth;
pub mod config;
pub mod enums;
pub mod matches;
pub mod parse;
pub mod permission;
pub mod posts;
pub mod schema;
pub mod state;
pub mod tournaments;
pub mod users;
pub mod util_resp;
pub mod validation;

#[cfg(test)]
mod test;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

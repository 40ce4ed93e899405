//! Creates the default admin account and arena.

use chrono::Utc;
use clap::Parser;
use courtside::{
    MIGRATIONS,
    auth::password::hash_password,
    enums::{Role, SkillLevel},
    schema::{arenas, users},
};
use diesel::{connection::SimpleConnection, prelude::*};
use diesel_migrations::MigrationHarness;

const ADMIN_EMAIL: &str = "admin@gotoplay.com";
const ARENA_NAME: &str = "Arena Beach Club";

#[derive(Parser)]
struct Seed {
    /// Falls back to `DATABASE_URL`.
    database_url: Option<String>,
    #[arg(long, env = "SEED_ADMIN_PASSWORD")]
    admin_password: String,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().init();

    let args = Seed::parse();
    let db_url = match args.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").map_err(|_| {
            "please either set `DATABASE_URL` or pass it as an argument"
        })?,
    };

    let mut conn = SqliteConnection::establish(&db_url)?;
    conn.batch_execute("PRAGMA foreign_keys = ON;")?;
    conn.run_pending_migrations(MIGRATIONS)?;

    let password_hash = hash_password(&args.admin_password)?;
    let now = Utc::now().naive_utc();

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let existing = users::table
            .filter(users::email.eq(ADMIN_EMAIL))
            .select(users::id)
            .first::<i32>(conn)
            .optional()?;

        match existing {
            Some(id) => {
                diesel::update(users::table.filter(users::id.eq(id)))
                    .set((
                        users::password_hash.eq(&password_hash),
                        users::role.eq(Role::Admin),
                        users::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                tracing::info!(user_id = id, "updated admin account");
            }
            None => {
                diesel::insert_into(users::table)
                    .values((
                        users::full_name.eq("Super Admin"),
                        users::email.eq(ADMIN_EMAIL),
                        users::password_hash.eq(&password_hash),
                        users::role.eq(Role::Admin),
                        users::level.eq(SkillLevel::Pro),
                        users::created_at.eq(now),
                        users::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                tracing::info!("created admin account {ADMIN_EMAIL}");
            }
        }

        let arena_count = arenas::table
            .filter(arenas::name.eq(ARENA_NAME))
            .count()
            .get_result::<i64>(conn)?;
        if arena_count == 0 {
            diesel::insert_into(arenas::table)
                .values((
                    arenas::name.eq(ARENA_NAME),
                    arenas::city.eq("São José dos Campos"),
                    arenas::address.eq("Av. Principal, 100"),
                    arenas::created_at.eq(now),
                ))
                .execute(conn)?;
            tracing::info!("created arena {ARENA_NAME}");
        }

        Ok(())
    })?;

    Ok(())
}

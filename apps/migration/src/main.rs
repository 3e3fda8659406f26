//! Migration CLI tool.
//!
//! Reads `DATABASE_URL` (a `.env` file is honoured) and runs the migration
//! subcommand given on the command line, e.g. `migration up`.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The CLI installs its own tracing subscriber.
    cli::run_cli(migration::Migrator).await;
}

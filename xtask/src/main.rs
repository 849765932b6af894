// Copyright (C) 2024-2025 Fred Clausen and the ratatui project contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask - Project Automation
//!
//! `cargo xtask ci` runs the same gates as CI: formatting, clippy, rustdoc,
//! `cargo deny`, `cargo machete`, the build, the tests and finally
//! `verify-migrations`, which applies the embedded `SQLite` migrations to a
//! scratch database, checks the account tables and their foreign keys,
//! reverts everything and re-applies it.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::collections::{BTreeMap, BTreeSet};
use std::{io, process::Output};

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    eyre::{eyre, Context},
    Result,
};
use diesel::sql_types::{Integer, Text};
use diesel::{Connection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    if let Err(err) = args.command.run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Copy, Debug, Subcommand)]
enum Command {
    /// Run every CI gate
    CI,

    /// Build all targets
    #[command(visible_alias = "b")]
    Build,

    /// Check licenses and advisories with cargo-deny
    #[command(visible_alias = "cd")]
    Deny,

    /// Look for unused dependencies with cargo-machete
    #[command(visible_alias = "m")]
    Machete,

    /// Check formatting, clippy and rustdoc
    #[command(visible_alias = "l")]
    Lint,

    /// Apply rustfmt and clippy fixes
    #[command(visible_alias = "f")]
    Fix,

    /// Run the workspace tests
    #[command(visible_alias = "t")]
    Test,

    /// Apply, revert and re-apply the `SQLite` migrations
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => {
                lint()?;
                run_cargo(&["deny", "check"])?;
                machete()?;
                build()?;
                test()?;
                verify_migrations()
            }
            Self::Build => build(),
            Self::Deny => run_cargo(&["deny", "check"]),
            Self::Machete => machete(),
            Self::Lint => lint(),
            Self::Fix => fix(),
            Self::Test => test(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

fn build() -> Result<()> {
    run_cargo(&["build", "--workspace", "--all-targets"])
}

fn test() -> Result<()> {
    run_cargo(&["test", "--workspace", "--all-targets"])
}

fn machete() -> Result<()> {
    cmd!("cargo-machete").run_with_trace()?;
    Ok(())
}

fn lint() -> Result<()> {
    run_cargo_nightly(&["fmt", "--all", "--check"])?;
    run_cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--",
        "-D",
        "warnings",
    ])?;
    cmd!("cargo", "doc", "--workspace", "--no-deps")
        .env("RUSTDOCFLAGS", "-D warnings")
        .run_with_trace()?;
    Ok(())
}

fn fix() -> Result<()> {
    run_cargo_nightly(&["fmt", "--all"])?;
    run_cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--fix",
        "--allow-dirty",
        "--allow-staged",
    ])
}

fn run_cargo(args: &[&str]) -> Result<()> {
    cmd("cargo", args.iter().copied()).run_with_trace()?;
    Ok(())
}

fn run_cargo_nightly(args: &[&str]) -> Result<()> {
    cmd("cargo", args.iter().copied())
        // CARGO is set because we're running in a cargo subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

/// Tables the migrations must create.
const EXPECTED_TABLES: [&str; 6] = [
    "applications",
    "audit_events",
    "notifications",
    "programs",
    "sessions",
    "users",
];

/// `(table, column, referenced table, referenced column)`
const EXPECTED_FOREIGN_KEYS: [(&str, &str, &str, &str); 6] = [
    ("applications", "program_id", "programs", "program_id"),
    ("applications", "user_id", "users", "user_id"),
    ("notifications", "user_id", "users", "user_id"),
    ("programs", "admin_user_id", "users", "user_id"),
    ("sessions", "user_id", "users", "user_id"),
    ("users", "program_id", "programs", "program_id"),
];

/// Verify the `SQLite` migrations.
///
/// The audit trail must outlive deleted users, so `audit_events` may not
/// reference any other table.
fn verify_migrations() -> Result<()> {
    tracing::info!("Verifying migrations on an in-memory database");

    let mut conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to open in-memory SQLite database")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .wrap_err("Failed to enable foreign keys")?;

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply migrations: {e}"))?;
    let applied = Schema::introspect(&mut conn)?;
    applied.check_account_layout()?;

    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to revert migrations: {e}"))?;
    let leftover = Schema::introspect(&mut conn)?;
    if !leftover.tables.is_empty() {
        return Err(eyre!(
            "Tables left after reverting migrations: {:?}",
            leftover.tables.keys().collect::<Vec<_>>()
        ));
    }

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to re-apply migrations: {e}"))?;
    if Schema::introspect(&mut conn)? != applied {
        return Err(eyre!("Schema differs after revert and re-apply"));
    }

    tracing::info!("✓ Migrations apply, revert and re-apply cleanly");
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Table {
    /// Column name to `(declared type, not null, primary key)`.
    columns: BTreeMap<String, (String, bool, bool)>,
    /// `(column, referenced table, referenced column)`
    foreign_keys: BTreeSet<(String, String, String)>,
}

#[derive(QueryableByName)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

#[derive(QueryableByName)]
struct ColumnInfo {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    r#type: String,
    #[diesel(sql_type = Integer)]
    notnull: i32,
    #[diesel(sql_type = Integer)]
    pk: i32,
}

#[derive(QueryableByName)]
struct ForeignKeyInfo {
    #[diesel(sql_type = Text)]
    table: String,
    #[diesel(sql_type = Text)]
    from: String,
    #[diesel(sql_type = Text)]
    to: String,
}

impl Schema {
    fn introspect(conn: &mut SqliteConnection) -> Result<Self> {
        let names: Vec<TableName> = diesel::sql_query(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             AND name != '__diesel_schema_migrations' ORDER BY name",
        )
        .load(conn)
        .wrap_err("Failed to list tables")?;

        let mut tables = BTreeMap::new();
        for TableName { name } in names {
            let columns: Vec<ColumnInfo> =
                diesel::sql_query(format!("PRAGMA table_info({name})"))
                    .load(conn)
                    .wrap_err_with(|| format!("Failed to read columns of {name}"))?;
            let foreign_keys: Vec<ForeignKeyInfo> =
                diesel::sql_query(format!("PRAGMA foreign_key_list({name})"))
                    .load(conn)
                    .wrap_err_with(|| format!("Failed to read foreign keys of {name}"))?;

            let table = Table {
                columns: columns
                    .into_iter()
                    .map(|c| {
                        (
                            c.name,
                            (c.r#type.to_uppercase(), c.notnull != 0, c.pk > 0),
                        )
                    })
                    .collect(),
                foreign_keys: foreign_keys
                    .into_iter()
                    .map(|fk| (fk.from, fk.table, fk.to))
                    .collect(),
            };
            tables.insert(name, table);
        }

        Ok(Self { tables })
    }

    fn check_account_layout(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        for table in EXPECTED_TABLES {
            if !self.tables.contains_key(table) {
                errors.push(format!("Missing table: {table}"));
            }
        }

        for (table, column, to_table, to_column) in EXPECTED_FOREIGN_KEYS {
            let expected = (
                column.to_string(),
                to_table.to_string(),
                to_column.to_string(),
            );
            let declared = self
                .tables
                .get(table)
                .is_some_and(|t| t.foreign_keys.contains(&expected));
            if !declared {
                errors.push(format!(
                    "Missing foreign key: {table}.{column} -> {to_table}.{to_column}"
                ));
            }
        }

        if self
            .tables
            .get("audit_events")
            .is_some_and(|t| !t.foreign_keys.is_empty())
        {
            errors.push(String::from("audit_events must not declare foreign keys"));
        }

        if errors.is_empty() {
            return Ok(());
        }
        for error in &errors {
            tracing::error!("{error}");
        }
        Err(eyre!(
            "Schema verification failed with {} error(s)",
            errors.len()
        ))
    }
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}

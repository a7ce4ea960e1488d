use sqlx::Row;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use picture_authz::authz::{ContextResolver, PermissionResolver, ResolutionRequest, ResourceKind, RoleProfileTable};
use picture_authz::store::SqliteStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "picture-authz maintenance tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a role profile document and report its roles
    ValidateProfile { path: PathBuf },
    /// Resolve the permissions of one actor against the configured database
    Resolve(ResolveArgs),
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
}

#[derive(clap::Args, Debug)]
struct ResolveArgs {
    /// Authenticated user; omit to resolve anonymously
    #[arg(long)]
    user_id: Option<i64>,
    #[arg(long)]
    admin: bool,
    /// Generic id, classified by --route or --kind
    #[arg(long)]
    id: Option<i64>,
    #[arg(long)]
    route: Option<String>,
    #[arg(long, value_enum)]
    kind: Option<ResourceKind>,
    #[arg(long)]
    picture_id: Option<i64>,
    #[arg(long)]
    space_id: Option<i64>,
    #[arg(long)]
    space_user_id: Option<i64>,
    /// Role document; the built-in one is used when unset
    #[arg(long, env = "ROLE_PROFILE_PATH")]
    profiles: Option<PathBuf>,
}

impl From<&ResolveArgs> for ResolutionRequest {
    fn from(args: &ResolveArgs) -> Self {
        ResolutionRequest {
            actor_user_id: args.user_id,
            actor_is_admin: args.admin,
            id: args.id,
            route: args.route.clone(),
            route_kind: args.kind,
            picture_id: args.picture_id,
            space_id: args.space_id,
            space_user_id: args.space_user_id,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Try to load env from CWD; when running in Docker the binary CWD may differ,
    // so fall back to the crate-local `.env` using CARGO_MANIFEST_DIR.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::ValidateProfile { path } => {
            let table = RoleProfileTable::from_path(&path)
                .with_context(|| format!("role profile {} is invalid", path.display()))?;
            println!("{} permissions", table.catalog().len());
            for role in table.roles() {
                println!("{:<12} {}", role.key, role.permissions.join(", "));
            }
        }
        Commands::Resolve(args) => return resolve(&args).await,
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn resolve(args: &ResolveArgs) -> anyhow::Result<ExitCode> {
    let profiles = match &args.profiles {
        Some(path) => RoleProfileTable::from_path(path)?,
        None => RoleProfileTable::builtin()?,
    };

    let request = ResolutionRequest::from(args);
    let outcome = match ContextResolver::default().resolve(&request) {
        Ok(reference) => {
            let pool = get_pool().await?;
            let resolver = PermissionResolver::new(Arc::new(profiles), SqliteStore::new(pool));
            resolver.resolve(request.actor().as_ref(), reference).await
        }
        Err(err) => Err(err),
    };

    match outcome {
        Ok(permissions) => {
            println!("{}", serde_json::to_string_pretty(&json!({ "permissions": permissions }))?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let failure = json!({ "kind": err.kind(), "detail": err.to_string() });
            println!("{}", serde_json::to_string_pretty(&failure)?);
            Ok(ExitCode::from(2))
        }
    }
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let db_applied = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    let applied_versions: HashSet<i64> = if db_applied.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let version = migration.version;
        let status = if applied_versions.contains(&version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, version, name);
    }

    Ok(())
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations when running from the repo root, else the crate-local folder.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_args_accept_resource_kinds() {
        let cli = Cli::try_parse_from(["cli", "resolve", "--user-id", "3", "--id", "9", "--kind", "membership"]).unwrap();
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        let request = ResolutionRequest::from(&args);
        assert_eq!(request.route_kind, Some(ResourceKind::Membership));
        assert_eq!(request.actor_user_id, Some(3));

        assert!(Cli::try_parse_from(["cli", "resolve", "--kind", "spaceUser"]).is_err());
    }
}

//! Server entry point and admin subcommands.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reviewd::{
    api::{AppState, router},
    auth::{AuthKeys, LogMailer, fresh_secret},
    config::AppConfig,
    db::{create_user, establish_pool, run_migrations},
    models::{NewUser, Role},
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Address to bind the server to
    #[arg(long)]
    bind: Option<String>,

    /// Database connection string or path
    #[arg(long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account directly, bypassing the signup flow
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Role to assign: user, moderator or admin
        #[arg(long, default_value = "user")]
        role: String,
        /// Grant the superuser flag
        #[arg(long)]
        superuser: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(database) = cli.database {
        config.database = database;
    }

    let pool = establish_pool(&config.database)
        .await
        .context("establishing connection pool")?;
    run_migrations(&pool, &config.database)
        .await
        .context("running migrations")?;

    if let Some(Commands::CreateUser {
        username,
        email,
        role,
        superuser,
    }) = cli.command
    {
        let role = Role::parse(&role)
            .with_context(|| format!("unknown role: {role}"))?;
        let secret = fresh_secret();
        let mut conn = pool.get().await.context("getting db connection")?;
        let user = create_user(
            &mut conn,
            &NewUser {
                username: &username,
                email: &email,
                role,
                bio: "",
                first_name: "",
                last_name: "",
                is_superuser: superuser,
                confirmation_secret: &secret,
            },
        )
        .await
        .context("creating user")?;
        println!("created {} ({})", user.username, user.email);
        return Ok(());
    }

    let secret = match config.secret_key.clone() {
        Some(secret) => secret,
        None => {
            tracing::warn!(
                "no secret_key configured; using an ephemeral secret, \
                 outstanding tokens will not survive a restart"
            );
            fresh_secret()
        }
    };
    let keys = AuthKeys::new(&secret, config.token_ttl_secs, config.code_ttl_secs);
    let state = AppState {
        pool,
        keys: Arc::new(keys),
        mailer: Arc::new(LogMailer {
            from: config.from_address.clone(),
        }),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(bind = %config.bind, "reviewd listening");
    axum::serve(listener, router(state))
        .await
        .context("serving")?;
    Ok(())
}

use clap::{Parser, Subcommand};
use dashboard::admin::{
    dto::CreateCollegeRequest,
    forms::{validate_cli_user, validate_new_college},
};
use dashboard::auth::Auth;
use dashboard::config::{AppConfig, redact_db_url};
use dashboard::entity::{college, user::UserType};
use dashboard::web::{AppState, app_router, session::SessionManager};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dashboard", about = "College management dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve,
    /// Manage colleges
    College {
        #[command(subcommand)]
        action: CollegeAction,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum CollegeAction {
    /// Register a new college
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        province: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        contact_email: Option<String>,
        #[arg(long)]
        phone_number: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// super_admin, college_admin, professor or student
        #[arg(long, default_value = "student")]
        user_type: UserType,
        #[arg(long, default_value = "")]
        email: String,
        /// Name of the college the account belongs to
        #[arg(long)]
        college: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init structured logging (respects RUST_LOG; defaults to info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    tracing::info!(database = %redact_db_url(&config.database_url), "connecting to database");

    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    tracing::info!("database initialized");

    match cli.command {
        None | Some(Commands::Serve) => serve(config, db).await?,
        Some(Commands::College { action }) => handle_college_action(&db, action).await?,
        Some(Commands::User { action }) => handle_user_action(db, action).await?,
    }

    Ok(())
}

async fn serve(config: AppConfig, db: DatabaseConnection) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(db, SessionManager::new(config.session.clone()));

    // Auto-seed a super admin if no users exist
    if state.auth.count_users().await? == 0 {
        let Some(password) = config.admin_password.as_deref() else {
            return Err("CM_ADMIN_PASSWORD is not set. Set it to a strong password before \
                        starting with an empty database."
                .into());
        };
        if let Some(admin) = state.auth.seed_super_admin(&config.admin_user, password).await? {
            tracing::warn!(username = %admin.username, "no users found, seeded super admin");
        }
    }

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "dashboard online");

    axum::serve(listener, app_router(state)).await?;
    Ok(())
}

async fn handle_college_action(
    db: &DatabaseConnection,
    action: CollegeAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CollegeAction::Create {
            name,
            province,
            address,
            contact_email,
            phone_number,
        } => {
            let fields = validate_new_college(&CreateCollegeRequest {
                name: Some(name),
                province: Some(province),
                address,
                contact_email: contact_email.filter(|e| !e.trim().is_empty()),
                phone_number,
            })?;
            let model = college::ActiveModel {
                id: Set(Uuid::now_v7()),
                name: Set(fields.name),
                province: Set(fields.province),
                address: Set(fields.address),
                contact_email: Set(fields.contact_email),
                phone_number: Set(fields.phone_number),
            }
            .insert(db)
            .await?;
            tracing::info!(college = %model.name, id = %model.id, "created college");
        }
    }
    Ok(())
}

async fn handle_user_action(
    db: DatabaseConnection,
    action: UserAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UserAction::Create {
            username,
            password,
            user_type,
            email,
            college,
        } => {
            let college_id = match college {
                Some(name) => Some(
                    college::Entity::find()
                        .filter(college::Column::Name.eq(name.as_str()))
                        .one(&db)
                        .await?
                        .ok_or_else(|| format!("no college named '{name}'"))?
                        .id,
                ),
                None => None,
            };
            let account = validate_cli_user(&username, &password, user_type, &email, college_id)?;

            let auth = Auth::new(db);
            let user = auth.create_user(account).await?;
            tracing::info!(username = %user.username, role = %user.user_type, "created user");
        }
    }
    Ok(())
}

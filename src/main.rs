use std::{process, sync::Arc};

use foglio::{
    application::{
        admin::AdminService,
        auth::AuthService,
        error::AppError,
        feed::FeedService,
        preview::{PatternPreview, PreviewRenderer},
        repos::{PostsRepo, PostsWriteRepo, UploadsRepo},
    },
    config,
    infra::{
        db::SqliteRepositories,
        error::InfraError,
        http::{self, AppState},
        telemetry,
        uploads::UploadStorage,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_app_state(repositories, &settings)?;

    let addr = settings.server.addr;
    let upload_body_limit = settings.uploads.max_request_bytes.get() as usize;
    let router = http::build_router(state, upload_body_limit);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(target = "foglio::server", addr = %addr, "listening");

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!(target = "foglio::migrate", "migrations applied");
    Ok(())
}

/// Connect, apply pending migrations, and reconcile legacy rows that still
/// lack a slug.
async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<SqliteRepositories>, AppError> {
    let pool = SqliteRepositories::connect(
        &settings.database.url,
        settings.database.max_connections.get(),
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    SqliteRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let repositories = Arc::new(SqliteRepositories::new(pool));

    let backfilled = repositories
        .backfill_missing_slugs()
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    if backfilled > 0 {
        info!(
            target = "foglio::migrate",
            posts = backfilled,
            "slug backfill completed"
        );
    }

    Ok(repositories)
}

fn build_app_state(
    repositories: Arc<SqliteRepositories>,
    settings: &config::Settings,
) -> Result<AppState, AppError> {
    let admin_settings = settings
        .admin
        .as_ref()
        .ok_or_else(|| InfraError::configuration("admin credentials are not configured"))
        .map_err(AppError::from)?;

    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let uploads_repo: Arc<dyn UploadsRepo> = repositories.clone();
    let preview: Arc<dyn PreviewRenderer> = Arc::new(PatternPreview);

    let upload_storage = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    let feed = Arc::new(FeedService::new(
        posts_repo.clone(),
        preview,
        &settings.content,
    ));
    let admin = Arc::new(AdminService::new(
        posts_repo,
        posts_write_repo,
        settings.content.page_size.get(),
    ));
    let auth = Arc::new(AuthService::new(
        admin_settings.credentials.clone(),
        admin_settings.session_ttl,
    ));

    Ok(AppState {
        feed,
        admin,
        auth,
        uploads: uploads_repo,
        upload_storage,
        db: repositories,
    })
}

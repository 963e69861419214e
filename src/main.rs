use std::{path::Path, process::ExitCode, sync::Arc};

use folio::{
    application::{
        admin::{
            AdminExportError, AdminExportService, AdminImportError, AdminImportService,
            AdminSearchService, ExportRequest, ImportSummary,
        },
        error::AppError,
        exchange::{ExportHooks, ForeignOptions, ImportHooks},
        media::MediaIngestor,
        repos::{PagesRepo, PagesWriteRepo, PostsRepo, PostsWriteRepo, UsersRepo},
        site::SiteMetadata,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState},
        media::RemoteMediaIngestor,
        telemetry,
        uploads::UploadStorage,
    },
};
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_application_error(&error);
            error.exit_code()
        }
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
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Export(args) => run_export(settings, args).await,
        config::Command::Import(args) => run_import(settings, args).await,
    }
}

/// Services shared by the HTTP surface and the CLI commands.
struct Services {
    db: Arc<PostgresRepositories>,
    search: Arc<AdminSearchService>,
    export: Arc<AdminExportService>,
    import: Arc<AdminImportService>,
}

fn build_services(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<Services, AppError> {
    let users: Arc<dyn UsersRepo> = repositories.clone();
    let posts: Arc<dyn PostsRepo> = repositories.clone();
    let post_writer: Arc<dyn PostsWriteRepo> = repositories.clone();
    let pages: Arc<dyn PagesRepo> = repositories.clone();
    let page_writer: Arc<dyn PagesWriteRepo> = repositories.clone();

    let site = SiteMetadata::new(
        settings.site.name.clone(),
        settings.site.description.clone(),
        settings.site.url.clone(),
    );

    let storage = UploadStorage::new(
        settings.uploads.directory.clone(),
        &settings.uploads.public_path,
    )
    .map_err(InfraError::from)?;
    let media_max_bytes = usize::try_from(settings.import.media_max_bytes.get())
        .map_err(|_| InfraError::configuration("import.media_max_bytes is too large"))?;
    let media: Arc<dyn MediaIngestor> = Arc::new(
        RemoteMediaIngestor::new(
            Arc::new(storage),
            settings.import.media_timeout,
            media_max_bytes,
        )
        .map_err(InfraError::from)?,
    );

    let search = AdminSearchService::new(
        users.clone(),
        posts.clone(),
        pages.clone(),
        settings.admin.per_page.get(),
    );
    let export = AdminExportService::new(
        users.clone(),
        posts.clone(),
        pages.clone(),
        site,
        ExportHooks::new(),
    );
    let import = AdminImportService::new(
        users,
        posts,
        post_writer,
        pages,
        page_writer,
        media,
        ImportHooks::new(),
        settings.import.enabled_feathers.clone(),
    );

    Ok(Services {
        db: repositories,
        search: Arc::new(search),
        export: Arc::new(export),
        import: Arc::new(import),
    })
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let services = build_services(repositories, &settings)?;

    let state = AdminState {
        db: services.db.clone(),
        search: services.search,
        export: services.export,
        import: services.import,
        importer_login: settings.import.importer.clone(),
    };
    let upload_body_limit = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| InfraError::configuration("uploads.max_request_bytes is too large"))?;
    let router = http::build_admin_router(state, upload_body_limit);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "folio::serve",
        addr = %settings.server.addr,
        "Admin service listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "folio::serve", "Admin service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "folio::serve", error = %err, "failed to listen for shutdown signal");
    }
}

async fn run_export(settings: config::Settings, args: config::ExportArgs) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let services = build_services(repositories, &settings)?;

    let (posts, pages) = args.selection();
    let request = ExportRequest {
        posts,
        pages,
        posts_filter: args.filter_posts.clone(),
        pages_filter: args.filter_pages.clone(),
    };

    info!(
        target = "folio::export",
        path = %args.file.display(),
        posts,
        pages,
        "Starting export"
    );

    let archive = services
        .export
        .export(&request, OffsetDateTime::now_utc().date())
        .await
        .map_err(export_failure)?;
    tokio::fs::write(&args.file, &archive.bytes)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "folio::export",
        path = %args.file.display(),
        entries = archive.entries,
        suggested_name = %archive.file_name,
        "Export completed"
    );
    Ok(())
}

async fn run_import(settings: config::Settings, args: config::ImportArgs) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let services = build_services(repositories, &settings)?;
    let importer = services
        .import
        .resolve_importer(&settings.import.importer)
        .await
        .map_err(import_failure)?;

    let summary = match &args.source {
        config::ImportSource::Native(native) => {
            let posts = read_optional(native.posts.as_deref()).await?;
            let pages = read_optional(native.pages.as_deref()).await?;
            services
                .import
                .import_native(posts.as_deref(), pages.as_deref(), &importer)
                .await
        }
        config::ImportSource::Foreign(foreign) => {
            let xml = read_file(&foreign.file).await?;
            let options = ForeignOptions {
                media_base: foreign.media_url.clone(),
            };
            services
                .import
                .import_foreign(&xml, &options, &importer)
                .await
        }
    }
    .map_err(import_failure)?;

    report_import(&summary);
    Ok(())
}

fn report_import(summary: &ImportSummary) {
    info!(
        target = "folio::import",
        posts = summary.posts,
        pages = summary.pages,
        skipped = summary.skipped,
        media = summary.media,
        "Import completed"
    );
}

async fn read_file(path: &Path) -> Result<Vec<u8>, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(InfraError::from)?;
    Ok(bytes)
}

async fn read_optional(path: Option<&Path>) -> Result<Option<Vec<u8>>, AppError> {
    match path {
        Some(path) => read_file(path).await.map(Some),
        None => Ok(None),
    }
}

fn export_failure(err: AdminExportError) -> AppError {
    match err {
        AdminExportError::NothingSelected | AdminExportError::Search(_) => {
            AppError::validation(err.to_string())
        }
        other => AppError::unexpected(other.to_string()),
    }
}

fn import_failure(err: AdminImportError) -> AppError {
    match err {
        AdminImportError::Repo(_) | AdminImportError::Media(_) => {
            AppError::unexpected(err.to_string())
        }
        other => AppError::validation(other.to_string()),
    }
}

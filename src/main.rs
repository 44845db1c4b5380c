use mimalloc::MiMalloc;
use ouka2::db::{self, ImageStore, TagStore};
use ouka2::drive::{Drive, DriveEndpoints, GoogleDriveApi};
use ouka2::router::{OukaState, ouka_router};
use ouka2::service::catalog::ImageCatalog;
use ouka2::service::drive_session::{self, DriveSessionArgs};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &ouka2::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    cfg.validate()?;

    info!(
        database_url = %cfg.database_url,
        parent_folder = %cfg.cutegirls_parent,
        owner_id = cfg.owner_id,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        cache_size = cfg.download_cache_size,
        loglevel = %cfg.loglevel,
    );

    let pool = db::connect(&cfg.database_url).await?;
    let tags = TagStore::new(pool.clone());

    let http = cfg.http_client()?;
    let session = drive_session::spawn(DriveSessionArgs {
        http: http.clone(),
        client_secrets_path: cfg.client_secrets_path.clone(),
        token_path: cfg.token_path.clone(),
        redirect_url: cfg.redirect_url.clone(),
    })
    .await?;

    let api = GoogleDriveApi::new(
        http,
        session.clone(),
        cfg.cutegirls_parent.clone(),
        DriveEndpoints::default(),
    );
    let drive = Arc::new(Drive::new(Arc::new(api), cfg.download_cache_size));
    let catalog = ImageCatalog::new(ImageStore::new(pool.clone()), tags.clone(), drive, cfg.owner_id);

    // Authorize up front so the first command does not wait on consent.
    let warmup = session.clone();
    tokio::spawn(async move {
        match warmup.access_token().await {
            Ok(_) => info!("Drive session ready"),
            Err(e) => warn!(error = %e, "Drive session warm-up failed"),
        }
    });

    let state = OukaState::new(tags, catalog, session, Arc::from(cfg.gateway_key.as_str()));
    let app = ouka_router(state, cfg.max_upload_bytes);

    let listener = TcpListener::bind(cfg.listen_addr.as_str()).await?;
    info!("Command gateway listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
}

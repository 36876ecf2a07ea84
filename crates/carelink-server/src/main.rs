use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use carelink_api::auth::{AppState, AppStateInner};
use carelink_gateway::{AuditLedger, HttpGateway, MockGateway, SmsGateway};
use carelink_server::router;

const DEFAULT_SMS_URL: &str = "https://api.sandbox.africastalking.com/version1/messaging";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carelink=debug,tower_http=debug".into()),
        )
        .init();

    // Config — read once here, injected through state everywhere else
    let jwt_secret =
        std::env::var("CARELINK_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("CARELINK_DB_PATH").unwrap_or_else(|_| "carelink.db".into());
    let host = std::env::var("CARELINK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CARELINK_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;

    // Init database
    let db = carelink_db::Database::open(&PathBuf::from(&db_path))?;

    // SMS gateway: real provider when an API key is configured, otherwise
    // the deterministic mock
    let sms: Arc<dyn SmsGateway> = match std::env::var("CARELINK_SMS_API_KEY") {
        Ok(api_key) if !api_key.is_empty() => {
            let username =
                std::env::var("CARELINK_SMS_USERNAME").unwrap_or_else(|_| "sandbox".into());
            let url = std::env::var("CARELINK_SMS_URL").unwrap_or_else(|_| DEFAULT_SMS_URL.into());
            info!("Using HTTP SMS gateway at {}", url);
            Arc::new(HttpGateway::new(url, username, api_key)?)
        }
        _ => {
            info!("No SMS API key configured, using mock gateway");
            Arc::new(MockGateway)
        }
    };

    // Audit sidecar is optional; without a secret it simply stays off
    let audit = std::env::var("CARELINK_LEDGER_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .and_then(|secret| {
            let url = std::env::var("CARELINK_LEDGER_URL")
                .unwrap_or_else(|_| "https://ledger-testnet.carelink.example".into());
            AuditLedger::new(url, &secret).map(Arc::new)
        });
    if audit.is_some() {
        info!("Audit ledger sidecar enabled");
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        sms,
        audit,
    });

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("CareLink server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

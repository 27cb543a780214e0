use std::sync::Arc;

use chrono::Duration;
use waterwala_client::configuration::get_configuration;
use waterwala_client::error::ClientError;
use waterwala_client::http_client::{ApiClient, LoggingNavigator};
use waterwala_client::telemetry::init_telemetry;
use waterwala_client::token_store::{FileStorage, SessionStore};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // 구조화된 로깅 초기화
    init_telemetry("info");

    tracing::info!("Starting waterwala client");

    // 설정 로드
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(e.into());
        }
    };

    // 세션 저장소 열기
    let store_path = &configuration.session.store_path;
    tracing::info!("Opening session store at {}", store_path.display());
    let store = SessionStore::new(FileStorage::open(store_path)?)?;

    let navigator = Arc::new(LoggingNavigator::new(
        configuration.session.login_path.clone(),
    ));
    let client = ApiClient::new(&configuration, store, navigator)?;

    // 저장된 세션이 없으면 종료
    if !client.auth().is_authenticated()? {
        tracing::info!("No persisted session, sign in required");
        return Ok(());
    }

    let user = client.auth().current_user()?;
    tracing::info!(
        user_id = user.as_ref().map(|u| u.id),
        "Persisted session found"
    );

    // 백엔드에서 세션 확인
    let sessions = client.sessions();
    if !sessions.validate(None).await {
        tracing::warn!("Session was not confirmed by the server");
    }

    // 만료가 가까우면 미리 갱신
    let buffer = Duration::seconds(configuration.session.refresh_buffer_secs);
    match sessions.refresh_if_expiring(buffer).await {
        Ok(true) => tracing::info!("Session refreshed ahead of expiry"),
        Ok(false) => tracing::info!("Session is current"),
        Err(e) => {
            tracing::error!("Failed to refresh session: {}", e);
            return Err(e);
        }
    }

    Ok(())
}

/// Refresh-and-retry support
///
/// A 401 is answered with at most one refresh call no matter how many
/// requests were rejected at the same time. The first rejected request
/// starts the refresh; the rest await the same shared future. A request
/// whose token has already been replaced in the store skips the refresh and
/// is retried with the newer token.
///
/// A failed refresh is terminal for the session: the store is cleared and
/// the navigator is invoked once, from inside the shared future. Requests
/// rejected after that teardown fail without starting another refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Method;
use tokio::sync::Mutex;

use super::{decode_response, Backend, Navigator};
use crate::auth::{fingerprint, token_expiry};
use crate::configuration::RefreshTokenRotation;
use crate::error::{AuthError, ClientError};
use crate::logger::RequestTimer;
use crate::models::SessionInfo;
use crate::token_store::SessionStore;

type RefreshOutcome = Result<(), ClientError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Performs one refresh against the user service
#[derive(Clone)]
pub(crate) struct Refresher {
    http_client: reqwest::Client,
    url: String,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    rotation: RefreshTokenRotation,
}

impl Refresher {
    pub(crate) fn new(
        http_client: reqwest::Client,
        url: String,
        store: SessionStore,
        navigator: Arc<dyn Navigator>,
        rotation: RefreshTokenRotation,
    ) -> Self {
        Self {
            http_client,
            url,
            store,
            navigator,
            rotation,
        }
    }

    async fn run(self) -> RefreshOutcome {
        let refresh_token = match self.store.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::warn!("No refresh token available, signing out");
                self.teardown();
                return Err(AuthError::AuthenticationRequired.into());
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read refresh token");
                self.teardown();
                return Err(e.into());
            }
        };

        match self.exchange(&refresh_token).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    refresh_token = %fingerprint(&refresh_token),
                    "Token refresh failed"
                );
                self.teardown();
                Err(e)
            }
        }
    }

    /// Unauthenticated `POST /sessions/refresh?refreshToken=`
    async fn exchange(&self, refresh_token: &str) -> RefreshOutcome {
        let timer = RequestTimer::start(&Method::POST, "/sessions/refresh", &[]);
        let response = match self
            .http_client
            .post(&self.url)
            .query(&[("refreshToken", refresh_token)])
            .send()
            .await
        {
            Ok(response) => {
                timer.finish(response.status());
                response
            }
            Err(e) => {
                timer.fail(&e.to_string());
                return Err(refresh_failed(None, e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let session: SessionInfo = decode_response(Backend::User, response)
            .await
            .map_err(|e| refresh_failed(e.status().or(Some(status)), e.to_string()))?;

        let access_token = session.bearer_token().ok_or_else(|| {
            refresh_failed(Some(status), "refresh response carried no access token")
        })?;

        let rotated = session.rotated_refresh_token();
        if rotated.is_none() && self.rotation == RefreshTokenRotation::Required {
            return Err(refresh_failed(
                Some(status),
                "refresh response carried no refresh token",
            ));
        }

        let expires_at = token_expiry(access_token).or_else(|| session.expires_at_utc());
        self.store.save_refreshed(
            access_token,
            rotated,
            session.rotated_session_token(),
            expires_at,
        )?;
        Ok(())
    }

    fn teardown(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "Failed to clear session store");
        }
        self.navigator.redirect_to_login();
    }
}

fn refresh_failed(status: Option<u16>, message: impl Into<String>) -> ClientError {
    AuthError::RefreshFailed {
        status,
        message: message.into(),
    }
    .into()
}

/// Coalesces concurrent refreshes into one call
pub(crate) struct RefreshCoordinator {
    refresher: Refresher,
    in_flight: Mutex<Option<(u64, SharedRefresh)>>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub(crate) fn new(refresher: Refresher) -> Self {
        Self {
            refresher,
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Recovers from a 401 received by a request sent with `sent_with`.
    pub(crate) async fn recover(&self, sent_with: Option<&str>) -> RefreshOutcome {
        self.single_flight(Some(sent_with)).await
    }

    pub(crate) async fn refresh(&self) -> RefreshOutcome {
        self.single_flight(None).await
    }

    async fn single_flight(&self, rejected: Option<Option<&str>>) -> RefreshOutcome {
        let (generation, refresh) = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some((generation, refresh)) => (*generation, refresh.clone()),
                None => {
                    if let Some(sent_with) = rejected {
                        let current = self.refresher.store.access_token()?;
                        match (sent_with, current.as_deref()) {
                            (Some(_), None) => {
                                tracing::debug!("Session already torn down, not refreshing");
                                return Err(AuthError::AuthenticationRequired.into());
                            }
                            (_, Some(current)) if Some(current) != sent_with => {
                                tracing::debug!("Access token already replaced, retrying");
                                return Ok(());
                            }
                            _ => {}
                        }
                    }

                    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    let refresh = self.refresher.clone().run().boxed().shared();
                    *slot = Some((generation, refresh.clone()));
                    (generation, refresh)
                }
            }
        };

        let outcome = refresh.await;

        let mut slot = self.in_flight.lock().await;
        if matches!(slot.as_ref(), Some((current, _)) if *current == generation) {
            *slot = None;
        }
        outcome
    }
}

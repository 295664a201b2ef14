//! Credential resolution state machine
//!
//! Each step is a cheap local check before escalating to the next; only the
//! last one needs a human:
//! 1. Cached bundle, unexpired, scopes sufficient → use it
//! 2. Cached bundle within a minute of expiry with a refresh token → refresh,
//!    overwrite cache. A rejected refresh token evicts the bundle; a refresh
//!    that could not reach a verdict keeps it for the next call. Either way
//!    resolution continues.
//! 3. Consent response attached to the invocation → validate state, exchange
//!    the code, cache the new bundle
//! 4. Otherwise → record a pending consent request and suspend
//!
//! A bundle missing required scopes counts as unusable and escalates to
//! consent for the full required set.

use std::sync::Arc;

use google_auth::{
    CredentialBundle, REFRESH_THRESHOLD_MILLIS, ScopeSet, TokenEndpoint, now_millis,
};
use tracing::{debug, info, warn};

use crate::cache::{CredentialCache, SessionKey};
use crate::context::{ConsentResponse, SessionContext};
use crate::detector::detect;
use crate::emitter::{ConsentEmitter, SuspendSignal};
use crate::error::{Error, Result};
use crate::metrics::{Outcome, record_refresh_failure, record_resolution};
use crate::refresher;

/// Result of a resolution that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Valid credentials for the required scopes
    Ready(CredentialBundle),
    /// The invocation must pause for the browser consent step
    Suspended(SuspendSignal),
}

/// Resolves credentials for tool invocations.
pub struct Resolver {
    endpoint: Arc<dyn TokenEndpoint>,
    emitter: ConsentEmitter,
}

impl Resolver {
    pub fn new(endpoint: Arc<dyn TokenEndpoint>, emitter: ConsentEmitter) -> Self {
        Self { endpoint, emitter }
    }

    /// Resolve credentials for `context.required_scopes` in `context.session_key`.
    ///
    /// Only `ConsentExchange` and `Setup` errors escape; refresh failures and
    /// scope gaps are absorbed by escalating to consent.
    pub async fn resolve(
        &self,
        cache: &mut CredentialCache,
        context: &SessionContext,
    ) -> Result<Resolution> {
        let result = self.run(cache, context).await;
        match &result {
            Ok((_, outcome)) => {
                debug!(session = %context.session_key, outcome = outcome.label(), "credential resolution finished");
                record_resolution(*outcome);
            }
            Err(e) => {
                warn!(session = %context.session_key, error = %e, "credential resolution failed");
                record_resolution(Outcome::Failed);
            }
        }
        result.map(|(resolution, _)| resolution)
    }

    async fn run(
        &self,
        cache: &mut CredentialCache,
        context: &SessionContext,
    ) -> Result<(Resolution, Outcome)> {
        let key = &context.session_key;
        let required = &context.required_scopes;

        if let Some(cached) = cache.get(key) {
            match self.usable_bundle(cache, key, cached, required).await {
                Ok(Some((bundle, outcome))) => return Ok((Resolution::Ready(bundle), outcome)),
                Ok(None) => {}
                Err(Error::InsufficientScope { missing }) => {
                    info!(session = %key, ?missing, "cached bundle lacks required scopes, escalating to consent");
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(response) = detect(context) {
            let bundle = self.complete_consent(cache, key, response).await?;
            match check_scopes(&bundle, required) {
                Ok(()) => return Ok((Resolution::Ready(bundle), Outcome::Exchanged)),
                Err(Error::InsufficientScope { missing }) => {
                    warn!(session = %key, ?missing, "consent granted fewer scopes than required");
                }
                Err(e) => return Err(e),
            }
        }

        let signal = self.emitter.request_consent(cache, key, required)?;
        Ok((Resolution::Suspended(signal), Outcome::Suspended))
    }

    /// Steps 1-2: validate the cached bundle, refreshing it near expiry.
    ///
    /// Returns `Ok(None)` when the bundle is unusable and resolution should
    /// continue with the consent path.
    async fn usable_bundle(
        &self,
        cache: &mut CredentialCache,
        key: &SessionKey,
        cached: CredentialBundle,
        required: &ScopeSet,
    ) -> Result<Option<(CredentialBundle, Outcome)>> {
        let refresh_at = now_millis().saturating_add(REFRESH_THRESHOLD_MILLIS);
        let (bundle, outcome) = if !cached.is_expired_at(refresh_at) {
            (cached, Outcome::Cached)
        } else if cached.refresh_token.is_none() {
            debug!(session = %key, "cached bundle near expiry and has no refresh token");
            return Ok(None);
        } else {
            match refresher::refresh(self.endpoint.as_ref(), &cached).await {
                Ok(refreshed) => {
                    cache.store(key.clone(), refreshed.clone());
                    (refreshed, Outcome::Refreshed)
                }
                Err(e @ Error::Refresh(_)) => {
                    record_refresh_failure();
                    warn!(session = %key, error = %e, "refresh token rejected, evicting bundle");
                    cache.evict(key);
                    return Ok(None);
                }
                Err(e) => {
                    record_refresh_failure();
                    warn!(session = %key, error = %e, "refresh unavailable, keeping bundle for retry");
                    return Ok(None);
                }
            }
        };

        check_scopes(&bundle, required)?;
        Ok(Some((bundle, outcome)))
    }

    /// Step 3: turn the redirect URL into a cached bundle.
    ///
    /// The pending request is consumed before anything is validated, so any
    /// failure leaves the session needing a fresh consent request.
    async fn complete_consent(
        &self,
        cache: &mut CredentialCache,
        key: &SessionKey,
        response: &ConsentResponse,
    ) -> Result<CredentialBundle> {
        let pending = cache.take_pending(key).ok_or_else(|| {
            Error::ConsentExchange("no consent request is pending for this session".into())
        })?;

        let authorization = response.parse()?;
        if authorization.state != pending.state_token {
            warn!(session = %key, "consent response state does not match the issued request");
            return Err(Error::ConsentExchange(
                "state token does not match the issued consent request".into(),
            ));
        }

        let token = self
            .endpoint
            .exchange_code(&authorization.code, &pending.verifier)
            .await
            .map_err(|e| Error::ConsentExchange(format!("authorization code exchange failed: {e}")))?;

        let bundle =
            CredentialBundle::from_token_response(token, now_millis(), None, &pending.required_scopes);
        cache.store(key.clone(), bundle.clone());
        info!(session = %key, scopes = ?bundle.scopes, "consent completed, credentials cached");
        Ok(bundle)
    }
}

fn check_scopes(bundle: &CredentialBundle, required: &ScopeSet) -> Result<()> {
    let missing = bundle.missing_scopes(required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::InsufficientScope { missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use common::Secret;
    use google_auth::{AUTHORIZE_ENDPOINT, TokenFuture, TokenResponse, compute_challenge};

    const SPACES: &str = "https://www.googleapis.com/auth/chat.spaces.readonly";
    const MESSAGES: &str = "https://www.googleapis.com/auth/chat.messages.readonly";
    const REDIRECT: &str = "http://localhost:8000/callback";

    #[derive(Clone)]
    enum Reply {
        Token(TokenResponse),
        Revoked,
        ConnectionReset,
    }

    impl Reply {
        fn to_result(&self) -> google_auth::Result<TokenResponse> {
            match self {
                Reply::Token(t) => Ok(t.clone()),
                Reply::Revoked => Err(google_auth::Error::InvalidGrant(
                    "Token has been expired or revoked.".into(),
                )),
                Reply::ConnectionReset => {
                    Err(google_auth::Error::Http("connection reset".into()))
                }
            }
        }
    }

    /// Token endpoint double that counts calls and records PKCE verifiers.
    struct FakeEndpoint {
        exchange_reply: Reply,
        refresh_reply: Reply,
        exchange_calls: AtomicUsize,
        refresh_calls: AtomicUsize,
        verifiers: Mutex<Vec<String>>,
    }

    impl FakeEndpoint {
        fn new(exchange_reply: Reply, refresh_reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                exchange_reply,
                refresh_reply,
                exchange_calls: AtomicUsize::new(0),
                refresh_calls: AtomicUsize::new(0),
                verifiers: Mutex::new(Vec::new()),
            })
        }

        fn exchanges(&self) -> usize {
            self.exchange_calls.load(Ordering::SeqCst)
        }

        fn refreshes(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }
    }

    impl TokenEndpoint for FakeEndpoint {
        fn exchange_code<'a>(&'a self, _code: &'a str, verifier: &'a str) -> TokenFuture<'a> {
            self.exchange_calls.fetch_add(1, Ordering::SeqCst);
            self.verifiers.lock().unwrap().push(verifier.to_owned());
            let reply = self.exchange_reply.to_result();
            Box::pin(async move { reply })
        }

        fn refresh<'a>(&'a self, _refresh_token: &'a str) -> TokenFuture<'a> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.refresh_reply.to_result();
            Box::pin(async move { reply })
        }
    }

    fn exchange_token(scope: Option<&str>) -> Reply {
        Reply::Token(TokenResponse {
            access_token: "ya29.exchanged".into(),
            refresh_token: Some("1//issued".into()),
            expires_in: 3599,
            scope: scope.map(str::to_owned),
            token_type: Some("Bearer".into()),
        })
    }

    fn refresh_token_reply(rotated: Option<&str>) -> Reply {
        Reply::Token(TokenResponse {
            access_token: "ya29.refreshed".into(),
            refresh_token: rotated.map(str::to_owned),
            expires_in: 3599,
            scope: None,
            token_type: Some("Bearer".into()),
        })
    }

    fn resolver(endpoint: Arc<FakeEndpoint>) -> Resolver {
        Resolver::new(
            endpoint,
            ConsentEmitter::new(
                AUTHORIZE_ENDPOINT,
                Secret::new("cid.apps.googleusercontent.com".into()),
                REDIRECT,
            ),
        )
    }

    fn scopes(items: &[&str]) -> ScopeSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn bundle(expires: u64, refresh: Option<&str>, granted: &[&str]) -> CredentialBundle {
        CredentialBundle {
            access_token: "ya29.cached".into(),
            refresh_token: refresh.map(str::to_owned),
            expires,
            scopes: scopes(granted),
        }
    }

    fn key() -> SessionKey {
        SessionKey::from("cli-user")
    }

    fn context(required: &[&str]) -> SessionContext {
        SessionContext::new(key(), scopes(required))
    }

    fn redirect_for(signal: &SuspendSignal) -> ConsentResponse {
        ConsentResponse::new(format!(
            "{REDIRECT}?state={}&code=4/0AeanS0b&scope={SPACES}",
            signal.state_token()
        ))
    }

    fn expect_suspended(resolution: Resolution) -> SuspendSignal {
        match resolution {
            Resolution::Suspended(signal) => signal,
            other => panic!("expected suspension, got {other:?}"),
        }
    }

    fn expect_ready(resolution: Resolution) -> CredentialBundle {
        match resolution {
            Resolution::Ready(bundle) => bundle,
            other => panic!("expected credentials, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpired_cached_bundle_is_returned_unchanged() {
        let fake = FakeEndpoint::new(exchange_token(None), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        let cached = bundle(now_millis() + 3_600_000, Some("1//rt"), &[SPACES, MESSAGES]);
        cache.store(key(), cached.clone());

        let resolved = expect_ready(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());

        assert_eq!(resolved, cached);
        assert_eq!(fake.refreshes(), 0);
        assert_eq!(fake.exchanges(), 0);
        assert!(cache.pending(&key()).is_none());
    }

    #[tokio::test]
    async fn expired_bundle_is_refreshed_exactly_once() {
        let fake = FakeEndpoint::new(exchange_token(None), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        let before = now_millis();
        cache.store(key(), bundle(before - 1_000, Some("1//rt"), &[SPACES]));

        let resolved = expect_ready(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());

        assert_eq!(fake.refreshes(), 1);
        assert_eq!(resolved.access_token, "ya29.refreshed");
        assert!(resolved.expires > before, "new expiry must be in the future");
        assert_eq!(resolved.refresh_token.as_deref(), Some("1//rt"));
        assert_eq!(cache.get(&key()), Some(resolved));
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_cached() {
        let fake = FakeEndpoint::new(exchange_token(None), refresh_token_reply(Some("1//rotated")));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        cache.store(key(), bundle(now_millis() - 1_000, Some("1//rt"), &[SPACES]));

        resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap();

        assert_eq!(
            cache.get(&key()).unwrap().refresh_token.as_deref(),
            Some("1//rotated")
        );
    }

    #[tokio::test]
    async fn refresh_failure_evicts_and_requests_consent() {
        let fake = FakeEndpoint::new(exchange_token(None), Reply::Revoked);
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        cache.store(key(), bundle(now_millis() - 1_000, Some("1//revoked"), &[SPACES]));

        let signal = expect_suspended(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());
        assert_eq!(signal.request.required_scopes, scopes(&[SPACES]));
        assert!(cache.get(&key()).is_none(), "expired bundle must not linger");

        // Second call does not retry the dead refresh token
        resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap();
        assert_eq!(fake.refreshes(), 1);
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_keeps_bundle_for_retry() {
        let fake = FakeEndpoint::new(exchange_token(None), Reply::ConnectionReset);
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        let cached = bundle(now_millis() - 1_000, Some("1//good"), &[SPACES]);
        cache.store(key(), cached.clone());

        expect_suspended(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());
        assert_eq!(cache.get(&key()), Some(cached), "refresh token must survive a network error");

        // Next call tries the refresh again instead of going straight to consent
        resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap();
        assert_eq!(fake.refreshes(), 2);
    }

    #[tokio::test]
    async fn bundle_about_to_expire_is_refreshed() {
        let fake = FakeEndpoint::new(exchange_token(None), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        cache.store(key(), bundle(now_millis() + 2_000, Some("1//rt"), &[SPACES]));

        let resolved = expect_ready(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());

        assert_eq!(fake.refreshes(), 1);
        assert_eq!(resolved.access_token, "ya29.refreshed");
        assert!(resolved.expires > now_millis() + REFRESH_THRESHOLD_MILLIS);
    }

    #[tokio::test]
    async fn bundle_outside_refresh_window_is_not_refreshed() {
        let fake = FakeEndpoint::new(exchange_token(None), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        cache.store(
            key(),
            bundle(now_millis() + REFRESH_THRESHOLD_MILLIS + 60_000, Some("1//rt"), &[SPACES]),
        );

        let resolved = expect_ready(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());

        assert_eq!(resolved.access_token, "ya29.cached");
        assert_eq!(fake.refreshes(), 0);
    }

    #[tokio::test]
    async fn expired_bundle_without_refresh_token_requests_consent() {
        let fake = FakeEndpoint::new(exchange_token(None), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        cache.store(key(), bundle(now_millis() - 1_000, None, &[SPACES]));

        let resolution = resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap();

        expect_suspended(resolution);
        assert_eq!(fake.refreshes(), 0);
    }

    #[tokio::test]
    async fn no_credentials_suspends_with_exact_scopes() {
        let fake = FakeEndpoint::new(exchange_token(None), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();

        let signal =
            expect_suspended(resolver.resolve(&mut cache, &context(&[MESSAGES])).await.unwrap());

        assert!(!signal.authorization_url().is_empty());
        assert_eq!(signal.request.required_scopes, scopes(&[MESSAGES]));
        assert!(signal.authorization_url().contains("chat.messages.readonly"));
        assert!(!signal.authorization_url().contains("chat.spaces.readonly"));
        assert_eq!(fake.exchanges(), 0);
    }

    #[tokio::test]
    async fn insufficient_scope_escalates_without_refresh() {
        let fake = FakeEndpoint::new(exchange_token(None), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        cache.store(key(), bundle(now_millis() + 3_600_000, Some("1//rt"), &[SPACES]));

        let signal = expect_suspended(
            resolver
                .resolve(&mut cache, &context(&[SPACES, MESSAGES]))
                .await
                .unwrap(),
        );

        assert_eq!(signal.request.required_scopes, scopes(&[SPACES, MESSAGES]));
        assert_eq!(fake.refreshes(), 0);
    }

    #[tokio::test]
    async fn mismatched_state_fails_and_leaves_cache_empty() {
        let fake = FakeEndpoint::new(exchange_token(Some(SPACES)), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        expect_suspended(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());

        let forged = ConsentResponse::new(format!("{REDIRECT}?state=forged&code=4/0Ae"));
        let err = resolver
            .resolve(&mut cache, &context(&[SPACES]).with_consent_response(forged))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConsentExchange(ref m) if m.contains("state")));
        assert!(err.requires_new_consent());
        assert!(cache.get(&key()).is_none());
        assert!(cache.pending(&key()).is_none(), "failed exchange discards the request");
        assert_eq!(fake.exchanges(), 0);
    }

    #[tokio::test]
    async fn response_without_pending_request_is_rejected() {
        let fake = FakeEndpoint::new(exchange_token(Some(SPACES)), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();

        let stray = ConsentResponse::new(format!("{REDIRECT}?state=s&code=c"));
        let err = resolver
            .resolve(&mut cache, &context(&[SPACES]).with_consent_response(stray))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConsentExchange(ref m) if m.contains("pending")));
        assert_eq!(fake.exchanges(), 0);
    }

    #[tokio::test]
    async fn failed_code_exchange_consumes_the_request() {
        let fake = FakeEndpoint::new(Reply::Revoked, refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        let signal = expect_suspended(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());
        let response = redirect_for(&signal);

        let first = resolver
            .resolve(&mut cache, &context(&[SPACES]).with_consent_response(response.clone()))
            .await
            .unwrap_err();
        assert!(matches!(first, Error::ConsentExchange(ref m) if m.contains("exchange")));

        // Replaying the same redirect cannot succeed: the request is gone
        let replay = resolver
            .resolve(&mut cache, &context(&[SPACES]).with_consent_response(response))
            .await
            .unwrap_err();
        assert!(matches!(replay, Error::ConsentExchange(ref m) if m.contains("pending")));
        assert_eq!(fake.exchanges(), 1);
        assert!(cache.get(&key()).is_none());
    }

    #[tokio::test]
    async fn exchange_uses_verifier_behind_the_challenge() {
        let fake = FakeEndpoint::new(exchange_token(Some(SPACES)), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        let signal = expect_suspended(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());

        resolver
            .resolve(&mut cache, &context(&[SPACES]).with_consent_response(redirect_for(&signal)))
            .await
            .unwrap();

        let verifier = fake.verifiers.lock().unwrap()[0].clone();
        let challenge = compute_challenge(&verifier);
        assert!(
            signal
                .authorization_url()
                .contains(&format!("code_challenge={challenge}")),
            "URL must carry the challenge for the verifier used in the exchange"
        );
    }

    #[tokio::test]
    async fn fresh_session_consents_then_reuses_cache() {
        let fake = FakeEndpoint::new(exchange_token(Some(SPACES)), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();

        // First call: consent needed
        let signal = expect_suspended(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());
        assert!(signal.authorization_url().contains("scope="));
        assert!(signal.authorization_url().contains("chat.spaces.readonly"));

        // Second call: redirect URL attached
        let bundle = expect_ready(
            resolver
                .resolve(&mut cache, &context(&[SPACES]).with_consent_response(redirect_for(&signal)))
                .await
                .unwrap(),
        );
        assert!(!bundle.access_token.is_empty());
        assert_eq!(bundle.refresh_token.as_deref(), Some("1//issued"));
        assert_eq!(bundle.scopes, scopes(&[SPACES]));

        // Third call: served from cache, no new prompt
        let again = expect_ready(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());
        assert_eq!(again, bundle);
        assert_eq!(fake.exchanges(), 1);
        assert_eq!(fake.refreshes(), 0);
        assert!(cache.pending(&key()).is_none());
    }

    #[tokio::test]
    async fn exchange_without_scope_field_uses_requested_scopes() {
        let fake = FakeEndpoint::new(exchange_token(None), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        let signal =
            expect_suspended(resolver.resolve(&mut cache, &context(&[MESSAGES])).await.unwrap());

        let bundle = expect_ready(
            resolver
                .resolve(&mut cache, &context(&[MESSAGES]).with_consent_response(redirect_for(&signal)))
                .await
                .unwrap(),
        );
        assert_eq!(bundle.scopes, scopes(&[MESSAGES]));
    }

    #[tokio::test]
    async fn partial_grant_is_cached_but_consent_is_requested_again() {
        // User unticked the messages scope on Google's consent screen
        let fake = FakeEndpoint::new(exchange_token(Some(SPACES)), refresh_token_reply(None));
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        let required = [SPACES, MESSAGES];
        let signal = expect_suspended(resolver.resolve(&mut cache, &context(&required)).await.unwrap());

        let again = expect_suspended(
            resolver
                .resolve(&mut cache, &context(&required).with_consent_response(redirect_for(&signal)))
                .await
                .unwrap(),
        );

        assert_ne!(again.state_token(), signal.state_token());
        assert_eq!(again.request.required_scopes, scopes(&required));
        assert_eq!(cache.get(&key()).unwrap().scopes, scopes(&[SPACES]));
    }

    #[tokio::test]
    async fn resolutions_are_counted_by_outcome() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let fake = FakeEndpoint::new(exchange_token(Some(SPACES)), Reply::Revoked);
        let resolver = resolver(fake.clone());
        let mut cache = CredentialCache::new();
        cache.store(key(), bundle(now_millis() - 1_000, Some("1//revoked"), &[SPACES]));

        let signal = expect_suspended(resolver.resolve(&mut cache, &context(&[SPACES])).await.unwrap());
        resolver
            .resolve(&mut cache, &context(&[SPACES]).with_consent_response(redirect_for(&signal)))
            .await
            .unwrap();

        let output = handle.render();
        assert!(output.contains("outcome=\"suspended\""), "got:\n{output}");
        assert!(output.contains("outcome=\"exchanged\""), "got:\n{output}");
        assert!(output.contains("token_refresh_failures_total 1"), "got:\n{output}");
    }
}

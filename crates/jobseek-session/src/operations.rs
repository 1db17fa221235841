//! Session operations: login, token refresh, logout, profile edit.
//!
//! Each operation follows the same shape: notify loading, do the network
//! I/O, then either return an [`OperationResult`] (and notify success) or
//! notify the error and return an [`OperationError`]. Operations never touch
//! the [`SessionStore`] themselves; [`SessionClient`] applies their results.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{OperationError, RequestError};
use crate::notify::Notifier;
use crate::session::{Credentials, ProfileFields, Session};
use crate::storage::{CookieJar, KeyValueStore, LOGGED_KEY, REFRESH_COOKIE, refresh_cookie_expiry};
use crate::store::{Operation, OperationResult, SessionStore};
use crate::transport::Transport;
use crate::upload::{Attachment, UploadKind, Uploader};

pub const LOGIN_PATH: &str = "auth/login";
pub const REFRESH_PATH: &str = "auth/refresh_token";
pub const PROFILE_PATH: &str = "jobseeker";

pub const LOGOUT_MESSAGE: &str = "Logout success.";
const LOGIN_SUCCESS_MESSAGE: &str = "Login success.";
const UPDATE_SUCCESS_MESSAGE: &str = "Update success.";

/// Input to [`SessionOps::edit_profile`].
#[derive(Debug, Clone)]
pub struct EditProfileRequest {
    /// Existing profile fields, including the currently stored avatar/cv URLs.
    pub profile: ProfileFields,
    /// New avatar file(s); empty keeps the stored avatar.
    pub temp_avatar: Vec<Attachment>,
    /// New CV file(s); empty keeps the stored CV.
    pub temp_cv: Vec<Attachment>,
    /// Access token authorizing the update.
    pub token: String,
}

impl EditProfileRequest {
    pub fn new(profile: ProfileFields, token: impl Into<String>) -> Self {
        Self {
            profile,
            temp_avatar: Vec::new(),
            temp_cv: Vec::new(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn with_avatar(mut self, files: Vec<Attachment>) -> Self {
        self.temp_avatar = files;
        self
    }

    #[must_use]
    pub fn with_cv(mut self, files: Vec<Attachment>) -> Self {
        self.temp_cv = files;
        self
    }
}

/// The four session operations, wired to their collaborators.
pub struct SessionOps {
    transport: Arc<dyn Transport>,
    uploader: Arc<dyn Uploader>,
    local: Arc<dyn KeyValueStore>,
    cookies: Arc<dyn CookieJar>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for SessionOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOps").finish_non_exhaustive()
    }
}

impl SessionOps {
    pub fn new(
        transport: Arc<dyn Transport>,
        uploader: Arc<dyn Uploader>,
        local: Arc<dyn KeyValueStore>,
        cookies: Arc<dyn CookieJar>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            uploader,
            local,
            cookies,
            notifier,
        }
    }

    /// The channel operations report through, for callers with their own notices.
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Logs in and persists the session marker and refresh credential.
    ///
    /// # Errors
    /// Returns the server message (or the fallback) when the request fails.
    pub async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<OperationResult, OperationError> {
        let op = Operation::Login;
        self.notifier.loading();
        tracing::debug!(email = %credentials.email, "logging in");

        let body = serde_json::to_value(credentials).map_err(|e| {
            tracing::warn!(error = %e, "could not encode credentials");
            self.reject(OperationError::fallback(op))
        })?;
        let res = self
            .transport
            .post(LOGIN_PATH, body)
            .await
            .map_err(|e| self.reject_request(op, &e))?;

        let msg = res.msg;
        let refresh = res.refresh_token;
        let session = Session::from_parts(res.access_token, res.user)
            .ok_or_else(|| self.reject(OperationError::fallback(op)))?;

        self.persist_login(refresh.as_deref())
            .map_err(|e| {
                tracing::warn!(error = %e, "could not persist login");
                self.reject(OperationError::fallback(op))
            })?;

        self.notifier
            .success(msg.as_deref().unwrap_or(LOGIN_SUCCESS_MESSAGE));
        tracing::info!("logged in");
        Ok(OperationResult::Login(session))
    }

    fn persist_login(&self, refresh_token: Option<&str>) -> anyhow::Result<()> {
        self.local.set_item(LOGGED_KEY, "true")?;
        match refresh_token {
            Some(token) => {
                self.cookies
                    .set_cookie(REFRESH_COOKIE, token, refresh_cookie_expiry(Utc::now()))?;
            }
            None => tracing::warn!("login response carried no refresh token"),
        }
        Ok(())
    }

    /// Exchanges the ambient refresh credential for a new session.
    ///
    /// Returns `Ok(None)` without any network call when no previous login
    /// is recorded.
    ///
    /// # Errors
    /// Returns the server message (or the fallback) when the request fails.
    pub async fn refresh_token(&self) -> Result<Option<OperationResult>, OperationError> {
        let op = Operation::RefreshToken;

        let logged = self.local.get_item(LOGGED_KEY).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read login marker");
            None
        });
        if logged.as_deref() != Some("true") {
            tracing::debug!("no previous login, skipping refresh");
            return Ok(None);
        }

        let res = self
            .transport
            .get(REFRESH_PATH)
            .await
            .map_err(|e| self.reject_request(op, &e))?;

        let session = Session::from_parts(res.access_token, res.user)
            .ok_or_else(|| self.reject(OperationError::fallback(op)))?;

        tracing::debug!("access token refreshed");
        Ok(Some(OperationResult::RefreshToken(session)))
    }

    /// Clears the durable marker and refresh credential. Never fails.
    pub async fn logout(&self) -> OperationResult {
        if let Err(e) = self.local.remove_item(LOGGED_KEY) {
            tracing::warn!(error = %e, "could not clear login marker");
        }
        if let Err(e) = self.cookies.remove_cookie(REFRESH_COOKIE) {
            tracing::warn!(error = %e, "could not remove refresh credential");
        }

        self.notifier.success(LOGOUT_MESSAGE);
        tracing::info!("logged out");
        OperationResult::Logout
    }

    /// Uploads any new attachments, then updates the profile.
    ///
    /// # Errors
    /// Returns the server message (or the fallback) when an upload or the
    /// update request fails.
    pub async fn edit_profile(
        &self,
        request: EditProfileRequest,
    ) -> Result<OperationResult, OperationError> {
        let op = Operation::EditProfile;
        self.notifier.loading();

        let EditProfileRequest {
            mut profile,
            temp_avatar,
            temp_cv,
            token,
        } = request;

        // Both uploads must settle before the update is sent.
        let (avatar_url, cv_url) = tokio::try_join!(
            self.upload_first(&temp_avatar, UploadKind::Avatar),
            self.upload_first(&temp_cv, UploadKind::Cv),
        )
        .map_err(|e| self.reject_request(op, &e))?;

        if let Some(url) = avatar_url {
            profile.avatar = Some(url);
        }
        if let Some(url) = cv_url {
            profile.cv = Some(url);
        }

        let body = serde_json::to_value(&profile).map_err(|e| {
            tracing::warn!(error = %e, "could not encode profile");
            self.reject(OperationError::fallback(op))
        })?;
        let res = self
            .transport
            .patch(PROFILE_PATH, body, &token)
            .await
            .map_err(|e| self.reject_request(op, &e))?;

        let user = res
            .user
            .ok_or_else(|| self.reject(OperationError::fallback(op)))?;

        self.notifier
            .success(res.msg.as_deref().unwrap_or(UPDATE_SUCCESS_MESSAGE));
        Ok(OperationResult::EditProfile(Session::new(token, user)))
    }

    /// Uploads `files` and returns the first URL, or None when nothing was sent.
    async fn upload_first(
        &self,
        files: &[Attachment],
        kind: UploadKind,
    ) -> Result<Option<String>, RequestError> {
        if files.is_empty() {
            return Ok(None);
        }
        let urls = self.uploader.upload(files, kind).await?;
        Ok(urls.into_iter().next().filter(|url| !url.is_empty()))
    }

    fn reject_request(&self, op: Operation, err: &RequestError) -> OperationError {
        tracing::debug!(operation = op.type_name(), error = %err, "request failed");
        self.reject(OperationError::from_request(op, err))
    }

    fn reject(&self, err: OperationError) -> OperationError {
        tracing::warn!(operation = err.operation.type_name(), message = %err.message, "operation failed");
        self.notifier.error(&err.message);
        err
    }
}

/// Runs operations and applies their successes to a [`SessionStore`].
#[derive(Debug)]
pub struct SessionClient {
    ops: SessionOps,
    store: SessionStore,
}

impl SessionClient {
    pub fn new(ops: SessionOps) -> Self {
        Self::with_store(ops, SessionStore::new())
    }

    pub fn with_store(ops: SessionOps, store: SessionStore) -> Self {
        Self { ops, store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn ops(&self) -> &SessionOps {
        &self.ops
    }

    /// # Errors
    /// Returns the operation failure; the store is left untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, OperationError> {
        let result = self.ops.login(credentials).await?;
        Ok(self.settle(result))
    }

    /// Returns `Ok(None)` when there was nothing to refresh.
    ///
    /// # Errors
    /// Returns the operation failure; the store is left untouched.
    pub async fn refresh_token(&self) -> Result<Option<Session>, OperationError> {
        let result = self.ops.refresh_token().await?;
        Ok(result.map(|result| self.settle(result)))
    }

    pub async fn logout(&self) -> Session {
        let result = self.ops.logout().await;
        self.settle(result)
    }

    /// # Errors
    /// Returns the operation failure; the store is left untouched.
    pub async fn edit_profile(
        &self,
        request: EditProfileRequest,
    ) -> Result<Session, OperationError> {
        let result = self.ops.edit_profile(request).await?;
        Ok(self.settle(result))
    }

    fn settle(&self, result: OperationResult) -> Session {
        let session = result.session().clone();
        self.store.apply(result);
        session
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Duration;
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    use super::*;
    use crate::error::{FALLBACK_MESSAGE, RequestErrorKind};
    use crate::notify::{ChannelNotifier, Notice};
    use crate::session::User;
    use crate::storage::{MemoryStorage, StoredCookie};
    use crate::transport::{ApiResponse, TransportFuture};
    use crate::upload::UploadFuture;

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        method: &'static str,
        path: String,
        body: Option<Value>,
        token: Option<String>,
    }

    /// Transport that replays scripted responses and records calls.
    #[derive(Default)]
    struct FakeTransport {
        responses: Mutex<Vec<Result<ApiResponse, RequestError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeTransport {
        fn replying(responses: Vec<Result<ApiResponse, RequestError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn respond(&self, call: Call) -> TransportFuture<'_> {
            self.calls.lock().unwrap().push(call);
            let mut responses = self.responses.lock().unwrap();
            let next = if responses.is_empty() {
                Err(RequestError::new(RequestErrorKind::Connect, "no scripted response"))
            } else {
                responses.remove(0)
            };
            Box::pin(async move { next })
        }
    }

    impl Transport for FakeTransport {
        fn get<'a>(&'a self, path: &'a str) -> TransportFuture<'a> {
            self.respond(Call {
                method: "GET",
                path: path.to_string(),
                body: None,
                token: None,
            })
        }

        fn post<'a>(&'a self, path: &'a str, body: Value) -> TransportFuture<'a> {
            self.respond(Call {
                method: "POST",
                path: path.to_string(),
                body: Some(body),
                token: None,
            })
        }

        fn patch<'a>(&'a self, path: &'a str, body: Value, auth_token: &'a str) -> TransportFuture<'a> {
            self.respond(Call {
                method: "PATCH",
                path: path.to_string(),
                body: Some(body),
                token: Some(auth_token.to_string()),
            })
        }
    }

    /// Uploader that returns `<kind>-<n>.url` per file, or a fixed error.
    #[derive(Default)]
    struct FakeUploader {
        calls: Mutex<Vec<(UploadKind, usize)>>,
        fail: Option<RequestError>,
    }

    impl Uploader for FakeUploader {
        fn upload<'a>(&'a self, files: &'a [Attachment], kind: UploadKind) -> UploadFuture<'a> {
            self.calls.lock().unwrap().push((kind, files.len()));
            let result = match &self.fail {
                Some(err) => Err(err.clone()),
                None => Ok((0..files.len())
                    .map(|n| format!("https://cdn.example/{kind}-{n}.url"))
                    .collect()),
            };
            Box::pin(async move { result })
        }
    }

    struct Harness {
        ops: SessionOps,
        transport: Arc<FakeTransport>,
        uploader: Arc<FakeUploader>,
        storage: Arc<MemoryStorage>,
        notices: mpsc::UnboundedReceiver<Notice>,
    }

    impl Harness {
        fn new(responses: Vec<Result<ApiResponse, RequestError>>) -> Self {
            Self::with_uploader(responses, FakeUploader::default())
        }

        fn with_uploader(
            responses: Vec<Result<ApiResponse, RequestError>>,
            uploader: FakeUploader,
        ) -> Self {
            let transport = FakeTransport::replying(responses);
            let uploader = Arc::new(uploader);
            let storage = Arc::new(MemoryStorage::new());
            let (notifier, notices) = ChannelNotifier::channel();
            let ops = SessionOps::new(
                transport.clone(),
                uploader.clone(),
                storage.clone(),
                storage.clone(),
                Arc::new(notifier),
            );
            Self {
                ops,
                transport,
                uploader,
                storage,
                notices,
            }
        }

        fn drain_notices(&mut self) -> Vec<Notice> {
            let mut out = Vec::new();
            while let Ok(notice) = self.notices.try_recv() {
                out.push(notice);
            }
            out
        }

        fn mark_logged_in(&self) {
            self.storage.set_item(LOGGED_KEY, "true").unwrap();
        }
    }

    fn user(name: &str) -> User {
        User {
            id: Some(format!("id-{name}")),
            name: Some(name.to_string()),
            ..User::default()
        }
    }

    fn login_response() -> ApiResponse {
        ApiResponse {
            access_token: Some("access-1".to_string()),
            refresh_token: Some("refresh-1".to_string()),
            user: Some(user("ada")),
            msg: Some("Login success!".to_string()),
        }
    }

    fn server_error(msg: &str) -> RequestError {
        RequestError::http_status(400, &json!({ "msg": msg }).to_string())
    }

    fn existing_profile() -> ProfileFields {
        ProfileFields {
            name: Some("Ada".to_string()),
            avatar: Some("old.png".to_string()),
            cv: Some("old.pdf".to_string()),
            ..ProfileFields::default()
        }
    }

    fn updated_user_response() -> ApiResponse {
        ApiResponse {
            user: Some(user("ada-updated")),
            msg: Some("Profile updated.".to_string()),
            ..ApiResponse::default()
        }
    }

    #[tokio::test]
    async fn test_login_success_persists_and_notifies() {
        let mut h = Harness::new(vec![Ok(login_response())]);

        let before = Utc::now();
        let result = h
            .ops
            .login(&Credentials::new("ada@example.com", "secret"))
            .await
            .unwrap();

        assert_eq!(result, OperationResult::Login(Session::new("access-1", user("ada"))));

        let data = h.storage.snapshot();
        assert_eq!(data.local.get(LOGGED_KEY).map(String::as_str), Some("true"));
        let cookie = data.cookies.get(REFRESH_COOKIE).unwrap();
        assert_eq!(cookie.value, "refresh-1");
        let expires = cookie.expires_at().unwrap();
        assert!(expires >= before + Duration::days(30));
        assert!(expires <= Utc::now() + Duration::days(30));

        let calls = h.transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].path, "auth/login");
        assert_eq!(
            calls[0].body,
            Some(json!({ "email": "ada@example.com", "password": "secret" }))
        );

        assert_eq!(
            h.drain_notices(),
            vec![Notice::Loading, Notice::Success("Login success!".to_string())]
        );
    }

    #[tokio::test]
    async fn test_login_session_excludes_refresh_token() {
        let h = Harness::new(vec![Ok(login_response())]);
        let result = h
            .ops
            .login(&Credentials::new("a@b.c", "pw"))
            .await
            .unwrap();
        let json = serde_json::to_value(result.session()).unwrap();
        assert_eq!(
            json.as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["accessToken", "user"]
        );
    }

    #[tokio::test]
    async fn test_login_failure_reports_server_message() {
        let mut h = Harness::new(vec![Err(server_error("Email or password is incorrect."))]);

        let err = h
            .ops
            .login(&Credentials::new("a@b.c", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err.operation, Operation::Login);
        assert_eq!(err.message, "Email or password is incorrect.");
        assert_eq!(
            h.drain_notices(),
            vec![
                Notice::Loading,
                Notice::Error("Email or password is incorrect.".to_string())
            ]
        );
        let data = h.storage.snapshot();
        assert!(data.local.is_empty());
        assert!(data.cookies.is_empty());
    }

    #[tokio::test]
    async fn test_error_without_message_uses_fallback() {
        let mut h = Harness::new(vec![Err(RequestError::new(
            RequestErrorKind::Connect,
            "connection refused",
        ))]);

        let err = h
            .ops
            .login(&Credentials::new("a@b.c", "pw"))
            .await
            .unwrap_err();

        assert_eq!(err.message, FALLBACK_MESSAGE);
        assert_eq!(
            h.drain_notices(),
            vec![Notice::Loading, Notice::Error("An error occurred".to_string())]
        );
    }

    #[tokio::test]
    async fn test_login_response_without_user_is_rejected() {
        let mut h = Harness::new(vec![Ok(ApiResponse {
            user: None,
            ..login_response()
        })]);

        let err = h
            .ops
            .login(&Credentials::new("a@b.c", "pw"))
            .await
            .unwrap_err();

        assert_eq!(err.message, FALLBACK_MESSAGE);
        assert!(h.storage.snapshot().local.is_empty());
        assert_eq!(h.drain_notices().last(), Some(&Notice::Error(FALLBACK_MESSAGE.to_string())));
    }

    #[tokio::test]
    async fn test_refresh_without_marker_is_idle() {
        let mut h = Harness::new(vec![Ok(login_response())]);

        let result = h.ops.refresh_token().await.unwrap();

        assert_eq!(result, None);
        assert!(h.transport.calls().is_empty());
        assert!(h.drain_notices().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_with_marker_returns_new_session() {
        let mut h = Harness::new(vec![Ok(ApiResponse {
            access_token: Some("access-2".to_string()),
            user: Some(user("ada")),
            msg: Some("ok".to_string()),
            refresh_token: None,
        })]);
        h.mark_logged_in();

        let result = h.ops.refresh_token().await.unwrap();

        assert_eq!(
            result,
            Some(OperationResult::RefreshToken(Session::new("access-2", user("ada"))))
        );
        let calls = h.transport.calls();
        assert_eq!(calls[0].method, "GET");
        assert_eq!(calls[0].path, "auth/refresh_token");
        // refresh is silent on success
        assert!(h.drain_notices().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_failure_notifies_error() {
        let mut h = Harness::new(vec![Err(server_error("Please login now."))]);
        h.mark_logged_in();

        let err = h.ops.refresh_token().await.unwrap_err();

        assert_eq!(err.operation, Operation::RefreshToken);
        assert_eq!(err.message, "Please login now.");
        assert_eq!(
            h.drain_notices(),
            vec![Notice::Error("Please login now.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_logout_clears_durable_state() {
        let mut h = Harness::new(vec![Ok(login_response())]);
        h.ops
            .login(&Credentials::new("a@b.c", "pw"))
            .await
            .unwrap();
        h.drain_notices();

        let result = h.ops.logout().await;

        assert_eq!(result, OperationResult::Logout);
        let data = h.storage.snapshot();
        assert!(data.local.get(LOGGED_KEY).is_none());
        assert!(data.cookies.get(REFRESH_COOKIE).is_none());
        assert_eq!(
            h.drain_notices(),
            vec![Notice::Success("Logout success.".to_string())]
        );
        // nothing went over the wire for logout
        assert_eq!(h.transport.calls().len(), 1);
    }

    /// Storage whose every access fails, like an unwritable session file.
    struct BrokenStorage;

    impl KeyValueStore for BrokenStorage {
        fn get_item(&self, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("disk unavailable")
        }

        fn set_item(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk unavailable")
        }

        fn remove_item(&self, _key: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk unavailable")
        }
    }

    impl CookieJar for BrokenStorage {
        fn set_cookie(
            &self,
            _name: &str,
            _value: &str,
            _expires_at: chrono::DateTime<Utc>,
        ) -> anyhow::Result<()> {
            anyhow::bail!("disk unavailable")
        }

        fn cookie(&self, _name: &str) -> anyhow::Result<Option<StoredCookie>> {
            anyhow::bail!("disk unavailable")
        }

        fn remove_cookie(&self, _name: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk unavailable")
        }
    }

    fn ops_with_broken_storage(
        responses: Vec<Result<ApiResponse, RequestError>>,
    ) -> (SessionOps, mpsc::UnboundedReceiver<Notice>) {
        let (notifier, notices) = ChannelNotifier::channel();
        let ops = SessionOps::new(
            FakeTransport::replying(responses),
            Arc::new(FakeUploader::default()),
            Arc::new(BrokenStorage),
            Arc::new(BrokenStorage),
            Arc::new(notifier),
        );
        (ops, notices)
    }

    #[tokio::test]
    async fn test_caller_notices_share_the_operation_channel() {
        let mut h = Harness::new(vec![]);
        h.ops.notifier().success("Session refreshed.");
        assert_eq!(
            h.drain_notices(),
            vec![Notice::Success("Session refreshed.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_logout_succeeds_when_storage_fails() {
        let (ops, mut notices) = ops_with_broken_storage(vec![]);

        let result = ops.logout().await;

        assert_eq!(result, OperationResult::Logout);
        assert_eq!(
            notices.try_recv().unwrap(),
            Notice::Success("Logout success.".to_string())
        );
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_login_fails_when_session_cannot_be_persisted() {
        let (ops, mut notices) = ops_with_broken_storage(vec![Ok(login_response())]);

        let err = ops
            .login(&Credentials::new("a@b.c", "pw"))
            .await
            .unwrap_err();

        assert_eq!(err.message, FALLBACK_MESSAGE);
        assert_eq!(notices.try_recv().unwrap(), Notice::Loading);
        assert_eq!(
            notices.try_recv().unwrap(),
            Notice::Error(FALLBACK_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_refresh_with_unreadable_marker_is_idle() {
        let (ops, mut notices) = ops_with_broken_storage(vec![]);

        assert!(ops.refresh_token().await.unwrap().is_none());
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_edit_profile_without_new_files_keeps_urls() {
        let mut h = Harness::new(vec![Ok(updated_user_response())]);

        let request = EditProfileRequest::new(existing_profile(), "access-1");
        let result = h.ops.edit_profile(request).await.unwrap();

        assert!(h.uploader.calls.lock().unwrap().is_empty());
        let calls = h.transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "PATCH");
        assert_eq!(calls[0].path, "jobseeker");
        assert_eq!(calls[0].token.as_deref(), Some("access-1"));
        let body = calls[0].body.clone().unwrap();
        assert_eq!(body["avatar"], json!("old.png"));
        assert_eq!(body["cv"], json!("old.pdf"));
        assert_eq!(body["name"], json!("Ada"));

        assert_eq!(
            result,
            OperationResult::EditProfile(Session::new("access-1", user("ada-updated")))
        );
        assert_eq!(
            h.drain_notices(),
            vec![Notice::Loading, Notice::Success("Profile updated.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_edit_profile_with_new_avatar_only() {
        let h = Harness::new(vec![Ok(updated_user_response())]);

        let request = EditProfileRequest::new(existing_profile(), "access-1")
            .with_avatar(vec![Attachment::new("me.png", vec![1, 2, 3])]);
        h.ops.edit_profile(request).await.unwrap();

        assert_eq!(
            *h.uploader.calls.lock().unwrap(),
            vec![(UploadKind::Avatar, 1)]
        );
        let body = h.transport.calls()[0].body.clone().unwrap();
        assert_eq!(body["avatar"], json!("https://cdn.example/avatar-0.url"));
        assert_eq!(body["cv"], json!("old.pdf"));
    }

    #[tokio::test]
    async fn test_edit_profile_uses_first_url_of_each_kind() {
        let h = Harness::new(vec![Ok(updated_user_response())]);

        let request = EditProfileRequest::new(existing_profile(), "access-1")
            .with_avatar(vec![
                Attachment::new("a.png", vec![1]),
                Attachment::new("b.png", vec![2]),
            ])
            .with_cv(vec![Attachment::new("cv.pdf", vec![3])]);
        h.ops.edit_profile(request).await.unwrap();

        let mut calls = h.uploader.calls.lock().unwrap().clone();
        calls.sort_by_key(|(kind, _)| kind.as_str());
        assert_eq!(calls, vec![(UploadKind::Avatar, 2), (UploadKind::Cv, 1)]);

        let body = h.transport.calls()[0].body.clone().unwrap();
        assert_eq!(body["avatar"], json!("https://cdn.example/avatar-0.url"));
        assert_eq!(body["cv"], json!("https://cdn.example/cv-0.url"));
    }

    #[tokio::test]
    async fn test_edit_profile_upload_failure_skips_update() {
        let mut h = Harness::with_uploader(
            vec![Ok(updated_user_response())],
            FakeUploader {
                fail: Some(RequestError::new(RequestErrorKind::Upload, "boom")),
                ..FakeUploader::default()
            },
        );

        let request = EditProfileRequest::new(existing_profile(), "access-1")
            .with_cv(vec![Attachment::new("cv.pdf", vec![3])]);
        let err = h.ops.edit_profile(request).await.unwrap_err();

        assert_eq!(err.operation, Operation::EditProfile);
        assert_eq!(err.message, FALLBACK_MESSAGE);
        assert!(h.transport.calls().is_empty());
        assert_eq!(
            h.drain_notices(),
            vec![Notice::Loading, Notice::Error(FALLBACK_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn test_client_applies_success_and_ignores_failure() {
        let h = Harness::new(vec![
            Ok(login_response()),
            Err(server_error("Invalid Authentication.")),
        ]);
        let client = SessionClient::new(h.ops);

        let session = client
            .login(&Credentials::new("a@b.c", "pw"))
            .await
            .unwrap();
        assert_eq!(client.store().session(), session);

        let request = EditProfileRequest::new(existing_profile(), "access-1");
        let err = client.edit_profile(request).await.unwrap_err();
        assert_eq!(err.message, "Invalid Authentication.");
        // last-known-good session survives the failure
        assert_eq!(client.store().session(), session);

        let cleared = client.logout().await;
        assert!(cleared.is_empty());
        assert!(!client.store().is_authenticated());
    }

    #[tokio::test]
    async fn test_client_idle_refresh_leaves_store_unchanged() {
        let h = Harness::new(vec![]);
        let client = SessionClient::new(h.ops);
        client.store().apply(OperationResult::Login(Session::new("keep", user("a"))));

        assert_eq!(client.refresh_token().await.unwrap(), None);
        assert_eq!(client.store().access_token().as_deref(), Some("keep"));
    }
}

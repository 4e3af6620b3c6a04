//! Session lifecycle: persisted credential → verified identity.
//!
//! `Unresolved → Resolving → {Authenticated | Anonymous}`. The store is the only
//! writer of the credential; everyone else observes [`SessionState`] through
//! [`SessionStore::subscribe`] or by borrowing [`SessionStore::state`].
//!
//! Hosts that cannot hold the store across an `.await` (the browser app keeps it
//! in a shared cell) drive the sans-IO halves directly: [`SessionStore::begin_restore`]
//! + [`SessionStore::finish_restore`], and [`SessionStore::apply_login`] after the
//! request resolves. The `async` methods compose the same halves.

use tracing::{debug, info, warn};

use crate::api::{AuthApi, LoginRequest, LoginResponse, RegisterRequest, RegisteredUser};
use crate::error::{ApiError, SessionError};
use crate::role::Identity;
use crate::storage::CredentialStore;

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unresolved,
    Resolving,
    Authenticated(Identity),
    Anonymous,
}

impl SessionState {
    /// True once start-up verification has produced a definite answer.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            SessionState::Authenticated(_) | SessionState::Anonymous
        )
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(id) => Some(id),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Unresolved => "unresolved",
            SessionState::Resolving => "resolving",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Anonymous => "anonymous",
        }
    }
}

pub type SubscriptionId = u64;

type Listener = Box<dyn Fn(&SessionState)>;

pub struct SessionStore<S: CredentialStore> {
    credentials: S,
    state: SessionState,
    last_error: Option<String>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl<S: CredentialStore> SessionStore<S> {
    pub fn new(credentials: S) -> Self {
        Self {
            credentials,
            state: SessionState::Unresolved,
            last_error: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity()
    }

    /// Bearer token for authenticated requests. `None` unless the session is
    /// `Authenticated`.
    pub fn token(&self) -> Option<String> {
        match self.state {
            SessionState::Authenticated(_) => self.credentials.load(),
            _ => None,
        }
    }

    /// Most recent login/register failure, as shown to the user.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&SessionState) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn transition(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        debug!("session: {} -> {}", self.state.label(), next.label());
        self.state = next;
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }

    /// Start-up step. Returns the token to verify, or `None` when there is
    /// nothing to verify (the session is then already `Anonymous`).
    pub fn begin_restore(&mut self) -> Option<String> {
        if self.state != SessionState::Unresolved {
            warn!("session restore requested twice; ignoring");
            return None;
        }
        match self.credentials.load() {
            Some(token) => {
                self.transition(SessionState::Resolving);
                Some(token)
            }
            None => {
                self.transition(SessionState::Anonymous);
                None
            }
        }
    }

    /// Applies the profile lookup issued by [`Self::begin_restore`].
    ///
    /// Ignored (returns `false`) unless the session is still `Resolving`, so a
    /// login or logout that raced the lookup wins.
    pub fn finish_restore(&mut self, outcome: Result<Identity, ApiError>) -> bool {
        if self.state != SessionState::Resolving {
            debug!("stale profile verification dropped");
            return false;
        }
        match outcome {
            Ok(identity) => {
                info!("session restored for {}", identity.username);
                self.transition(SessionState::Authenticated(identity));
            }
            Err(e) => {
                warn!("Token verification failed: {}", e);
                self.credentials.clear();
                self.transition(SessionState::Anonymous);
            }
        }
        true
    }

    pub async fn restore(&mut self, api: &impl AuthApi) {
        if let Some(token) = self.begin_restore() {
            let outcome = api.profile(&token).await;
            self.finish_restore(outcome);
        }
    }

    /// Marks the start of a login/register attempt.
    pub fn begin_attempt(&mut self) {
        self.last_error = None;
    }

    /// Commits a successful credential exchange. Token and identity land
    /// together; if the token cannot be persisted nothing changes.
    pub fn apply_login(&mut self, resp: LoginResponse) -> Result<Identity, SessionError> {
        if let Err(e) = self.credentials.save(&resp.token) {
            let err = SessionError::from(e);
            self.record_login_error(&err);
            return Err(err);
        }
        info!("logged in as {} ({})", resp.user.username, resp.user.role_name);
        self.transition(SessionState::Authenticated(resp.user.clone()));
        Ok(resp.user)
    }

    pub fn record_login_error(&mut self, err: &SessionError) {
        self.last_error = Some(user_message(err, LOGIN_FAILED));
    }

    pub fn record_register_error(&mut self, err: &SessionError) {
        self.last_error = Some(user_message(err, REGISTRATION_FAILED));
    }

    pub async fn login(
        &mut self,
        api: &impl AuthApi,
        email: &str,
        password: &str,
    ) -> Result<Identity, SessionError> {
        self.begin_attempt();
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        match api.login(&req).await {
            Ok(resp) => self.apply_login(resp),
            Err(e) => {
                let err = SessionError::from(e);
                self.record_login_error(&err);
                Err(err)
            }
        }
    }

    /// Creates an account. Does not log in and never changes [`SessionState`].
    pub async fn register(
        &mut self,
        api: &impl AuthApi,
        req: &RegisterRequest,
    ) -> Result<RegisteredUser, SessionError> {
        self.begin_attempt();
        match api.register(req).await {
            Ok(created) => {
                info!("registered {}", req.username);
                Ok(created)
            }
            Err(e) => {
                let err = SessionError::from(e);
                self.record_register_error(&err);
                Err(err)
            }
        }
    }

    /// Clears the credential and goes `Anonymous`. Idempotent; no network.
    pub fn logout(&mut self) {
        self.credentials.clear();
        self.transition(SessionState::Anonymous);
    }

    /// Delegation point for a 401 seen anywhere mid-session. Returns `true` if
    /// the session was ended because of it.
    pub fn handle_rejection(&mut self, err: &ApiError) -> bool {
        if !err.is_auth_rejection() {
            return false;
        }
        if matches!(self.state, SessionState::Authenticated(_)) {
            warn!("credential rejected mid-session; logging out");
        }
        self.logout();
        true
    }
}

/// Single human-readable message for an auth failure: the server's own text
/// when it sent one, otherwise `fallback`.
pub fn user_message(err: &SessionError, fallback: &str) -> String {
    match err {
        SessionError::Api(api) => api
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string()),
        SessionError::Storage(_) => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCredentials;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn asha(role: &str) -> Identity {
        Identity {
            id: 1,
            username: "asha".into(),
            email: "asha@example.com".into(),
            role_name: role.into(),
        }
    }

    struct FakeAuth {
        profile: Result<Identity, ApiError>,
        login: Result<LoginResponse, ApiError>,
        register: Result<RegisteredUser, ApiError>,
        profile_calls: Cell<u32>,
    }

    impl FakeAuth {
        fn new() -> Self {
            Self {
                profile: Ok(asha("citizen")),
                login: Ok(LoginResponse {
                    token: "fresh".into(),
                    user: asha("official"),
                }),
                register: Ok(RegisteredUser::default()),
                profile_calls: Cell::new(0),
            }
        }
    }

    impl AuthApi for FakeAuth {
        async fn login(&self, _req: &LoginRequest) -> Result<LoginResponse, ApiError> {
            self.login.clone()
        }

        async fn register(&self, _req: &RegisterRequest) -> Result<RegisteredUser, ApiError> {
            self.register.clone()
        }

        async fn profile(&self, _token: &str) -> Result<Identity, ApiError> {
            self.profile_calls.set(self.profile_calls.get() + 1);
            self.profile.clone()
        }
    }

    fn record(store: &mut SessionStore<MemoryCredentials>) -> Rc<RefCell<Vec<&'static str>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |s| sink.borrow_mut().push(s.label()));
        seen
    }

    struct BrokenStorage;

    impl CredentialStore for BrokenStorage {
        fn load(&self) -> Option<String> {
            None
        }
        fn save(&mut self, _token: &str) -> Result<(), crate::error::StorageError> {
            Err(crate::error::StorageError::Unavailable)
        }
        fn clear(&mut self) {}
    }

    #[tokio::test]
    async fn credential_less_start_goes_anonymous_without_request() {
        let api = FakeAuth::new();
        let mut store = SessionStore::new(MemoryCredentials::default());
        let seen = record(&mut store);

        store.restore(&api).await;

        assert_eq!(store.state(), &SessionState::Anonymous);
        assert_eq!(api.profile_calls.get(), 0);
        assert_eq!(*seen.borrow(), vec!["anonymous"]);
    }

    #[tokio::test]
    async fn stored_credential_passes_through_resolving() {
        let api = FakeAuth::new();
        let mut store = SessionStore::new(MemoryCredentials::with_token("t0"));
        let seen = record(&mut store);

        store.restore(&api).await;

        assert_eq!(*seen.borrow(), vec!["resolving", "authenticated"]);
        assert_eq!(store.identity().map(|i| i.username.as_str()), Some("asha"));
        assert_eq!(store.token().as_deref(), Some("t0"));
        assert_eq!(api.profile_calls.get(), 1);
    }

    #[tokio::test]
    async fn rejected_token_at_startup_is_cleared() {
        let mut api = FakeAuth::new();
        api.profile = Err(ApiError::from_status(401, None));
        let mut store = SessionStore::new(MemoryCredentials::with_token("expired"));
        let seen = record(&mut store);

        store.restore(&api).await;

        assert_eq!(store.state(), &SessionState::Anonymous);
        assert_eq!(*seen.borrow(), vec!["resolving", "anonymous"]);
        assert_eq!(store.credentials.load(), None);
    }

    #[tokio::test]
    async fn network_failure_at_startup_also_clears() {
        let mut api = FakeAuth::new();
        api.profile = Err(ApiError::Network("connection refused".into()));
        let mut store = SessionStore::new(MemoryCredentials::with_token("t0"));

        store.restore(&api).await;

        assert_eq!(store.state(), &SessionState::Anonymous);
        assert_eq!(store.credentials.load(), None);
    }

    #[test]
    fn late_verification_does_not_override_login() {
        let mut store = SessionStore::new(MemoryCredentials::with_token("old"));
        assert_eq!(store.begin_restore().as_deref(), Some("old"));

        store
            .apply_login(LoginResponse {
                token: "new".into(),
                user: asha("admin"),
            })
            .unwrap();

        assert!(!store.finish_restore(Err(ApiError::from_status(401, None))));
        assert_eq!(store.credentials.load().as_deref(), Some("new"));
        assert_eq!(store.identity().and_then(|i| i.role()), Some(crate::role::Role::Admin));
    }

    #[tokio::test]
    async fn login_sets_token_and_identity_together() {
        let api = FakeAuth::new();
        let mut store = SessionStore::new(MemoryCredentials::default());
        store.restore(&api).await;

        let id = store.login(&api, "asha@example.com", "pw").await.unwrap();

        assert_eq!(id.role_name, "official");
        assert_eq!(store.token().as_deref(), Some("fresh"));
        assert_eq!(store.last_error(), None);
    }

    #[tokio::test]
    async fn failed_login_keeps_state_and_surfaces_server_message() {
        let mut api = FakeAuth::new();
        api.login = Err(ApiError::from_status(
            401,
            Some("Invalid email or password".into()),
        ));
        let mut store = SessionStore::new(MemoryCredentials::default());
        store.restore(&api).await;
        let seen = record(&mut store);

        assert!(store.login(&api, "x@example.com", "bad").await.is_err());

        assert_eq!(store.state(), &SessionState::Anonymous);
        assert_eq!(store.last_error(), Some("Invalid email or password"));
        assert!(seen.borrow().is_empty());
    }

    #[tokio::test]
    async fn login_without_server_message_uses_fallback() {
        let mut api = FakeAuth::new();
        api.login = Err(ApiError::Network("timed out".into()));
        let mut store = SessionStore::new(MemoryCredentials::default());

        assert!(store.login(&api, "a@b.c", "pw").await.is_err());
        assert_eq!(store.last_error(), Some("Login failed"));
    }

    #[test]
    fn unpersistable_token_leaves_session_untouched() {
        let mut store = SessionStore::new(BrokenStorage);
        store.begin_restore();

        let res = store.apply_login(LoginResponse {
            token: "t".into(),
            user: asha("citizen"),
        });

        assert!(res.is_err());
        assert_eq!(store.state(), &SessionState::Anonymous);
        assert_eq!(store.last_error(), Some("Login failed"));
    }

    #[tokio::test]
    async fn register_never_logs_in() {
        let mut api = FakeAuth::new();
        let mut store = SessionStore::new(MemoryCredentials::default());
        store.restore(&api).await;
        let req = RegisterRequest {
            username: "asha".into(),
            email: "asha@example.com".into(),
            password: "pw".into(),
            role: None,
        };

        store.register(&api, &req).await.unwrap();
        assert_eq!(store.state(), &SessionState::Anonymous);

        api.register = Err(ApiError::from_status(409, Some("Email already registered".into())));
        assert!(store.register(&api, &req).await.is_err());
        assert_eq!(store.last_error(), Some("Email already registered"));
        assert_eq!(store.state(), &SessionState::Anonymous);
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let api = FakeAuth::new();
        let mut store = SessionStore::new(MemoryCredentials::with_token("t0"));
        store.restore(&api).await;
        let seen = record(&mut store);

        store.logout();
        store.logout();

        assert_eq!(*seen.borrow(), vec!["anonymous"]);
        assert_eq!(store.token(), None);
        assert_eq!(store.credentials.load(), None);
    }

    #[tokio::test]
    async fn only_401_forces_logout() {
        let api = FakeAuth::new();
        let mut store = SessionStore::new(MemoryCredentials::with_token("t0"));
        store.restore(&api).await;

        assert!(!store.handle_rejection(&ApiError::Status(500)));
        assert!(store.identity().is_some());

        assert!(store.handle_rejection(&ApiError::from_status(401, None)));
        assert_eq!(store.state(), &SessionState::Anonymous);
        assert_eq!(store.credentials.load(), None);
    }

    #[test]
    fn unsubscribed_listener_is_silent() {
        let mut store = SessionStore::new(MemoryCredentials::default());
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        let id = store.subscribe(move |_| sink.set(sink.get() + 1));

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.begin_restore();
        assert_eq!(hits.get(), 0);
    }
}

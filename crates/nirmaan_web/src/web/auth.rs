//! Shared session context plus the pages and guard built on it.
//!
//! The [`SessionStore`] lives in a local (non-`Send`) stored value and is never
//! borrowed across an `.await`: requests go out with a cloned [`HttpClient`]
//! and their results are applied through the store's sans-IO halves.

use leptos::prelude::*;
use leptos_router::components::Redirect;
use leptos_router::hooks::{use_location, use_navigate, use_query_map};
use nirmaan::api::{AuthApi, HttpClient, LoginRequest, RegisterRequest};
use nirmaan::config::ClientConfig;
use nirmaan::error::{ApiError, SessionError};
use nirmaan::gate::{post_login_destination, AppRoute, GateDecision, LANDING_PATH, LOGIN_PATH};
use nirmaan::role::{Identity, Role};
use nirmaan::session::{SessionState, SessionStore};
use tracing::{info, warn};
use wasm_bindgen_futures::spawn_local;

use super::storage::LocalStorageCredentials;
use crate::ui_model::{login_href, page_title};

#[derive(Clone, Copy)]
pub(super) struct Auth {
    session: StoredValue<SessionStore<LocalStorageCredentials>, LocalStorage>,
    api: StoredValue<HttpClient, LocalStorage>,
    config: StoredValue<ClientConfig>,
    /// Mirror of the store's state, kept current by a store subscription.
    pub(super) state: RwSignal<SessionState>,
}

/// The backend is served from the same origin as the app.
fn page_config() -> ClientConfig {
    let origin = web_sys::window().and_then(|w| w.location().origin().ok());
    match origin.as_deref().map(ClientConfig::with_base) {
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            warn!("page origin unusable as API base ({e}); using default");
            ClientConfig::default()
        }
        None => ClientConfig::default(),
    }
}

pub(super) fn provide_auth() -> Result<Auth, ApiError> {
    let cfg = page_config();
    let client = HttpClient::new(&cfg)?;
    info!("API base {}", client.base());

    let state = RwSignal::new(SessionState::Unresolved);
    let mut store = SessionStore::new(LocalStorageCredentials::new(cfg.token_key));
    store.subscribe(move |s| state.set(s.clone()));

    let auth = Auth {
        session: StoredValue::new_local(store),
        api: StoredValue::new_local(client),
        config: StoredValue::new(cfg),
        state,
    };
    provide_context(auth);
    Ok(auth)
}

pub(super) fn use_auth() -> Auth {
    expect_context::<Auth>()
}

impl Auth {
    pub(super) fn client(self) -> HttpClient {
        self.api.get_value()
    }

    /// Settings resolved once in [`provide_auth`].
    pub(super) fn config(self) -> ClientConfig {
        self.config.get_value()
    }

    pub(super) fn token(self) -> Option<String> {
        self.session.try_with_value(|s| s.token()).flatten()
    }

    fn last_error_or(self, fallback: &str) -> String {
        self.session
            .try_with_value(|s| s.last_error().map(str::to_string))
            .flatten()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Verifies a persisted token once at start-up.
    pub(super) fn restore(self) {
        let Some(token) = self.session.try_update_value(|s| s.begin_restore()).flatten() else {
            return;
        };
        let api = self.client();
        spawn_local(async move {
            let outcome = api.profile(&token).await;
            self.session.try_update_value(|s| s.finish_restore(outcome));
        });
    }

    pub(super) async fn login(self, email: String, password: String) -> Result<Identity, String> {
        self.session.try_update_value(|s| s.begin_attempt());
        let api = self.client();
        let outcome = api.login(&LoginRequest { email, password }).await;
        let applied = self.session.try_update_value(|s| match outcome {
            Ok(resp) => s.apply_login(resp),
            Err(e) => {
                let err = SessionError::from(e);
                s.record_login_error(&err);
                Err(err)
            }
        });
        match applied {
            Some(Ok(identity)) => Ok(identity),
            _ => Err(self.last_error_or("Login failed")),
        }
    }

    pub(super) async fn register(self, req: RegisterRequest) -> Result<Option<String>, String> {
        self.session.try_update_value(|s| s.begin_attempt());
        let api = self.client();
        match api.register(&req).await {
            Ok(created) => Ok(created.message),
            Err(e) => {
                let err = SessionError::from(e);
                self.session.try_update_value(|s| s.record_register_error(&err));
                Err(self.last_error_or("Registration failed"))
            }
        }
    }

    pub(super) fn logout(self) {
        self.session.try_update_value(|s| s.logout());
    }

    /// Ends the session if `err` is a credential rejection.
    pub(super) fn handle_rejection(self, err: &ApiError) -> bool {
        self.session
            .try_update_value(|s| s.handle_rejection(err))
            .unwrap_or(false)
    }
}

/// Renders `children` only when the route's gate allows it. Re-evaluated on
/// every session change, so logging out elsewhere redirects immediately.
#[component]
pub(super) fn Protected(route: AppRoute, children: ChildrenFn) -> impl IntoView {
    let auth = use_auth();
    let location = use_location();
    move || {
        let path = location.pathname.get();
        let decision = match route.gate() {
            Some(gate) => auth.state.with(|s| gate.decide(s, &path)),
            None => GateDecision::Render,
        };
        match decision {
            GateDecision::Loading => view! { <p class="loading">"Loading..."</p> }.into_any(),
            GateDecision::RedirectToLogin { from } => {
                view! { <Redirect path=login_href(&from) /> }.into_any()
            }
            GateDecision::RedirectToLanding => view! { <Redirect path=LANDING_PATH /> }.into_any(),
            GateDecision::Render => children().into_any(),
        }
    }
}

#[component]
pub(super) fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let query = use_query_map();
    let navigate = use_navigate();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        set_busy.set(true);
        set_error.set(None);
        let from = query.with_untracked(|q| q.get("from"));
        let navigate = navigate.clone();
        let (email, password) = (email.get_untracked(), password.get_untracked());
        spawn_local(async move {
            match auth.login(email, password).await {
                Ok(_) => navigate(&post_login_destination(from.as_deref()), Default::default()),
                Err(msg) => {
                    let _ = set_error.try_set(Some(msg));
                }
            }
            let _ = set_busy.try_set(false);
        });
    };

    view! {
        <section class="auth-page">
            <h1>{page_title(AppRoute::Login)}</h1>
            <Show when=move || error.get().is_some()>
                <div class="alert error">{move || error.get().unwrap_or_default()}</div>
            </Show>
            <form on:submit=on_submit>
                <label>"Email"
                    <input type="email" required
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev)) />
                </label>
                <label>"Password"
                    <input type="password" required
                        prop:value=move || password.get()
                        on:input=move |ev| set_password.set(event_target_value(&ev)) />
                </label>
                <button type="submit" disabled=move || busy.get()>
                    {move || if busy.get() { "Logging in..." } else { "Login" }}
                </button>
            </form>
            <p>"No account? " <a href="/register">"Register"</a></p>
        </section>
    }
}

#[component]
pub(super) fn RegisterPage() -> impl IntoView {
    let auth = use_auth();
    let navigate = use_navigate();

    let (username, set_username) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (role, set_role) = signal(Role::Citizen);
    let (error, set_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        set_busy.set(true);
        set_error.set(None);
        let req = RegisterRequest {
            username: username.get_untracked(),
            email: email.get_untracked(),
            password: password.get_untracked(),
            role: Some(role.get_untracked()),
        };
        let navigate = navigate.clone();
        spawn_local(async move {
            match auth.register(req).await {
                Ok(message) => {
                    info!("{}", message.as_deref().unwrap_or("registered"));
                    navigate(LOGIN_PATH, Default::default());
                }
                Err(msg) => {
                    let _ = set_error.try_set(Some(msg));
                }
            }
            let _ = set_busy.try_set(false);
        });
    };

    view! {
        <section class="auth-page">
            <h1>{page_title(AppRoute::Register)}</h1>
            <Show when=move || error.get().is_some()>
                <div class="alert error">{move || error.get().unwrap_or_default()}</div>
            </Show>
            <form on:submit=on_submit>
                <label>"Username"
                    <input type="text" required
                        prop:value=move || username.get()
                        on:input=move |ev| set_username.set(event_target_value(&ev)) />
                </label>
                <label>"Email"
                    <input type="email" required
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev)) />
                </label>
                <label>"Password"
                    <input type="password" required
                        prop:value=move || password.get()
                        on:input=move |ev| set_password.set(event_target_value(&ev)) />
                </label>
                <label>"Role"
                    <select on:change=move |ev| {
                        if let Some(r) = Role::parse(&event_target_value(&ev)) {
                            set_role.set(r);
                        }
                    }>
                        {Role::all()
                            .iter()
                            .map(|r| {
                                let r = *r;
                                view! {
                                    <option value=r.label() selected=move || role.get() == r>
                                        {r.label()}
                                    </option>
                                }
                            })
                            .collect_view()}
                    </select>
                </label>
                <button type="submit" disabled=move || busy.get()>
                    {move || if busy.get() { "Registering..." } else { "Register" }}
                </button>
            </form>
            <p>"Already registered? " <a href="/login">"Login"</a></p>
        </section>
    }
}

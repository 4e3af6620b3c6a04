use leptos::prelude::*;
use nirmaan::api::{ProjectApi, ProjectSummary};
use nirmaan::dashboard::{Dashboard, DashboardView, RoleDispatcher};
use nirmaan::fmt::fmt_fixed;
use nirmaan::gate::AppRoute;
use tracing::warn;
use wasm_bindgen_futures::spawn_local;

use super::auth::use_auth;
use crate::ui_model::page_title;

type Listing = Option<Result<Vec<ProjectSummary>, String>>;

/// Loads the listing at `path` with the session token; a 401 ends the session.
fn load_listing(path: &'static str, set_listing: WriteSignal<Listing>) {
    let auth = use_auth();
    let Some(token) = auth.token() else {
        set_listing.set(Some(Err("Not logged in".to_string())));
        return;
    };
    let api = auth.client();
    spawn_local(async move {
        let outcome = api.listing(path, &token).await;
        if let Err(e) = &outcome {
            warn!("project listing {path} failed: {e}");
            auth.handle_rejection(e);
        }
        // The view may be gone by now.
        let _ = set_listing.try_set(Some(outcome.map_err(|_| {
            "Failed to load projects. Please try again later.".to_string()
        })));
    });
}

#[component]
pub(super) fn DashboardRouter() -> impl IntoView {
    let auth = use_auth();
    let dispatcher = RwSignal::new(RoleDispatcher::new());

    Effect::new(move |_| {
        let identity = auth.state.with(|s| s.identity().cloned());
        dispatcher.maybe_update(|d| d.observe(identity.as_ref()));
    });

    move || match dispatcher.with(RoleDispatcher::view) {
        DashboardView::Loading => view! { <p class="loading">"Loading dashboard..."</p> }.into_any(),
        DashboardView::Ready(dashboard) => view! { <DashboardPanel dashboard=dashboard /> }.into_any(),
    }
}

#[component]
fn DashboardPanel(dashboard: Dashboard) -> impl IntoView {
    let auth = use_auth();
    let (listing, set_listing) = signal::<Listing>(None);
    load_listing(dashboard.projects_path(), set_listing);

    let username = move || {
        auth.state
            .with(|s| s.identity().map(|i| i.username.clone()))
            .unwrap_or_default()
    };

    view! {
        <section class="dashboard">
            <h1>{dashboard.title()}</h1>
            <p class="subtitle">"Welcome, " {username} "!"</p>
            <ProjectList listing=listing />
        </section>
    }
}

#[component]
pub(super) fn ProjectsPage() -> impl IntoView {
    let (listing, set_listing) = signal::<Listing>(None);
    load_listing(AppRoute::Projects.path(), set_listing);

    view! {
        <section class="projects">
            <h1>{page_title(AppRoute::Projects)}</h1>
            <ProjectList listing=listing />
        </section>
    }
}

#[component]
fn ProjectList(listing: ReadSignal<Listing>) -> impl IntoView {
    move || match listing.get() {
        None => view! { <p class="loading">"Loading projects..."</p> }.into_any(),
        Some(Err(msg)) => view! { <p class="alert error">{msg}</p> }.into_any(),
        Some(Ok(projects)) if projects.is_empty() => {
            view! { <p>"No projects yet."</p> }.into_any()
        }
        Some(Ok(projects)) => view! {
            <ul class="project-list">
                {projects
                    .into_iter()
                    .map(|p| {
                        view! {
                            <li class="project-card">
                                <h3>{p.name}</h3>
                                <p>{p.location.unwrap_or_default()}</p>
                                <p>"Status: " {p.status}</p>
                                <p>"Progress: " {fmt_fixed(p.progress, 0)} "%"</p>
                                {p.delay_status.map(|d| view! { <p class="delay">{d}</p> })}
                            </li>
                        }
                    })
                    .collect_view()}
            </ul>
        }
        .into_any(),
    }
}

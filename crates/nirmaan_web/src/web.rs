use leptos::prelude::*;
use leptos_router::components::{Redirect, Route, Router, Routes, A};
use leptos_router::hooks::use_navigate;
use leptos_router::path;
use nirmaan::gate::AppRoute;

use crate::ui_model::{nav_items, page_title, NavItem};

mod auth;
mod charts;
mod dashboard;
mod files;
mod predict;
mod storage;

use auth::{provide_auth, use_auth, LoginPage, Protected, RegisterPage};
use dashboard::{DashboardRouter, ProjectsPage};
use predict::PredictPage;

pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    log::info!("Nirmaan web starting");
    leptos::mount::mount_to_body(App);
}

#[component]
fn App() -> impl IntoView {
    let auth = match provide_auth() {
        Ok(auth) => auth,
        Err(e) => {
            return view! { <p class="alert error">"Failed to start: " {e.to_string()}</p> }
                .into_any()
        }
    };
    auth.restore();

    view! {
        <Router>
            <div class="app">
                <Nav />
                <main class="main-content">
                    <Routes fallback=|| view! { <Redirect path="/" /> }>
                        <Route path=path!("/") view=HomePage />
                        <Route path=path!("/predict") view=PredictPage />
                        <Route path=path!("/about") view=AboutPage />
                        <Route path=path!("/login") view=LoginPage />
                        <Route path=path!("/register") view=RegisterPage />
                        <Route
                            path=path!("/dashboard")
                            view=|| view! {
                                <Protected route=AppRoute::Dashboard>
                                    <DashboardRouter />
                                </Protected>
                            }
                        />
                        <Route
                            path=path!("/projects")
                            view=|| view! {
                                <Protected route=AppRoute::Projects>
                                    <ProjectsPage />
                                </Protected>
                            }
                        />
                    </Routes>
                </main>
            </div>
        </Router>
    }
    .into_any()
}

#[component]
fn Nav() -> impl IntoView {
    let auth = use_auth();
    let navigate = use_navigate();

    let items = move || {
        auth.state.with(nav_items).into_iter().map({
            let navigate = navigate.clone();
            move |item| match item.route() {
                Some(route) => view! { <A href=route.path()>{item.label()}</A> }.into_any(),
                None => {
                    let navigate = navigate.clone();
                    view! {
                        <button
                            class="nav-logout"
                            on:click=move |_| {
                                auth.logout();
                                navigate(AppRoute::Home.path(), Default::default());
                            }
                        >
                            {NavItem::Logout.label()}
                        </button>
                    }
                    .into_any()
                }
            }
        })
        .collect_view()
    };

    view! {
        <nav class="navbar">
            <A href="/">"Nirmaan.ai"</A>
            <div class="nav-links">{items}</div>
        </nav>
    }
}

#[component]
fn HomePage() -> impl IntoView {
    view! {
        <section class="home">
            <h1>{page_title(AppRoute::Home)}</h1>
            <p>"Track public construction projects and predict their progress from a site photo."</p>
            <A href="/predict">"Try a prediction"</A>
        </section>
    }
}

#[component]
fn AboutPage() -> impl IntoView {
    view! {
        <section class="about">
            <h1>{page_title(AppRoute::About)}</h1>
            <p>
                "Nirmaan.ai estimates the construction stage, completion percentage and delay risk "
                "of a site from its photo, timeline and budget utilization."
            </p>
        </section>
    }
}

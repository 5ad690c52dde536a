//! Main Leptos application component and routing.

use ghars_session::{GateDecision, Identity, PermissionRouter, Role, RoleSet, View, gate};
use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    components::{Redirect, Route, Router, Routes},
    hooks::use_navigate,
    path,
};

use crate::config::client_config;
use crate::context::{SessionContext, use_session};
use crate::pages::{AdminIndex, AdminPlaceholder, AdminPointsPage, DashboardPage, LoginPage};

/// The main application component.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let context = match SessionContext::new(&client_config()) {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build API client");
            return view! {
                <Title text="Ghars"/>
                <p class="notice error">"The app is misconfigured. Contact your administrator."</p>
            }
            .into_any();
        }
    };
    context.start();
    provide_context(context);

    view! {
        <Title text="Ghars"/>
        <Router>
            <Header/>
            <main class="container">
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=|| view! {
                        <Protected roles=RoleSet::any()><Landing/></Protected>
                    }/>
                    <Route path=path!("/login") view=LoginPage/>
                    <Route path=path!("/dashboard") view=|| view! {
                        <Protected roles=RoleSet::student()><DashboardPage/></Protected>
                    }/>
                    <Route path=path!("/admin") view=|| view! {
                        <Protected roles=RoleSet::admin()><AdminIndex/></Protected>
                    }/>
                    <Route path=path!("/admin/points") view=|| view! {
                        <Protected roles=RoleSet::admin()><AdminPointsPage/></Protected>
                    }/>
                    <Route path=path!("/admin/users") view=|| view! {
                        <Protected roles=RoleSet::admin()><AdminPlaceholder section=View::AdminUsers/></Protected>
                    }/>
                    <Route path=path!("/admin/weeks") view=|| view! {
                        <Protected roles=RoleSet::admin()><AdminPlaceholder section=View::AdminWeeks/></Protected>
                    }/>
                    <Route path=path!("/admin/analytics") view=|| view! {
                        <Protected roles=RoleSet::admin()><AdminPlaceholder section=View::AdminAnalytics/></Protected>
                    }/>
                </Routes>
            </main>
        </Router>
    }
    .into_any()
}

/// Renders `children` only for identities in `roles`.
#[component]
pub fn Protected(roles: RoleSet, children: ChildrenFn) -> impl IntoView {
    let snapshot = use_session().snapshot;
    let decision = Memo::new(move |_| snapshot.with(|s| gate::decide(s, &roles)));

    move || match decision.get() {
        GateDecision::Loading => view! { <p class="loading">"Loading..."</p> }.into_any(),
        GateDecision::Redirect(target) => view! { <Redirect path=target.path()/> }.into_any(),
        GateDecision::Unavailable => view! { <Unavailable/> }.into_any(),
        GateDecision::Render => children().into_any(),
    }
}

/// Sends an authenticated identity to its role's home.
#[component]
fn Landing() -> impl IntoView {
    let snapshot = use_session().snapshot;
    move || {
        snapshot.with(|s| {
            let target = s
                .identity
                .as_ref()
                .map_or(View::Login, |identity| View::landing(identity.role()));
            view! { <Redirect path=target.path()/> }
        })
    }
}

/// Shown when a credential is held but the server could not be reached.
#[component]
fn Unavailable() -> impl IntoView {
    let context = use_session();
    let message = context
        .snapshot
        .with_untracked(|s| s.failure.as_ref().map(|f| f.to_error().user_message()))
        .unwrap_or("Something went wrong. Try again.");

    view! {
        <div class="panel notice">
            <p class="error">{message}</p>
            <button on:click=move |_| context.retry()>"Try again"</button>
        </div>
    }
}

/// Header component with role-specific navigation.
#[component]
fn Header() -> impl IntoView {
    let snapshot = use_session().snapshot;
    let identity = move || snapshot.with(|s| s.identity.clone());

    view! {
        <header class="header">
            <div class="header-left">
                <a href="/" class="logo">"Ghars"</a>
            </div>
            <div class="header-right">
                {move || identity().map(|identity| view! { <UserMenu identity=identity/> })}
            </div>
        </header>
    }
}

/// Navigation links and logout for the signed-in identity.
#[component]
fn UserMenu(identity: Identity) -> impl IntoView {
    let context = use_session();
    let navigate = use_navigate();
    let on_logout = move |_| {
        context.session.logout();
        navigate(View::Login.path(), Default::default());
    };

    let links = nav_links(&identity)
        .into_iter()
        .map(|target| view! { <a href=target.path()>{label(target)}</a> })
        .collect_view();
    let points = identity
        .points()
        .map(|points| view! { <span class="user-points">{format!("{points} pts")}</span> });

    view! {
        <nav class="user-menu">
            {links}
            <span class="user-name">{identity.name().to_string()}</span>
            {points}
            <button class="logout-button" on:click=on_logout>"Log out"</button>
        </nav>
    }
}

/// Views the identity can navigate to, in landing priority order.
fn nav_links(identity: &Identity) -> Vec<View> {
    match identity.role() {
        Role::Student => vec![View::StudentHome],
        Role::Admin => {
            let mut views = Vec::new();
            for (capability, view) in PermissionRouter::default().routes() {
                if identity.can(*capability) && !views.contains(view) {
                    views.push(*view);
                }
            }
            views
        }
    }
}

pub(crate) fn label(view: View) -> &'static str {
    match view {
        View::Login => "Log in",
        View::StudentHome => "My points",
        View::AdminHome => "Admin",
        View::AdminUsers => "Users",
        View::AdminWeeks => "Weeks",
        View::AdminPoints => "Points",
        View::AdminAnalytics => "Analytics",
    }
}

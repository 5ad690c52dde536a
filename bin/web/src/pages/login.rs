//! Password login page.

use std::sync::Arc;

use ghars_session::{GateDecision, HydrationOutcome, gate};
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::Redirect;

use crate::context::use_session;

/// Login form. A hydrated identity is sent to its landing view instead.
#[component]
pub fn LoginPage() -> impl IntoView {
    let context = use_session();
    let snapshot = context.snapshot;
    let decision = Memo::new(move |_| snapshot.with(gate::decide_guest));
    // Why the previous session ended, if the user has to log in again.
    let notice = move || {
        snapshot.with(|s| {
            s.failure
                .as_ref()
                .filter(|failure| !failure.is_retryable())
                .map(|failure| failure.to_error().user_message())
        })
    };

    let password = RwSignal::new(String::new());
    let error = RwSignal::new(None::<&'static str>);
    let pending = RwSignal::new(false);

    let session = context.session;
    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if pending.get_untracked() {
            return;
        }
        let entered = password.get_untracked();
        if entered.trim().is_empty() {
            error.set(Some("Enter your password."));
            return;
        }

        pending.set(true);
        error.set(None);
        let session = Arc::clone(&session);
        spawn_local(async move {
            let message = match session.sign_in(&entered).await {
                Ok(HydrationOutcome::Hydrated | HydrationOutcome::Superseded) => None,
                Ok(_) => Some(
                    session
                        .snapshot()
                        .failure
                        .map_or("Something went wrong. Try again.", |f| {
                            f.to_error().user_message()
                        }),
                ),
                Err(e) => Some(e.user_message()),
            };
            if message.is_none() {
                password.try_set(String::new());
            }
            error.try_set(message);
            pending.try_set(false);
        });
    };

    move || match decision.get() {
        GateDecision::Loading => view! { <p class="loading">"Loading..."</p> }.into_any(),
        GateDecision::Redirect(target) => view! { <Redirect path=target.path()/> }.into_any(),
        GateDecision::Unavailable | GateDecision::Render => view! {
            <div class="login-page">
                <div class="login-box">
                    <h1>"Log in to Ghars"</h1>
                    <form on:submit=on_submit.clone()>
                        <input
                            type="password"
                            placeholder="Password"
                            autocomplete="current-password"
                            prop:value=move || password.get()
                            on:input=move |ev| password.set(event_target_value(&ev))
                        />
                        <button type="submit" disabled=move || pending.get()>
                            {move || if pending.get() { "Logging in..." } else { "Log in" }}
                        </button>
                    </form>
                    {move || {
                        error
                            .get()
                            .or_else(notice)
                            .map(|message| view! { <p class="error">{message}</p> })
                    }}
                </div>
            </div>
        }
        .into_any(),
    }
}

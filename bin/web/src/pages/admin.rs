//! Admin pages.

use std::str::FromStr;
use std::sync::Arc;

use ghars_api::StudentRecord;
use ghars_core::UserId;
use ghars_session::{ApiError, PermissionRouter, View};
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::Redirect;

use crate::app::label;
use crate::context::use_session;
use crate::pages::api_failure_message;

/// `/admin`: sends the admin to the first screen their capabilities allow.
///
/// An admin with no routable capability is logged out with a reason and sent
/// to login, so the login page does not bounce them straight back here.
#[component]
pub fn AdminIndex() -> impl IntoView {
    let context = use_session();
    let identity = context.snapshot.with_untracked(|s| s.identity.clone());
    let target = match identity {
        Some(identity) => match PermissionRouter::default().try_resolve(&identity) {
            Ok(target) => target,
            Err(_) => {
                context.session.end_without_landing_view(identity.id());
                View::Login
            }
        },
        None => View::Login,
    };

    view! { <Redirect path=target.path()/> }
}

/// Admin sections without a client-side screen yet.
#[component]
pub fn AdminPlaceholder(section: View) -> impl IntoView {
    view! {
        <div class="panel notice">
            <h1>{label(section)}</h1>
            <p>"This section is not available in this client yet."</p>
        </div>
    }
}

/// Awards points to a student and bumps the change generation so every
/// points view refetches.
#[component]
pub fn AdminPointsPage() -> impl IntoView {
    let context = use_session();
    let generation = context.generation;
    let changes = context.changes.clone();
    let session = context.session;

    let students = RwSignal::new(None::<Result<Vec<StudentRecord>, ApiError>>);
    let selected = RwSignal::new(String::new());
    let points = RwSignal::new(String::new());
    let message = RwSignal::new(None::<Result<String, String>>);
    let pending = RwSignal::new(false);

    let list_session = Arc::clone(&session);
    Effect::new(move |_| {
        let requested = generation.get();
        let session = Arc::clone(&list_session);
        spawn_local(async move {
            let api = session.api();
            let result = session
                .authorized(|credential| async move { api.list_students(&credential).await })
                .await;
            if generation.get_untracked() == requested {
                students.try_set(Some(result));
            }
        });
    });

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if pending.get_untracked() {
            return;
        }
        let (student, amount) =
            match parse_award(&selected.get_untracked(), &points.get_untracked()) {
                Ok(award) => award,
                Err(problem) => {
                    message.set(Some(Err(problem.to_string())));
                    return;
                }
            };

        pending.set(true);
        message.set(None);
        let session = Arc::clone(&session);
        let changes = changes.clone();
        spawn_local(async move {
            let api = session.api();
            let result = session
                .authorized(|credential| async move {
                    api.award_points(&credential, student, amount).await
                })
                .await;
            let outcome = match result {
                Ok(updated) => {
                    changes.bump();
                    points.try_set(String::new());
                    Ok(format!(
                        "{} now has {} points.",
                        updated.name, updated.points
                    ))
                }
                Err(e) => Err(api_failure_message(&e)),
            };
            message.try_set(Some(outcome));
            pending.try_set(false);
        });
    };

    let student_options = move || match students.get() {
        None => view! { <option value="">"Loading students..."</option> }.into_any(),
        Some(Ok(list)) => view! {
            <option value="">"Select a student"</option>
            {list
                .into_iter()
                .map(|student| {
                    let text = format!("{} ({} pts)", student.name, student.points);
                    view! { <option value=student.id.to_string()>{text}</option> }
                })
                .collect_view()}
        }
        .into_any(),
        Some(Err(e)) => {
            view! { <option value="">{api_failure_message(&e)}</option> }.into_any()
        }
    };

    view! {
        <div class="panel">
            <h1>"Award points"</h1>
            <form on:submit=on_submit>
                <select
                    prop:value=move || selected.get()
                    on:change=move |ev| selected.set(event_target_value(&ev))
                >
                    {student_options}
                </select>
                <input
                    type="number"
                    placeholder="Points"
                    prop:value=move || points.get()
                    on:input=move |ev| points.set(event_target_value(&ev))
                />
                <button type="submit" disabled=move || pending.get()>"Add points"</button>
            </form>
            {move || message.get().map(|outcome| match outcome {
                Ok(text) => view! { <p class="success">{text}</p> }.into_any(),
                Err(text) => view! { <p class="error">{text}</p> }.into_any(),
            })}
        </div>
    }
}

/// Validates the award form.
fn parse_award(student: &str, points: &str) -> Result<(UserId, i64), &'static str> {
    let student = UserId::from_str(student.trim()).map_err(|_| "Select a student.")?;
    let points = points
        .trim()
        .parse::<i64>()
        .map_err(|_| "Enter a whole number of points.")?;
    if points == 0 {
        return Err("Enter a non-zero number of points.");
    }
    Ok((student, points))
}

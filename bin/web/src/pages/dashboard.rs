//! Student dashboard.

use std::sync::Arc;

use ghars_api::StudentRecord;
use ghars_session::ApiError;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::context::use_session;
use crate::pages::api_failure_message;

/// Shows the student's points, refetched on every change generation.
#[component]
pub fn DashboardPage() -> impl IntoView {
    let context = use_session();
    let generation = context.generation;
    let session = context.session;
    let record = RwSignal::new(None::<Result<StudentRecord, ApiError>>);

    Effect::new(move |_| {
        let requested = generation.get();
        let session = Arc::clone(&session);
        spawn_local(async move {
            let api = session.api();
            let result = session
                .authorized(|credential| async move { api.student_me(&credential).await })
                .await;
            // A newer generation has its own fetch in flight.
            if generation.get_untracked() == requested {
                record.try_set(Some(result));
            }
        });
    });

    view! {
        <div class="dashboard">
            {move || match record.get() {
                None => view! { <p class="loading">"Loading dashboard..."</p> }.into_any(),
                Some(Ok(student)) => view! { <StudentCard student=student/> }.into_any(),
                Some(Err(e)) => view! { <p class="error">{api_failure_message(&e)}</p> }.into_any(),
            }}
        </div>
    }
}

#[component]
fn StudentCard(student: StudentRecord) -> impl IntoView {
    view! {
        <div class="panel">
            <h1>{format!("Welcome, {}!", student.name)}</h1>
            {student.class_name.map(|class_name| view! { <p>{format!("Class: {class_name}")}</p> })}
            <p>"Your points"</p>
            <p class="points">{student.points}</p>
        </div>
    }
}

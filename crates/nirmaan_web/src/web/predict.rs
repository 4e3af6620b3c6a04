use leptos::html::Canvas;
use leptos::prelude::*;
use nirmaan::api::PredictionApi;
use nirmaan::gate::AppRoute;
use nirmaan::prediction::{Field, PredictionForm, PredictionResult, SubmitBlocked, CHART_LABELS};
use nirmaan::time::Instant;
use tracing::{debug, warn};
use wasm_bindgen_futures::spawn_local;

use super::auth::use_auth;
use super::charts::draw_progress_chart;
use super::files::{preview_for, read_attachment, selected_file};
use crate::ui_model::page_title;

type FormCell = StoredValue<PredictionForm, LocalStorage>;

#[component]
pub(super) fn PredictPage() -> impl IntoView {
    let auth = use_auth();
    let settle = auth.config().settle_window;
    let form: FormCell = StoredValue::new_local(PredictionForm::new(settle));
    // Bumped after every mutation of `form`; memos below re-read through it.
    let version = RwSignal::new(0u64);
    let bump = move || {
        let _ = version.try_update(|v| *v += 1);
    };

    on_cleanup(move || {
        form.try_update_value(|f| f.unmount());
    });

    let field_error = move |field: Field| {
        Memo::new(move |_| {
            version.track();
            form.try_with_value(|f| f.error(field)).flatten()
        })
    };
    let timeline_error = field_error(Field::TimelineDays);
    let budget_error = field_error(Field::BudgetUtilizedPercent);
    let image_error = field_error(Field::Image);

    let can_submit = Memo::new(move |_| {
        version.track();
        form.try_with_value(PredictionForm::can_submit).unwrap_or(false)
    });
    let submitting = Memo::new(move |_| {
        version.track();
        form.try_with_value(PredictionForm::is_submitting).unwrap_or(false)
    });
    let failure = Memo::new(move |_| {
        version.track();
        form.try_with_value(|f| f.failure().map(str::to_string)).flatten()
    });
    let result = Memo::new(move |_| {
        version.track();
        form.try_with_value(|f| f.result().cloned()).flatten()
    });
    let preview_url = Memo::new(move |_| {
        version.track();
        form.try_with_value(|f| f.preview_url().map(str::to_string)).flatten()
    });

    let on_text = move |field: Field, value: String| {
        let ticket = form
            .try_update_value(|f| f.set_text(field, &value, Instant::now()))
            .flatten();
        bump();
        if let Some(ticket) = ticket {
            set_timeout(
                move || {
                    if form.try_update_value(|f| f.on_settled(&ticket)) == Some(true) {
                        bump();
                    }
                },
                settle,
            );
        }
    };

    let on_file = move |ev: leptos::ev::Event| {
        let Some(file) = selected_file(&ev) else {
            return;
        };
        // The type check runs before any bytes are read.
        let started = form
            .try_update_value(|f| f.begin_image_selection(&file.type_()))
            .flatten();
        bump();
        let Some(id) = started else {
            return;
        };
        let preview = preview_for(&file);
        spawn_local(async move {
            match read_attachment(file).await {
                Ok(attachment) => {
                    let applied =
                        form.try_update_value(|f| f.finish_image_selection(id, attachment, preview));
                    if applied == Some(true) {
                        bump();
                    }
                }
                Err(e) => warn!("could not read selected file: {e}"),
            }
        });
    };

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let started = form.try_update_value(|f| f.begin_submit());
        bump();
        let ticket = match started {
            Some(Ok(ticket)) => ticket,
            Some(Err(SubmitBlocked::InFlight)) => return,
            Some(Err(blocked)) => {
                debug!("submit blocked: {blocked:?}");
                return;
            }
            None => return,
        };
        let api = auth.client();
        spawn_local(async move {
            let outcome = api.predict(&ticket.request).await;
            if form.try_update_value(|f| f.complete(ticket.id, outcome)) == Some(true) {
                bump();
            }
        });
    };

    let dismiss = move |_| {
        form.try_update_value(|f| f.dismiss_failure());
        bump();
    };

    view! {
        <section class="predict">
            <h1>{page_title(AppRoute::Predict)}</h1>
            <Show when=move || failure.get().is_some()>
                <div class="alert error" role="alert">
                    {move || failure.get().unwrap_or_default()}
                    <button class="dismiss" on:click=dismiss>"×"</button>
                </div>
            </Show>
            <form on:submit=on_submit>
                <label>{Field::TimelineDays.label()}
                    <input type="number"
                        on:input=move |ev| on_text(Field::TimelineDays, event_target_value(&ev)) />
                </label>
                <FieldError error=timeline_error />
                <label>{Field::BudgetUtilizedPercent.label()}
                    <input type="number"
                        on:input=move |ev| {
                            on_text(Field::BudgetUtilizedPercent, event_target_value(&ev))
                        } />
                </label>
                <FieldError error=budget_error />
                <label>{Field::Image.label()}
                    <input type="file" accept="image/*" on:change=on_file />
                </label>
                <FieldError error=image_error />
                {move || preview_url.get().map(|src| view! {
                    <img class="preview" src=src alt="Selected site" />
                })}
                <button type="submit" disabled=move || !can_submit.get()>
                    {move || if submitting.get() { "Predicting..." } else { "Predict" }}
                </button>
            </form>
            {move || result.get().map(|r| view! { <ResultCard result=r /> })}
        </section>
    }
}

#[component]
fn FieldError(error: Memo<Option<&'static str>>) -> impl IntoView {
    move || error.get().map(|msg| view! { <p class="field-error">{msg}</p> })
}

#[component]
fn ResultCard(result: PredictionResult) -> impl IntoView {
    let canvas_ref = NodeRef::<Canvas>::new();
    let series = result.progress_series();

    Effect::new(move |_| {
        if let Some(canvas) = canvas_ref.get() {
            if let Err(e) =
                draw_progress_chart(&canvas, &series, &CHART_LABELS, "#2e7d32", "#ffffff", "#cccccc")
            {
                warn!("chart: {e}");
            }
        }
    });

    let risk_class = if result.high_delay_risk() {
        "high-risk"
    } else {
        "low-risk"
    };

    view! {
        <div class="result-card">
            <h2>"Prediction Results"</h2>
            <p>"Construction Stage: " <strong>{result.predicted_stage.clone()}</strong></p>
            <p>"Confidence: " {result.confidence_label()}</p>
            <p>"Delay Status: " {result.delay_status()}</p>
            <p class=risk_class>"Delay Probability: " {result.probability_label()}</p>
            <canvas node_ref=canvas_ref width="480" height="240"></canvas>
        </div>
    }
}

use dataset_recommender::config::{api_base, NOTICE_DISMISS_MS};
use dataset_recommender::http::HttpGateway;
use dataset_recommender::session::SessionStore;
use dataset_recommender::Workbench;
use gloo_timers::callback::Timeout;
use std::future::Future;
use std::rc::Rc;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// A text field whose committed value is parsed and validated.
#[derive(Clone)]
pub struct ValidatedInput<T: Clone + PartialEq + 'static> {
    pub text: String,
    /// Last value that passed validation.
    pub value: T,
    pub error: Option<String>,
    pub on_text_input: Callback<InputEvent>,
    /// Parses the current text; on failure `value` is kept and `error` set.
    pub on_commit: Callback<()>,
}

#[hook]
pub fn use_validated_input<T: Clone + PartialEq + std::fmt::Display + 'static>(
    initial_value: T,
    parse_and_validate: Rc<dyn Fn(&str) -> Result<T, String>>,
) -> ValidatedInput<T> {
    let value = use_state(|| initial_value.clone());
    let text = use_state(|| initial_value.to_string());
    let error = use_state(|| None::<String>);

    let on_text_input = {
        let text = text.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            text.set(input.value());
        })
    };

    let on_commit = {
        let text = text.clone();
        let value = value.clone();
        let error = error.clone();
        Callback::from(move |_| match parse_and_validate(&text) {
            Ok(parsed) => {
                text.set(parsed.to_string());
                value.set(parsed);
                error.set(None);
            }
            Err(msg) => error.set(Some(msg)),
        })
    };

    ValidatedInput {
        text: (*text).clone(),
        value: (*value).clone(),
        error: (*error).clone(),
        on_text_input,
        on_commit,
    }
}

/// The app-wide workbench. Re-renders the calling component after every
/// state change and reloads visualizations for a session restored from storage.
#[hook]
pub fn use_workbench() -> Rc<Workbench> {
    let refresh = use_force_update();
    let bench = use_memo((), |_| {
        Workbench::new(Rc::new(HttpGateway::new(api_base())), SessionStore::browser())
    });

    {
        let bench = bench.clone();
        use_effect_with((), move |_| {
            bench.subscribe(move || refresh.force_update());
            let restored = bench.state().session.get().is_some();
            if restored {
                spawn_action(&bench, |bench| async move {
                    let _ = bench.load_visualizations().await;
                });
            }
            || ()
        });
    }

    bench
}

/// Runs an async workbench flow. Errors are already shown as notices.
pub fn spawn_action<F, Fut>(bench: &Rc<Workbench>, action: F)
where
    F: FnOnce(Rc<Workbench>) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let bench = bench.clone();
    wasm_bindgen_futures::spawn_local(async move {
        action(bench).await;
    });
}

/// Dismisses the current notice after a fixed delay.
#[hook]
pub fn use_notice_timeout(bench: Rc<Workbench>, notice_id: Option<u64>) {
    use_effect_with(notice_id, move |id| {
        let timeout = id.map(|id| {
            Timeout::new(NOTICE_DISMISS_MS, move || bench.dismiss_notice(id))
        });
        move || drop(timeout)
    });
}

//! Dataset recommender front-end built with Yew.
//! Renders the workbench state and forwards user events to it.

use dataset_recommender::browser::{download_bytes, read_file, read_file_list};
use dataset_recommender::compile::CompileState;
use dataset_recommender::config::{CONFIG_EXPORT_FILENAME, DEBUG_STORAGE_KEY, DEFAULT_RECOMMENDATIONS};
use dataset_recommender::selection::SlotRole;
use dataset_recommender::utils::validate_recommendation_count;
use dataset_recommender::{AppError, ColumnRef, DatasetFile, SystemType, Workbench};
use std::rc::Rc;
use web_sys::{DragEvent, HtmlInputElement};
use yew::prelude::*;

mod components;
mod hooks;

use components::{
    render_algorithm_select, render_column_picker, render_mode_tabs, render_notice,
    render_query_fields, render_recommendations, render_role_slots, render_visualizations,
};
use hooks::{spawn_action, use_notice_timeout, use_validated_input, use_workbench};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadMode {
    Single,
    Multiple,
    Kaggle,
}

impl UploadMode {
    const ALL: [UploadMode; 3] = [UploadMode::Single, UploadMode::Multiple, UploadMode::Kaggle];

    fn label(self) -> &'static str {
        match self {
            UploadMode::Single => "Single CSV",
            UploadMode::Multiple => "Multiple CSVs",
            UploadMode::Kaggle => "Kaggle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryMode {
    Direct,
    Advanced,
}

/// Hands the picked files to the import flow matching the upload tab.
fn import_files(bench: &Rc<Workbench>, mode: UploadMode, files: Option<web_sys::FileList>) {
    spawn_action(bench, move |bench| async move {
        let files = match read_file_list(files).await {
            Ok(files) => files,
            Err(err) => {
                bench.report(err);
                return;
            }
        };
        let _ = match mode {
            UploadMode::Multiple => bench.import_multiple(files).await,
            _ => match files.into_iter().next() {
                Some(file) => bench.import_single(file).await,
                None => Ok(()),
            },
        };
    });
}

fn text_setter(handle: &UseStateHandle<String>) -> Callback<InputEvent> {
    let handle = handle.clone();
    Callback::from(move |e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        handle.set(input.value());
    })
}

#[function_component(Main)]
fn main_component() -> Html {
    let bench = use_workbench();
    let upload_mode = use_state(|| UploadMode::Single);
    let kaggle_username = use_state(String::new);
    let kaggle_key = use_state(String::new);
    let kaggle_path = use_state(String::new);
    let query_mode = use_state(|| QueryMode::Direct);
    let query_text = use_state(String::new);
    let count = use_validated_input(
        DEFAULT_RECOMMENDATIONS,
        Rc::new(|text: &str| validate_recommendation_count(text)),
    );

    let notice_id = bench.state().notice.as_ref().map(|n| n.id);
    use_notice_timeout(bench.clone(), notice_id);

    {
        let bench = bench.clone();
        use_effect_with(count.value, move |value| {
            bench.set_recommendation_count(*value);
            || ()
        });
    }

    // ── dataset upload ────────────────────────────────────────────────────
    let on_file_change = {
        let bench = bench.clone();
        let mode = *upload_mode;
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            import_files(&bench, mode, input.files());
            input.set_value("");
        })
    };

    let on_drop = {
        let bench = bench.clone();
        let mode = *upload_mode;
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            let files = e.data_transfer().and_then(|dt| dt.files());
            import_files(&bench, mode, files);
        })
    };
    let on_drag_over = Callback::from(|e: DragEvent| e.prevent_default());

    let on_kaggle_import = {
        let bench = bench.clone();
        let username = kaggle_username.clone();
        let key = kaggle_key.clone();
        let path = kaggle_path.clone();
        Callback::from(move |_: MouseEvent| {
            let (username, key, path) = ((*username).clone(), (*key).clone(), (*path).clone());
            spawn_action(&bench, move |bench| async move {
                let _ = bench.import_remote(&username, &key, &path).await;
            });
        })
    };

    // ── model configuration ───────────────────────────────────────────────
    let on_select_type = {
        let bench = bench.clone();
        Callback::from(move |system_type: SystemType| bench.select_system_type(system_type))
    };
    let on_select_algorithm = {
        let bench = bench.clone();
        Callback::from(move |algorithm| {
            let _ = bench.select_algorithm(algorithm);
        })
    };
    let on_toggle_input = {
        let bench = bench.clone();
        Callback::from(move |column: ColumnRef| bench.toggle_input(column))
    };
    let on_set_output = {
        let bench = bench.clone();
        Callback::from(move |column: ColumnRef| bench.set_output(column))
    };
    let on_assign_role = {
        let bench = bench.clone();
        Callback::from(move |(role, column): (SlotRole, Option<ColumnRef>)| match column {
            Some(column) => bench.assign_role(role, column),
            None => bench.clear_role(role),
        })
    };
    let on_compile = {
        let bench = bench.clone();
        Callback::from(move |_: MouseEvent| {
            spawn_action(&bench, |bench| async move {
                let _ = bench.compile().await;
            });
        })
    };

    // ── export, save and restore ──────────────────────────────────────────
    let on_export = {
        let bench = bench.clone();
        Callback::from(move |_: MouseEvent| {
            spawn_action(&bench, |bench| async move {
                if let Ok(Some(artifact)) = bench.export_model().await {
                    if let Err(err) =
                        download_bytes(&artifact.file_name, &artifact.bytes, "application/octet-stream")
                    {
                        bench.report(err);
                    }
                }
            });
        })
    };
    let on_save_config = {
        let bench = bench.clone();
        Callback::from(move |_: MouseEvent| {
            if let Ok(json) = bench.configuration_json() {
                if let Err(err) =
                    download_bytes(CONFIG_EXPORT_FILENAME, json.as_bytes(), "application/json")
                {
                    bench.report(err);
                }
            }
        })
    };
    let on_restore_config = {
        let bench = bench.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let Some(file) = input.files().and_then(|list| list.get(0)) else {
                return;
            };
            input.set_value("");
            spawn_action(&bench, move |bench| async move {
                let result = read_file(&file).await.and_then(|DatasetFile { bytes, .. }| {
                    String::from_utf8(bytes)
                        .map_err(|_| AppError::transport("configuration file is not UTF-8"))
                });
                match result {
                    Ok(json) => {
                        let _ = bench.restore_configuration(&json);
                    }
                    Err(err) => {
                        bench.report(err);
                    }
                }
            });
        })
    };

    // ── recommendations ───────────────────────────────────────────────────
    let on_query_field = {
        let bench = bench.clone();
        Callback::from(move |(key, value): (String, String)| bench.set_query_field(&key, value))
    };
    let on_recommend = {
        let bench = bench.clone();
        let query_mode = *query_mode;
        let query_text = query_text.clone();
        Callback::from(move |_: MouseEvent| {
            let text = (*query_text).clone();
            spawn_action(&bench, move |bench| async move {
                let _ = match query_mode {
                    QueryMode::Direct => bench.query_direct(&text).await,
                    QueryMode::Advanced => bench.query_advanced().await,
                };
            });
        })
    };
    let on_dismiss = {
        let bench = bench.clone();
        Callback::from(move |id: u64| bench.dismiss_notice(id))
    };

    let state = bench.state();
    let system_type = state.model.system_type();
    let compiling = matches!(state.model.state(), CompileState::Compiling);
    let compiled = state.model.is_compiled();
    let importing = state.import.is_pending();

    html! {
        <div class="app">
            <header>
                <h1>{ "Dataset Recommender" }</h1>
                { render_mode_tabs(system_type, on_select_type) }
            </header>

            { render_notice(state.notice.as_ref(), on_dismiss) }

            // Upload section
            <section class="panel upload-panel">
                <div class="upload-tabs">
                    { for UploadMode::ALL.iter().map(|&mode| {
                        let upload_mode = upload_mode.clone();
                        let class = if *upload_mode == mode { "tab active" } else { "tab" };
                        html! {
                            <button {class} onclick={Callback::from(move |_| upload_mode.set(mode))}>
                                { mode.label() }
                            </button>
                        }
                    }) }
                </div>

                if *upload_mode == UploadMode::Kaggle {
                    <div class="kaggle-form">
                        <input type="text" placeholder="Kaggle username"
                            value={(*kaggle_username).clone()}
                            oninput={text_setter(&kaggle_username)} />
                        <input type="password" placeholder="Kaggle API key"
                            value={(*kaggle_key).clone()}
                            oninput={text_setter(&kaggle_key)} />
                        <input type="text" placeholder="owner/dataset-name"
                            value={(*kaggle_path).clone()}
                            oninput={text_setter(&kaggle_path)} />
                        <button class="btn-primary" disabled={importing} onclick={on_kaggle_import}>
                            { "Import" }
                        </button>
                    </div>
                } else {
                    <div class="drop-zone" ondrop={on_drop} ondragover={on_drag_over}>
                        <p>
                            { state.import.label().map(str::to_string).unwrap_or_else(|| "Drop CSV file(s) here or browse".to_string()) }
                        </p>
                        <input type="file" accept=".csv,text/csv"
                            multiple={*upload_mode == UploadMode::Multiple}
                            onchange={on_file_change} />
                    </div>
                }

                if importing {
                    <div class="loading">
                        <p>{ "Uploading..." }</p>
                        if !state.import.preview().is_empty() {
                            <p class="hint">{ format!("Columns: {}", state.import.preview().join(", ")) }</p>
                        }
                    </div>
                }
                if let Some(err) = state.import.error() {
                    <div class="input-error">{ err.to_string() }</div>
                }
            </section>

            { render_visualizations(state.visuals.images(), state.visuals.is_pending()) }

            // Model configuration
            <section class="panel model-panel">
                { render_algorithm_select(state.model.algorithm_options(), state.model.algorithm(), on_select_algorithm) }

                if let Some(manifest) = state.import.manifest() {
                    if system_type.is_some_and(SystemType::uses_role_slots) {
                        { render_role_slots(manifest, &state.selection, on_assign_role) }
                    } else if system_type.is_some() {
                        { render_column_picker(manifest, &state.selection, on_toggle_input, on_set_output) }
                    }
                }

                <div class="model-actions">
                    <button class="btn-primary" disabled={compiling} onclick={on_compile}>
                        { if compiling { "Compiling..." } else { "Compile Model" } }
                    </button>
                    <button class="btn-secondary" disabled={!compiled || state.model.is_exporting()} onclick={on_export}>
                        { "Export Model" }
                    </button>
                    <button class="btn-secondary" disabled={!compiled} onclick={on_save_config}>
                        { "Save Configuration" }
                    </button>
                    <label class="btn-secondary">
                        { "Restore Configuration" }
                        <input type="file" accept=".json,application/json" hidden={true} onchange={on_restore_config} />
                    </label>
                </div>
                if let CompileState::Failed(err) = state.model.state() {
                    <div class="current-error compact">{ err.to_string() }</div>
                }
            </section>

            // Recommendations
            if compiled {
                <section class="panel recommend-panel">
                    <div class="query-tabs">
                        <button class={if *query_mode == QueryMode::Direct { "tab active" } else { "tab" }}
                            onclick={let query_mode = query_mode.clone(); Callback::from(move |_| query_mode.set(QueryMode::Direct))}>
                            { "Direct" }
                        </button>
                        <button class={if *query_mode == QueryMode::Advanced { "tab active" } else { "tab" }}
                            onclick={let query_mode = query_mode.clone(); Callback::from(move |_| query_mode.set(QueryMode::Advanced))}>
                            { "Advanced" }
                        </button>
                    </div>

                    if *query_mode == QueryMode::Direct {
                        <input type="text" placeholder="Enter a value"
                            value={(*query_text).clone()}
                            oninput={text_setter(&query_text)} />
                    } else {
                        { render_query_fields(state.recommendations.form(), on_query_field) }
                    }

                    <div class="input-group">
                        <label for="count">{ "Number of recommendations" }</label>
                        <input id="count" type="text"
                            value={count.text.clone()}
                            class={if count.error.is_some() { "invalid" } else { "" }}
                            oninput={count.on_text_input.clone()}
                            onchange={count.on_commit.reform(|_| ())} />
                        if let Some(ref err) = count.error {
                            <div class="input-error">{ err }</div>
                        }
                    </div>

                    <button class="btn-primary" disabled={state.recommendations.is_pending()} onclick={on_recommend}>
                        { "Get Recommendations" }
                    </button>
                    { render_recommendations(state.recommendations.view()) }
                </section>
            }
        </div>
    }
}

/// Entry point: sets up logging and mounts the app.
fn main() {
    let debug_enabled = web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|s| s.get_item(DEBUG_STORAGE_KEY).ok().flatten())
        .is_some_and(|v| v == "true");
    let level = if debug_enabled {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    _ = console_log::init_with_level(level);
    console_error_panic_hook::set_once();
    yew::Renderer::<Main>::new().render();
}

//! Stateless view pieces. Each takes plain data plus callbacks and returns
//! markup; all state lives in the workbench.

use dataset_recommender::gateway::Visualizations;
use dataset_recommender::recommend::{QueryField, RecommendationItem, RecommendationView};
use dataset_recommender::selection::{ColumnSelectionModel, SlotRole};
use dataset_recommender::utils::format_score;
use dataset_recommender::{Algorithm, ColumnManifest, ColumnRef, Notice, NoticeKind, SystemType};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

pub fn render_notice(notice: Option<&Notice>, on_dismiss: Callback<u64>) -> Html {
    let Some(notice) = notice else {
        return html! {};
    };
    let class = match notice.kind {
        NoticeKind::Info => "notice notice-info",
        NoticeKind::Error => "notice notice-error",
    };
    let id = notice.id;
    html! {
        <div class={class} role="status">
            <span>{ &notice.text }</span>
            <button class="btn-secondary small" onclick={on_dismiss.reform(move |_| id)}>
                { "×" }
            </button>
        </div>
    }
}

pub fn render_mode_tabs(current: Option<SystemType>, on_select: Callback<SystemType>) -> Html {
    html! {
        <div class="mode-tabs">
            { for SystemType::ALL.iter().map(|&system_type| {
                let class = if current == Some(system_type) { "tab active" } else { "tab" };
                html! {
                    <button class={class} onclick={on_select.reform(move |_| system_type)}>
                        { system_type.label() }
                    </button>
                }
            }) }
        </div>
    }
}

pub fn render_algorithm_select(
    options: &[Algorithm],
    selected: Option<Algorithm>,
    on_change: Callback<Algorithm>,
) -> Html {
    if options.is_empty() {
        return html! {
            <p class="hint">{ "Choose a recommender system type to see its algorithms." }</p>
        };
    }
    let onchange = Callback::from(move |e: Event| {
        let select: HtmlSelectElement = e.target_unchecked_into();
        if let Some(algorithm) = Algorithm::parse(&select.value()) {
            on_change.emit(algorithm);
        }
    });
    html! {
        <div class="input-group">
            <label for="algorithm">{ "Algorithm" }</label>
            <select id="algorithm" {onchange}>
                { for options.iter().map(|algorithm| html! {
                    <option value={algorithm.label()} selected={selected == Some(*algorithm)}>
                        { algorithm.label() }
                    </option>
                }) }
            </select>
        </div>
    }
}

/// Checkbox per input and radio per output; content-based and hybrid modes.
pub fn render_column_picker(
    manifest: &ColumnManifest,
    selection: &ColumnSelectionModel,
    on_toggle_input: Callback<ColumnRef>,
    on_set_output: Callback<ColumnRef>,
) -> Html {
    html! {
        <table class="column-table">
            <thead>
                <tr>
                    <th>{ "Column" }</th>
                    <th>{ "Input" }</th>
                    <th>{ "Output" }</th>
                </tr>
            </thead>
            <tbody>
                { for manifest.columns().into_iter().map(|column| {
                    let toggle = {
                        let column = column.clone();
                        on_toggle_input.reform(move |_: Event| column.clone())
                    };
                    let choose = {
                        let column = column.clone();
                        on_set_output.reform(move |_: Event| column.clone())
                    };
                    html! {
                        <tr key={column.key()}>
                            <td>{ column.to_string() }</td>
                            <td>
                                <input type="checkbox"
                                    checked={selection.is_input(&column)}
                                    onchange={toggle} />
                            </td>
                            <td>
                                <input type="radio" name="output-column"
                                    checked={selection.is_output(&column)}
                                    onchange={choose} />
                            </td>
                        </tr>
                    }
                }) }
            </tbody>
        </table>
    }
}

/// One dropdown per collaborative role.
pub fn render_role_slots(
    manifest: &ColumnManifest,
    selection: &ColumnSelectionModel,
    on_assign: Callback<(SlotRole, Option<ColumnRef>)>,
) -> Html {
    let columns = manifest.columns();
    html! {
        <div class="role-slots">
            { for SlotRole::ALL.iter().map(|&role| {
                let current = selection.slot(role).map(ColumnRef::key);
                let onchange = {
                    let columns = columns.clone();
                    let on_assign = on_assign.clone();
                    Callback::from(move |e: Event| {
                        let select: HtmlSelectElement = e.target_unchecked_into();
                        let key = select.value();
                        let column = columns.iter().find(|c| c.key() == key).cloned();
                        on_assign.emit((role, column));
                    })
                };
                html! {
                    <div class="input-group">
                        <label>{ role.label() }</label>
                        <select {onchange}>
                            <option value="" selected={current.is_none()}>{ "-- none --" }</option>
                            { for columns.iter().map(|column| {
                                let key = column.key();
                                html! {
                                    <option value={key.clone()} selected={current.as_deref() == Some(key.as_str())}>
                                        { column.to_string() }
                                    </option>
                                }
                            }) }
                        </select>
                    </div>
                }
            }) }
        </div>
    }
}

pub fn render_visualizations(images: Option<&Visualizations>, loading: bool) -> Html {
    if loading {
        return html! { <p class="hint">{ "Loading visualizations..." }</p> };
    }
    let Some(images) = images else {
        return html! {};
    };
    html! {
        <div class="visualization-grid">
            { for images.panels().into_iter().filter(|(_, data)| !data.is_empty()).map(|(title, data)| html! {
                <figure class="visualization">
                    <img src={Visualizations::data_uri(data)} alt={title} />
                    <figcaption>{ title }</figcaption>
                </figure>
            }) }
        </div>
    }
}

pub fn render_query_fields(fields: &[QueryField], on_field: Callback<(String, String)>) -> Html {
    html! {
        <div class="query-fields">
            { for fields.iter().map(|field| {
                let key = field.column.key();
                let oninput = {
                    let key = key.clone();
                    on_field.reform(move |e: InputEvent| {
                        let input: HtmlInputElement = e.target_unchecked_into();
                        (key.clone(), input.value())
                    })
                };
                html! {
                    <div class="input-group" key={key}>
                        <label>{ field.column.to_string() }</label>
                        <input type="text" value={field.value.clone()} {oninput} />
                    </div>
                }
            }) }
        </div>
    }
}

/// Renders the ranked result list.
pub fn render_recommendations(view: &RecommendationView) -> Html {
    match view {
        RecommendationView::Idle => html! {},
        RecommendationView::Empty => html! {
            <div class="no-results-message">
                <p>{ "No recommendations found for this input." }</p>
            </div>
        },
        RecommendationView::Ranked(items) => html! {
            <ol class="recommendations">
                { for items.iter().map(render_recommendation_item) }
            </ol>
        },
    }
}

fn render_recommendation_item(item: &RecommendationItem) -> Html {
    html! {
        <li class="recommendation" key={item.rank}>
            <span class="rank">{ format!("#{}", item.rank) }</span>
            <span class="value">{ &item.output_value }</span>
            if let Some(score) = item.score {
                <span class="score">{ format_score(score) }</span>
            }
            if let Some(details) = &item.details {
                <p class="details">{ details }</p>
            }
        </li>
    }
}

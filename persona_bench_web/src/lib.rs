use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use leptos::*;
use persona_bench::charts::AL_AXIS_TITLE;
use persona_bench::log::template_jsonl;
use persona_bench::presenter::format_number;
use persona_bench::state::StatusKind;
use persona_bench::{
    run_evaluation, run_upload, switch_language, ChartSlot, Dashboard, DashboardConfig,
    DashboardView, Lang, LogFile, ResultsView, StateStore, Texts,
};
use wasm_bindgen::JsCast;
use web_sys::HtmlInputElement;

mod browser;
mod transport;

use browser::{BrowserScheduler, ChartJsHandle};
use transport::GlooApi;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_COMMIT: &str = env!("DASHBOARD_BUILD_COMMIT");

const AL_CANVAS: &str = "alCurveChart";
const RADAR_CANVAS: &str = "radarChart";

/// The dashboard state plus a revision signal that views subscribe to.
///
/// Controllers mutate through [`StateStore::update`], which bumps the
/// revision after the borrow is released; [`AppStore::watch`] turns any
/// projection of the state into a memo that follows those bumps.
#[derive(Clone)]
pub struct AppStore {
    state: Rc<RefCell<Dashboard>>,
    revision: RwSignal<u64>,
}

impl AppStore {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            state: Rc::new(RefCell::new(dashboard)),
            revision: create_rw_signal(0),
        }
    }

    pub fn watch<T, F>(&self, project: F) -> Memo<T>
    where
        T: PartialEq + 'static,
        F: Fn(&Dashboard) -> T + 'static,
    {
        let state = self.state.clone();
        let revision = self.revision;
        create_memo(move |_| {
            revision.with(|_| ());
            project(&state.borrow())
        })
    }
}

impl StateStore for AppStore {
    fn update<R>(&self, f: impl FnOnce(&mut Dashboard) -> R) -> R {
        let out = f(&mut self.state.borrow_mut());
        self.revision.update(|rev| *rev += 1);
        out
    }

    fn read<R>(&self, f: impl FnOnce(&Dashboard) -> R) -> R {
        f(&self.state.borrow())
    }
}

type Slot = Rc<RefCell<ChartSlot<ChartJsHandle>>>;

fn initial_lang() -> Lang {
    browser::page_lang()
        .and_then(|code| Lang::from_code(code.split('-').next().unwrap_or_default()))
        .unwrap_or_default()
}

fn draw_charts(results: &ResultsView, al_slot: &Slot, radar_slot: &Slot) {
    al_slot
        .borrow_mut()
        .redraw(|| browser::draw_chart(AL_CANVAS, &results.al_curve.to_chartjs(AL_AXIS_TITLE)));
    radar_slot
        .borrow_mut()
        .redraw(|| browser::draw_chart(RADAR_CANVAS, &results.radar.to_chartjs()));
}

#[component]
fn NavLink(
    store: AppStore,
    active: Memo<Option<String>>,
    href: &'static str,
    label: &'static str,
) -> impl IntoView {
    let on_click = move |ev: ev::MouseEvent| {
        ev.prevent_default();
        if let Some(id) = store.update(|s| s.follow_link(href, browser::element_exists)) {
            browser::scroll_to(&id);
        }
    };
    view! {
        <a href=href class="nav-link" class:active=move || active.get().as_deref() == Some(href) on:click=on_click>
            {label}
        </a>
    }
}

#[component]
fn ResultsBody(results: ResultsView, texts: &'static Texts) -> impl IntoView {
    let cards = results
        .cards
        .iter()
        .map(|card| {
            let label = card.label(texts.total_sessions);
            view! {
                <div class="metric-card" class:best=card.is_best()>
                    <div class="metric-value">{card.value.clone()}</div>
                    <div class="metric-label">{label}</div>
                </div>
            }
        })
        .collect_view();
    let header = results
        .table
        .columns
        .iter()
        .map(|column| view! { <th>{column.clone()}</th> })
        .collect_view();
    let rows = results
        .table
        .rows
        .iter()
        .map(|row| {
            let cells = row
                .cells
                .iter()
                .map(|cell| view! { <td class:best-score=cell.best>{format_number(cell.value)}</td> })
                .collect_view();
            view! { <tr><td class="method-name">{row.method.clone()}</td>{cells}</tr> }
        })
        .collect_view();

    view! {
        <h3>{texts.metrics_title}</h3>
        <div class="metrics-grid">{cards}</div>
        <h3>{texts.details_title}</h3>
        <table class="comparison-table">
            <thead><tr><th>{texts.method}</th>{header}</tr></thead>
            <tbody>{rows}</tbody>
        </table>
    }
}

#[component]
pub fn App() -> impl IntoView {
    let lang = initial_lang();
    let texts = lang.texts();
    let store = AppStore::new(Dashboard::new(DashboardConfig {
        lang,
        ..DashboardConfig::default()
    }));
    let api = Rc::new(GlooApi::default());

    let page: Memo<DashboardView> = store.watch(Dashboard::render);
    let epoch = store.watch(Dashboard::results_epoch);
    let active = store.watch(|s| s.nav().active().map(str::to_string));
    let (dragging, set_dragging) = create_signal(false);
    let (revealed, set_revealed) = create_signal(false);
    let al_slot: Slot = Rc::new(RefCell::new(ChartSlot::new()));
    let radar_slot: Slot = Rc::new(RefCell::new(ChartSlot::new()));

    let upload = {
        let store = store.clone();
        let api = api.clone();
        move |file: LogFile| {
            let store = store.clone();
            let api = api.clone();
            spawn_local(async move {
                if let Err(err) = run_upload(&store, api.as_ref(), file).await {
                    logging::warn!("upload failed: {err}");
                }
            });
        }
    };

    let on_file_input = {
        let upload = upload.clone();
        move |ev: ev::Event| {
            let Some(input) = ev
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            let upload = upload.clone();
            spawn_local(async move {
                let file = match input.files() {
                    Some(list) => browser::read_first(&list).await,
                    None => None,
                };
                input.set_value("");
                if let Some(file) = file {
                    upload(file);
                }
            });
        }
    };

    let on_drop = {
        let upload = upload.clone();
        move |ev: ev::DragEvent| {
            ev.prevent_default();
            set_dragging.set(false);
            if !page.with_untracked(|p| p.upload_enabled) {
                return;
            }
            let Some(list) = ev.data_transfer().and_then(|dt| dt.files()) else {
                return;
            };
            let upload = upload.clone();
            spawn_local(async move {
                if let Some(file) = browser::read_first(&list).await {
                    upload(file);
                }
            });
        }
    };

    let on_start = {
        let store = store.clone();
        let api = api.clone();
        move |_ev: ev::MouseEvent| {
            let store = store.clone();
            let api = api.clone();
            spawn_local(async move {
                if let Err(err) = run_evaluation(&store, api.as_ref(), &BrowserScheduler).await {
                    logging::warn!("evaluation did not complete: {err}");
                }
            });
        }
    };

    let on_export = {
        let store = store.clone();
        move |_ev: ev::MouseEvent| match store.read(|s| s.export()) {
            Some(Ok(file)) => {
                if let Err(err) = browser::download(&file) {
                    logging::warn!("export failed: {err:?}");
                }
            }
            Some(Err(err)) => logging::warn!("export failed: {err}"),
            None => {}
        }
    };

    // New results are revealed after a short pause so the progress bar can
    // be seen reaching 100 %.
    create_effect({
        let store = store.clone();
        let al_slot = al_slot.clone();
        let radar_slot = radar_slot.clone();
        move |_| {
            if epoch.get() == 0 {
                return;
            }
            let delay = store.read(|s| s.config().results_reveal_delay_ms);
            let al_slot = al_slot.clone();
            let radar_slot = radar_slot.clone();
            spawn_local(async move {
                TimeoutFuture::new(delay).await;
                set_revealed.set(true);
                if let Some(results) = page.get_untracked().results {
                    draw_charts(&results, &al_slot, &radar_slot);
                }
                browser::scroll_to("results");
            });
        }
    });

    on_cleanup(move || {
        al_slot.borrow_mut().clear();
        radar_slot.borrow_mut().clear();
    });

    let method_tags = {
        let store = store.clone();
        move || {
            page.with(|p| p.method_tags.clone())
                .into_iter()
                .map(|tag| {
                    let store = store.clone();
                    let name = tag.name.clone();
                    view! {
                        <div class="method-tag" class:selected=tag.selected on:click=move |ev: ev::MouseEvent| {
                            ev.prevent_default();
                            ev.stop_propagation();
                            store.update(|s| s.toggle_method(&name));
                        }>
                            <span>"🔹 "{tag.name.clone()}</span>
                        </div>
                    }
                })
                .collect_view()
        }
    };

    let upload_status = move || {
        page.with(|p| p.upload_status.clone()).map(|status| {
            let failed = status.kind == StatusKind::Error;
            view! {
                <div class="upload-status" class:error=failed>
                    <span class="status-icon">{status.icon()}</span>
                    <span class="status-text">{status.text.clone()}</span>
                </div>
            }
        })
    };

    let progress = move || {
        page.with(|p| p.progress.clone()).map(|progress| {
            let width = format!("width: {}%", progress.percent);
            view! {
                <div class="eval-progress" class:evaluating=progress.evaluating>
                    <div class="progress-bar">
                        <div class="progress-fill" style=width></div>
                    </div>
                    <div class="progress-text">{progress.text}</div>
                </div>
            }
        })
    };

    let results_body = move || {
        page.with(|p| p.results.clone())
            .map(|results| view! { <ResultsBody results=results texts=texts/> })
    };

    let lang_buttons = Lang::ALL
        .iter()
        .map(|&code| {
            let api = api.clone();
            let current = code == lang;
            view! {
                <button class="lang-btn" class:active=current on:click=move |_| {
                    let api = api.clone();
                    spawn_local(async move {
                        match switch_language(api.as_ref(), code).await {
                            Ok(true) => browser::reload(),
                            Ok(false) => logging::warn!("server refused language {}", code.code()),
                            Err(err) => logging::warn!("language switch failed: {err}"),
                        }
                    });
                }>
                    {code.native_name()}
                </button>
            }
        })
        .collect_view();

    let template_href = format!(
        "data:application/json;charset=utf-8,{}",
        String::from(js_sys::encode_uri_component(&template_jsonl()))
    );

    view! {
        <nav class="navbar">
            <div class="nav-brand">{texts.title}</div>
            <div class="nav-links">
                <NavLink store=store.clone() active=active href="#home" label=texts.home/>
                <NavLink store=store.clone() active=active href="#upload" label=texts.upload/>
                <NavLink store=store.clone() active=active href="#evaluate" label=texts.evaluate/>
                <NavLink store=store.clone() active=active href="#results" label=texts.results/>
                <NavLink store=store.clone() active=active href="#docs" label=texts.docs/>
            </div>
            <div class="lang-switcher">{lang_buttons}</div>
        </nav>
        <main>
            <section id="home" class="hero">
                <h1>{texts.title}</h1>
                <p class="subtitle">{texts.subtitle}</p>
            </section>

            <section id="upload" class="section">
                <h2>{texts.upload_title}</h2>
                <p>{texts.upload_desc}</p>
                <label
                    class="dropzone"
                    class:dragover=move || dragging.get()
                    class:disabled=move || !page.with(|p| p.upload_enabled)
                    on:dragover=move |ev: ev::DragEvent| {
                        ev.prevent_default();
                        set_dragging.set(true);
                    }
                    on:dragleave=move |_| set_dragging.set(false)
                    on:drop=on_drop
                >
                    <span class="btn">{texts.select_file}</span>
                    <span>{texts.drag_drop}</span>
                    <input
                        id="fileInput"
                        type="file"
                        accept=".jsonl"
                        hidden
                        disabled=move || !page.with(|p| p.upload_enabled)
                        on:change=on_file_input
                    />
                    <span class="note">{texts.file_format}</span>
                </label>
                <a class="note" href=template_href download="template.jsonl">{texts.download_template}</a>
                {upload_status}
            </section>

            <section id="evaluate" class="section">
                <h2>{texts.eval_title}</h2>
                <p>{texts.eval_desc}</p>
                <h3>{texts.select_methods}</h3>
                <div id="methodList" class="method-list">{method_tags}</div>
                <button
                    id="startEvalBtn"
                    class="btn btn-primary"
                    disabled=move || !page.with(|p| p.start_enabled)
                    on:click=on_start
                >
                    {move || page.with(|p| p.start_label.clone())}
                </button>
                {progress}
            </section>

            <section id="results" class="section" class:hidden=move || !revealed.get()>
                <h2>{texts.results_title}</h2>
                {results_body}
                <h3>{texts.al_curve_title}</h3>
                <div class="chart-container"><canvas id=AL_CANVAS></canvas></div>
                <h3>{texts.radar_title}</h3>
                <div class="chart-container"><canvas id=RADAR_CANVAS></canvas></div>
                <button
                    class="btn"
                    disabled=move || !page.with(|p| p.export_available)
                    on:click=on_export
                >
                    {texts.export_results}
                </button>
            </section>

            <section id="docs" class="section">
                <h2>{texts.docs}</h2>
                <h3>{texts.doc_format_title}</h3>
                <p>{texts.doc_format_desc}</p>
                <h3>{texts.doc_metrics_title}</h3>
                <p>{texts.doc_metrics_desc}</p>
                <ul>
                    <li><strong>"AVG"</strong>" – "{texts.avg_score}</li>
                    <li><strong>"N-IR"</strong>" – "{texts.n_ir}</li>
                    <li><strong>"N-R²"</strong>" – "{texts.n_r2}</li>
                </ul>
            </section>
        </main>
        <footer>
            <p class="note">{texts.powered_by}" PersonaSteer · v"{APP_VERSION}" ("{APP_COMMIT}")"</p>
        </footer>
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(|| view! { <App/> });
}

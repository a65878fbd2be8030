use std::cell::RefCell;
use std::fs;
use std::fs::File;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use persona_bench::charts::AL_AXIS_TITLE;
use persona_bench::log::{detect_methods, template_jsonl, validate_log};
use persona_bench::{
    run_evaluation, run_upload, switch_language, BenchmarkApi, ComparisonTable, Dashboard,
    DashboardConfig, DashboardError, EvaluationResults, Lang, LogFile, ResultsView, StateStore,
    Texts,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod http;
mod plot;

use http::{HttpApi, TokioScheduler};
use plot::{render_al_curve, render_chart_guard, render_radar, ChartKind};

type Store = Rc<RefCell<Dashboard>>;

#[derive(Parser, Debug)]
#[command(author, version, about = "PersonaSteer benchmark client", long_about = None)]
struct Cli {
    /// Benchmark server base URL
    #[arg(
        long,
        global = true,
        env = "PERSONA_BENCH_SERVER",
        default_value = "http://127.0.0.1:5000",
        value_hint = ValueHint::Url
    )]
    server: String,

    /// Language of printed labels
    #[arg(long, global = true, value_enum, default_value_t = LangOpt::Zh)]
    lang: LangOpt,

    /// Verbose logging
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a session log the way the server does and list its methods
    Check(CheckArgs),
    /// Write the sample session log
    Template(TemplateArgs),
    /// Upload a session log, evaluate the chosen methods and write the results
    Evaluate(EvaluateArgs),
    /// Present a previously exported results file
    Render(RenderArgs),
    /// Fetch stored results for a task from the server
    Results(ResultsArgs),
    /// Query server health
    Status,
    /// Switch the server-side page language
    Language(LanguageArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Session log (.jsonl)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Output path
    #[arg(short, long, default_value = "template.jsonl", value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Session log (.jsonl)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Methods to evaluate (comma separated); all detected methods when omitted
    #[arg(long, value_delimiter = ',')]
    methods: Vec<String>,

    /// Skip the local validation pass before uploading
    #[arg(long, action = ArgAction::SetTrue)]
    no_check: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Exported results JSON
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct ResultsArgs {
    /// Task id reported by a finished evaluation
    task_id: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct LanguageArgs {
    #[arg(value_enum)]
    lang: LangOpt,
}

#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Directory for the export JSON, table CSV and charts
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    out_dir: PathBuf,

    /// Render charts as PNG (default)
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "svg")]
    png: bool,

    /// Render charts as SVG
    #[arg(long, action = ArgAction::SetTrue)]
    svg: bool,

    /// Disable chart rendering
    #[arg(long, action = ArgAction::SetTrue)]
    no_plot: bool,
}

impl OutputArgs {
    fn chart_kind(&self) -> Option<ChartKind> {
        if self.no_plot {
            None
        } else if self.svg && !self.png {
            Some(ChartKind::Svg)
        } else {
            Some(ChartKind::Png)
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LangOpt {
    Zh,
    En,
    Ko,
}

impl From<LangOpt> for Lang {
    fn from(value: LangOpt) -> Self {
        match value {
            LangOpt::Zh => Lang::Zh,
            LangOpt::En => Lang::En,
            LangOpt::Ko => Lang::Ko,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = DashboardConfig {
        lang: cli.lang.into(),
        ..DashboardConfig::default()
    };

    match cli.command {
        Command::Check(args) => handle_check(args),
        Command::Template(args) => handle_template(args),
        Command::Render(args) => handle_render(config, args),
        Command::Evaluate(args) => {
            let api = HttpApi::new(&cli.server)?;
            run_local(handle_evaluate(api, config, args))
        }
        Command::Results(args) => {
            let api = HttpApi::new(&cli.server)?;
            run_local(handle_results(api, config, args))
        }
        Command::Status => {
            let api = HttpApi::new(&cli.server)?;
            run_local(handle_status(api, cli.server.clone()))
        }
        Command::Language(args) => {
            let api = HttpApi::new(&cli.server)?;
            run_local(handle_language(api, args.lang.into()))
        }
    }
}

/// The controllers are `!Send`; drive them on one thread.
fn run_local<F>(task: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, task)
}

fn handle_check(args: CheckArgs) -> Result<()> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let summary = validate_log(&text)
        .with_context(|| format!("{} failed validation", args.input.display()))?;
    println!(
        "{}: {} sessions, {} rounds",
        args.input.display(),
        summary.sessions,
        summary.rounds
    );
    println!("methods: {}", detect_methods(&text).join(", "));
    Ok(())
}

fn handle_template(args: TemplateArgs) -> Result<()> {
    fs::write(&args.output, template_jsonl())
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("Wrote template: {}", args.output.display());
    Ok(())
}

fn handle_render(config: DashboardConfig, args: RenderArgs) -> Result<()> {
    let results = read_results(&args.input)?;
    let mut dashboard = Dashboard::new(config);
    dashboard.load_results(results);
    emit_results(&dashboard, &args.output)
}

fn read_results(path: &Path) -> Result<EvaluationResults> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not an exported results file", path.display()))
}

async fn handle_evaluate(api: HttpApi, config: DashboardConfig, args: EvaluateArgs) -> Result<()> {
    let bytes =
        fs::read(&args.input).with_context(|| format!("failed to read {}", args.input.display()))?;
    let name = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let file = LogFile::new(name, bytes);

    if !args.no_check {
        let summary = validate_log(&file.text())
            .with_context(|| format!("{} failed validation", args.input.display()))?;
        debug!(sessions = summary.sessions, rounds = summary.rounds, "log passed validation");
    }

    let store: Store = Rc::new(RefCell::new(Dashboard::new(config)));
    let log = run_upload(&store, &api, file)
        .await
        .with_context(|| format!("failed to upload {}", args.input.display()))?;
    info!("{}", log.status_text());

    select_methods(&store, &args.methods)?;
    let label = store.read(|s| s.render().start_label);
    info!("{label}");

    with_progress(&store, run_evaluation(&store, &api, &TokioScheduler))
        .await
        .context("evaluation failed")?;
    if let Some(progress) = store.read(|s| s.render().progress) {
        info!("{}", progress.text);
    }

    store.read(|s| emit_results(s, &args.output))
}

async fn handle_results(api: HttpApi, config: DashboardConfig, args: ResultsArgs) -> Result<()> {
    let results = api
        .fetch_results(&args.task_id)
        .await
        .with_context(|| format!("failed to fetch results for task {}", args.task_id))?;
    let mut dashboard = Dashboard::new(config);
    dashboard.load_results(results);
    emit_results(&dashboard, &args.output)
}

async fn handle_status(api: HttpApi, server: String) -> Result<()> {
    let status = api
        .status()
        .await
        .with_context(|| format!("server {server} is not reachable"))?;
    println!(
        "{server}: {} (version {}, {})",
        status.status, status.version, status.timestamp
    );
    Ok(())
}

async fn handle_language(api: HttpApi, lang: Lang) -> Result<()> {
    let accepted = switch_language(&api, lang)
        .await
        .with_context(|| format!("failed to switch language to {}", lang.code()))?;
    if !accepted {
        return Err(anyhow!("server rejected language '{}'", lang.code()));
    }
    println!("{} ({})", lang.native_name(), lang.code());
    Ok(())
}

/// Select the requested methods, or every detected one when none are named.
fn select_methods(store: &Store, wanted: &[String]) -> Result<()> {
    let available: Vec<String> = store.read(|s| {
        s.selection()
            .tags()
            .iter()
            .map(|tag| tag.name.clone())
            .collect()
    });
    if available.is_empty() {
        return Err(anyhow!("no methods detected in the uploaded log"));
    }

    let mut chosen: Vec<&str> = Vec::new();
    if wanted.is_empty() {
        chosen.extend(available.iter().map(String::as_str));
    } else {
        for name in wanted.iter().map(|m| m.trim()).filter(|m| !m.is_empty()) {
            if !available.iter().any(|a| a == name) {
                return Err(anyhow!(
                    "unknown method '{name}' (available: {})",
                    available.join(", ")
                ));
            }
            if !chosen.contains(&name) {
                chosen.push(name);
            }
        }
    }

    store.update(|s| {
        for name in &chosen {
            s.toggle_method(name);
        }
    });
    Ok(())
}

/// Drive `evaluation` while redrawing the cosmetic progress line on stderr.
async fn with_progress<F>(store: &Store, evaluation: F) -> Result<(), DashboardError>
where
    F: Future<Output = Result<(), DashboardError>>,
{
    tokio::pin!(evaluation);
    let (period, label) =
        store.read(|s| (s.config().progress_tick_ms, s.lang().texts().evaluating));
    let mut redraw = tokio::time::interval(Duration::from_millis(u64::from(period.max(1))));
    let mut stderr = io::stderr();
    loop {
        tokio::select! {
            outcome = &mut evaluation => {
                let _ = writeln!(stderr);
                return outcome;
            }
            _ = redraw.tick() => {
                let percent = store.read(|s| s.progress_percent());
                let _ = write!(stderr, "\r{label} {percent:>5.1}%");
                let _ = stderr.flush();
            }
        }
    }
}

fn emit_results(dashboard: &Dashboard, opts: &OutputArgs) -> Result<()> {
    let view = dashboard.render();
    let Some(results) = view.results.as_ref() else {
        warn!("No results to show");
        return Ok(());
    };
    let texts = view.lang.texts();
    print_summary(results, texts);

    fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("failed to create {}", opts.out_dir.display()))?;

    if let Some(export) = dashboard.export() {
        let export = export.context("failed to export results")?;
        let path = opts.out_dir.join(&export.filename);
        fs::write(&path, export.contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote results: {}", path.display());
    }

    let table_path = opts.out_dir.join("table.csv");
    write_table_csv(&results.table, &table_path)?;
    info!("Wrote table: {}", table_path.display());

    if let Some(kind) = opts.chart_kind() {
        let al_path = opts.out_dir.join(format!("al_curve.{}", kind.extension()));
        match render_chart_guard(|| {
            render_al_curve(&results.al_curve, AL_AXIS_TITLE, &al_path, kind)
        }) {
            Ok(()) => info!("Wrote plot: {}", al_path.display()),
            Err(err) => warn!("Skipping chart render ({}): {}", al_path.display(), err),
        }
        let radar_path = opts.out_dir.join(format!("radar.{}", kind.extension()));
        match render_chart_guard(|| render_radar(&results.radar, &radar_path, kind)) {
            Ok(()) => info!("Wrote plot: {}", radar_path.display()),
            Err(err) => warn!("Skipping chart render ({}): {}", radar_path.display(), err),
        }
    }
    Ok(())
}

fn print_summary(results: &ResultsView, texts: &Texts) {
    println!("{}", texts.metrics_title);
    for card in &results.cards {
        println!("  {:<28} {}", card.label(texts.total_sessions), card.value);
    }
    println!();
    println!("{}", texts.details_title);
    print!("  {:<20}", texts.method);
    for column in &results.table.columns {
        print!(" {:>10}", column);
    }
    println!();
    for row in &results.table.rows {
        print!("  {:<20}", row.method);
        for cell in &row.cells {
            let mark = if cell.best { "*" } else { " " };
            print!(" {:>9}{}", persona_bench::presenter::format_number(cell.value), mark);
        }
        println!();
    }
}

fn write_table_csv(table: &ComparisonTable, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    write_table_rows(table, &mut writer)
}

fn write_table_rows<W: Write>(table: &ComparisonTable, writer: &mut csv::Writer<W>) -> Result<()> {
    let mut header = vec!["method".to_string()];
    header.extend(table.columns.iter().cloned());
    header.push("best".to_string());
    writer.write_record(&header)?;
    for row in &table.rows {
        let mut record = vec![row.method.clone()];
        record.extend(row.cells.iter().map(|c| c.value.to_string()));
        let best: Vec<&str> = table
            .columns
            .iter()
            .zip(&row.cells)
            .filter(|(_, cell)| cell.best)
            .map(|(column, _)| column.as_str())
            .collect();
        record.push(best.join("|"));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_bench::presenter::comparison_table;

    const RESULTS: &str = r#"{
        "task_id": "ab12cd34",
        "total_sessions": 12,
        "methods": {
            "Base": {"metrics": {"AVG": 70, "N_IR": 10, "N_R2": 5}, "al_curve": [50, 60, 70]},
            "RAG": {"metrics": {"AVG": 85, "N_IR": 20, "N_R2": 5}, "al_curve": [60, 80]}
        },
        "radar_data": {
            "Base": {"AVG": 70, "N_IR": 100, "N_R2": 5, "Consistency": 82, "Improvement": 70},
            "RAG": {"AVG": 85, "N_IR": 100, "N_R2": 5, "Consistency": 60, "Improvement": 70}
        }
    }"#;

    fn results() -> EvaluationResults {
        serde_json::from_str(RESULTS).unwrap()
    }

    fn no_plot(dir: &Path) -> OutputArgs {
        OutputArgs {
            out_dir: dir.to_path_buf(),
            png: false,
            svg: false,
            no_plot: true,
        }
    }

    #[test]
    fn table_csv_marks_column_maxima() {
        let mut buf = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            write_table_rows(&comparison_table(&results()), &mut writer).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "method,AVG,N_IR,N_R2,best");
        assert_eq!(lines[1], "Base,70,10,5,N_R2");
        assert_eq!(lines[2], "RAG,85,20,5,AVG|N_IR|N_R2");
    }

    #[test]
    fn render_writes_export_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        fs::write(&input, RESULTS).unwrap();
        let out = dir.path().join("out");
        handle_render(
            DashboardConfig::default(),
            RenderArgs {
                input,
                output: no_plot(&out),
            },
        )
        .unwrap();

        let exported = fs::read_to_string(out.join("benchmark_results_ab12cd34.json")).unwrap();
        let back: EvaluationResults = serde_json::from_str(&exported).unwrap();
        assert_eq!(back, results());
        assert!(out.join("table.csv").exists());
        assert!(!out.join("al_curve.png").exists());
    }

    #[test]
    fn render_rejects_non_results_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        fs::write(&input, "{\"success\": false}").unwrap();
        let err = handle_render(
            DashboardConfig::default(),
            RenderArgs {
                input,
                output: no_plot(dir.path()),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("not an exported results file"));
    }

    #[test]
    fn template_passes_check() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("template.jsonl");
        handle_template(TemplateArgs {
            output: output.clone(),
        })
        .unwrap();
        handle_check(CheckArgs { input: output }).unwrap();
    }

    #[test]
    fn method_selection_honours_names() {
        let store: Store = Rc::new(RefCell::new(Dashboard::default()));
        store.update(|s| {
            s.finish_upload(Ok(persona_bench::UploadedLog {
                file: persona_bench::UploadedFile {
                    filename: "f1".into(),
                    file_id: None,
                },
                message: "ok".into(),
                sessions: 1,
                methods: vec!["Base".into(), "RAG".into()],
                source: persona_bench::MethodSource::Server,
            }))
        });
        select_methods(&store, &["RAG".into(), "RAG".into()]).unwrap();
        assert_eq!(store.read(|s| s.selection().selected()), vec!["RAG"]);
        assert!(select_methods(&store, &["Nope".into()]).is_err());
    }

    #[test]
    fn cli_parses_evaluate_flags() {
        let cli = Cli::try_parse_from([
            "persona-bench",
            "--lang",
            "en",
            "evaluate",
            "log.jsonl",
            "--methods",
            "Base,RAG",
            "--svg",
        ])
        .unwrap();
        match cli.command {
            Command::Evaluate(args) => {
                assert_eq!(args.methods, vec!["Base", "RAG"]);
                assert_eq!(args.output.chart_kind(), Some(ChartKind::Svg));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}

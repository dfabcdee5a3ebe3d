use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lector_config::{Settings, TranslationRequest};
use lector_engine::{
  ApprovalDecision, RunResponse, Supervisor, SupervisorConfig, TracingNotifier,
};
use lector_state::{RunState, RunStatus};
use lector_store::{FsStore, RunStore, SqliteStore};

/// Lector - a supervised document translation pipeline
#[derive(Parser)]
#[command(name = "lector")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.lector)
  #[arg(long, global = true, env = "LECTOR_DATA_DIR")]
  data_dir: Option<PathBuf>,

  /// Settings file (default: <data-dir>/settings.json)
  #[arg(long, global = true, env = "LECTOR_SETTINGS")]
  settings: Option<PathBuf>,

  /// Log filter used when RUST_LOG is unset
  #[arg(long, global = true, env = "LECTOR_LOG", default_value = "info")]
  log_level: String,

  /// Emit logs as JSON
  #[arg(long, global = true, env = "LECTOR_LOG_JSON")]
  log_json: bool,

  /// Where run records are kept
  #[arg(long, global = true, value_enum, env = "LECTOR_STORE", default_value = "fs")]
  store: StoreKind,

  #[command(flatten)]
  llm: LlmArgs,

  #[command(subcommand)]
  command: Option<Commands>,
}

/// Translation backend overrides, layered over the settings file.
#[derive(Args)]
struct LlmArgs {
  /// Translate with Gemini instead of the offline mock
  #[arg(long, global = true, env = "USE_REAL_LLM")]
  use_real_llm: bool,

  /// Gemini model name
  #[arg(long, global = true, env = "GEMINI_MODEL")]
  gemini_model: Option<String>,

  /// Gemini API key
  #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
  google_api_key: Option<String>,
}

impl LlmArgs {
  fn apply(self, settings: &mut Settings) {
    if self.use_real_llm {
      settings.use_real_llm = true;
    }
    if let Some(model) = self.gemini_model {
      settings.gemini_model = model;
    }
    if let Some(key) = self.google_api_key {
      settings.google_api_key = Some(key);
    }
  }
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreKind {
  /// One JSON file per run under <data-dir>/runs
  Fs,
  /// A SQLite database at <data-dir>/lector.db
  Sqlite,
}

#[derive(Subcommand)]
enum Commands {
  /// Translate a document
  Run {
    /// Path to the document text, or `-` for stdin
    input_file: PathBuf,

    #[arg(long)]
    source_language: Option<String>,

    #[arg(long)]
    target_language: Option<String>,

    #[arg(long)]
    document_type: Option<String>,

    #[arg(long, default_value_t = 1)]
    page_count: i64,

    #[arg(long)]
    max_retries: Option<u32>,

    /// Translate paragraphs concurrently
    #[arg(long)]
    parallel: bool,

    /// Fail QA on the first pass to exercise the retry path
    #[arg(long)]
    force_qa_fail_once: bool,

    /// Pause at the approval gate instead of auto-approving
    #[arg(long)]
    require_approval: bool,

    /// Also write the response JSON here
    #[arg(long)]
    output_file: Option<PathBuf>,
  },

  /// Continue a run paused at the approval gate
  Resume {
    run_id: String,

    #[arg(long, conflicts_with = "deny", required_unless_present = "deny")]
    approve: bool,

    #[arg(long)]
    deny: bool,

    /// Also write the response JSON here
    #[arg(long)]
    output_file: Option<PathBuf>,
  },

  /// Print the stored record of a run
  Show { run_id: String },

  /// List stored runs
  List,
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();
  init_tracing(&cli.log_level, cli.log_json);

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".lector"),
  };
  let settings_path = cli
    .settings
    .unwrap_or_else(|| data_dir.join("settings.json"));

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(dispatch(cli.command, cli.store, cli.llm, data_dir, settings_path))
}

async fn dispatch(
  command: Option<Commands>,
  store_kind: StoreKind,
  llm: LlmArgs,
  data_dir: PathBuf,
  settings_path: PathBuf,
) -> Result<ExitCode> {
  let mut settings = Settings::load_or_default(&settings_path)
    .await
    .with_context(|| format!("failed to load settings: {}", settings_path.display()))?;
  llm.apply(&mut settings);
  let store = open_store(store_kind, &data_dir).await?;

  match command {
    Some(Commands::Run {
      input_file,
      source_language,
      target_language,
      document_type,
      page_count,
      max_retries,
      parallel,
      force_qa_fail_once,
      require_approval,
      output_file,
    }) => {
      let raw_text = read_input(&input_file).await?;
      let mut request = settings.request(raw_text);
      if let Some(source) = source_language {
        request.source_language = source;
      }
      if let Some(target) = target_language {
        request.target_language = target;
      }
      if let Some(document_type) = document_type {
        request.document_type = document_type;
      }
      if let Some(max_retries) = max_retries {
        request.max_retries = max_retries;
      }
      let request = request
        .with_page_count(page_count)
        .with_parallel_execution(parallel)
        .with_forced_qa_failure(force_qa_fail_once);

      let mut config = SupervisorConfig::from(&settings);
      if require_approval {
        config.auto_approve = false;
      }
      run(request, &settings, config, store, output_file.as_deref()).await
    }
    Some(Commands::Resume {
      run_id,
      approve,
      deny: _,
      output_file,
    }) => {
      let decision = if approve {
        ApprovalDecision::Grant
      } else {
        ApprovalDecision::Deny
      };
      resume(&run_id, decision, &settings, store, output_file.as_deref()).await
    }
    Some(Commands::Show { run_id }) => {
      let state = store
        .load(&run_id)
        .await
        .with_context(|| format!("failed to load run {run_id}"))?;
      println!("{}", serde_json::to_string_pretty(&state)?);
      Ok(ExitCode::SUCCESS)
    }
    Some(Commands::List) => {
      for run in store.list().await.context("failed to list runs")? {
        println!(
          "{}\t{}\t{}",
          run.run_id,
          run.status,
          run.run_status.map(|s| s.as_str()).unwrap_or("-")
        );
      }
      Ok(ExitCode::SUCCESS)
    }
    None => {
      println!("lector - use --help to see available commands");
      Ok(ExitCode::SUCCESS)
    }
  }
}

fn init_tracing(level: &str, json: bool) {
  let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

  // stdout carries the response JSON
  if json {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
      .init();
  } else {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
      .init();
  }
}

async fn open_store(kind: StoreKind, data_dir: &Path) -> Result<Arc<dyn RunStore>> {
  match kind {
    StoreKind::Fs => Ok(Arc::new(FsStore::new(data_dir.join("runs")))),
    StoreKind::Sqlite => {
      tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;
      let path = data_dir.join("lector.db");
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open database: {}", path.display()))?;
      Ok(Arc::new(store))
    }
  }
}

async fn read_input(path: &Path) -> Result<String> {
  if path == Path::new("-") {
    let mut buf = String::new();
    io::stdin()
      .read_to_string(&mut buf)
      .context("failed to read document from stdin")?;
    return Ok(buf);
  }
  tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read input file: {}", path.display()))
}

/// Build a supervisor with the configured translator. Returns any warning
/// raised while picking the translator.
fn supervisor(
  settings: &Settings,
  config: SupervisorConfig,
  store: Arc<dyn RunStore>,
) -> Result<(Supervisor<TracingNotifier>, Option<String>)> {
  let choice = lector_workers::select_translator(settings);
  let registry = lector_workers::registry_with_translator(choice.translator)
    .context("failed to build step registry")?;
  let supervisor = Supervisor::with_notifier(registry, store, config, TracingNotifier);
  Ok((supervisor, choice.warning))
}

async fn run(
  request: TranslationRequest,
  settings: &Settings,
  config: SupervisorConfig,
  store: Arc<dyn RunStore>,
  output_file: Option<&Path>,
) -> Result<ExitCode> {
  let (supervisor, warning) = supervisor(settings, config, store)?;
  let request = match warning {
    Some(warning) => request.with_warning(warning),
    None => request,
  };
  let state = supervisor.run(request).await;
  report(&state, output_file).await
}

async fn resume(
  run_id: &str,
  decision: ApprovalDecision,
  settings: &Settings,
  store: Arc<dyn RunStore>,
  output_file: Option<&Path>,
) -> Result<ExitCode> {
  // the translator warning was already logged; the record predates it
  let (supervisor, _) = supervisor(settings, SupervisorConfig::from(settings), store)?;
  let state = supervisor
    .resume_run(run_id, decision)
    .await
    .with_context(|| format!("failed to resume run {run_id}"))?;
  report(&state, output_file).await
}

async fn report(state: &RunState, output_file: Option<&Path>) -> Result<ExitCode> {
  let response = RunResponse::from_state(state);
  let json = response.to_json_pretty()?;

  if let Some(path) = output_file {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &json)
      .await
      .with_context(|| format!("failed to write output file: {}", path.display()))?;
    info!(path = %path.display(), "response written");
  }
  println!("{json}");

  Ok(match response.status() {
    RunStatus::Failed => ExitCode::FAILURE,
    _ => ExitCode::SUCCESS,
  })
}

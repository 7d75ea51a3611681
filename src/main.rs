use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use purgeguard_config::PurgeConfig;
use purgeguard_engine::{ChannelNotifier, WorkflowController, WorkflowError, WorkflowEvent};
use purgeguard_service::{
  Credential, HttpPurgeService, InMemoryPurgeService, PurgeService, ServiceError,
};
use purgeguard_workflow::{
  Actor, AffectedGroup, ImpactSummary, ResultSummary, Step, Target,
};

const DEMO_PASSWORD: &str = "demo";
const MAX_PASSWORD_ATTEMPTS: usize = 3;

/// Purgeguard - guarded execution of irreversible data purges
#[derive(Parser)]
#[command(name = "purgeguard")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.purgeguard)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Path to a JSON config file (default: <data_dir>/config.json if present)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Override the purge service base URL
  #[arg(long, global = true)]
  service_url: Option<String>,

  /// Use a seeded in-memory service instead of HTTP (password: demo)
  #[arg(long, global = true)]
  demo: bool,

  /// Log level used when RUST_LOG is not set
  #[arg(long, global = true, default_value = "warn")]
  log_level: String,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// List the targets that can be purged
  Targets,

  /// Print the impact preview of a target as JSON
  Preview {
    /// The target ID
    target_id: String,
  },

  /// Walk through the confirmation steps and purge a target
  Purge {
    /// ID of the operator performing the purge
    #[arg(long)]
    actor_id: String,

    /// Display name of the operator
    #[arg(long)]
    actor_label: String,

    /// Preselect the target instead of choosing interactively
    #[arg(long)]
    target: Option<String>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(&cli.log_level);

  let data_dir = match cli.data_dir.clone() {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".purgeguard"),
  };
  let config = load_config(&cli, &data_dir)?;

  let Some(command) = cli.command else {
    println!("purgeguard - use --help to see available commands");
    return Ok(());
  };

  let actor_id = match &command {
    Commands::Purge { actor_id, .. } => Some(actor_id.as_str()),
    _ => None,
  };
  let service = build_service(cli.demo, actor_id, &config)?;

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async {
    match command {
      Commands::Targets => list_targets(service).await,
      Commands::Preview { target_id } => preview(service, &target_id).await,
      Commands::Purge {
        actor_id,
        actor_label,
        target,
      } => {
        let actor = Actor::new(actor_id, actor_label);
        purge(service, actor, config, target).await
      }
    }
  })
}

fn init_logging(level: &str) {
  let level = level.parse().unwrap_or(tracing::Level::WARN);
  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  // stdout carries command output only
  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_writer(std::io::stderr))
    .init();
}

fn load_config(cli: &Cli, data_dir: &Path) -> Result<PurgeConfig> {
  let mut config = match &cli.config {
    Some(path) => PurgeConfig::load(path)
      .with_context(|| format!("failed to load config: {}", path.display()))?,
    None => {
      let path = data_dir.join("config.json");
      if path.exists() {
        PurgeConfig::load(&path)
          .with_context(|| format!("failed to load config: {}", path.display()))?
      } else {
        PurgeConfig::default()
      }
    }
  };

  if let Some(url) = &cli.service_url {
    config.service.base_url = url.clone();
    config.validate().context("invalid --service-url")?;
  }

  Ok(config)
}

fn build_service(
  demo: bool,
  actor_id: Option<&str>,
  config: &PurgeConfig,
) -> Result<Arc<dyn PurgeService>> {
  if demo {
    tracing::info!("using in-memory demo service");
    return Ok(Arc::new(demo_service(actor_id.unwrap_or("demo-admin"))));
  }

  let service =
    HttpPurgeService::new(config.service.clone()).context("failed to create HTTP client")?;
  Ok(Arc::new(service))
}

fn demo_service(actor_id: &str) -> InMemoryPurgeService {
  let group = |name: &str, display_name: &str, count: u64, description: &str| AffectedGroup {
    name: name.to_string(),
    display_name: display_name.to_string(),
    record_count: count,
    description: description.to_string(),
  };

  InMemoryPurgeService::new()
    .with_target(
      Target::new("hillcrest-high", "Hillcrest High School"),
      ImpactSummary {
        target_label: "Hillcrest High School".to_string(),
        affected_groups: vec![
          group("students", "Students", 812, "Student profiles and enrolments"),
          group("grades", "Grades", 15430, "All recorded grades"),
          group("attendance", "Attendance", 96211, "Daily attendance records"),
        ],
        total_record_count: 112453,
        warnings: vec![
          "All student accounts will be permanently deleted.".to_string(),
          "Grade history cannot be recovered from backups.".to_string(),
          "Parents will lose access to the portal immediately.".to_string(),
        ],
      },
    )
    .with_target(
      Target::new("lakeside-primary", "Lakeside Primary"),
      ImpactSummary {
        target_label: "Lakeside Primary".to_string(),
        affected_groups: vec![group("students", "Students", 240, "Student profiles")],
        total_record_count: 240,
        warnings: vec!["All student accounts will be permanently deleted.".to_string()],
      },
    )
    .with_password(actor_id, DEMO_PASSWORD)
}

async fn list_targets(service: Arc<dyn PurgeService>) -> Result<()> {
  let targets = service
    .list_targets()
    .await
    .context("failed to list targets")?;
  println!("{}", serde_json::to_string_pretty(&targets)?);
  Ok(())
}

async fn preview(service: Arc<dyn PurgeService>, target_id: &str) -> Result<()> {
  let summary = service
    .fetch_impact_preview(target_id)
    .await
    .with_context(|| format!("failed to fetch impact preview for '{}'", target_id))?;
  println!("{}", serde_json::to_string_pretty(&summary)?);

  summary
    .validate()
    .context("impact preview failed integrity check")?;
  Ok(())
}

async fn purge(
  service: Arc<dyn PurgeService>,
  actor: Actor,
  config: PurgeConfig,
  target: Option<String>,
) -> Result<()> {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let controller = WorkflowController::with_notifier(
    service,
    actor,
    config.workflow,
    Arc::new(ChannelNotifier::new(tx)),
  );

  tokio::spawn(async move {
    while let Some(event) = rx.recv().await {
      if let WorkflowEvent::ExecutionProgress { percent, .. } = event {
        eprintln!("  ... {}%", percent);
      }
    }
  });

  let mut prompt = Prompt::new(BufReader::new(tokio::io::stdin()));
  let result = run_wizard(&controller, &mut prompt, target).await?;

  println!("{}", serde_json::to_string_pretty(&result)?);
  Ok(())
}

async fn run_wizard<R: AsyncBufRead + Unpin>(
  controller: &WorkflowController,
  prompt: &mut Prompt<R>,
  mut target: Option<String>,
) -> Result<ResultSummary> {
  let targets = controller
    .load_targets()
    .await
    .context("failed to load targets")?;
  if targets.is_empty() {
    bail!("no targets available");
  }

  // Select Target
  loop {
    let target_id = match target.take() {
      Some(id) => id,
      None => choose_target(&targets, prompt).await?,
    };
    match controller.select_target(&target_id).await {
      Ok(()) => break,
      Err(e) => eprintln!("error: {}", e),
    }
  }
  advance(controller)?;

  // Review Impact
  let state = controller.snapshot();
  let preview = state
    .impact_preview
    .context("impact preview missing after selection")?;
  eprintln!("\n{}", Step::ReviewImpact);
  eprintln!("{} records will be deleted from {}:", preview.total_record_count, preview.target_label);
  for group in &preview.affected_groups {
    eprintln!("  {:>10}  {}", group.record_count, group.display_name);
  }
  for (i, warning) in preview.warnings.iter().enumerate() {
    eprintln!("\nWARNING {}/{}: {}", i + 1, preview.warnings.len(), warning);
    if !prompt.confirm("Acknowledge?").await? {
      bail!("warning not acknowledged; purge aborted");
    }
    controller.acknowledge_warning(i, true)?;
  }
  advance(controller)?;

  // Verify Identity
  eprintln!("\n{}", Step::VerifyIdentity);
  let mut attempts = 0;
  loop {
    let password = Credential::new(prompt.read_line("Password:").await?);
    match controller.verify_identity(&password).await {
      Ok(()) => break,
      Err(WorkflowError::Service(ServiceError::InvalidCredential)) => {
        attempts += 1;
        eprintln!("invalid password");
        if attempts >= MAX_PASSWORD_ATTEMPTS {
          bail!("identity verification failed");
        }
      }
      Err(e) => return Err(e).context("identity verification failed"),
    }
  }
  advance(controller)?;

  confirm_purge(controller, prompt).await?;

  // Execute
  eprintln!("\n{}", Step::Execute);
  loop {
    let result = controller.execute().await?;
    if result.is_succeeded() {
      eprintln!("purge completed");
      return Ok(result);
    }

    eprintln!(
      "purge failed: {}",
      result.error_message().unwrap_or("unknown error")
    );
    if !prompt.confirm("Retry?").await? {
      bail!("purge failed");
    }
    if !ready_to_execute(controller) {
      eprintln!("confirmation was cleared by the failure; confirm again");
      if !controller.back() {
        bail!("cannot return to '{}'", Step::FinalConfirmation);
      }
      confirm_purge(controller, prompt).await?;
    }
  }
}

/// Final Confirmation: ask for the phrase and consent until the step can be
/// left.
async fn confirm_purge<R: AsyncBufRead + Unpin>(
  controller: &WorkflowController,
  prompt: &mut Prompt<R>,
) -> Result<()> {
  eprintln!("\n{}", Step::FinalConfirmation);
  let required = controller.config().required_phrase.clone();
  loop {
    let phrase = prompt.ask(&format!("Type '{}' to confirm:", required)).await?;
    controller.set_confirmation_phrase(phrase)?;
    let consent = prompt
      .confirm("I understand this cannot be undone. Continue?")
      .await?;
    controller.set_final_consent(consent)?;
    if !consent {
      bail!("final consent not given; purge aborted");
    }
    if controller.next() {
      return Ok(());
    }
    eprintln!("confirmation phrase does not match");
  }
}

async fn choose_target<R: AsyncBufRead + Unpin>(
  targets: &[Target],
  prompt: &mut Prompt<R>,
) -> Result<String> {
  eprintln!("\n{}", Step::SelectTarget);
  for (i, target) in targets.iter().enumerate() {
    eprintln!("  [{}] {} ({})", i + 1, target.display_name, target.id);
  }

  loop {
    let answer = prompt.ask("Target number or id:").await?;
    if let Ok(n) = answer.parse::<usize>()
      && let Some(target) = n.checked_sub(1).and_then(|i| targets.get(i))
    {
      return Ok(target.id.clone());
    }
    if targets.iter().any(|t| t.id == answer) {
      return Ok(answer);
    }
    eprintln!("no such target: {}", answer);
  }
}

fn advance(controller: &WorkflowController) -> Result<()> {
  if !controller.next() {
    bail!(
      "cannot leave step '{}'",
      controller
        .current_step()
        .map(|s| s.label())
        .unwrap_or("result")
    );
  }
  Ok(())
}

fn ready_to_execute(controller: &WorkflowController) -> bool {
  let state = controller.snapshot();
  state.phrase_confirmed() && state.final_consent_checked
}

struct Prompt<R> {
  lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
  fn new(reader: R) -> Self {
    Self {
      lines: reader.lines(),
    }
  }

  /// Read one line as typed, without the line terminator.
  async fn read_line(&mut self, question: &str) -> Result<String> {
    eprint!("{} ", question);
    let line = self
      .lines
      .next_line()
      .await
      .context("failed to read from stdin")?
      .context("stdin closed")?;
    Ok(line.trim_end_matches('\r').to_string())
  }

  async fn ask(&mut self, question: &str) -> Result<String> {
    Ok(self.read_line(question).await?.trim().to_string())
  }

  async fn confirm(&mut self, question: &str) -> Result<bool> {
    let answer = self.ask(&format!("{} [y/N]", question)).await?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
  }
}

mod commands;
mod context;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use scoutdesk_config::{ApprovalMode, CollectionMode};
use scoutdesk_gatherer::FeedbackType;

#[derive(Debug, Parser)]
#[command(name = "scoutdesk", version, about = "Per-workspace multi-agent research assistant")]
struct Cli {
    /// Config file to load (TOML).
    #[arg(long, global = true, default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage notebooks (research workspaces).
    Notebook {
        #[command(subcommand)]
        command: NotebookCommands,
    },
    /// Run collection — either the ambient scheduler or an immediate pull.
    Collect {
        #[command(subcommand)]
        command: CollectCommands,
    },
    /// Manage a notebook's approval queue.
    Approvals {
        #[command(subcommand)]
        command: ApprovalsCommands,
    },
    /// Generate and print the cross-notebook briefing.
    Briefing {
        #[command(subcommand)]
        command: BriefingCommands,
    },
    /// Run source discovery for a notebook's intent.
    Discover {
        notebook_id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
enum NotebookCommands {
    /// Create a new notebook.
    Create {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        intent: String,
        #[arg(long = "focus-area")]
        focus_areas: Vec<String>,
    },
    /// Update an existing notebook's profile.
    Update {
        notebook_id: Uuid,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        intent: Option<String>,
        #[arg(long = "focus-area")]
        focus_areas: Option<Vec<String>>,
        #[arg(long, value_enum)]
        collection_mode: Option<CliCollectionMode>,
        #[arg(long, value_enum)]
        approval_mode: Option<CliApprovalMode>,
    },
    /// List all notebooks.
    List,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliCollectionMode {
    Manual,
    Automatic,
    Hybrid,
}

impl From<CliCollectionMode> for CollectionMode {
    fn from(value: CliCollectionMode) -> Self {
        match value {
            CliCollectionMode::Manual => CollectionMode::Manual,
            CliCollectionMode::Automatic => CollectionMode::Automatic,
            CliCollectionMode::Hybrid => CollectionMode::Hybrid,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliApprovalMode {
    Auto,
    Review,
    Mixed,
}

impl From<CliApprovalMode> for ApprovalMode {
    fn from(value: CliApprovalMode) -> Self {
        match value {
            CliApprovalMode::Auto => ApprovalMode::Auto,
            CliApprovalMode::Review => ApprovalMode::Review,
            CliApprovalMode::Mixed => ApprovalMode::Mixed,
        }
    }
}

#[derive(Debug, Subcommand)]
enum CollectCommands {
    /// Run one Ambient Orchestrator tick across every notebook due for collection.
    Run,
    /// Immediately collect for one notebook ("collect now").
    Now {
        notebook_id: Uuid,
        #[arg(long)]
        query: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ApprovalsCommands {
    List { notebook_id: Uuid },
    Approve { notebook_id: Uuid, item_id: Uuid },
    Reject {
        notebook_id: Uuid,
        item_id: Uuid,
        #[arg(long, value_enum, default_value = "other")]
        feedback: CliFeedbackType,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliFeedbackType {
    WrongTopic,
    BadSource,
    TooOld,
    AlreadyKnew,
    Other,
}

impl From<CliFeedbackType> for FeedbackType {
    fn from(value: CliFeedbackType) -> Self {
        match value {
            CliFeedbackType::WrongTopic => FeedbackType::WrongTopic,
            CliFeedbackType::BadSource => FeedbackType::BadSource,
            CliFeedbackType::TooOld => FeedbackType::TooOld,
            CliFeedbackType::AlreadyKnew => FeedbackType::AlreadyKnew,
            CliFeedbackType::Other => FeedbackType::Other,
        }
    }
}

#[derive(Debug, Subcommand)]
enum BriefingCommands {
    /// Generate and print the briefing since a given number of days ago.
    Show {
        #[arg(long, default_value_t = 1)]
        since_days: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = scoutdesk_config::AppConfig::load_from(&cli.config)?;
    let ctx = context::AppContext::new(config)?;

    match cli.command {
        Commands::Notebook { command } => match command {
            NotebookCommands::Create { subject, intent, focus_areas } => {
                commands::notebook::create(&ctx, subject, intent, focus_areas).await?;
            }
            NotebookCommands::Update { notebook_id, subject, intent, focus_areas, collection_mode, approval_mode } => {
                commands::notebook::update(&ctx, notebook_id, subject, intent, focus_areas, collection_mode.map(Into::into), approval_mode.map(Into::into))?;
            }
            NotebookCommands::List => commands::notebook::list(&ctx).await?,
        },
        Commands::Collect { command } => match command {
            CollectCommands::Run => commands::collect::run_ambient_tick(&ctx).await?,
            CollectCommands::Now { notebook_id, query } => commands::collect::collect_now(&ctx, notebook_id, query).await?,
        },
        Commands::Approvals { command } => match command {
            ApprovalsCommands::List { notebook_id } => commands::approvals::list(&ctx, notebook_id)?,
            ApprovalsCommands::Approve { notebook_id, item_id } => commands::approvals::approve(&ctx, notebook_id, item_id)?,
            ApprovalsCommands::Reject { notebook_id, item_id, feedback } => {
                commands::approvals::reject(&ctx, notebook_id, item_id, feedback.into())?;
            }
        },
        Commands::Briefing { command } => match command {
            BriefingCommands::Show { since_days } => commands::briefing::show(&ctx, since_days).await?,
        },
        Commands::Discover { notebook_id } => commands::discover::run(&ctx, notebook_id).await?,
    }

    Ok(())
}

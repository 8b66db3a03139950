use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use userbase::Database;
use userbase::cli::{self as prog_cli, Command};
use userbase::config::{AppConfig, CliOverrides};
use userbase::http::{self, dto::ErrorBody};
use userbase::logger;
use userbase::users::{ListParams, UserService};

#[derive(Parser, Debug)]
#[command(name = "userbase", version, about = "User records over REST and the command line", long_about = None)]
struct Cli {
    #[arg(long, global = true, help = "Path to a config file (TOML)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Operation log file. Takes precedence over config/env.")]
    data: Option<PathBuf>,
    #[arg(long, global = true, help = "Keep everything in memory; nothing is persisted")]
    in_memory: bool,
    #[arg(long, global = true, help = "error|warn|info|debug|trace")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the HTTP API")]
    Serve {
        #[arg(long, help = "Listen address, e.g. 0.0.0.0:5000")]
        bind: Option<String>,
    },
    #[command(about = "List users with filters, sorting and pagination")]
    List {
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        limit: Option<String>,
        #[arg(long, help = "Exact status: active|inactive|suspended")]
        status: Option<String>,
        #[arg(long, help = "Exact city")]
        city: Option<String>,
        #[arg(long, help = "Case-insensitive text in name or email")]
        search: Option<String>,
        #[arg(long, help = "field:dir list, e.g. name:asc,age:desc")]
        sort: Option<String>,
    },
    #[command(about = "Status breakdown, average age and top cities")]
    Stats,
    #[command(about = "Show one user")]
    Get { id: String },
    #[command(about = "Create a user from a JSON object")]
    Create { json: String },
    #[command(about = "Apply a partial JSON update to a user")]
    Update { id: String, json: String },
    #[command(about = "Delete a user")]
    Delete { id: String },
    #[command(about = "Insert synthetic users")]
    Seed {
        #[arg(long, default_value_t = 25)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let bind = match &cli.command {
        Commands::Serve { bind } => bind.clone(),
        _ => None,
    };
    let overrides = CliOverrides {
        config: cli.config.clone(),
        bind,
        data_path: cli.data.clone(),
        log_level: cli.log_level.clone(),
        in_memory: cli.in_memory,
    };
    let cfg = match AppConfig::load(&overrides) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logger::configure_logging(cfg.log_dir.as_deref(), &cfg.log_level, None) {
        eprintln!("logging disabled: {e}");
    }

    let db = match Database::open(cfg.data_path.as_deref()) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            log::error!("cannot open database: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = match run(cli.command, &cfg, db.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    };
    if let Err(e) = db.close() {
        log::warn!("close failed: {e}");
    }
    code
}

async fn run(command: Commands, cfg: &AppConfig, db: Arc<Database>) -> Result<(), Box<dyn std::error::Error>> {
    let cmd = match command {
        Commands::Serve { .. } => return http::serve(cfg, db).await,
        Commands::List { page, limit, status, city, search, sort } => {
            Command::List(ListParams { page, limit, status, city, search, sort })
        }
        Commands::Stats => Command::Stats,
        Commands::Get { id } => Command::Get { id },
        Commands::Create { json } => Command::Create { json },
        Commands::Update { id, json } => Command::Update { id, json },
        Commands::Delete { id } => Command::Delete { id },
        Commands::Seed { count } => Command::Seed { count },
    };
    let service = UserService::new(&db, cfg.service_settings())?;
    match prog_cli::run(&service, cmd).await {
        Ok(out) => {
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Err(e) => {
            let body = ErrorBody::new(e.to_string(), e.details().to_vec());
            println!("{}", serde_json::to_string_pretty(&body)?);
            Err(Box::new(e))
        }
    }
}

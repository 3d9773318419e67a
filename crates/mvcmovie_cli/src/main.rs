//! MvcMovie CLI
//!
//! Command-line host for the movie catalogue: opens the store per invocation,
//! routes each subcommand through `MoviesController` and renders the result.

use clap::{Args, Parser, Subcommand};
use log::info;
use mvcmovie_core::controller::hello_world;
use mvcmovie_core::db::open_db;
use mvcmovie_core::{
    init_logging, seed_if_empty, AntiForgery, AppConfig, MovieService, MoviesController,
    SqliteMovieRepository,
};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "mvcmovie")]
#[command(about = "MvcMovie - movie catalogue with conflict-checked edits", long_about = None)]
struct Cli {
    /// SQLite database file (overrides MVCMOVIE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error (overrides MVCMOVIE_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute log directory (overrides MVCMOVIE_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Skip seeding sample movies into an empty database
    #[arg(long, global = true)]
    no_seed: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List movies, optionally filtered by genre and title text
    List(commands::ListArgs),
    /// List the distinct genres currently stored
    Genres,
    /// Show one movie
    Show {
        id: Option<i64>,
    },
    /// Create a movie
    Create(commands::MovieArgs),
    /// Edit a movie against the version you last saw
    Edit(commands::EditArgs),
    /// Delete a movie (shows it first; pass --confirm to remove it)
    Delete(commands::DeleteArgs),
    /// Insert the sample movies if the database is empty
    Seed,
    /// Print the greeting landing text
    Hello,
    /// Print a greeting
    Welcome(WelcomeArgs),
    /// Print the core version
    Version,
}

#[derive(Debug, Args)]
struct WelcomeArgs {
    name: String,

    /// How many times to repeat the greeting
    #[arg(long)]
    times: Option<u32>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = resolve_config(&cli);

    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    match &cli.command {
        Commands::Version => {
            println!("mvcmovie_core version={}", mvcmovie_core::core_version());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Hello => {
            println!("{}", hello_world::index());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Welcome(args) => {
            commands::render_welcome(args.name.as_str(), args.times, cli.json)?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let conn = open_db(&config.db_path)?;

    if let Commands::Seed = cli.command {
        let inserted = seed_if_empty(&conn)?;
        println!("Seeded {inserted} movie(s).");
        return Ok(ExitCode::SUCCESS);
    }
    if config.seed_on_startup {
        seed_if_empty(&conn)?;
    }

    let repo = SqliteMovieRepository::try_new(&conn)?;
    let controller = MoviesController::new(MovieService::new(repo), AntiForgery::new_session());
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    let code = match cli.command {
        Commands::List(args) => commands::list(&controller, &args, cli.json)?,
        Commands::Genres => commands::genres(&controller, cli.json)?,
        Commands::Show { id } => commands::show(&controller, id, cli.json)?,
        Commands::Create(args) => commands::create(&controller, args, cli.json)?,
        Commands::Edit(args) => commands::edit(&controller, args, cli.json)?,
        Commands::Delete(args) => commands::delete(&controller, &args, cli.json)?,
        Commands::Seed | Commands::Hello | Commands::Welcome(_) | Commands::Version => {
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

fn resolve_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::from_env();
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = dir.clone();
    }
    if cli.no_seed {
        config.seed_on_startup = false;
    }
    config
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::List(_) => "list",
        Commands::Genres => "genres",
        Commands::Show { .. } => "show",
        Commands::Create(_) => "create",
        Commands::Edit(_) => "edit",
        Commands::Delete(_) => "delete",
        Commands::Seed => "seed",
        Commands::Hello => "hello",
        Commands::Welcome(_) => "welcome",
        Commands::Version => "version",
    }
}

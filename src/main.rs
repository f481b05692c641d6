use clap::Parser;
use color_eyre::Result;
use taskboard::{Board, Config, Profile, cli::{Cli, Commands}, store, utils};

fn main() -> Result<()> {
    color_eyre::install()?;

    // .env or a web project's .env.local may carry the hosted endpoint and key
    dotenv::dotenv().ok();
    dotenv::from_filename(".env.local").ok();

    let cli = Cli::parse();

    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    let command = cli.command.unwrap_or(Commands::Tui);
    let interactive = matches!(command, Commands::Tui);

    if interactive {
        let log_path = utils::expand_path(&utils::data_file(profile, "taskboard.log"));
        taskboard::logging::init_file(&log_path)?;
    } else {
        taskboard::logging::init_stderr();
    }

    let config_path = cli.config.as_deref().map(utils::expand_path);
    let mut config = Config::load_with_profile(profile, config_path.as_deref())?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    tracing::info!(backend = %config.backend, version = env!("CARGO_PKG_VERSION"), "Starting taskboard");

    let store = store::open(&config)?;
    let board = Board::new(store);

    if interactive {
        let app = taskboard::tui::App::new(config, board);
        taskboard::tui::run_event_loop(app)?;
    } else {
        let mut board = board;
        board.start()?;
        let mut stdout = std::io::stdout().lock();
        taskboard::cli::run_command(command, &mut board, &mut stdout)?;
    }

    Ok(())
}

use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Instant,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use pointrush::{
    app::{App, AppAction},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    game::{parse_point_count, Phase},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    session::{Session, SessionConfig},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use tracing::{info, warn};

/// click the numbered targets in order before each countdown runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed memory game for the terminal: targets are scattered on a board and must be clicked in ascending order. Each newly activated target must be clicked within 3 seconds."
)]
pub struct Cli {
    /// number of targets on the board, from 1 to 999
    #[clap(short = 'n', long, allow_hyphen_values = true)]
    points: Option<String>,

    /// start with autoplay enabled
    #[clap(long)]
    auto: bool,

    /// seed for a reproducible board layout
    #[clap(long)]
    seed: Option<u64>,

    /// write logs to this file instead of the default state directory
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// do not remember settings for the next run
    #[clap(long)]
    no_save: bool,
}

impl Cli {
    /// CLI flags win over the stored settings
    fn to_session_config(&self, stored: &Config) -> SessionConfig {
        SessionConfig {
            point_count: self
                .points
                .as_deref()
                .map(parse_point_count)
                .unwrap_or(stored.point_count),
            auto_play: self.auto || stored.auto_play,
            seed: self.seed,
            ..SessionConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) {
        logging::init_file_logging(&path)?;
    }

    let store = FileConfigStore::new();
    let stored = store.load();
    let session_config = cli.to_session_config(&stored);
    info!(
        points = session_config.point_count,
        auto_play = session_config.auto_play,
        seed = ?session_config.seed,
        "pointrush starting"
    );
    let mut app = App::new(Session::new(session_config));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if !cli.no_save {
        if let Err(err) = store.save(&app.config()) {
            warn!(%err, "could not save settings");
        }
    }
    info!("pointrush exiting");

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let mut last_step = Instant::now();

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let event = runner.step();

        // every event advances the clock by the real time that passed
        let now = Instant::now();
        let mut redraw = app.on_elapsed(now - last_step);
        last_step = now;

        match event {
            GameEvent::Tick => redraw |= app.snapshot().phase == Phase::Playing,
            GameEvent::Resize => redraw = true,
            GameEvent::Key(key) => {
                if app.on_key(key) == AppAction::Quit {
                    break;
                }
                redraw = true;
            }
            GameEvent::Mouse(mouse) => {
                let size = terminal.size()?;
                app.on_mouse(mouse, Rect::new(0, 0, size.width, size.height));
                redraw = true;
            }
        }

        if redraw {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    Ok(())
}

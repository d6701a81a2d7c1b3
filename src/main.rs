use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use time_humanize::HumanTime;

use typedrill::checkpoint::ProgressSink;
use typedrill::config::{ConfigStore, FileConfigStore};
use typedrill::runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner};
use typedrill::samples;
use typedrill::session::TypingSession;
use typedrill::store::ProjectStore;
use typedrill::theme::Theme;
use typedrill::ui::SessionView;
use typedrill::words::tokenize;

const TICK_RATE_MS: u64 = 100;
const STATUS_TTL: Duration = Duration::from_secs(3);

/// terminal typing trainer for your own documents
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Import text documents as practice projects, then transcribe them in fixed-size \
chunks with live WPM and accuracy. Progress is checkpointed so a session can be resumed later."
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Practice a project, resuming from the latest checkpoint
    Practice {
        /// project id, as shown by `list`
        id: i64,

        /// ignore saved progress and start from the first word
        #[clap(long)]
        from_start: bool,

        /// color scheme override for this session
        #[clap(long, value_enum)]
        theme: Option<Theme>,
    },

    /// Import a text file or bundled sample as a new project
    Import {
        /// path to a UTF-8 text file
        path: Option<PathBuf>,

        /// import a bundled sample text instead of a file
        #[clap(long, conflicts_with = "path")]
        sample: Option<String>,

        /// project title (defaults to the file stem or sample name)
        #[clap(long)]
        title: Option<String>,
    },

    /// List projects with progress and last-practiced time
    List,

    /// Delete a project and its checkpoints
    Delete { id: i64 },

    /// Export a project's checkpoint history as CSV
    Export {
        /// project id, as shown by `list`
        id: i64,

        /// output file (defaults to stdout)
        #[clap(long)]
        out: Option<PathBuf>,
    },

    /// List the bundled sample texts
    Samples,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Practice {
            id,
            from_start,
            theme,
        } => cmd_practice(id, from_start, theme),
        Command::Import {
            path,
            sample,
            title,
        } => cmd_import(path, sample, title),
        Command::List => cmd_list(),
        Command::Delete { id } => cmd_delete(id),
        Command::Export { id, out } => cmd_export(id, out),
        Command::Samples => cmd_samples(),
    }
}

/// Exits through clap's error reporting so pre-TUI failures print uniformly.
fn cli_error(kind: ErrorKind, message: &str) -> ! {
    Cli::command().error(kind, message).exit()
}

fn cmd_import(
    path: Option<PathBuf>,
    sample: Option<String>,
    title: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let (default_title, content) = match (&path, &sample) {
        (Some(p), None) => {
            let content = std::fs::read_to_string(p).unwrap_or_else(|e| {
                cli_error(ErrorKind::Io, &format!("cannot read {}: {}", p.display(), e))
            });
            (file_stem(p), content)
        }
        (None, Some(name)) => match samples::sample_text(name) {
            Some(text) => (name.clone(), text.to_owned()),
            None => cli_error(
                ErrorKind::InvalidValue,
                &format!(
                    "no sample named '{}'; run `typedrill samples` to see what is bundled",
                    name
                ),
            ),
        },
        _ => cli_error(
            ErrorKind::MissingRequiredArgument,
            "give a file path or --sample <name>",
        ),
    };

    if tokenize(&content).is_empty() {
        cli_error(ErrorKind::InvalidValue, "document has no typable content");
    }

    let store = ProjectStore::new()?;
    let title = title.unwrap_or(default_title);
    let id = store.create_project(&title, &content)?;
    let words = tokenize(&content).len();
    println!("Imported '{}' as project {} ({} words)", title, id, words);
    println!("Practice it with: typedrill practice {}", id);
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_owned())
}

fn cmd_list() -> Result<(), Box<dyn Error>> {
    let store = ProjectStore::new()?;
    let projects = store.list_projects()?;

    if projects.is_empty() {
        println!("No projects yet. Import one with `typedrill import <file>`.");
        return Ok(());
    }

    println!(
        "{:>4}  {:<28} {:>10} {:>6} {:>5}  {}",
        "id", "title", "progress", "wpm", "acc", "last practiced"
    );
    for p in projects {
        let pct = if p.word_count > 0 {
            (100 * p.completed_words.min(p.word_count)) / p.word_count
        } else {
            0
        };
        let practiced = match p.last_practiced {
            Some(ts) => {
                let ago = (Local::now() - ts).num_seconds();
                HumanTime::from(-ago).to_string()
            }
            None => "never".to_owned(),
        };
        println!(
            "{:>4}  {:<28} {:>9}% {:>6} {:>4}%  {}",
            p.id,
            truncate(&p.title, 28),
            pct,
            p.wpm,
            p.accuracy,
            practiced
        );
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_owned()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn cmd_delete(id: i64) -> Result<(), Box<dyn Error>> {
    let store = ProjectStore::new()?;
    if store.delete_project(id)? {
        println!("Deleted project {}", id);
    } else {
        cli_error(ErrorKind::InvalidValue, &format!("no project with id {}", id));
    }
    Ok(())
}

fn cmd_export(id: i64, out: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let store = ProjectStore::new()?;
    let history = store.checkpoint_history(id)?;
    if history.is_empty() {
        cli_error(
            ErrorKind::InvalidValue,
            &format!("project {} has no checkpoints to export", id),
        );
    }

    let writer: Box<dyn Write> = match &out {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(io::stdout()),
    };
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["timestamp", "wpm", "accuracy", "completed_words"])?;
    for cp in &history {
        csv.write_record([
            cp.timestamp.to_rfc3339(),
            cp.wpm.to_string(),
            cp.accuracy.to_string(),
            cp.completed_words.to_string(),
        ])?;
    }
    csv.flush()?;

    if let Some(path) = out {
        println!("Wrote {} checkpoints to {}", history.len(), path.display());
    }
    Ok(())
}

fn cmd_samples() -> Result<(), Box<dyn Error>> {
    println!("Bundled samples (import with `typedrill import --sample <name>`):");
    for name in samples::sample_names() {
        let words = samples::sample_text(&name)
            .map(|t| tokenize(t).len())
            .unwrap_or(0);
        println!("  {:<16} {} words", name, words);
    }
    Ok(())
}

struct App {
    session: TypingSession,
    theme: Theme,
    status: Option<(String, Instant)>,
    autosave: Option<Duration>,
    last_autosave: Instant,
}

impl App {
    fn set_status(&mut self, message: String, now: Instant) {
        self.status = Some((message, now));
    }

    fn expire_status(&mut self, now: Instant) {
        if let Some((_, since)) = self.status {
            if now.duration_since(since) >= STATUS_TTL {
                self.status = None;
            }
        }
    }
}

fn cmd_practice(
    id: i64,
    from_start: bool,
    theme_override: Option<Theme>,
) -> Result<(), Box<dyn Error>> {
    let store = ProjectStore::new()?;
    let config = FileConfigStore::new().load();
    let theme = theme_override.unwrap_or(config.theme);

    let resume_offset = if from_start {
        0
    } else {
        store
            .latest_checkpoint(id)?
            .map(|cp| cp.completed_words)
            .unwrap_or(0)
    };

    // Content failures surface as messages, never as a panic or raw I/O error
    let session = match TypingSession::open(&store, id, resume_offset) {
        Ok(session) => session,
        Err(e) => cli_error(ErrorKind::InvalidValue, &e.to_string()),
    };

    if !stdin().is_tty() {
        cli_error(ErrorKind::Io, "stdin must be a tty");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App {
        session,
        theme,
        status: None,
        autosave: config.autosave_secs.map(Duration::from_secs),
        last_autosave: Instant::now(),
    };

    let result = run_session(&mut terminal, &mut app, &store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Checkpoint on the way out so a quit never loses progress
    if app.session.has_started() {
        match save_progress(&store, &app.session) {
            Ok(message) | Err(message) => println!("{}", message),
        }
    }

    result
}

/// Persists a checkpoint and reports either way; a failed save leaves the
/// session running and only the stored copy stale.
fn save_progress(store: &ProjectStore, session: &TypingSession) -> Result<String, String> {
    let checkpoint = session.checkpoint(Local::now());
    match store.save_checkpoint(&checkpoint) {
        Ok(()) => Ok(format!(
            "Progress saved ({} of {} words)",
            checkpoint.completed_words,
            session.total_words()
        )),
        Err(e) => Err(e.to_string()),
    }
}

fn run_session<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &ProjectStore,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| draw(app, f))?;

    loop {
        let now = Instant::now();
        match runner.step() {
            AppEvent::Tick => {
                app.session.on_tick(now);
                app.expire_status(now);
                autosave_if_due(app, store, now);
                if app.session.has_started() {
                    terminal.draw(|f| draw(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| draw(app, f))?;
            }
            AppEvent::Key(key) => {
                if handle_key(app, store, key, now) {
                    break;
                }
                terminal.draw(|f| draw(app, f))?;
            }
        }
    }

    Ok(())
}

/// Applies one key event; returns true when the session screen should close.
fn handle_key(app: &mut App, store: &ProjectStore, key: KeyEvent, now: Instant) -> bool {
    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Backspace => app.session.backspace(),
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                match c {
                    'c' => return true,
                    'p' => app.session.toggle_pause(now),
                    's' => {
                        let message = match save_progress(store, &app.session) {
                            Ok(m) | Err(m) => m,
                        };
                        app.set_status(message, now);
                    }
                    _ => {}
                }
            } else {
                app.session.type_char(c, now);
            }
        }
        _ => {}
    }
    false
}

fn autosave_if_due(app: &mut App, store: &ProjectStore, now: Instant) {
    let Some(interval) = app.autosave else {
        return;
    };
    if !app.session.has_started() || app.session.is_paused() || app.session.is_complete() {
        return;
    }
    if now.duration_since(app.last_autosave) < interval {
        return;
    }
    app.last_autosave = now;
    let message = match save_progress(store, &app.session) {
        Ok(m) | Err(m) => m,
    };
    app.set_status(message, now);
}

fn draw(app: &App, f: &mut Frame) {
    let view = SessionView {
        session: &app.session,
        theme: app.theme,
        elapsed: app.session.elapsed(Instant::now()),
        status: app.status.as_ref().map(|(m, _)| m.as_str()),
    };
    f.render_widget(&view, f.area());
}

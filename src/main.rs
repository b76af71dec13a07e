use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use lectura::app::App;
use lectura::audio::SilentBackend;
use lectura::config::Config;
use lectura::engine::highlight::Segment;
use lectura::error::LoadError;
use lectura::lesson::source::{self, FileLessonSource, HttpLessonSource};
use lectura::lesson::validate::LoadReport;
use lectura::lesson::{LessonKind, LessonSet};
use lectura::report::{BackgroundReporter, HttpProgressReporter, LogReporter, ProgressReporter};
use lectura::session::{AdvanceOutcome, Feedback, ReadingStep, SelectOutcome};

#[derive(Parser)]
#[command(name = "lectura", version, about = "Assisted reading trainer")]
struct Cli {
    #[arg(short, long, help = "Log filter, overrides the configured level")]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a lesson file and print what would be skipped
    Check {
        file: PathBuf,
        #[arg(long, help = "Treat the file as a narrated lesson set")]
        narrated: bool,
    },
    /// Fill the blanks of the exercise sets in a file
    Play {
        file: PathBuf,
        #[arg(short, long, help = "Learner name sent with the completion report")]
        user: Option<String>,
    },
    /// Step through a narrated lesson set
    Read { file: PathBuf },
    /// Download the fill-blank exercises from the configured server
    Fetch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let filter = cli.log.clone().unwrap_or_else(|| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match cli.command {
        Command::Check { file, narrated } => check(&config, &file, narrated),
        Command::Play { file, user } => play(&config, &file, user),
        Command::Read { file } => read(&config, &file),
        Command::Fetch => fetch(&config),
    }
}

fn load(
    config: &Config,
    file: &Path,
    kind: LessonKind,
) -> Result<(LessonSet, LoadReport), LoadError> {
    let source = FileLessonSource::new(file);
    match kind {
        LessonKind::FillBlank => {
            source::load_fill_blank(&source, &config.exercise_type, config.blank_marker)
        }
        LessonKind::Narrated => source::load_narrated(&source, 0),
    }
}

fn print_report(report: &LoadReport) {
    println!("{} lessons usable", report.accepted);
    for e in &report.rejected {
        println!("  skipped: {e}");
    }
    for w in &report.warnings {
        println!("  warning: {w:?}");
    }
}

fn check(config: &Config, file: &Path, narrated: bool) -> Result<()> {
    let kind = if narrated {
        LessonKind::Narrated
    } else {
        LessonKind::FillBlank
    };
    let (set, report) = load(config, file, kind)?;
    println!("set {} {:?}", set.id, set.title);
    print_report(&report);
    Ok(())
}

fn reporter(config: &Config) -> Arc<dyn ProgressReporter> {
    if config.has_server() {
        Arc::new(BackgroundReporter::new(HttpProgressReporter::new(config.endpoint())))
    } else {
        Arc::new(LogReporter)
    }
}

fn show(feedback: Option<Feedback>) {
    match feedback {
        Some(Feedback::Haptic) => println!("  (bzz)"),
        Some(Feedback::Spoken(message)) => println!("  {message}"),
        Some(Feedback::Celebrate) => println!("  ¡Ejercicio completado!"),
        None => {}
    }
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

fn show_exercise(app: &App<SilentBackend>) {
    let Some(session) = app.exercise() else {
        return;
    };
    if let Some(i) = session.current_index() {
        let letters: String = session.pool().letters().iter().collect();
        println!(
            "[{}/{}] {}   letters: {}",
            i + 1,
            session.lesson_count(),
            session.rendered_sentence(),
            letters
        );
    }
}

fn play(config: &Config, file: &Path, user: Option<String>) -> Result<()> {
    let mut options = config.session_options();
    if let Some(user) = user {
        options.username = user;
    }
    let mut app = App::new(SilentBackend::new(), reporter(config), options, config.narrated_gate());

    let ticket = app.begin_load(LessonKind::FillBlank);
    let loaded = load(config, file, LessonKind::FillBlank).map(|(set, report)| {
        print_report(&report);
        set
    });
    app.finish_load(ticket, loaded)?;
    app.pump_audio();
    show_exercise(&app);
    prompt()?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let input = line.trim();
        match input {
            "q" | "<" => app.exit(),
            ">" => {
                if let Some(outcome) = app.advance() {
                    show(outcome.feedback());
                    if let AdvanceOutcome::Finished { reported: false } = outcome {
                        println!("  completion could not be recorded");
                    }
                }
            }
            "r" => app.replay(),
            _ => {
                for letter in input.chars().filter(|c| !c.is_whitespace()) {
                    if let Some(outcome) = app.select(letter) {
                        if let SelectOutcome::Rejected(why) = &outcome {
                            println!("  {letter}: {why:?}");
                        }
                        show(outcome.feedback());
                    }
                }
            }
        }
        app.pump_audio();

        if app.is_exited() || app.exercise().is_some_and(|s| s.is_finished()) {
            break;
        }
        show_exercise(&app);
        prompt()?;
    }

    if let Some(session) = app.exercise() {
        println!("{}", serde_json::to_string_pretty(&session.summary())?);
    }
    Ok(())
}

fn show_reading(app: &App<SilentBackend>) {
    let Some(reading) = app.reading() else {
        return;
    };
    let lesson = reading.current();
    println!("[{}/{}] {}", reading.index() + 1, reading.lesson_count(), lesson.title);
    let text: String = lesson
        .segments()
        .iter()
        .map(|s| match s {
            Segment::Plain(t) => t.to_string(),
            Segment::Highlight(t) => format!("[{}]", t.to_uppercase()),
            Segment::Sound(t) => format!("<{t}>"),
        })
        .collect();
    println!("{text}");
}

fn read(config: &Config, file: &Path) -> Result<()> {
    let mut app = App::new(
        SilentBackend::new(),
        Arc::new(LogReporter),
        config.session_options(),
        config.narrated_gate(),
    );

    let ticket = app.begin_load(LessonKind::Narrated);
    let loaded = load(config, file, LessonKind::Narrated).map(|(set, _)| set);
    app.finish_load(ticket, loaded)?;
    app.pump_audio();
    show_reading(&app);
    prompt()?;

    for line in io::stdin().lock().lines() {
        let step = match line?.trim() {
            "n" | ">" => app.next(),
            "p" | "<" => app.previous(),
            "r" => {
                app.replay();
                None
            }
            "q" => {
                app.exit();
                None
            }
            _ => None,
        };
        app.pump_audio();

        match step {
            Some(ReadingStep::Blocked) => show(Some(Feedback::Haptic)),
            Some(ReadingStep::Quiz(quiz)) => {
                println!("continue with quiz {quiz}");
                break;
            }
            Some(ReadingStep::Done) => {
                show(Some(Feedback::Celebrate));
                break;
            }
            _ => {}
        }
        if app.is_exited() {
            break;
        }
        show_reading(&app);
        prompt()?;
    }
    Ok(())
}

fn fetch(config: &Config) -> Result<()> {
    if !config.has_server() {
        bail!("no server_url in {}", Config::config_path().display());
    }
    let source = HttpLessonSource::new(config.endpoint());
    let (set, report) =
        source::load_fill_blank(&source, &config.exercise_type, config.blank_marker)?;
    println!("exercise {} {:?}", set.id, set.title);
    print_report(&report);
    for (i, lesson) in set.lessons().iter().enumerate() {
        if let Some(l) = set.fill_blank_at(i) {
            println!("  {:>3} {}", l.id, l.sentence_text());
        } else {
            println!("  {:>3} (not a fill-blank lesson)", lesson.id());
        }
    }
    Ok(())
}

//! `mouledi` binary: drives the voice pipeline from a terminal.
//!
//! `mouledi route <text…>` routes typed text the way the home screen's debug
//! mode does. `mouledi listen <file.wav> [<followup.wav>]` runs one
//! press-to-talk session against the configured backends, using the WAV file
//! as the recording, and prints the providers found for the dispatched query.
//! A second file is transcribed as if spoken on the results screen.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use mouledi_nlu::QueryRouter;
use mouledi_types::Coordinates;
use mouledi_voice::{
    AudioCapture, Collaborators, FeedbackPlayer, FixedGeolocator, HttpBackend, LoggingOutput,
    PressOutcome, ResultsAction, ResultsLoader, ResultsPage, SessionError, SessionOutcome,
    Transcriber, VoiceSessionController, WavFileCapture,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "usage: mouledi [--config <path>] <route <text…> | listen <file.wav> [<followup.wav>]>";

#[derive(Debug, PartialEq)]
enum Command {
    Route(String),
    Listen {
        recording: PathBuf,
        follow_up: Option<PathBuf>,
    },
}

#[derive(Debug, PartialEq)]
struct CliArgs {
    config_path: Option<String>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut rest = args;
    let mut config_path = None;

    if rest.first().map(String::as_str) == Some("--config") {
        match rest.get(1) {
            Some(path) if !path.trim().is_empty() => config_path = Some(path.clone()),
            _ => return Err("--config needs a path".to_string()),
        }
        rest = &rest[2..];
    }

    let command = match rest.split_first() {
        Some((name, words)) if name == "route" => {
            let text = words.join(" ");
            if text.trim().is_empty() {
                return Err("route needs some text".to_string());
            }
            Command::Route(text)
        }
        Some((name, [file])) if name == "listen" => Command::Listen {
            recording: PathBuf::from(file),
            follow_up: None,
        },
        Some((name, [file, next])) if name == "listen" => Command::Listen {
            recording: PathBuf::from(file),
            follow_up: Some(PathBuf::from(next)),
        },
        Some((name, _)) if name == "listen" => {
            return Err("listen needs one or two WAV files".to_string())
        }
        Some((name, _)) => return Err(format!("unknown command {name:?}")),
        None => return Err("missing command".to_string()),
    };

    Ok(CliArgs {
        config_path,
        command,
    })
}

fn resolve_config_path(cli: Option<&str>) -> (String, &'static str) {
    if let Some(path) = cli {
        return (path.to_string(), "cli-arg");
    }

    if let Ok(path) = std::env::var("MOULEDI_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (path, "env-var");
        }
    }

    ("mouledi.toml".to_string(), "default")
}

fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let (config_path, config_source) = resolve_config_path(cli.config_path.as_deref());
    let config = match config::load_config(Some(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    init_tracing(&config.logging);
    tracing::info!(
        source = config_source,
        path = %config_path,
        "resolved startup configuration path"
    );

    let router = match config.router() {
        Ok(router) => router,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Command::Route(text) => {
            route_text(&router, &text);
            ExitCode::SUCCESS
        }
        Command::Listen {
            recording,
            follow_up,
        } => listen(&config, router, recording, follow_up).await,
    }
}

fn route_text(router: &QueryRouter, text: &str) {
    let routed = router.route(text);
    let district = routed.district.map_or("-", |d| d.as_str());
    println!("DEBUG: intent={} | district={}", routed.intent, district);
}

async fn listen(
    config: &config::Config,
    router: QueryRouter,
    path: PathBuf,
    follow_up: Option<PathBuf>,
) -> ExitCode {
    let backend = Arc::new(HttpBackend::new(config.services.clone()));
    let feedback = Arc::new(FeedbackPlayer::new(
        backend.clone(),
        Arc::new(LoggingOutput::new()),
        config.feedback.language.clone(),
    ));
    let controller = VoiceSessionController::new(
        Collaborators {
            capture: Arc::new(WavFileCapture::new(path)),
            transcriber: backend.clone(),
            health: backend.clone(),
            geolocator: Arc::new(FixedGeolocator::new(config.location)),
        },
        feedback.clone(),
        router.clone(),
        config.session.clone(),
        &config.services,
    );

    controller.welcome().await;

    let outcome = match controller.press().await {
        PressOutcome::RecordingStarted => match controller.press().await {
            PressOutcome::Finished(outcome) => outcome,
            other => {
                tracing::error!(?other, "second press did not finish the session");
                controller.shutdown().await;
                return ExitCode::FAILURE;
            }
        },
        PressOutcome::Finished(outcome) => outcome,
        PressOutcome::Ignored => {
            tracing::error!("press ignored by an idle controller");
            return ExitCode::FAILURE;
        }
    };

    let code = match outcome {
        SessionOutcome::Dispatched(request) => {
            println!("Entendu: {}", request.transcript);
            let limit = config.services.result_limit;
            let loader = ResultsLoader::new(backend.clone(), feedback, limit).with_router(router);
            match loader
                .load(request.intent, request.district, request.coordinates)
                .await
            {
                Ok(page) => {
                    print_page(&page);
                    match follow_up {
                        Some(path) => {
                            follow_up_on(&loader, &backend, &page, path, request.coordinates).await
                        }
                        None => ExitCode::SUCCESS,
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "provider search failed");
                    println!("Erreur: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        SessionOutcome::Fallback { last_heard, .. } => {
            println!("{}", controller.status());
            if let Some(heard) = last_heard {
                println!("Dernier entendu: {heard}");
            }
            ExitCode::SUCCESS
        }
        SessionOutcome::Failed(e) => {
            println!("{}", e.user_status());
            ExitCode::FAILURE
        }
    };

    controller.shutdown().await;
    code
}

/// Transcribes `path` and handles it as speech heard on the results screen.
async fn follow_up_on(
    loader: &ResultsLoader,
    backend: &HttpBackend,
    page: &ResultsPage,
    path: PathBuf,
    near: Option<Coordinates>,
) -> ExitCode {
    let text = match transcribe_file(backend, path).await {
        Ok(text) => text,
        Err(e) => {
            println!("{}", e.user_status());
            return ExitCode::FAILURE;
        }
    };
    println!("Entendu: {text}");

    match loader.handle_transcript(page, &text, near).await {
        Ok(ResultsAction::Back) => println!("Retour à l'accueil"),
        Ok(ResultsAction::Call(Some(uri))) => println!("Appel: {uri}"),
        Ok(ResultsAction::Call(None)) => println!("Pas de numéro pour cet élément"),
        Ok(ResultsAction::Repeat) => println!("Veuillez répéter"),
        Ok(ResultsAction::Page(next)) => print_page(&next),
        Err(e) => {
            tracing::warn!(error = %e, "follow-up search failed");
            println!("Erreur: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

async fn transcribe_file(backend: &HttpBackend, path: PathBuf) -> Result<String, SessionError> {
    let recording = WavFileCapture::new(path).start().await?.stop().await?;
    let transcription = backend.transcribe(&recording).await?;
    Ok(transcription.text)
}

fn print_page(page: &ResultsPage) {
    let district = page.district.map_or("Lomé", |d| d.as_str());
    println!("{} ({district})", page.intent);
    if page.widened {
        println!("Aucune pharmacie de garde trouvée, toutes les pharmacies:");
    }
    if page.is_empty() {
        println!("Aucun résultat.");
        return;
    }
    for (i, item) in page.items.iter().enumerate() {
        let phone = item.phone.as_deref().unwrap_or("-");
        let on_call = if item.is_on_call_now { " [garde]" } else { "" };
        println!("{:>2}. {}{} {}", i + 1, item.name, on_call, phone);
    }
}

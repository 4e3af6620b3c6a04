//! Terminal client for the Nirmaan backend.
//!
//! Examples:
//!   nirmaan-cli login official@test.com password123
//!   nirmaan-cli whoami
//!   nirmaan-cli predict 120 45 site.jpg
//!   nirmaan-cli access /projects
//!   nirmaan-cli projects --public
//!   nirmaan-cli logout
//!
//! By default it talks to http://localhost:5000 (or `$NIRMAAN_API_BASE`);
//! override with `--api <url>`. The bearer token is kept in the OS data dir.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use nirmaan::api::{HttpClient, ProjectApi, RegisterRequest};
use nirmaan::config::ClientConfig;
use nirmaan::dashboard::Dashboard;
use nirmaan::gate::{post_login_destination, AppRoute, GateDecision};
use nirmaan::prediction::{
    Field, ImageAttachment, PredictionForm, SubmissionStatus, SubmitBlocked, CHART_LABELS,
};
use nirmaan::role::Role;
use nirmaan::session::{SessionState, SessionStore};
use nirmaan::storage::FileCredentials;
use nirmaan::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct AppPaths {
    data_dir: PathBuf,
    token_key: &'static str,
}

impl AppPaths {
    fn new(cfg: &ClientConfig) -> Result<Self, String> {
        let base = dirs::data_dir().ok_or("Could not determine data directory")?;
        let data_dir = base.join("nirmaan");
        fs::create_dir_all(&data_dir)
            .map_err(|e| format!("Failed to create data directory: {}", e))?;
        Ok(Self {
            data_dir,
            token_key: cfg.token_key,
        })
    }

    fn token_file(&self) -> PathBuf {
        self.data_dir.join(self.token_key)
    }
}

fn usage() -> ! {
    eprintln!("nirmaan-cli (talks to the Nirmaan backend @ http://localhost:5000 by default)");
    eprintln!("Usage: nirmaan-cli [--api http://host:port] <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  login <email> <password>               Exchange credentials for a token");
    eprintln!("  logout                                 Forget the stored token");
    eprintln!("  whoami                                 Verify the stored token and show the user");
    eprintln!("  register <username> <email> <password> [citizen|official|admin]");
    eprintln!("  predict <timeline_days> <budget_percent> <image>  Run a progress prediction");
    eprintln!("  projects [--public]                    List projects (dashboard listing needs login)");
    eprintln!("  access <path>                          Show what the route guard decides for <path>");
    eprintln!("  paths                                  Show data directory and token file");
    process::exit(1);
}

fn parse_args() -> (Option<String>, Vec<String>) {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut api = None;
    if args.len() >= 2 && args[0] == "--api" {
        api = Some(args[1].clone());
        args.drain(0..2);
    }

    if args.is_empty() {
        usage();
    }
    (api, args)
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn describe(state: &SessionState) -> String {
    match state {
        SessionState::Authenticated(id) => format!(
            "{} <{}> role={} (id {})",
            id.username, id.email, id.role_name, id.id
        ),
        other => other.label().to_string(),
    }
}

async fn run(api_override: Option<String>, args: Vec<String>) -> Result<(), String> {
    let cfg = ClientConfig::resolve(api_override.as_deref())?;
    let paths = AppPaths::new(&cfg)?;
    let client = HttpClient::new(&cfg).map_err(|e| e.to_string())?;
    let mut session = SessionStore::new(FileCredentials::new(paths.token_file()));
    info!("Using backend {}", client.base());

    let cmd = args[0].as_str();
    let rest = &args[1..];
    match cmd {
        "login" => {
            let [email, password] = rest else { usage() };
            match session.login(&client, email, password).await {
                Ok(id) => {
                    println!("Logged in as {} ({})", id.username, id.role_name);
                    println!("Continue at {}", post_login_destination(None));
                    Ok(())
                }
                Err(_) => Err(session.last_error().unwrap_or("Login failed").to_string()),
            }
        }
        "logout" => {
            session.logout();
            println!("Logged out");
            Ok(())
        }
        "whoami" => {
            session.restore(&client).await;
            println!("{}", describe(session.state()));
            Ok(())
        }
        "register" => {
            let (username, email, password, role) = match rest {
                [u, e, p] => (u, e, p, None),
                [u, e, p, r] => match Role::parse(r) {
                    Some(role) => (u, e, p, Some(role)),
                    None => return Err(format!("unknown role: {r}")),
                },
                _ => usage(),
            };
            let req = RegisterRequest {
                username: username.clone(),
                email: email.clone(),
                password: password.clone(),
                role,
            };
            match session.register(&client, &req).await {
                Ok(created) => {
                    println!(
                        "{}",
                        created
                            .message
                            .unwrap_or_else(|| "User registered successfully".to_string())
                    );
                    println!("Now run: nirmaan-cli login {} <password>", email);
                    Ok(())
                }
                Err(_) => Err(session
                    .last_error()
                    .unwrap_or("Registration failed")
                    .to_string()),
            }
        }
        "predict" => {
            let [timeline, budget, image_path] = rest else { usage() };
            predict(&client, &cfg, timeline, budget, Path::new(image_path)).await
        }
        "projects" => {
            let listing = match rest {
                [flag] if flag == "--public" => client.public_projects().await,
                [] => {
                    session.restore(&client).await;
                    let (Some(token), Some(id)) = (session.token(), session.identity()) else {
                        return Err("Not logged in (try --public)".to_string());
                    };
                    let path = Dashboard::for_identity(id).projects_path();
                    client.listing(path, &token).await
                }
                _ => usage(),
            };
            match listing {
                Ok(projects) => {
                    for p in projects {
                        println!(
                            "#{:<4} {:<32} {:<12} {:>5}%  {}",
                            p.id,
                            p.name,
                            p.status,
                            p.progress,
                            p.delay_status.unwrap_or_default()
                        );
                    }
                    Ok(())
                }
                Err(e) => {
                    if session.handle_rejection(&e) {
                        Err("Session expired; logged out".to_string())
                    } else {
                        Err(e.to_string())
                    }
                }
            }
        }
        "access" => {
            let [path] = rest else { usage() };
            session.restore(&client).await;
            let route = AppRoute::from_path(path);
            match route.decide(session.state()) {
                GateDecision::Loading => println!("{} -> loading", route.path()),
                GateDecision::RedirectToLogin { from } => {
                    println!("{} -> redirect to /login (return to {})", route.path(), from)
                }
                GateDecision::RedirectToLanding => {
                    println!("{} -> redirect to /dashboard (role not allowed)", route.path())
                }
                GateDecision::Render => match (route, session.identity()) {
                    (AppRoute::Dashboard, Some(id)) => {
                        println!("{} -> {}", route.path(), Dashboard::for_identity(id).title())
                    }
                    _ => println!("{} -> render", route.path()),
                },
            }
            Ok(())
        }
        "paths" => {
            println!("Data dir: {}", paths.data_dir.display());
            println!("Token file: {}", paths.token_file().display());
            Ok(())
        }
        _ => usage(),
    }
}

async fn predict(
    client: &HttpClient,
    cfg: &ClientConfig,
    timeline: &str,
    budget: &str,
    image_path: &Path,
) -> Result<(), String> {
    let mut form = PredictionForm::new(cfg.settle_window);
    let now = Instant::now();
    form.set_text(Field::TimelineDays, timeline, now);
    form.set_text(Field::BudgetUtilizedPercent, budget, now);

    match tokio::fs::read(image_path).await {
        Ok(bytes) => {
            let attachment = ImageAttachment {
                file_name: image_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "image".to_string()),
                content_type: content_type_for(image_path).to_string(),
                bytes,
            };
            form.select_image(attachment, None);
        }
        Err(e) => warn!("Could not read {:?}: {}", image_path, e),
    }

    match form.submit(client).await {
        Ok(()) => {}
        Err(SubmitBlocked::Invalid) => {
            let msgs: Vec<String> = form
                .errors()
                .messages()
                .into_iter()
                .map(|(f, m)| format!("  {}: {}", f.label(), m))
                .collect();
            return Err(format!("Invalid input:\n{}", msgs.join("\n")));
        }
        Err(other) => return Err(format!("submission blocked: {other:?}")),
    }

    match form.status() {
        SubmissionStatus::Succeeded(r) => {
            println!("Construction Stage: {}", r.predicted_stage);
            println!("Confidence: {}", r.confidence_label());
            println!("Delay Status: {}", r.delay_status());
            println!(
                "Delay Probability: {}{}",
                r.probability_label(),
                if r.high_delay_risk() { " (high)" } else { "" }
            );
            println!("Progress:");
            for (label, v) in CHART_LABELS.iter().zip(r.progress_series()) {
                println!("  {:>4}  {:>6.1}", label, v);
            }
            Ok(())
        }
        SubmissionStatus::Failed(msg) => Err(msg.clone()),
        SubmissionStatus::Idle | SubmissionStatus::Submitting => {
            Err("prediction did not complete".to_string())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (api, args) = parse_args();
    if let Err(e) = run(api, args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_file_is_named_by_config() {
        let cfg = ClientConfig {
            token_key: "session",
            ..ClientConfig::default()
        };
        let paths = AppPaths {
            data_dir: PathBuf::from("/tmp/nirmaan"),
            token_key: cfg.token_key,
        };
        assert_eq!(paths.token_file(), PathBuf::from("/tmp/nirmaan/session"));
    }
}

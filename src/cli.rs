use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use sankalp_push::adapters::{HttpPushApi, SystemTimeProvider};
use sankalp_push::codec::url_base64_to_key;
use sankalp_push::config::AppConfig;
use sankalp_push::ports::api::PushApi;
use sankalp_push::ports::time::TimeProvider;
use sankalp_push::relay;
use sankalp_push::types::notification::PushPayload;
use sankalp_push::types::push::{PushSubscription, TestNotificationRequest};

pub(crate) enum RunOutcome {
    Execute(Invocation),
    Exit(i32),
}

pub(crate) struct Invocation {
    command: Command,
    config: AppConfig,
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    match resolve_config(&cli) {
        Ok(config) => RunOutcome::Execute(Invocation {
            command: cli.command,
            config,
        }),
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "sankalp-push",
    version,
    about = "Push notification and background worker tooling for Sankalp"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[arg(long, env = "SANKALP_PUSH_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "SANKALP_API_URL")]
    api_url: Option<String>,
    #[arg(long, env = "SANKALP_SESSION_COOKIE")]
    session_cookie: Option<String>,
    #[arg(long, env = "SANKALP_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "SANKALP_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "SANKALP_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode an application server key; fetches the server's key when omitted.
    DecodeKey { key: Option<String> },
    /// Show the notification the worker would display for a payload file ("-" for stdin).
    Render { payload: PathBuf },
    /// Print the server's public key and subscription status.
    Status,
    /// Ask the server to push a test notification.
    Test,
    /// Generate a VAPID key pair.
    Vapid(VapidArgs),
    /// Deliver a payload straight to stored subscriptions through the relay.
    Send(SendArgs),
}

#[derive(Args, Debug)]
struct VapidArgs {
    #[arg(long)]
    subject: Option<String>,
}

#[derive(Args, Debug)]
struct SendArgs {
    /// JSON file holding one subscription or an array of them.
    #[arg(long)]
    subscription: PathBuf,
    #[arg(long)]
    payload: PathBuf,
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, String> {
    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load(path).map_err(|err| err.to_string())?,
        None => AppConfig::default(),
    };

    if let Some(api_url) = cli.api_url.as_deref() {
        let api_url = api_url.trim();
        if api_url.is_empty() {
            return Err("api url cannot be empty".to_string());
        }
        config.api.base_url = api_url.to_string();
    }
    if let Some(cookie) = cli.session_cookie.as_ref() {
        config.api.session_cookie = Some(cookie.clone());
    }
    if let Some(key) = cli.vapid_private_key.as_ref() {
        config.relay.vapid_private_key = Some(key.clone());
    }
    if let Some(key) = cli.vapid_public_key.as_ref() {
        config.relay.vapid_public_key = Some(key.clone());
    }
    if let Some(subject) = cli.vapid_subject.as_ref() {
        config.relay.vapid_subject = Some(subject.clone());
    }

    config.origin_url().map_err(|err| err.to_string())?;
    Ok(config)
}

pub(crate) async fn execute(invocation: Invocation) -> i32 {
    let Invocation { command, config } = invocation;
    let result = match command {
        Command::DecodeKey { key } => run_decode_key(&config, key).await,
        Command::Render { payload } => run_render(&config, &payload),
        Command::Status => run_status(&config).await,
        Command::Test => run_test(&config).await,
        Command::Vapid(args) => run_vapid(args),
        Command::Send(args) => run_send(&config, &args).await,
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

fn api_client(config: &AppConfig) -> Result<HttpPushApi, String> {
    let origin = config.origin_url().map_err(|err| err.to_string())?;
    HttpPushApi::new(&config.api, &origin).map_err(|err| err.to_string())
}

async fn run_decode_key(config: &AppConfig, key: Option<String>) -> Result<(), String> {
    let key = match key {
        Some(key) => key,
        None => api_client(config)?
            .vapid_public_key()
            .await
            .map_err(|err| format!("failed to fetch public key: {err}"))?,
    };
    let decoded = url_base64_to_key(&key).map_err(|err| err.to_string())?;
    let hex: String = decoded
        .as_bytes()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect();

    println!("length: {}", decoded.len());
    println!(
        "uncompressed P-256: {}",
        if decoded.is_uncompressed_p256() { "yes" } else { "no" }
    );
    println!("{hex}");
    Ok(())
}

fn run_render(config: &AppConfig, path: &Path) -> Result<(), String> {
    let bytes = read_input(path)?;
    let payload = match PushPayload::decode(Some(bytes.as_slice())) {
        Ok(payload) => payload,
        Err(err) => {
            eprintln!("warning: {err}; the worker would show the default notification");
            PushPayload::default()
        }
    };
    let notification = payload.into_notification(&config.notifications, SystemTimeProvider.now());
    let rendered = serde_json::to_string_pretty(&notification).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}

async fn run_status(config: &AppConfig) -> Result<(), String> {
    let api = api_client(config)?;
    match api.vapid_public_key().await {
        Ok(key) => println!("public key: {key}"),
        Err(err) => println!("public key: unavailable ({err})"),
    }
    let status = api
        .subscription_status()
        .await
        .map_err(|err| format!("failed to check notification status: {err}"))?;
    println!("subscribed: {}", status.subscribed);
    let preferences = status.preferences.unwrap_or_default();
    let rendered = serde_json::to_string_pretty(&preferences).map_err(|err| err.to_string())?;
    println!("preferences: {rendered}");
    Ok(())
}

async fn run_test(config: &AppConfig) -> Result<(), String> {
    api_client(config)?
        .send_test_notification(&TestNotificationRequest::default())
        .await
        .map_err(|err| format!("failed to send test notification: {err}"))?;
    println!("test notification requested");
    Ok(())
}

fn run_vapid(args: VapidArgs) -> Result<(), String> {
    let credentials = relay::generate_keys()
        .map_err(|err| format!("failed to generate VAPID credentials: {err}"))?;
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => ("mailto:you@example.com".to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("SANKALP_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("SANKALP_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("SANKALP_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace SANKALP_VAPID_SUBJECT with a contact URI you control.");
    }
    Ok(())
}

async fn run_send(config: &AppConfig, args: &SendArgs) -> Result<(), String> {
    let subscriptions = parse_subscriptions(&read_input(&args.subscription)?)?;
    let payload = read_input(&args.payload)?;
    let sender = relay::sender_from_config(&config.relay).map_err(|err| err.to_string())?;

    let report = relay::deliver(&sender, &subscriptions, &payload)
        .await
        .map_err(|err| err.to_string())?;
    println!("delivered: {}", report.delivered);
    for endpoint in &report.failed {
        println!("failed: {endpoint}");
    }
    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(format!("{} deliveries failed", report.failed.len()))
    }
}

fn parse_subscriptions(bytes: &[u8]) -> Result<Vec<PushSubscription>, String> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(PushSubscription),
        Many(Vec<PushSubscription>),
    }

    match serde_json::from_slice(bytes) {
        Ok(OneOrMany::One(subscription)) => Ok(vec![subscription]),
        Ok(OneOrMany::Many(subscriptions)) => Ok(subscriptions),
        Err(err) => Err(format!("invalid subscription file: {err}")),
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>, String> {
    if path == Path::new("-") {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .map_err(|err| format!("failed to read stdin: {err}"))?;
        return Ok(buffer);
    }
    std::fs::read(path).map_err(|err| format!("failed to read {}: {err}", path.display()))
}

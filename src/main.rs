use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use predict_rs::api::{ChainGame, GameContract};
use predict_rs::app::{Dashboard, Step};
use predict_rs::config::Config;
use predict_rs::events::Event;
use predict_rs::feeds::{self, game::GamePoller, retry::Backoff};
use predict_rs::state::{GameClock, SessionStore};
use predict_rs::submit;
use predict_rs::view;
use predict_rs::wallet::{ConnectOutcome, LocalKeyWallet, WalletConnector, WalletProvider};

const DEFAULT_CONFIG: &str = "config.toml";

enum Command {
    Watch,
    Status,
    Connect,
    Disconnect,
    Predict(String),
}

struct Cli {
    config_path: Option<String>,
    command: Command,
}

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: predict-rs [--config <path>] [watch | status | connect | disconnect | predict <price>]\n\
         \n\
         Commands:\n\
           watch             Live dashboard (default)\n\
           status            Read the game once and exit\n\
           connect           Connect the wallet in PREDICT_PRIVATE_KEY and remember it\n\
           disconnect        Forget the saved wallet\n\
           predict <price>   Enter a BTC price prediction (whole USD)\n\
         \n\
         Flags:\n\
           --config <path>   Config file (defaults to {})",
        DEFAULT_CONFIG
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<Cli> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    let mut command = None;

    while let Some(arg) = args.next() {
        let next = match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a path argument"))?;
                config_path = Some(path);
                continue;
            }
            "--help" | "-h" => print_usage_and_exit(),
            "watch" => Command::Watch,
            "status" => Command::Status,
            "connect" => Command::Connect,
            "disconnect" => Command::Disconnect,
            "predict" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("predict requires a price argument"))?;
                Command::Predict(value)
            }
            other => return Err(anyhow!("Unknown argument: {other}")),
        };
        if command.is_some() {
            return Err(anyhow!("Only one command may be given"));
        }
        command = Some(next);
    }

    Ok(Cli {
        config_path,
        command: command.unwrap_or(Command::Watch),
    })
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

fn wallet_connector(cfg: &Config) -> Result<(WalletConnector, Option<LocalKeyWallet>)> {
    let key_wallet = match LocalKeyWallet::from_env() {
        Ok(w) => w,
        Err(e) => {
            warn!("{}", e);
            None
        }
    };
    let provider = key_wallet
        .clone()
        .map(|w| Box::new(w) as Box<dyn WalletProvider>);
    let mut connector = WalletConnector::new(provider, SessionStore::new(&cfg.session.path));
    connector.restore();
    Ok((connector, key_wallet))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = parse_cli_args()?;
    let cfg = match &cli.config_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(DEFAULT_CONFIG)?,
    };
    init_tracing(&cfg.general.log_level);
    info!(rpc = %cfg.network.rpc_url, "loaded config");

    match cli.command {
        Command::Watch => watch(&cfg).await,
        Command::Status => status(&cfg).await,
        Command::Connect => connect(&cfg),
        Command::Disconnect => disconnect(&cfg),
        Command::Predict(value) => predict(&cfg, &value).await,
    }
}

fn connect(cfg: &Config) -> Result<()> {
    let (mut connector, _) = wallet_connector(cfg)?;
    match connector.connect() {
        ConnectOutcome::Connected(session) => println!("Connected: {}", session.short_address()),
        ConnectOutcome::Unavailable => println!("No wallet available. Set PREDICT_PRIVATE_KEY."),
        ConnectOutcome::Rejected(reason) => println!("Wallet refused: {}", reason),
    }
    Ok(())
}

fn disconnect(cfg: &Config) -> Result<()> {
    let (mut connector, _) = wallet_connector(cfg)?;
    connector.disconnect()?;
    println!("Disconnected");
    Ok(())
}

async fn status(cfg: &Config) -> Result<()> {
    let contract = ChainGame::read_only(&cfg.network.rpc_url, cfg.network.contract_address)?;
    let backoff = Backoff::from_policy(&cfg.policy);

    let snapshot = feeds::retry::with_retry(backoff, "game state read", || contract.snapshot()).await?;
    let mut clock = GameClock::new(cfg.game.interval_secs);
    clock.apply(snapshot, now_secs());
    println!("{}", view::phase_line(clock.phase(), clock.remaining()));

    let count = feeds::retry::with_retry(backoff, "prediction list read", || {
        contract.prediction_count()
    })
    .await;
    let count = match count {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("prediction list read gave up: {}", e);
            None
        }
    };
    println!("{}", view::prediction_count(count));
    Ok(())
}

async fn predict(cfg: &Config, value: &str) -> Result<()> {
    let (connector, key_wallet) = wallet_connector(cfg)?;
    let Some(session) = connector.session() else {
        return Err(anyhow!("Not connected. Run `predict-rs connect` first."));
    };
    let Some(key_wallet) = key_wallet else {
        return Err(anyhow!("No wallet available to sign. Set PREDICT_PRIVATE_KEY."));
    };
    let signer = key_wallet.signer();
    if !signer.address().to_string().eq_ignore_ascii_case(&session.address) {
        warn!(
            session = %session.address,
            signer = %signer.address(),
            "saved session does not match signing key"
        );
    }

    let wager = cfg.game.entry_fee_wei()?;
    let contract = ChainGame::with_signer(
        &cfg.network.rpc_url,
        cfg.network.contract_address,
        signer,
    )?;

    let backoff = Backoff::from_policy(&cfg.policy);
    let result = match feeds::retry::with_retry(backoff, "game state read", || contract.snapshot()).await {
        Ok(snapshot) => {
            let mut clock = GameClock::new(cfg.game.interval_secs);
            clock.apply(snapshot, now_secs());
            submit::submit_prediction(&contract, clock.phase(), value, wager).await
        }
        Err(e) => Err(e),
    };

    if let Ok(tx_hash) = &result {
        println!("Prediction submitted: {}", tx_hash);
        return Ok(());
    }
    if let Some(line) = submit::report(&result, cfg.policy.submission_errors) {
        println!("{}", line);
    }
    std::process::exit(1);
}

async fn watch(cfg: &Config) -> Result<()> {
    let (connector, key_wallet) = wallet_connector(cfg)?;
    let session = connector.session().cloned();

    let contract = Arc::new(match (&session, key_wallet) {
        (Some(_), Some(w)) => {
            ChainGame::with_signer(&cfg.network.rpc_url, cfg.network.contract_address, w.signer())?
        }
        _ => ChainGame::read_only(&cfg.network.rpc_url, cfg.network.contract_address)?,
    });
    let backoff = Backoff::from_policy(&cfg.policy);

    let mut dashboard = Dashboard::new(
        cfg.game.interval_secs,
        session,
        cfg.game.entry_fee_eth.clone(),
        cfg.network.chain_name.clone(),
        cfg.policy.price_errors,
    );

    // Create the event channel
    let (tx, mut rx) = mpsc::channel::<Event>(100);

    // Start feeds; dropping the handles stops them
    let (_game_feed, resync) = GamePoller::new(contract.clone(), backoff).spawn(tx.clone());
    let _players_feed = feeds::players::spawn(contract.clone(), backoff, tx.clone());
    let _price_feed = feeds::price::spawn(cfg.price.url.clone(), cfg.price.poll_interval(), tx.clone());
    let _ticker = feeds::spawn_ticker(tx.clone(), Duration::from_secs(1));

    let shutdown_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(Event::Shutdown).await;
        }
    });
    drop(tx);

    for line in dashboard.render() {
        println!("{}", line);
    }
    println!("\nWatching game... (Ctrl+C to quit)\n");

    // Main event loop
    while let Some(event) = rx.recv().await {
        let redraw = matches!(event, Event::Tick);
        match dashboard.handle(event, now_secs()) {
            Step::Continue => {}
            Step::Resync => resync.request(),
            Step::Quit => {
                println!("\nShutting down...");
                break;
            }
        }

        for notice in dashboard.take_notices() {
            println!("{}", notice);
        }
        if redraw {
            println!("{}", dashboard.status_line());
        }
    }

    Ok(())
}

//! callbridge-sim: play scripted call scenarios against the bridge
//!
//! UI events are printed to stdout as JSON lines; host activity is logged to
//! stderr.

mod console;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::time::sleep;

use callbridge_core::call::raw;
use callbridge_core::{
    setup_logging, AlertBackends, BridgeConfig, CallBridge, CallDirection, CallHandle, FixedScreenLock,
    InMemoryPreferences, LogFormat, RawCall,
};

use console::{ConsoleContacts, ConsoleNotifications, ConsoleRingtone, ConsoleTelephony, ConsoleVibrator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Incoming call answered from the notification, one DTMF digit, then hung up
    IncomingAnswered,
    /// Incoming call declined from the notification
    IncomingDeclined,
    /// Incoming call that stops ringing unanswered
    Missed,
    /// Outgoing call that connects and is hung up
    Outgoing,
}

/// Drive the call bridge through a scripted scenario
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario to play
    #[arg(short, long, value_enum, default_value = "incoming-answered")]
    scenario: Scenario,

    /// Bridge configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overrides `[logging] level`
    #[arg(short, long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    /// Include source file and line in logs
    #[arg(long)]
    file_info: bool,

    /// Log span open and close
    #[arg(long)]
    log_spans: bool,

    /// Pretend the screen is locked
    #[arg(long)]
    locked: bool,

    /// Remote party number
    #[arg(short, long, default_value = "+15551234567")]
    number: String,

    /// Custom ringtone identifier stored in preferences
    #[arg(long)]
    ringtone: Option<String>,

    /// Pause between scripted steps (ms)
    #[arg(long, default_value = "200")]
    step_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => BridgeConfig::default(),
    };

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json {
        config.logging.format = LogFormat::Json;
    }
    config.logging.file_info |= args.file_info;
    config.logging.spans |= args.log_spans;
    setup_logging(&config.logging).context("setting up logging")?;
    tracing::info!("Starting callbridge-sim v{}", callbridge_core::VERSION);

    let telephony = ConsoleTelephony::new();
    let preferences = Arc::new(InMemoryPreferences::new());
    if let Some(ringtone) = &args.ringtone {
        preferences.set(config.ringtone_preference_key.clone(), ringtone.clone());
    }
    let backends = AlertBackends {
        ringtone: Arc::new(ConsoleRingtone),
        vibrator: Arc::new(ConsoleVibrator),
        notifications: Arc::new(ConsoleNotifications),
        preferences,
        contacts: Some(Arc::new(ConsoleContacts)),
    };

    let bridge = CallBridge::new(config, telephony.clone(), backends, Arc::new(FixedScreenLock(args.locked)))
        .context("building call bridge")?;

    let mut events = bridge.subscribe_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{}", event.to_json());
        }
    });

    let step = Duration::from_millis(args.step_ms);
    play(args.scenario, &bridge, &telephony, &args.number, step).await?;

    bridge.shutdown();
    bridge.unsubscribe();
    printer.await.context("event printer task")?;
    Ok(())
}

async fn play(
    scenario: Scenario,
    bridge: &CallBridge,
    telephony: &ConsoleTelephony,
    number: &str,
    step: Duration,
) -> Result<()> {
    tracing::info!(?scenario, %number, "Playing scenario");
    let handle = CallHandle::new("sim-call-1");

    match scenario {
        Scenario::IncomingAnswered => {
            bridge.on_call_added(RawCall::new(handle.clone(), raw::STATE_RINGING).with_number(number));
            sleep(step).await;
            bridge.handle_intent("ANSWER_CALL").await;
            telephony.report_state(&handle, raw::STATE_ACTIVE);
            sleep(step).await;
            bridge.send_dtmf('1').await?;
            bridge.end_call().await?;
            telephony.report_state(&handle, raw::STATE_DISCONNECTING);
            telephony.report_state(&handle, raw::STATE_DISCONNECTED);
        }
        Scenario::IncomingDeclined => {
            bridge.on_call_added(RawCall::new(handle.clone(), raw::STATE_RINGING).with_number(number));
            sleep(step).await;
            bridge.handle_intent("DECLINE_CALL").await;
            telephony.report_state(&handle, raw::STATE_DISCONNECTED);
        }
        Scenario::Missed => {
            bridge.on_call_added(RawCall::new(handle.clone(), raw::STATE_RINGING).with_number(number));
            sleep(step * 3).await;
            telephony.report_state(&handle, raw::STATE_DISCONNECTED);
        }
        Scenario::Outgoing => {
            bridge.make_call(number).await?;
            bridge.on_call_added(
                RawCall::new(handle.clone(), raw::STATE_DIALING)
                    .with_number(number)
                    .with_direction(CallDirection::Outgoing),
            );
            sleep(step).await;
            telephony.report_state(&handle, raw::STATE_ACTIVE);
            sleep(step).await;
            bridge.end_call().await?;
            telephony.report_state(&handle, raw::STATE_DISCONNECTED);
        }
    }

    bridge.on_call_removed(&handle);
    sleep(step).await;
    Ok(())
}

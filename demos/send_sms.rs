// ABOUTME: Example application sending one SMS through a reconnecting SMPP session
// ABOUTME: Waits for the first bind, submits (splitting long text) and unbinds

use argh::FromArgs;
use smpp_session::client::{BindCredentials, ConnStatusKind, SessionBuilder, ShortMessage};
use smpp_session::pdutext::Text;
use std::error::Error;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Example application to show the simplest case of sending an SMS message
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the system id
    #[argh(option)]
    system_id: Option<String>,

    /// the password
    #[argh(option)]
    password: Option<String>,

    /// the hostname of IP address of the SMSC (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to use when connecting to the SMSC (default: 2775)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// encode the message as UCS-2 instead of GSM 7-bit
    #[argh(switch)]
    unicode: bool,

    /// the message to send
    #[argh(option, short = 'm')]
    message: String,

    /// the recipient telephone number
    #[argh(option, short = 't')]
    to: String,

    /// the telephone number that the message will be from
    #[argh(option, short = 'f')]
    from: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let level = if cli_args.debugging { Level::TRACE } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(smpp_session::client::DEFAULT_PORT);
    let credentials = BindCredentials::transmitter(
        cli_args.system_id.unwrap_or_default(),
        cli_args.password.unwrap_or_default(),
    );

    let session = SessionBuilder::new(format!("{host}:{port}"), credentials).bind();
    let mut status = session.status_events().ok_or("status events already taken")?;

    // Give up after the first failed attempt rather than retrying forever.
    let first = tokio::time::timeout(Duration::from_secs(30), status.recv())
        .await?
        .ok_or("session stopped")?;
    if first.kind != ConnStatusKind::Connected {
        session.close().await?;
        return Err(format!("bind failed: {first}").into());
    }
    println!("Connected and bound successfully");

    let text = if cli_args.unicode {
        Text::ucs2(cli_args.message)
    } else {
        Text::gsm7_packed(cli_args.message)
    };
    let sms = ShortMessage::new(cli_args.from, cli_args.to, text);

    let result = session.submit_long_msg(&sms).await;
    session.close().await?;

    match result {
        Ok(resp) => {
            println!("Message sent successfully! Message ID: {}", resp.message_id);
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to send message: {e}");
            Err(e.into())
        }
    }
}

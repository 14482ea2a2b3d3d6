// ABOUTME: Runs the bundled test SMSC and a transceiver session against it in one process
// ABOUTME: Submits messages that request receipts and prints the receipts as they arrive

use argh::FromArgs;
use smpp_session::client::{BindCredentials, DeliveryFanout, SessionBuilder, ShortMessage};
use smpp_session::datatypes::RegisteredDelivery;
use smpp_session::pdutext::Text;
use smpp_session::server::{Server, ServerConfig, StubHandler};
use std::error::Error;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Submit messages to an in-process test SMSC and collect their receipts
#[derive(FromArgs)]
struct CliArgs {
    /// how many messages to send (default: 5)
    #[argh(option, short = 'n', default = "5")]
    count: usize,

    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let level = if cli_args.debugging { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::default();
    let credentials = BindCredentials::transceiver(config.user.clone(), config.password.clone());
    let server = Server::start(config, StubHandler::new()).await?;
    info!(addr = %server.addr(), "test SMSC listening");

    let fanout = DeliveryFanout::new();
    let mut receipts = fanout.subscribe();
    let session = SessionBuilder::new(server.addr(), credentials)
        .handler(fanout.clone())
        .bind();

    let mut status = session.status_events().ok_or("status events already taken")?;
    while let Some(event) = status.recv().await {
        info!(%event, "session status");
        if event.is_connected() {
            break;
        }
    }

    for i in 1..=cli_args.count {
        let sms = ShortMessage::new("loopback", "123456789", Text::gsm7_packed(format!("message {i}")))
            .registered_delivery(RegisteredDelivery::FinalDeliveryReceipt);
        let resp = session.submit(&sms).await?;
        println!("submitted #{i} as {}", resp.message_id);
    }

    for _ in 0..cli_args.count {
        match tokio::time::timeout(Duration::from_secs(2), receipts.recv()).await {
            Ok(Some(delivery)) => match delivery.receipt {
                Some(receipt) => println!("receipt for {}: {}", receipt.id, receipt.stat),
                None => println!("message from {}: {}", delivery.src, delivery.text),
            },
            _ => break,
        }
    }

    session.close().await?;
    server.close().await;
    Ok(())
}

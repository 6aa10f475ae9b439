//! Runs an endpoint and logs everything it dispatches until Ctrl-C.

use eater_endpoint::{Decode, Endpoint, Json, Raw};

use crate::config::{Config, PayloadFormat};

pub async fn run(config: Config) -> anyhow::Result<()> {
    match config.format {
        PayloadFormat::Raw => {
            let limit = config.preview_len;
            tail(&config, Raw, move |payload: &Vec<u8>| {
                preview(payload, limit)
            })
            .await
        }
        PayloadFormat::Json => {
            tail(&config, Json::<serde_json::Value>::new(), |event: &serde_json::Value| {
                event.to_string()
            })
            .await
        }
    }
}

async fn tail<D, F>(config: &Config, decoder: D, describe: F) -> anyhow::Result<()>
where
    D: Decode,
    F: Fn(&D::Event) -> String,
{
    let endpoint =
        Endpoint::launch_with_config(&config.listen, decoder, config.endpoint.clone()).await?;
    let reader = endpoint.reader();
    let mut received: u64 = 0;

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                tracing::info!("interrupt received");
                break;
            }
            event = reader.recv() => match event {
                Some(event) => {
                    received += 1;
                    tracing::info!(seq = received, "{}", describe(&event));
                }
                None => break,
            },
        }
    }

    endpoint.stop().await?;
    tracing::info!(received, "event feed closed");
    Ok(())
}

/// Lossy UTF-8 preview of at most `limit` bytes.
fn preview(payload: &[u8], limit: usize) -> String {
    let shown = &payload[..payload.len().min(limit)];
    let mut text = String::from_utf8_lossy(shown).into_owned();
    if shown.len() < payload.len() {
        text.push_str(&format!("... ({} bytes)", payload.len()));
    }
    text
}

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::KeyAction;
use crate::playback::SequencerControl;

/// Forward key lines (`space`, `esc`, `left`, `right`, ...) to a sequencer.
///
/// End of input only ends key handling; playback keeps going until a stop
/// key, Ctrl-C or natural completion.
pub async fn run<R>(reader: R, control: SequencerControl, cancel: CancellationToken) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read key input")? else {
                    info!("key input closed; playback continues without keys");
                    break;
                };
                match KeyAction::from_key_name(&line) {
                    Some(action) => {
                        debug!(?action, "key action");
                        control.apply_key(action).await;
                        if action == KeyAction::Stop {
                            break;
                        }
                    }
                    None => debug!(input = line.trim(), "ignoring unknown key"),
                }
            }
        }
    }
    Ok(())
}

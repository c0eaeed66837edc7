use anyhow::Result;
use tokio::sync::mpsc::Receiver;
use tracing::{info, warn};

use crate::events::{NoticeKind, PlaybackEvent, StopReason};
use crate::library::Library;

/// What the headless presenter saw over one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentedSession {
    /// `(cell, image_index)` in arrival order.
    pub shown: Vec<(Option<usize>, usize)>,
    pub notices: Vec<NoticeKind>,
    pub closed: Option<StopReason>,
}

/// Headless stand-in for the renderer: logs what would be on screen.
///
/// Returns when the sequencer reports the session closed or drops its sender.
pub async fn run(mut events: Receiver<PlaybackEvent>, library: Library) -> Result<PresentedSession> {
    let mut session = PresentedSession::default();
    while let Some(event) = events.recv().await {
        match event {
            PlaybackEvent::Display(update) => {
                let Some(item) = library.get(update.image_index) else {
                    warn!(index = update.image_index, "display update out of range");
                    continue;
                };
                info!(
                    cell = ?update.cell,
                    index = update.image_index,
                    file = %item.filename,
                    animated = item.is_animated,
                    fade = update.use_fade,
                    "display"
                );
                session.shown.push((update.cell, update.image_index));
            }
            PlaybackEvent::Notice { kind, visible_for } => {
                info!(?kind, ?visible_for, "notice");
                session.notices.push(kind);
            }
            PlaybackEvent::Closed(reason) => {
                info!(?reason, "closing slideshow view");
                session.closed = Some(reason);
                break;
            }
        }
    }
    Ok(session)
}

use std::time::Duration;

/// Instruction for the renderer: put `image_index` on screen.
///
/// `cell` is `None` for single-image playback and the row-major cell index in
/// grid mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayUpdate {
    pub cell: Option<usize>,
    pub image_index: usize,
    pub use_fade: bool,
}

impl DisplayUpdate {
    pub fn single(image_index: usize, use_fade: bool) -> Self {
        Self {
            cell: None,
            image_index,
            use_fade,
        }
    }

    pub fn in_cell(cell: usize, image_index: usize, use_fade: bool) -> Self {
        Self {
            cell: Some(cell),
            image_index,
            use_fade,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Paused,
    Resumed,
}

/// Everything a sequencer emits towards the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Display(DisplayUpdate),
    /// Transient overlay hint; the renderer hides it after `visible_for`.
    Notice {
        kind: NoticeKind,
        visible_for: Duration,
    },
    /// The session ended; the owning view should close.
    Closed(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Non-looping playback reached the end of its sequence.
    Completed,
    /// `stop()` was called on the handle (ESC, Stop button).
    Requested,
    /// Someone else lowered the shared session flag or started a newer session.
    SessionEnded,
    /// The handle was dropped while playback was still active.
    TornDown,
}

/// Logical key actions delivered by the keyboard-capture collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    TogglePause,
    Stop,
    Next,
    Previous,
}

impl KeyAction {
    /// Desktop virtual key codes: space 49, escape 53, left 123, right 124.
    pub fn from_key_code(code: u16) -> Option<Self> {
        match code {
            49 => Some(Self::TogglePause),
            53 => Some(Self::Stop),
            123 => Some(Self::Previous),
            124 => Some(Self::Next),
            _ => None,
        }
    }

    pub fn from_key_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "space" | "p" | "pause" => Some(Self::TogglePause),
            "esc" | "escape" | "q" | "quit" | "stop" => Some(Self::Stop),
            "right" | "n" | "next" => Some(Self::Next),
            "left" | "b" | "back" | "prev" | "previous" => Some(Self::Previous),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_codes_map_to_actions() {
        assert_eq!(KeyAction::from_key_code(49), Some(KeyAction::TogglePause));
        assert_eq!(KeyAction::from_key_code(53), Some(KeyAction::Stop));
        assert_eq!(KeyAction::from_key_code(123), Some(KeyAction::Previous));
        assert_eq!(KeyAction::from_key_code(124), Some(KeyAction::Next));
        assert_eq!(KeyAction::from_key_code(0), None);
    }

    #[test]
    fn key_names_are_case_insensitive() {
        assert_eq!(KeyAction::from_key_name("Escape"), Some(KeyAction::Stop));
        assert_eq!(KeyAction::from_key_name(" RIGHT "), Some(KeyAction::Next));
        assert_eq!(KeyAction::from_key_name("left"), Some(KeyAction::Previous));
        assert_eq!(KeyAction::from_key_name("wat"), None);
    }
}

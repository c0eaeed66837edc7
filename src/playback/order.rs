use std::collections::VecDeque;

use rand::{rngs::StdRng, seq::SliceRandom};

/// Visited indices remembered for backtracking under shuffle.
const HISTORY_LIMIT: usize = 1024;

/// Visiting order over a fixed-size collection.
///
/// Linear mode walks `0..len`. Shuffle mode draws from a shuffle-bag that is
/// refilled with a fresh permutation at every loop restart; going back walks
/// the history of already drawn indices, and going forward again replays that
/// history before drawing anything new.
#[derive(Debug)]
pub struct PlaylistOrder {
    len: usize,
    looping: bool,
    mode: OrderMode,
    rng: StdRng,
}

#[derive(Debug)]
enum OrderMode {
    Linear {
        cursor: Option<usize>,
    },
    Shuffled {
        /// Remaining permutation, consumed from the back.
        bag: Vec<usize>,
        history: VecDeque<usize>,
        /// Position of the current index inside `history`.
        position: Option<usize>,
    },
}

impl PlaylistOrder {
    pub fn new(len: usize, shuffle: bool, looping: bool, rng: StdRng) -> Self {
        let mode = if shuffle {
            OrderMode::Shuffled {
                bag: Vec::new(),
                history: VecDeque::new(),
                position: None,
            }
        } else {
            OrderMode::Linear { cursor: None }
        };
        Self {
            len,
            looping,
            mode,
            rng,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    pub fn current(&self) -> Option<usize> {
        match &self.mode {
            OrderMode::Linear { cursor } => *cursor,
            OrderMode::Shuffled {
                history, position, ..
            } => position.map(|p| history[p]),
        }
    }

    /// Pick the index shown when the session starts.
    pub fn first(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        match &mut self.mode {
            OrderMode::Linear { cursor } => {
                *cursor = Some(0);
                Some(0)
            }
            OrderMode::Shuffled {
                history, position, ..
            } => {
                history.clear();
                *position = None;
                self.reshuffle();
                self.draw()
            }
        }
    }

    /// Advance one step. `None` signals the end of a non-looping sequence.
    pub fn next(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        match &mut self.mode {
            OrderMode::Linear { cursor } => {
                let next = match *cursor {
                    None => 0,
                    Some(c) if c + 1 < self.len => c + 1,
                    Some(_) if self.looping => 0,
                    Some(_) => return None,
                };
                *cursor = Some(next);
                Some(next)
            }
            OrderMode::Shuffled {
                history, position, ..
            } => {
                if let Some(p) = *position
                    && p + 1 < history.len()
                {
                    *position = Some(p + 1);
                    return Some(history[p + 1]);
                }
                self.draw()
            }
        }
    }

    /// Step back. `None` means there is nowhere to go and the current index
    /// stays on screen.
    pub fn previous(&mut self) -> Option<usize> {
        match &mut self.mode {
            OrderMode::Linear { cursor } => {
                let prev = match (*cursor)? {
                    0 if self.looping => self.len - 1,
                    0 => return None,
                    c => c - 1,
                };
                *cursor = Some(prev);
                Some(prev)
            }
            OrderMode::Shuffled {
                history, position, ..
            } => match *position {
                Some(p) if p > 0 => {
                    *position = Some(p - 1);
                    Some(history[p - 1])
                }
                _ => None,
            },
        }
    }

    /// Replace the remaining shuffle-bag with a fresh permutation of every
    /// index. Forward history past the current position is dropped. No-op in
    /// linear mode.
    pub fn reshuffle(&mut self) {
        let len = self.len;
        if let OrderMode::Shuffled {
            bag,
            history,
            position,
        } = &mut self.mode
        {
            bag.clear();
            bag.extend(0..len);
            bag.shuffle(&mut self.rng);
            history.truncate(position.map_or(0, |p| p + 1));
        }
    }

    fn draw(&mut self) -> Option<usize> {
        let needs_refill = matches!(&self.mode, OrderMode::Shuffled { bag, .. } if bag.is_empty());
        if needs_refill {
            let restarting = self.current().is_some();
            if restarting && !self.looping {
                return None;
            }
            self.reshuffle();
        }
        let OrderMode::Shuffled {
            bag,
            history,
            position,
        } = &mut self.mode
        else {
            return None;
        };
        let index = bag.pop()?;
        history.push_back(index);
        if history.len() > HISTORY_LIMIT {
            history.pop_front();
        }
        *position = Some(history.len() - 1);
        Some(index)
    }
}

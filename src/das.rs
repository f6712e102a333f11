//! Delayed auto-shift: a held key fires once immediately (the caller handles
//! the press edge), then repeats after a charge delay at a fixed interval.

/// Frame counts for charge and repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatDelays {
    pub charge: u32,
    pub repeat: u32,
}

impl RepeatDelays {
    /// Board shifting at 50 fps.
    pub const BOARD: Self = Self {
        charge: 19,
        repeat: 7,
    };
    /// Form value cycling at 50 fps.
    pub const FORM: Self = Self {
        charge: 19,
        repeat: 7,
    };

    /// Rescales delays tuned for 50 fps to another frame rate. Never below one frame.
    pub fn scaled(self, fps: u32) -> Self {
        let scale = |frames: u32| ((u64::from(frames) * u64::from(fps) + 25) / 50).max(1) as u32;
        Self {
            charge: scale(self.charge),
            repeat: scale(self.repeat),
        }
    }
}

impl Default for RepeatDelays {
    fn default() -> Self {
        Self::BOARD
    }
}

#[derive(Debug, Clone)]
pub struct AutoRepeat<K> {
    key: Option<K>,
    frames: u32,
    charged: bool,
    delays: RepeatDelays,
}

impl<K: Copy + PartialEq> AutoRepeat<K> {
    pub fn new(delays: RepeatDelays) -> Self {
        Self {
            key: None,
            frames: 0,
            charged: false,
            delays,
        }
    }

    /// Feeds the currently held key (if any). Call once per frame.
    pub fn update(&mut self, held: Option<K>) {
        if held != self.key {
            self.key = held;
            self.frames = u32::from(held.is_some());
            self.charged = false;
            return;
        }
        if self.key.is_none() {
            return;
        }
        self.frames += 1;
        if !self.charged && self.frames >= self.delays.charge {
            self.charged = true;
            self.frames = 0;
        }
    }

    /// Returns the held key on frames where it should auto-repeat.
    pub fn pulse(&mut self) -> Option<K> {
        if self.charged && self.frames >= self.delays.repeat {
            self.frames = 0;
            return self.key;
        }
        None
    }

    pub fn reset(&mut self) {
        self.key = None;
        self.frames = 0;
        self.charged = false;
    }

    #[cfg(test)]
    pub fn key(&self) -> Option<K> {
        self.key
    }
}

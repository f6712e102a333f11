//! Key bindings and per-frame button sampling.
//!
//! The game reads a handheld-style button set once per frame. Terminal key
//! events are folded into that set by [`KeyTracker`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Button bitset. Bit values match the handheld's layout: D-pad in the low nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Buttons(u8);

impl Buttons {
    pub const NONE: Self = Self(0);
    pub const LEFT: Self = Self(1);
    pub const RIGHT: Self = Self(2);
    pub const UP: Self = Self(4);
    pub const DOWN: Self = Self(8);
    pub const B: Self = Self(16);
    pub const A: Self = Self(32);
    pub const DIRECTIONS: Self = Self(0x0F);

    const ALL: [Self; 6] = [
        Self::LEFT,
        Self::RIGHT,
        Self::UP,
        Self::DOWN,
        Self::B,
        Self::A,
    ];

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn directions(self) -> Self {
        Self(self.0 & Self::DIRECTIONS.0)
    }
}

impl BitOr for Buttons {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for Buttons {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// One frame's view of the buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub held: Buttons,
    /// Went down since the previous frame.
    pub pressed: Buttons,
    /// Went up since the previous frame.
    pub released: Buttons,
}

impl InputState {
    pub const fn new(held: Buttons, pressed: Buttons, released: Buttons) -> Self {
        Self {
            held,
            pressed,
            released,
        }
    }

    /// Buttons newly pressed this frame and still held.
    #[cfg(test)]
    pub const fn press(buttons: Buttons) -> Self {
        Self::new(buttons, buttons, Buttons::NONE)
    }

    #[cfg(test)]
    pub const fn hold(buttons: Buttons) -> Self {
        Self::new(buttons, Buttons::NONE, Buttons::NONE)
    }
}

/// Host-level commands outside the button set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleMusic,
    ToggleSound,
    EndGame,
    Quit,
}

/// What a key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Button(Buttons),
    Command(Command),
    None,
}

/// Map key event to a button or command. Arrows plus x/z (or vim-ish k/j) for A/B.
pub fn key_to_control(key: KeyEvent) -> Control {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Control::Command(Command::Quit),
            _ => Control::None,
        };
    }
    match code {
        KeyCode::Left => Control::Button(Buttons::LEFT),
        KeyCode::Right => Control::Button(Buttons::RIGHT),
        KeyCode::Up => Control::Button(Buttons::UP),
        KeyCode::Down => Control::Button(Buttons::DOWN),
        KeyCode::Char('x' | 'X' | 'k') | KeyCode::Enter => Control::Button(Buttons::A),
        KeyCode::Char('z' | 'Z' | 'j') | KeyCode::Backspace => Control::Button(Buttons::B),
        KeyCode::Char('m' | 'M') => Control::Command(Command::ToggleMusic),
        KeyCode::Char('n' | 'N') => Control::Command(Command::ToggleSound),
        KeyCode::Esc => Control::Command(Command::EndGame),
        KeyCode::Char('q' | 'Q') => Control::Command(Command::Quit),
        _ => Control::None,
    }
}

/// Frames a single press stays held on terminals that never send releases.
/// Shorter than the board's auto-shift charge, so a tap moves once.
const TAP_HOLD_FRAMES: u32 = 4;
/// Frames a key keeps being held after its latest OS auto-repeat event.
const REPEAT_HOLD_FRAMES: u32 = 8;

/// Turns key events into per-frame [`InputState`]s.
#[derive(Debug, Clone)]
pub struct KeyTracker {
    held: Buttons,
    /// Went down since the last snapshot (survives a release in the same frame).
    fresh: Buttons,
    /// Held keys that got another press/repeat event, i.e. the OS is auto-repeating them.
    repeating: Buttons,
    previous: Buttons,
    last_seen: [u32; 6],
    frame: u32,
    tap_frames: u32,
    repeat_frames: u32,
    releases_seen: bool,
}

impl KeyTracker {
    pub fn new(fps: u32) -> Self {
        let scale = |frames: u32| (frames * fps / 50).max(1);
        Self {
            held: Buttons::NONE,
            fresh: Buttons::NONE,
            repeating: Buttons::NONE,
            previous: Buttons::NONE,
            last_seen: [0; 6],
            frame: 0,
            tap_frames: scale(TAP_HOLD_FRAMES),
            repeat_frames: scale(REPEAT_HOLD_FRAMES),
            releases_seen: false,
        }
    }

    /// Feeds one terminal key event. Returns a command when one was pressed.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key_to_control(key) {
            Control::Command(command) if key.kind == KeyEventKind::Press => Some(command),
            Control::Button(button) => {
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => {
                        if self.held.intersects(button) {
                            self.repeating |= button;
                        } else {
                            self.fresh |= button;
                        }
                        self.held |= button;
                        self.touch(button);
                    }
                    KeyEventKind::Release => {
                        self.releases_seen = true;
                        self.held = self.held & !button;
                        self.repeating = self.repeating & !button;
                    }
                }
                None
            }
            _ => None,
        }
    }

    /// Advances one frame and returns the button edges since the last call.
    pub fn snapshot(&mut self) -> InputState {
        self.frame = self.frame.wrapping_add(1);
        if !self.releases_seen {
            for (i, button) in Buttons::ALL.into_iter().enumerate() {
                let limit = if self.repeating.intersects(button) {
                    self.repeat_frames
                } else {
                    self.tap_frames
                };
                if self.held.intersects(button)
                    && self.frame.wrapping_sub(self.last_seen[i]) > limit
                {
                    self.held = self.held & !button;
                    self.repeating = self.repeating & !button;
                }
            }
        }
        let held = self.held | self.fresh;
        let state = InputState::new(
            held,
            self.fresh | (held & !self.previous),
            self.previous & !held,
        );
        self.previous = held;
        self.fresh = Buttons::NONE;
        state
    }

    fn touch(&mut self, button: Buttons) {
        for (i, b) in Buttons::ALL.into_iter().enumerate() {
            if button.intersects(b) {
                self.last_seen[i] = self.frame;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn test_bindings() {
        let k = |c| key_to_control(KeyEvent::new(c, KeyModifiers::NONE));
        assert_eq!(k(KeyCode::Left), Control::Button(Buttons::LEFT));
        assert_eq!(k(KeyCode::Char('x')), Control::Button(Buttons::A));
        assert_eq!(k(KeyCode::Char('z')), Control::Button(Buttons::B));
        assert_eq!(k(KeyCode::Esc), Control::Command(Command::EndGame));
        assert_eq!(k(KeyCode::Char('q')), Control::Command(Command::Quit));
        assert_eq!(
            key_to_control(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Control::Command(Command::Quit)
        );
    }

    #[test]
    fn test_buttons_set_ops() {
        let b = Buttons::LEFT | Buttons::A;
        assert!(b.contains(Buttons::LEFT));
        assert!(!b.contains(Buttons::LEFT | Buttons::RIGHT));
        assert!(b.intersects(Buttons::LEFT | Buttons::RIGHT));
        assert_eq!(b.directions(), Buttons::LEFT);
        assert_eq!(Buttons::DIRECTIONS.directions(), Buttons::LEFT | Buttons::RIGHT | Buttons::UP | Buttons::DOWN);
    }

    #[test]
    fn test_press_hold_release_edges() {
        let mut t = KeyTracker::new(50);
        t.handle_key(key(KeyCode::Left, KeyEventKind::Press));
        let s = t.snapshot();
        assert_eq!(s.pressed, Buttons::LEFT);
        assert_eq!(s.held, Buttons::LEFT);

        t.handle_key(key(KeyCode::Left, KeyEventKind::Repeat));
        let s = t.snapshot();
        assert!(s.pressed.is_empty());
        assert_eq!(s.held, Buttons::LEFT);

        t.handle_key(key(KeyCode::Left, KeyEventKind::Release));
        let s = t.snapshot();
        assert!(s.held.is_empty());
        assert_eq!(s.released, Buttons::LEFT);
    }

    #[test]
    fn test_tap_within_one_frame_is_seen() {
        let mut t = KeyTracker::new(50);
        t.handle_key(key(KeyCode::Up, KeyEventKind::Press));
        t.handle_key(key(KeyCode::Up, KeyEventKind::Release));
        let s = t.snapshot();
        assert_eq!(s.pressed, Buttons::UP);
        let s = t.snapshot();
        assert_eq!(s.released, Buttons::UP);
        assert!(s.held.is_empty());
    }

    fn frames_held(t: &mut KeyTracker, button: Buttons) -> u32 {
        let mut frames = 0;
        while t.snapshot().held.contains(button) {
            frames += 1;
            assert!(frames < 1000);
        }
        frames
    }

    #[test]
    fn test_tap_expires_before_auto_shift_charges() {
        let mut t = KeyTracker::new(50);
        t.handle_key(key(KeyCode::Right, KeyEventKind::Press));
        let frames = frames_held(&mut t, Buttons::RIGHT);
        assert_eq!(frames, TAP_HOLD_FRAMES);
        assert!(frames < crate::das::RepeatDelays::BOARD.charge);

        let mut slow = KeyTracker::new(25);
        slow.handle_key(key(KeyCode::Right, KeyEventKind::Press));
        let charge = crate::das::RepeatDelays::BOARD.scaled(25).charge;
        assert!(frames_held(&mut slow, Buttons::RIGHT) < charge);
    }

    #[test]
    fn test_os_auto_repeat_keeps_key_held() {
        let mut t = KeyTracker::new(50);
        t.handle_key(key(KeyCode::Left, KeyEventKind::Press));
        assert_eq!(t.snapshot().pressed, Buttons::LEFT);
        // Repeats arrive every other frame, as a terminal at ~25 Hz sends them.
        for _ in 0..20 {
            t.handle_key(key(KeyCode::Left, KeyEventKind::Press));
            let s = t.snapshot();
            assert!(s.held.contains(Buttons::LEFT));
            assert!(s.pressed.is_empty());
            assert!(t.snapshot().held.contains(Buttons::LEFT));
        }
        // The last repeat is two frames old; the rest of the longer window remains.
        assert_eq!(frames_held(&mut t, Buttons::LEFT), REPEAT_HOLD_FRAMES - 2);
    }

    #[test]
    fn test_hold_does_not_expire_once_releases_are_reported() {
        let mut t = KeyTracker::new(50);
        t.handle_key(key(KeyCode::Down, KeyEventKind::Press));
        t.handle_key(key(KeyCode::Down, KeyEventKind::Release));
        t.snapshot();
        t.handle_key(key(KeyCode::Right, KeyEventKind::Press));
        for _ in 0..200 {
            assert!(t.snapshot().held.contains(Buttons::RIGHT));
        }
    }

    #[test]
    fn test_commands_fire_on_press_only() {
        let mut t = KeyTracker::new(50);
        assert_eq!(
            t.handle_key(key(KeyCode::Char('m'), KeyEventKind::Press)),
            Some(Command::ToggleMusic)
        );
        assert_eq!(t.handle_key(key(KeyCode::Char('m'), KeyEventKind::Release)), None);
    }
}

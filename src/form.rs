//! On-screen form: an ordered list of fields with one focused.
//!
//! The focused field sees every pressed (or auto-repeated) button first. If it
//! lets the input through, newly pressed Down/Right move focus forward and
//! Up/Left move it back, clamped at both ends.

use crate::das::{AutoRepeat, RepeatDelays};
use crate::input::{Buttons, InputState};

pub const SEED_LENGTH: usize = 8;
const SEED_DIGITS: &[u8; 16] = b"0123456789ABCDEF";
/// Blink counter limit for the focused field.
const BLINK_FRAMES: u32 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<A> {
    /// Eight hex digits edited one at a time.
    Seed {
        label: &'static str,
        value: [u8; SEED_LENGTH],
        editing: bool,
        caret: usize,
    },
    Numeric {
        label: &'static str,
        value: i32,
        min: i32,
        max: i32,
        editing: bool,
    },
    Boolean {
        label: &'static str,
        value: bool,
    },
    Button {
        label: &'static str,
        action: A,
    },
}

impl<A: Copy> Field<A> {
    /// Seed field from text; anything that is not a hex digit becomes `0`.
    pub fn seed(label: &'static str, text: &str) -> Self {
        let mut value = [b'0'; SEED_LENGTH];
        for (slot, c) in value.iter_mut().zip(text.bytes()) {
            let c = c.to_ascii_uppercase();
            if SEED_DIGITS.contains(&c) {
                *slot = c;
            }
        }
        Self::Seed {
            label,
            value,
            editing: false,
            caret: 0,
        }
    }

    pub fn numeric(label: &'static str, value: i32, min: i32, max: i32) -> Self {
        Self::Numeric {
            label,
            value: value.clamp(min, max),
            min,
            max,
            editing: false,
        }
    }

    pub fn boolean(label: &'static str, value: bool) -> Self {
        Self::Boolean { label, value }
    }

    pub fn button(label: &'static str, action: A) -> Self {
        Self::Button { label, action }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Seed { label, .. }
            | Self::Numeric { label, .. }
            | Self::Boolean { label, .. }
            | Self::Button { label, .. } => label,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(
            self,
            Self::Seed { editing: true, .. } | Self::Numeric { editing: true, .. }
        )
    }

    /// Applies buttons to the field. Returns whether the input bubbles up to
    /// the form, and the action of a fired button.
    fn handle(&mut self, buttons: Buttons) -> (bool, Option<A>) {
        match self {
            Self::Seed {
                value,
                editing,
                caret,
                ..
            } => {
                if buttons.contains(Buttons::A) {
                    *editing = !*editing;
                    *caret = 0;
                    return (false, None);
                }
                if !*editing {
                    return (true, None);
                }
                if buttons.contains(Buttons::RIGHT) {
                    *caret = (*caret + 1).min(SEED_LENGTH - 1);
                } else if buttons.contains(Buttons::LEFT) {
                    *caret = caret.saturating_sub(1);
                } else if buttons.intersects(Buttons::UP | Buttons::DOWN) {
                    let idx = SEED_DIGITS
                        .iter()
                        .position(|&d| d == value[*caret])
                        .unwrap_or(0);
                    let n = SEED_DIGITS.len();
                    let idx = if buttons.contains(Buttons::UP) {
                        (idx + 1) % n
                    } else {
                        (idx + n - 1) % n
                    };
                    value[*caret] = SEED_DIGITS[idx];
                }
                (false, None)
            }
            Self::Numeric {
                value,
                min,
                max,
                editing,
                ..
            } => {
                if buttons.contains(Buttons::A) {
                    *editing = !*editing;
                    return (false, None);
                }
                if *editing && buttons.contains(Buttons::UP) {
                    *value = if *value >= *max { *min } else { *value + 1 };
                } else if *editing && buttons.contains(Buttons::DOWN) {
                    *value = if *value <= *min { *max } else { *value - 1 };
                }
                (!*editing, None)
            }
            Self::Boolean { value, .. } => {
                if buttons.contains(Buttons::A) {
                    *value = !*value;
                    return (false, None);
                }
                (true, None)
            }
            Self::Button { action, .. } => {
                if buttons.contains(Buttons::A) {
                    return (false, Some(*action));
                }
                (true, None)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Form<A> {
    fields: Vec<Field<A>>,
    focus: usize,
    blink_frames: u32,
    blink_off: bool,
    repeat: AutoRepeat<Buttons>,
}

impl<A: Copy> Form<A> {
    pub fn new(delays: RepeatDelays) -> Self {
        Self {
            fields: Vec::new(),
            focus: 0,
            blink_frames: 0,
            blink_off: false,
            repeat: AutoRepeat::new(delays),
        }
    }

    /// Appends a field and returns its index.
    pub fn push(&mut self, field: Field<A>) -> usize {
        self.fields.push(field);
        self.fields.len() - 1
    }

    #[must_use]
    pub fn with(mut self, field: Field<A>) -> Self {
        self.push(field);
        self
    }

    /// Moves focus to `index` and restarts button repeat.
    pub fn focus(&mut self, index: usize) {
        if index < self.fields.len() {
            self.focus = index;
            self.repeat.reset();
        }
    }

    pub fn focused(&self) -> usize {
        self.focus
    }

    pub fn fields(&self) -> &[Field<A>] {
        &self.fields
    }

    /// Whether the field draws highlighted this frame (the focused one blinks).
    pub fn is_highlighted(&self, index: usize) -> bool {
        index == self.focus && !self.blink_off
    }

    /// Runs one frame of input. Returns the action of a button fired this frame.
    pub fn update(&mut self, input: &InputState) -> Option<A> {
        let directions = input.held.directions();
        self.repeat
            .update((!directions.is_empty()).then_some(directions));
        let buttons = input.pressed | self.repeat.pulse().unwrap_or(Buttons::NONE);

        let mut action = None;
        if let Some(field) = self.fields.get_mut(self.focus) {
            let (bubble, fired) = field.handle(buttons);
            action = fired;
            if bubble {
                if input.pressed.intersects(Buttons::DOWN | Buttons::RIGHT) {
                    self.move_focus(self.focus + 1);
                } else if input.pressed.intersects(Buttons::UP | Buttons::LEFT) {
                    self.move_focus(self.focus.saturating_sub(1));
                }
            }
        }

        if self.blink_frames == BLINK_FRAMES {
            self.blink_frames = 0;
            self.blink_off = !self.blink_off;
        } else {
            self.blink_frames += 1;
        }
        action
    }

    fn move_focus(&mut self, index: usize) {
        self.focus = index.min(self.fields.len().saturating_sub(1));
        self.blink_frames = 0;
        self.blink_off = false;
    }

    pub fn seed_text(&self, index: usize) -> Option<&str> {
        match self.fields.get(index)? {
            Field::Seed { value, .. } => std::str::from_utf8(value).ok(),
            _ => None,
        }
    }

    /// The seed field's digits as a number.
    pub fn seed(&self, index: usize) -> Option<u32> {
        u32::from_str_radix(self.seed_text(index)?, 16).ok()
    }

    pub fn number(&self, index: usize) -> Option<i32> {
        match self.fields.get(index)? {
            Field::Numeric { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn flag(&self, index: usize) -> Option<bool> {
        match self.fields.get(index)? {
            Field::Boolean { value, .. } => Some(*value),
            _ => None,
        }
    }
}

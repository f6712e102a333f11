//! Scenes: title, options and the board. The active scene gets one update per
//! frame; a change it requests is applied by the app at the top of the next frame.

use crate::assets::Assets;
use crate::audio::Audio;
use crate::das::RepeatDelays;
use crate::form::{Field, Form};
use crate::input::{Buttons, Command, InputState};
use crate::piece::Piece;
use crate::rng::Lcg;
use crate::round::{Cue, Phase, Round, RoundConfig};
use crate::scoring::MAX_DIFFICULTY;
use crate::ui::MatrixCanvas;
use std::time::{SystemTime, UNIX_EPOCH};
use tachyonfx::Effect;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Options,
    Board(RoundConfig),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneUpdate {
    /// Something on screen changed.
    pub redraw: bool,
    pub change: Option<SceneChange>,
}

/// Shared services handed to scenes each frame.
pub struct Context<'a> {
    pub assets: &'a Assets,
    pub audio: &'a mut dyn Audio,
}

/// Starting values for the options form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionsDefaults {
    /// `None` generates a seed from the clock.
    pub seed: Option<u32>,
    pub level: u8,
    pub music: bool,
    pub sound: bool,
}

impl Default for OptionsDefaults {
    fn default() -> Self {
        Self {
            seed: None,
            level: 0,
            music: true,
            sound: true,
        }
    }
}

pub enum Scene {
    Title(TitleScene),
    Options(OptionsScene),
    Board(Box<BoardScene>),
}

impl Scene {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Options(_) => "options",
            Self::Board(_) => "board",
        }
    }

    /// Called once when the scene becomes active.
    pub fn enter(&mut self, ctx: &mut Context<'_>) {
        debug!(scene = self.name(), "enter");
        if let Self::Board(board) = self {
            board.start_music(ctx);
        }
    }

    /// Called once before the scene is replaced.
    pub fn leave(&mut self, ctx: &mut Context<'_>) {
        debug!(scene = self.name(), "leave");
        if matches!(self, Self::Board(_)) && ctx.audio.is_music_playing() {
            ctx.audio.stop_music();
        }
    }

    pub fn update(&mut self, input: &InputState, ctx: &mut Context<'_>) -> SceneUpdate {
        match self {
            Self::Title(title) => title.update(input),
            Self::Options(options) => options.update(input),
            Self::Board(board) => board.update(input, ctx),
        }
    }

    /// Host commands (system menu). Only the board reacts to them.
    pub fn command(&mut self, command: Command, ctx: &mut Context<'_>) -> Option<SceneChange> {
        match self {
            Self::Board(board) => board.command(command, ctx),
            _ => None,
        }
    }
}

/// Title screen. Releasing A moves on.
#[derive(Debug, Default)]
pub struct TitleScene {
    drawn: bool,
}

impl TitleScene {
    fn update(&mut self, input: &InputState) -> SceneUpdate {
        let redraw = !std::mem::replace(&mut self.drawn, true);
        if input.released.contains(Buttons::A) {
            return SceneUpdate {
                redraw: true,
                change: Some(SceneChange::Options),
            };
        }
        SceneUpdate {
            redraw,
            change: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsAction {
    Play,
}

/// Options form field order.
pub mod options_field {
    pub const SEED: usize = 0;
    pub const LEVEL: usize = 1;
    pub const MUSIC: usize = 2;
    pub const SOUND: usize = 3;
    pub const PLAY: usize = 4;
}

#[derive(Debug, Clone)]
pub struct OptionsScene {
    form: Form<OptionsAction>,
    start: bool,
}

impl OptionsScene {
    pub fn new(defaults: OptionsDefaults, delays: RepeatDelays) -> Self {
        let seed = defaults
            .seed
            .map_or_else(clock_seed, |seed| format!("{seed:08X}"));
        let mut form = Form::new(delays)
            .with(Field::seed("Seed", &seed))
            .with(Field::numeric(
                "Level",
                i32::from(defaults.level),
                0,
                i32::from(MAX_DIFFICULTY),
            ))
            .with(Field::boolean("Music", defaults.music))
            .with(Field::boolean("SFX", defaults.sound))
            .with(Field::button("Play!", OptionsAction::Play));
        form.focus(options_field::PLAY);
        Self { form, start: false }
    }

    pub fn form(&self) -> &Form<OptionsAction> {
        &self.form
    }

    /// Round settings as currently entered.
    pub fn config(&self) -> RoundConfig {
        use options_field::{LEVEL, MUSIC, SEED, SOUND};
        RoundConfig {
            seed: self.form.seed(SEED).unwrap_or(0),
            initial_difficulty: self
                .form
                .number(LEVEL)
                .map_or(0, |n| n.clamp(0, i32::from(MAX_DIFFICULTY)) as u8),
            music: self.form.flag(MUSIC).unwrap_or(true),
            sound: self.form.flag(SOUND).unwrap_or(true),
        }
    }

    fn update(&mut self, input: &InputState) -> SceneUpdate {
        // Play! takes effect the frame after it is pressed.
        if std::mem::take(&mut self.start) {
            let config = self.config();
            info!(seed = %format!("{:08X}", config.seed), "starting game");
            return SceneUpdate {
                redraw: true,
                change: Some(SceneChange::Board(config)),
            };
        }
        if self.form.update(input) == Some(OptionsAction::Play) {
            self.start = true;
        }
        SceneUpdate {
            redraw: true,
            change: None,
        }
    }
}

/// Eight hex digits from the wall clock.
fn clock_seed() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    Lcg::new(secs as u32).hex_seed()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverAction {
    Replay,
    NewGame,
}

/// Values shown in the sidebar boxes, refreshed on cue rather than every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxValues {
    pub next: Piece,
    pub level: u8,
    pub lines: u32,
    pub score: u32,
    pub seed: u32,
}

pub struct BoardScene {
    round: Round,
    music: bool,
    sound: bool,
    canvas: MatrixCanvas,
    boxes: BoxValues,
    game_over: Form<GameOverAction>,
    /// Dims the sidebar once the curtain is down.
    dim: Option<Effect>,
}

impl BoardScene {
    pub fn new(config: RoundConfig, delays: RepeatDelays) -> Self {
        let game_over = Form::new(delays)
            .with(Field::button("Replay", GameOverAction::Replay))
            .with(Field::button("New Game", GameOverAction::NewGame));
        Self {
            round: Round::with_delays(config, delays),
            music: config.music,
            sound: config.sound,
            canvas: MatrixCanvas::default(),
            boxes: BoxValues {
                seed: config.seed,
                level: config.initial_difficulty,
                ..BoxValues::default()
            },
            game_over,
            dim: None,
        }
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn canvas(&self) -> &MatrixCanvas {
        &self.canvas
    }

    pub fn boxes(&self) -> BoxValues {
        self.boxes
    }

    pub fn game_over_form(&self) -> &Form<GameOverAction> {
        &self.game_over
    }

    pub fn music(&self) -> bool {
        self.music
    }

    pub fn sound(&self) -> bool {
        self.sound
    }

    pub fn dim_effect(&mut self) -> &mut Option<Effect> {
        &mut self.dim
    }

    fn start_music(&self, ctx: &mut Context<'_>) {
        if let (true, Some(track)) = (self.music, ctx.assets.music()) {
            ctx.audio.play_music(track);
        }
    }

    fn update(&mut self, input: &InputState, ctx: &mut Context<'_>) -> SceneUpdate {
        let mut redraw = self.round.update(input);
        for cue in self.round.take_cues() {
            self.apply(cue, ctx);
            redraw = true;
        }
        redraw |= self.canvas.sync(self.round.matrix_mut(), false);

        let mut change = None;
        if self.round.phase() == Phase::GameOver && self.round.curtain_done() {
            change = match self.game_over.update(input) {
                Some(GameOverAction::Replay) => Some(SceneChange::Board(self.replay_config())),
                Some(GameOverAction::NewGame) => Some(SceneChange::Options),
                None => None,
            };
        }
        SceneUpdate { redraw, change }
    }

    fn apply(&mut self, cue: Cue, ctx: &mut Context<'_>) {
        match cue {
            Cue::Sample(sound) => {
                if self.sound {
                    if let Some(sample) = ctx.assets.sample(sound) {
                        ctx.audio.play_sample(sample);
                    }
                }
            }
            Cue::StopMusic => {
                if ctx.audio.is_music_playing() {
                    ctx.audio.stop_music();
                }
            }
            Cue::FullRedraw => {
                self.canvas.sync(self.round.matrix_mut(), true);
            }
            Cue::FlashRows => self.canvas.blank_rows(self.round.completed_rows()),
            Cue::CoverQuarter(quarter) => {
                let (top, bottom) = Round::cover_rows(quarter);
                self.canvas.cover_rows(top..=bottom);
            }
            Cue::Boxes => {
                self.boxes = BoxValues {
                    next: self.round.on_deck(),
                    level: self.round.difficulty(),
                    lines: self.round.lines(),
                    score: self.round.score(),
                    seed: self.round.config().seed,
                };
            }
        }
    }

    /// Same seed and level, current audio toggles.
    fn replay_config(&self) -> RoundConfig {
        RoundConfig {
            music: self.music,
            sound: self.sound,
            ..self.round.config()
        }
    }

    fn command(&mut self, command: Command, ctx: &mut Context<'_>) -> Option<SceneChange> {
        match command {
            Command::ToggleMusic => {
                self.music = !self.music;
                info!(music = self.music, "music toggled");
                if self.music {
                    self.start_music(ctx);
                } else {
                    ctx.audio.stop_music();
                }
                None
            }
            Command::ToggleSound => {
                self.sound = !self.sound;
                info!(sound = self.sound, "sound toggled");
                None
            }
            Command::EndGame => Some(SceneChange::Options),
            Command::Quit => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Sample;
    use crate::audio::RecordingAudio;
    use crate::theme::Theme;

    fn assets() -> Assets {
        Assets::builtin(&Theme::default())
    }

    fn release(b: Buttons) -> InputState {
        InputState::new(Buttons::NONE, Buttons::NONE, b)
    }

    #[test]
    fn test_title_moves_on_when_a_is_released() {
        let mut title = TitleScene::default();
        assert!(title.update(&InputState::default()).redraw);
        assert_eq!(title.update(&InputState::press(Buttons::A)).change, None);
        assert_eq!(
            title.update(&release(Buttons::A)).change,
            Some(SceneChange::Options)
        );
    }

    #[test]
    fn test_options_defaults_and_play() {
        let defaults = OptionsDefaults {
            seed: Some(0xDEAD_BEEF),
            level: 7,
            music: false,
            sound: true,
        };
        let mut options = OptionsScene::new(defaults, RepeatDelays::FORM);
        assert_eq!(options.form().focused(), options_field::PLAY);
        assert_eq!(
            options.config(),
            RoundConfig {
                seed: 0xDEAD_BEEF,
                initial_difficulty: 7,
                music: false,
                sound: true,
            }
        );
        assert_eq!(options.update(&InputState::press(Buttons::A)).change, None);
        let expected = Some(SceneChange::Board(options.config()));
        assert_eq!(options.update(&release(Buttons::A)).change, expected);
    }

    #[test]
    fn test_generated_seed_is_eight_hex_digits() {
        let options = OptionsScene::new(OptionsDefaults::default(), RepeatDelays::FORM);
        let text = options.form().seed_text(options_field::SEED).unwrap();
        assert_eq!(text.len(), 8);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_board_plays_cues_only_when_sound_enabled() {
        let assets = assets();
        let mut audio = RecordingAudio::default();
        let config = RoundConfig {
            sound: false,
            ..RoundConfig::default()
        };
        let mut board = BoardScene::new(config, RepeatDelays::BOARD);
        let mut ctx = Context {
            assets: &assets,
            audio: &mut audio,
        };
        for _ in 0..200 {
            board.update(&InputState::press(Buttons::UP), &mut ctx);
        }
        assert!(audio.samples.is_empty());

        let mut audio = RecordingAudio::default();
        let mut board = BoardScene::new(RoundConfig::default(), RepeatDelays::BOARD);
        let mut ctx = Context {
            assets: &assets,
            audio: &mut audio,
        };
        for _ in 0..30 {
            board.update(&InputState::press(Buttons::UP), &mut ctx);
        }
        assert!(audio.samples.iter().all(|s| *s == Sample::Bell));
        assert!(!audio.samples.is_empty());
    }

    #[test]
    fn test_board_boxes_follow_round() {
        let assets = assets();
        let mut audio = RecordingAudio::default();
        let mut ctx = Context {
            assets: &assets,
            audio: &mut audio,
        };
        let config = RoundConfig {
            seed: 0xABCD_0123,
            initial_difficulty: 4,
            ..RoundConfig::default()
        };
        let mut board = BoardScene::new(config, RepeatDelays::BOARD);
        board.update(&InputState::default(), &mut ctx);
        let boxes = board.boxes();
        assert_eq!(boxes.next, board.round().on_deck());
        assert_eq!(boxes.level, 4);
        assert_eq!(boxes.seed, 0xABCD_0123);
    }

    #[test]
    fn test_top_out_stops_music_and_game_over_offers_replay() {
        let assets = assets();
        let mut audio = RecordingAudio {
            music_playing: true,
            ..RecordingAudio::default()
        };
        let config = RoundConfig {
            seed: 77,
            initial_difficulty: 2,
            music: true,
            sound: true,
        };
        let mut board = BoardScene::new(config, RepeatDelays::BOARD);
        let mut ctx = Context {
            assets: &assets,
            audio: &mut audio,
        };
        // Hard drop everything until the stack reaches the top.
        let mut frames = 0;
        while !board.round().curtain_done() {
            board.update(&InputState::press(Buttons::UP), &mut ctx);
            frames += 1;
            assert!(frames < 20_000);
        }
        assert!(!ctx.audio.is_music_playing());

        // Toggle sound off before replaying; the replay keeps it.
        board.command(Command::ToggleSound, &mut ctx);
        board.update(&InputState::default(), &mut ctx);
        let update = board.update(&InputState::press(Buttons::A), &mut ctx);
        assert_eq!(
            update.change,
            Some(SceneChange::Board(RoundConfig {
                sound: false,
                ..config
            }))
        );
    }

    #[test]
    fn test_game_over_new_game_returns_to_options() {
        let assets = assets();
        let mut audio = RecordingAudio::default();
        let mut ctx = Context {
            assets: &assets,
            audio: &mut audio,
        };
        let mut board = BoardScene::new(RoundConfig::default(), RepeatDelays::BOARD);
        let mut frames = 0;
        while !board.round().curtain_done() {
            board.update(&InputState::press(Buttons::UP), &mut ctx);
            frames += 1;
            assert!(frames < 20_000);
        }
        board.update(&InputState::press(Buttons::DOWN), &mut ctx);
        board.update(&InputState::default(), &mut ctx);
        let update = board.update(&InputState::press(Buttons::A), &mut ctx);
        assert_eq!(update.change, Some(SceneChange::Options));
    }

    #[test]
    fn test_system_menu_commands() {
        let assets = assets();
        let mut audio = RecordingAudio::default();
        let mut ctx = Context {
            assets: &assets,
            audio: &mut audio,
        };
        let mut scene = Scene::Board(Box::new(BoardScene::new(
            RoundConfig::default(),
            RepeatDelays::BOARD,
        )));
        scene.enter(&mut ctx);
        // Built-in assets carry no music track.
        assert!(!ctx.audio.is_music_playing());
        assert_eq!(scene.command(Command::ToggleMusic, &mut ctx), None);
        if let Scene::Board(board) = &scene {
            assert!(!board.music());
        }
        assert_eq!(
            scene.command(Command::EndGame, &mut ctx),
            Some(SceneChange::Options)
        );

        let mut title = Scene::Title(TitleScene::default());
        assert_eq!(title.command(Command::EndGame, &mut ctx), None);
    }
}

//! App: terminal init, fixed-rate frame loop, key handling and scene switching.

use crate::GameConfig;
use crate::assets::Assets;
use crate::audio::Audio;
use crate::das::RepeatDelays;
use crate::input::{Command, KeyTracker};
use crate::scene::{BoardScene, Context, OptionsDefaults, OptionsScene, Scene, SceneChange, TitleScene};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Frames the loop may fall behind before it stops trying to catch up.
const MAX_CATCH_UP_FRAMES: u32 = 5;

pub struct App {
    config: GameConfig,
    theme: Theme,
    assets: Assets,
    audio: Box<dyn Audio>,
    scene: Scene,
    /// Requested by the last update; applied at the top of the next frame.
    pending: Option<SceneChange>,
    keys: KeyTracker,
    board_delays: RepeatDelays,
    form_delays: RepeatDelays,
    /// Seed from the command line, used by the first options screen only.
    cli_seed: Option<u32>,
    frame_duration: Duration,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, assets: Assets, audio: Box<dyn Audio>) -> Self {
        let fps = config.fps.max(1);
        let form_delays = RepeatDelays::FORM.scaled(fps);
        let mut app = Self {
            theme,
            assets,
            audio,
            scene: Scene::Title(TitleScene::default()),
            pending: None,
            keys: KeyTracker::new(fps),
            board_delays: RepeatDelays::BOARD.scaled(fps),
            form_delays,
            cli_seed: config.seed,
            frame_duration: Duration::from_secs(1) / fps,
            config,
        };
        if app.config.skip_title {
            app.pending = Some(SceneChange::Options);
        }
        app
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Release events are needed for held buttons; not every terminal has them.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        self.leave_scene();
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        info!(fps = self.config.fps, "starting");
        self.enter_scene();
        let mut next_frame = Instant::now();
        let mut last_draw = Instant::now();
        let mut redraw = true;
        loop {
            let timeout = next_frame.saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) => {
                            if let Some(command) = self.keys.handle_key(key) {
                                if command == Command::Quit {
                                    info!("quit");
                                    return Ok(());
                                }
                                self.command(command);
                                redraw = true;
                            }
                        }
                        Event::Resize(..) => redraw = true,
                        _ => {}
                    }
                }
            }

            let now = Instant::now();
            if now < next_frame {
                continue;
            }
            next_frame += self.frame_duration;
            if now > next_frame + self.frame_duration * MAX_CATCH_UP_FRAMES {
                debug!("frame loop behind, resynchronising");
                next_frame = now + self.frame_duration;
            }

            redraw |= self.step();
            if redraw || self.animating() {
                let delta = now.saturating_duration_since(last_draw);
                last_draw = now;
                let (scene, theme, assets) = (&mut self.scene, &self.theme, &self.assets);
                terminal.draw(|f| crate::ui::draw(f, scene, theme, assets, delta))?;
                redraw = false;
            }
        }
    }

    /// One frame: apply a pending scene change, then update the active scene.
    fn step(&mut self) -> bool {
        let mut changed = false;
        if let Some(change) = self.pending.take() {
            self.leave_scene();
            self.scene = self.build_scene(change);
            self.enter_scene();
            changed = true;
        }
        let input = self.keys.snapshot();
        let mut ctx = Context {
            assets: &self.assets,
            audio: self.audio.as_mut(),
        };
        let update = self.scene.update(&input, &mut ctx);
        if update.change.is_some() {
            self.pending = update.change;
        }
        changed || update.redraw
    }

    fn command(&mut self, command: Command) {
        let mut ctx = Context {
            assets: &self.assets,
            audio: self.audio.as_mut(),
        };
        if let Some(change) = self.scene.command(command, &mut ctx) {
            self.pending = Some(change);
        }
    }

    fn build_scene(&mut self, change: SceneChange) -> Scene {
        match change {
            SceneChange::Options => Scene::Options(OptionsScene::new(
                OptionsDefaults {
                    seed: self.cli_seed.take(),
                    level: self.config.level,
                    music: self.config.music,
                    sound: self.config.sound,
                },
                self.form_delays,
            )),
            SceneChange::Board(round) => {
                Scene::Board(Box::new(BoardScene::new(round, self.board_delays)))
            }
        }
    }

    fn enter_scene(&mut self) {
        let mut ctx = Context {
            assets: &self.assets,
            audio: self.audio.as_mut(),
        };
        self.scene.enter(&mut ctx);
    }

    fn leave_scene(&mut self) {
        let mut ctx = Context {
            assets: &self.assets,
            audio: self.audio.as_mut(),
        };
        self.scene.leave(&mut ctx);
    }

    /// An effect is still running and needs frames drawn.
    fn animating(&mut self) -> bool {
        match &mut self.scene {
            Scene::Board(board) => {
                board.round().curtain_done()
                    && board.dim_effect().as_ref().is_none_or(|e| !e.done())
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingAudio;

    fn app(config: GameConfig) -> App {
        let theme = Theme::default();
        let assets = Assets::builtin(&theme);
        App::new(config, theme, assets, Box::new(RecordingAudio::default()))
    }

    #[test]
    fn test_skip_title_opens_options_on_first_frame() {
        let mut app = app(GameConfig {
            skip_title: true,
            seed: Some(0xFEED_0001),
            ..GameConfig::default()
        });
        assert!(matches!(app.scene, Scene::Title(_)));
        assert!(app.step());
        let Scene::Options(options) = &app.scene else {
            panic!("expected options, got {}", app.scene.name());
        };
        assert_eq!(options.config().seed, 0xFEED_0001);
        assert!(app.cli_seed.is_none());
    }

    #[test]
    fn test_end_game_goes_back_to_options() {
        let mut app = app(GameConfig::default());
        app.pending = Some(SceneChange::Board(crate::round::RoundConfig::default()));
        app.step();
        assert_eq!(app.scene.name(), "board");
        app.command(Command::EndGame);
        app.step();
        assert_eq!(app.scene.name(), "options");
    }

    #[test]
    fn test_frame_duration_follows_fps() {
        let app = app(GameConfig {
            fps: 25,
            ..GameConfig::default()
        });
        assert_eq!(app.frame_duration, Duration::from_millis(40));
        assert_eq!(app.board_delays, RepeatDelays::BOARD.scaled(25));
    }
}

//! App: terminal init, main loop, screen routing, pointer dispatch.

use crate::board::BoardState;
use crate::catalog;
use crate::input::{Action, PointerEvent, key_to_action, mouse_to_pointer};
use crate::picture::{self, Picture};
use crate::slicer::jigsaw_cut;
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::{Position, Rect};
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
}

/// Selector-screen state: hover highlight plus the painted previews. The
/// pictures are painted once at startup so menu and board always agree.
pub struct MenuState {
    pub hover: Option<usize>,
    pub pictures: Vec<Picture>,
    pub animation_start: Instant,
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    screen: Screen,
    menu: MenuState,
    board: Option<BoardState>,
    /// TachyonFX fade for the WELL DONE banner (created when the board
    /// completes, dropped with the board).
    banner_effect: Option<Effect>,
    /// Last time the banner effect was processed (for delta).
    banner_process_time: Option<Instant>,
    launched: Instant,
    games_started: u32,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let now = Instant::now();
        let pictures = catalog::PUZZLES
            .iter()
            .map(|def| picture::paint(def.kind, def.art_width, def.art_height))
            .collect();
        let mut app = Self {
            args,
            config,
            theme,
            screen: Screen::Menu,
            menu: MenuState {
                hover: None,
                pictures,
                animation_start: now,
            },
            board: None,
            banner_effect: None,
            banner_process_time: None,
            launched: now,
            games_started: 0,
        };
        if let Some(puzzle) = app.args.puzzle {
            app.start_puzzle(puzzle.saturating_sub(1));
        }
        Ok(app)
    }

    /// Scatter seed for the next board: --seed verbatim when given, otherwise
    /// startup-clock entropy mixed with a per-game counter.
    fn next_seed(&mut self) -> u32 {
        self.games_started = self.games_started.wrapping_add(1);
        self.args.seed.unwrap_or_else(|| {
            self.launched
                .elapsed()
                .subsec_nanos()
                .wrapping_mul(0x9E37_79B9)
                .wrapping_add(self.games_started)
        })
    }

    fn start_puzzle(&mut self, index: usize) {
        let def = &catalog::PUZZLES[index.min(catalog::PUZZLES.len() - 1)];
        let pic = picture::paint(def.kind, def.art_width, def.art_height);
        let sliced = jigsaw_cut(&pic, def.cols, def.rows);
        let seed = self.next_seed();
        self.board = Some(BoardState::new(sliced, &self.config, seed, def.label));
        self.banner_effect = None;
        self.banner_process_time = None;
        self.screen = Screen::Playing;
    }

    /// Tear the board down and hand control back to the selector.
    fn leave_board(&mut self) {
        self.board = None;
        self.banner_effect = None;
        self.banner_process_time = None;
        self.menu.hover = None;
        self.menu.animation_start = Instant::now();
        self.screen = Screen::Menu;
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            // Advance the snap tween and fade timelines before drawing; the
            // completion check hangs off the tween finishing in here.
            if let Some(board) = &mut self.board {
                board.tick(now);
            }
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.menu,
                    self.board.as_ref(),
                    &self.theme,
                    &self.config,
                    now,
                    &mut self.banner_effect,
                    &mut self.banner_process_time,
                )
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) => {
                            if key.kind != KeyEventKind::Press {
                                continue;
                            }
                            match key_to_action(key) {
                                Action::Quit => return Ok(()),
                                Action::Back => match self.screen {
                                    Screen::Menu => return Ok(()),
                                    Screen::Playing => self.leave_board(),
                                },
                                Action::None => {}
                            }
                        }
                        Event::Mouse(mouse) => {
                            if let Some(pointer) = mouse_to_pointer(mouse) {
                                self.handle_pointer(pointer, now);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn handle_pointer(&mut self, pointer: PointerEvent, now: Instant) {
        let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        let area = Rect::new(0, 0, cols, rows);
        match self.screen {
            Screen::Menu => {
                let rects = crate::ui::thumb_rects(area);
                let thumb_at = |col: u16, row: u16| {
                    rects
                        .iter()
                        .position(|r| r.contains(Position { x: col, y: row }))
                };
                match pointer {
                    PointerEvent::Moved { col, row } | PointerEvent::Drag { col, row } => {
                        self.menu.hover = thumb_at(col, row);
                    }
                    PointerEvent::Up { col, row } => {
                        if let Some(index) = thumb_at(col, row) {
                            self.start_puzzle(index);
                        }
                    }
                    PointerEvent::Down { .. } => {}
                }
            }
            Screen::Playing => {
                // The banner's sole exit: a pointer-down once it has settled.
                if matches!(pointer, PointerEvent::Down { .. })
                    && self.board.as_ref().is_some_and(BoardState::is_complete)
                {
                    if self
                        .board
                        .as_ref()
                        .is_some_and(|b| b.banner_settled(now))
                    {
                        self.leave_board();
                    }
                    return;
                }
                let Some(board) = self.board.as_mut() else {
                    return;
                };
                let (outer, _) = crate::ui::board_layout(area, board);
                let inner = Rect {
                    x: outer.x + 1,
                    y: outer.y + 1,
                    width: outer.width.saturating_sub(2),
                    height: outer.height.saturating_sub(2),
                };
                match pointer {
                    PointerEvent::Down { col, row } => {
                        let (px, py) = crate::ui::pointer_to_px(inner, col, row);
                        board.pointer_down(px, py, now);
                    }
                    PointerEvent::Drag { col, row } => {
                        let (px, py) = crate::ui::pointer_to_px(inner, col, row);
                        board.pointer_drag(px, py);
                    }
                    PointerEvent::Up { col, row } => {
                        let (px, py) = crate::ui::pointer_to_px(inner, col, row);
                        board.pointer_up(px, py, now);
                    }
                    PointerEvent::Moved { .. } => {}
                }
            }
        }
    }
}

//! jigsawtui — jigsaw puzzle mini-game in the terminal.

mod app;
mod board;
mod catalog;
mod input;
mod picture;
mod rng;
mod slicer;
mod snap;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that shape board behaviour (snap distance,
/// scatter, fade and snap timings, shadow).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub snap_radius: f32,
    pub hide_pieces_on_pickup: bool,
    pub jitter: f32,
    pub rotation_jitter: f32,
    pub snap_ms: u64,
    pub fade_out_ms: u64,
    pub fade_in_ms: u64,
    pub shadow_offset: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        snap_radius: args.snap_radius.max(1.0),
        hide_pieces_on_pickup: !args.keep_pieces_visible,
        jitter: args.jitter.max(0.0),
        rotation_jitter: args.rotation_jitter.max(0.0),
        snap_ms: args.snap_ms,
        fade_out_ms: args.fade_out_ms,
        fade_in_ms: args.fade_in_ms,
        shadow_offset: args.shadow_offset.max(0.0),
    };
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Jigsaw puzzle mini-game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "jigsawtui",
    version,
    about = "Jigsaw puzzle in the terminal. Pick a picture, drag the pieces home with the mouse.",
    long_about = "Jigsawtui cuts one of four pictures into a grid of pieces, scatters them over \
        the board, and lets you drag each piece onto its slot. A piece dropped close enough to \
        its place snaps down and locks; place them all and the puzzle is done.\n\n\
        CONTROLS:\n  Mouse drag   Move a piece    Mouse release  Drop (snaps when close)\n  Q / Esc      Back / quit     Ctrl+C         Quit\n\n\
        Needs a terminal with mouse reporting. Use --snap-radius to tune placement difficulty \
        and --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Start a puzzle immediately, skipping the menu (1..=4 in menu order).
    #[arg(short, long, value_name = "N")]
    pub puzzle: Option<usize>,

    /// Snap distance in logical px: a piece dropped closer than this to its
    /// slot centre locks in. Denser grids want smaller values.
    #[arg(long, default_value = "32.0", value_name = "PX")]
    pub snap_radius: f32,

    /// Keep the other loose pieces fully visible while dragging one.
    #[arg(long)]
    pub keep_pieces_visible: bool,

    /// Scatter jitter in logical px added to each piece at setup.
    #[arg(long, default_value = "32.0", value_name = "PX")]
    pub jitter: f32,

    /// Scatter tilt in degrees added to each piece at setup.
    #[arg(long, default_value = "6.0", value_name = "DEG")]
    pub rotation_jitter: f32,

    /// Snap animation duration in ms (the piece gliding into its slot).
    #[arg(long, default_value = "500", value_name = "MS")]
    pub snap_ms: u64,

    /// Fade-out duration in ms when a piece is picked up.
    #[arg(long, default_value = "100", value_name = "MS")]
    pub fade_out_ms: u64,

    /// Fade-in duration in ms when the loose pieces are restored.
    #[arg(long, default_value = "250", value_name = "MS")]
    pub fade_in_ms: u64,

    /// Shadow offset in logical px under the dragged piece.
    #[arg(long, default_value = "8.0", value_name = "PX")]
    pub shadow_offset: f32,

    /// Scatter seed; pass the same value to replay a layout.
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

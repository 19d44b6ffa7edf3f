//! Layout and drawing: menu thumbnails, board compositing, shadow, sidebar,
//! WELL DONE banner.

use crate::GameConfig;
use crate::app::{MenuState, Screen};
use crate::board::{BoardState, Phase};
use crate::catalog::{PUZZLES, PuzzleDef};
use crate::picture::Picture;
use crate::slicer::{OUTLINE, PX_PER_CELL, PieceSurface};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 22;

/// Thumbnail block size (border included) and the gap between them.
const THUMB_W: u16 = 24;
const THUMB_H: u16 = 12;
const THUMB_GAP: u16 = 3;

/// WELL DONE banner: drop-in time and fade time (the full banner settle time
/// is `board::BANNER_MS`).
const BANNER_DROP_MS: u32 = 900;
const BANNER_FADE_MS: u32 = 600;

/// Shadow opacity under the dragged piece.
const SHADOW_ALPHA: f32 = 0.55;

/// Draw the current screen.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    menu: &MenuState,
    board: Option<&BoardState>,
    theme: &Theme,
    config: &GameConfig,
    now: Instant,
    banner_effect: &mut Option<Effect>,
    banner_process_time: &mut Option<Instant>,
) {
    let area = frame.area();
    frame
        .buffer_mut()
        .set_style(area, Style::default().bg(theme.bg).fg(theme.main_fg));
    match screen {
        Screen::Menu => draw_menu(frame, theme, menu, area, now),
        Screen::Playing => {
            if let Some(board) = board {
                draw_board(frame, board, theme, config, area, now);
                if board.is_complete() {
                    draw_banner(frame, board, theme, area, now, banner_effect, banner_process_time);
                }
            }
        }
    }
}

/// Screen rects of the four menu thumbnails; shared with the app's mouse
/// hit-testing so hover and click agree with what is drawn.
pub fn thumb_rects(area: Rect) -> [Rect; 4] {
    let grid_w = THUMB_W * 2 + THUMB_GAP;
    let grid_h = THUMB_H * 2 + 1;
    let x0 = area.x + area.width.saturating_sub(grid_w) / 2;
    let y0 = area.y + 3 + area.height.saturating_sub(grid_h + 5) / 2;
    let mut rects = [Rect::default(); 4];
    for (i, rect) in rects.iter_mut().enumerate() {
        let col = (i % 2) as u16;
        let row = (i / 2) as u16;
        *rect = Rect {
            x: x0 + col * (THUMB_W + THUMB_GAP),
            y: y0 + row * (THUMB_H + 1),
            width: THUMB_W.min(area.width),
            height: THUMB_H.min(area.height),
        };
    }
    rects
}

fn draw_menu(frame: &mut Frame, theme: &Theme, menu: &MenuState, area: Rect, now: Instant) {
    let rects = thumb_rects(area);

    // Startup animation: slide in from below, ease-out cubic.
    let elapsed = now.duration_since(menu.animation_start).as_millis() as u32;
    let t = (elapsed as f32 / 400.0).min(1.0);
    let offset = ((1.0 - (1.0 - t).powi(3)) * 6.0) as u16;
    let slide = 6 - offset.min(6);

    let title = Line::from(vec![
        Span::styled(
            " jigsaw ",
            Style::default().fg(Color::Rgb(255, 120, 120)).bold(),
        ),
        Span::styled(" tui ", Style::default().fg(theme.main_fg).bold()),
    ]);
    let header = Rect {
        x: area.x,
        y: (rects[0].y.saturating_sub(2) + slide).min(area.y + area.height.saturating_sub(1)),
        width: area.width,
        height: 1,
    };
    Paragraph::new(title)
        .alignment(Alignment::Center)
        .render(header, frame.buffer_mut());

    for (i, (def, rect)) in PUZZLES.iter().zip(rects.iter()).enumerate() {
        let mut rect = *rect;
        rect.y = (rect.y + slide).min(area.y + area.height.saturating_sub(rect.height));
        let rect = rect.intersection(area);
        if rect.width < 4 || rect.height < 4 {
            continue;
        }
        let hovered = menu.hover == Some(i);
        draw_thumb(frame, theme, def, &menu.pictures[i], rect, hovered);
    }

    let footer = Rect {
        x: area.x,
        y: (rects[2].y + THUMB_H + 1 + slide).min(area.y + area.height.saturating_sub(1)),
        width: area.width,
        height: 1,
    };
    Paragraph::new(Line::from(vec![
        Span::styled(" CLICK ", Style::default().fg(theme.palette[3])),
        Span::from("a picture to play   "),
        Span::styled(" Q ", Style::default().fg(theme.palette[2])),
        Span::from("quit"),
    ]))
    .alignment(Alignment::Center)
    .render(footer, frame.buffer_mut());
}

/// One thumbnail: bordered preview plus a piece-count label. Hover swaps the
/// border for the emphasis style, brightens the art and leans the preview
/// slightly.
fn draw_thumb(
    frame: &mut Frame,
    theme: &Theme,
    def: &PuzzleDef,
    picture: &Picture,
    rect: Rect,
    hovered: bool,
) {
    let border_style = if hovered {
        Style::default().fg(theme.title).bold()
    } else {
        Style::default().fg(theme.div_line)
    };
    let label = format!(" {} · {}×{} ", def.label, def.cols, def.rows);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(
            label,
            if hovered {
                Style::default().fg(theme.title).bold()
            } else {
                Style::default().fg(theme.main_fg)
            },
        ));
    let inner = block.inner(rect);
    block.render(rect, frame.buffer_mut());
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let buf = frame.buffer_mut();
    let samples_y = inner.height as usize * 2;
    for y in 0..inner.height {
        // A one-cell lean below the midline reads as a slight tilt.
        let lean = u16::from(hovered && y > inner.height / 2);
        for x in 0..inner.width {
            let sx = |col: u16| (col as usize) * picture.width / inner.width as usize;
            let sy = |half: usize| half * picture.height / samples_y;
            let top = picture.get(sx(x), sy(y as usize * 2));
            let bot = picture.get(sx(x), sy(y as usize * 2 + 1));
            let mut fg = theme.paint_color(top);
            let mut bg = theme.paint_color(bot);
            if hovered {
                fg = blend(Color::White, fg, 0.18);
                bg = blend(Color::White, bg, 0.18);
            }
            let rx = inner.x + ((x + lean).min(inner.width - 1));
            let ry = inner.y + y;
            buf[(rx, ry)]
                .set_symbol("▀")
                .set_style(Style::default().fg(fg).bg(bg));
        }
    }
}

/// Board and sidebar rects, centred in `area`. Shared with the app so mouse
/// coordinates convert against the same layout that was drawn.
pub fn board_layout(area: Rect, board: &BoardState) -> (Rect, Rect) {
    let (cw, ch) = board.cell_size();
    let bw = cw as u16 + 2;
    let bh = (ch as u16).div_ceil(2) + 2;
    let total_w = bw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(bh) / 2;
    let outer = Rect {
        x,
        y,
        width: bw.min(area.width),
        height: bh.min(area.height),
    };
    let sidebar = Rect {
        x: (outer.x + outer.width).min(area.x + area.width),
        y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(outer.width)),
        height: bh.min(area.height),
    };
    (outer, sidebar)
}

/// Pointer cell → board-space logical px. The vertical axis maps one terminal
/// row to two art cells (the ▀ blit), so the pointer lands on the row's
/// midline.
pub fn pointer_to_px(inner: Rect, col: u16, row: u16) -> (f32, f32) {
    let px = ((col as i32 - inner.x as i32) as f32 + 0.5) * PX_PER_CELL;
    let py = ((row as i32 - inner.y as i32) as f32 * 2.0 + 1.0) * PX_PER_CELL;
    (px, py)
}

fn draw_board(
    frame: &mut Frame,
    board: &BoardState,
    theme: &Theme,
    config: &GameConfig,
    area: Rect,
    now: Instant,
) {
    let (outer, sidebar) = board_layout(area, board);
    let title = format!(" jigsawtui — {} ", board.label);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let inner = block.inner(outer);
    block.render(outer, frame.buffer_mut());

    // Composite the scene at art-cell resolution, then blit ▀ pairs.
    let (cw, ch) = board.cell_size();
    let mut canvas: Vec<Option<Color>> = vec![None; cw * ch];

    stamp_corner_guides(&mut canvas, cw, ch, board, theme);

    let alpha_loose = board.fade_alpha(now);
    for &idx in &board.z_order {
        let piece = &board.pieces[idx];
        // Outline-free only once home; a piece still gliding in keeps its
        // outline until the tween lands.
        let surface = if piece.placed && board.snapping_piece() != Some(idx) {
            &piece.plain
        } else {
            &piece.outlined
        };
        let alpha = if board.active == Some(idx) || piece.placed {
            1.0
        } else {
            alpha_loose
        };
        if board.phase == Phase::Dragging && board.active == Some(idx) {
            // Shadow first, so the piece itself covers most of it.
            stamp_shadow(&mut canvas, cw, ch, piece, config.shadow_offset, theme);
        }
        stamp_piece(&mut canvas, cw, ch, piece, surface, theme, alpha);
    }

    blit(frame, inner, &canvas, cw, ch, theme);
    draw_sidebar(frame, board, theme, sidebar, now);
}

/// Bracket guides at the assembled picture's corners, under the pieces.
fn stamp_corner_guides(
    canvas: &mut [Option<Color>],
    cw: usize,
    ch: usize,
    board: &BoardState,
    theme: &Theme,
) {
    let ox = (board.origin.0 / PX_PER_CELL) as usize;
    let oy = (board.origin.1 / PX_PER_CELL) as usize;
    let x1 = ox + board.art_width - 1;
    let y1 = oy + board.art_height - 1;
    let mut put = |x: usize, y: usize| {
        if x < cw && y < ch {
            canvas[y * cw + x] = Some(theme.div_line);
        }
    };
    for d in 0..3usize {
        put(ox + d, oy);
        put(ox, oy + d);
        put(x1 - d, oy);
        put(x1, oy + d);
        put(ox + d, y1);
        put(ox, y1 - d);
        put(x1 - d, y1);
        put(x1, y1 - d);
    }
}

fn stamp_piece(
    canvas: &mut [Option<Color>],
    cw: usize,
    ch: usize,
    piece: &crate::board::Piece,
    surface: &PieceSurface,
    theme: &Theme,
    alpha: f32,
) {
    let cx = (piece.x / PX_PER_CELL).round() as i32;
    let cy = (piece.y / PX_PER_CELL).round() as i32;
    let shear = piece.rotation.to_radians().tan();
    for sy in 0..surface.height {
        // Scatter tilt renders as a row shear; zero for a straight piece.
        let lean = (sy as f32 * shear).round() as i32;
        for sx in 0..surface.width {
            let x = cx + sx as i32 + lean;
            let y = cy + sy as i32;
            if x < 0 || y < 0 || x as usize >= cw || y as usize >= ch {
                continue;
            }
            let index = surface.get(sx, sy);
            let color = if index == OUTLINE {
                theme.outline
            } else {
                theme.paint_color(index)
            };
            canvas[y as usize * cw + x as usize] = Some(blend(color, theme.felt, alpha));
        }
    }
}

/// The drag shadow: the piece's footprint, offset and dark.
fn stamp_shadow(
    canvas: &mut [Option<Color>],
    cw: usize,
    ch: usize,
    piece: &crate::board::Piece,
    offset_px: f32,
    theme: &Theme,
) {
    let cx = ((piece.x + offset_px) / PX_PER_CELL).round() as i32;
    let cy = ((piece.y + offset_px) / PX_PER_CELL).round() as i32;
    for sy in 0..piece.outlined.height {
        for sx in 0..piece.outlined.width {
            let x = cx + sx as i32;
            let y = cy + sy as i32;
            if x < 0 || y < 0 || x as usize >= cw || y as usize >= ch {
                continue;
            }
            canvas[y as usize * cw + x as usize] =
                Some(blend(theme.shadow, theme.felt, SHADOW_ALPHA));
        }
    }
}

/// Blit the canvas into the terminal, two art rows per cell via ▀.
fn blit(
    frame: &mut Frame,
    inner: Rect,
    canvas: &[Option<Color>],
    cw: usize,
    ch: usize,
    theme: &Theme,
) {
    let buf = frame.buffer_mut();
    for y in (0..ch).step_by(2) {
        for x in 0..cw {
            let top = canvas[y * cw + x].unwrap_or(theme.felt);
            let bot = if y + 1 < ch {
                canvas[(y + 1) * cw + x].unwrap_or(theme.felt)
            } else {
                theme.felt
            };
            let rx = inner.x + x as u16;
            let ry = inner.y + (y / 2) as u16;
            if rx < inner.x + inner.width && ry < inner.y + inner.height {
                buf[(rx, ry)]
                    .set_symbol("▀")
                    .set_style(Style::default().fg(top).bg(bot));
            }
        }
    }
}

fn draw_sidebar(frame: &mut Frame, board: &BoardState, theme: &Theme, area: Rect, now: Instant) {
    if area.width < 4 {
        return;
    }
    let border = Style::default().fg(theme.div_line).bg(theme.bg);
    let total = board.pieces.len();

    let progress_rect = Rect {
        x: area.x + 1,
        y: area.y,
        width: area.width.saturating_sub(1),
        height: 5.min(area.height),
    };
    let gauge_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(" Pieces ", Style::default().fg(theme.title)));
    Gauge::default()
        .block(gauge_block)
        .gauge_style(Style::default().fg(theme.palette[0]).bg(theme.felt))
        .ratio(board.placed_count as f64 / total.max(1) as f64)
        .label(format!("{} / {}", board.placed_count, total))
        .render(progress_rect, frame.buffer_mut());

    let help_rect = Rect {
        x: area.x + 1,
        y: area.y + 6.min(area.height),
        width: area.width.saturating_sub(1),
        height: 6.min(area.height.saturating_sub(6)),
    };
    if help_rect.height >= 3 {
        let status = match board.phase {
            Phase::Selecting => "pick a piece",
            Phase::Dragging => "drop it home",
            Phase::Snapping => "snap!",
            Phase::Complete => {
                if board.banner_settled(now) {
                    "click for menu"
                } else {
                    "well done"
                }
            }
        };
        let lines = vec![
            Line::from(Span::styled(status, Style::default().fg(theme.main_fg))),
            Line::from(""),
            Line::from(vec![
                Span::styled(" drag ", Style::default().fg(theme.palette[3])),
                Span::from("place piece"),
            ]),
            Line::from(vec![
                Span::styled(" q ", Style::default().fg(theme.palette[2])),
                Span::from("back to menu"),
            ]),
        ];
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(Span::styled(" Help ", Style::default().fg(theme.title))),
            )
            .render(help_rect, frame.buffer_mut());
    }
}

/// WELL DONE overlay: drops in from the top (manual ease-out, like the menu
/// slide-in) while a TachyonFX fade brings its cells up from the background.
fn draw_banner(
    frame: &mut Frame,
    board: &BoardState,
    theme: &Theme,
    area: Rect,
    now: Instant,
    banner_effect: &mut Option<Effect>,
    banner_process_time: &mut Option<Instant>,
) {
    let Some(completed_at) = board.completed_at else {
        return;
    };
    let popup_w = 34u16.min(area.width);
    let popup_h = 5u16.min(area.height);
    let final_y = area.y + area.height.saturating_sub(popup_h) / 2;

    let elapsed = now.saturating_duration_since(completed_at).as_millis() as u32;
    let t = (elapsed as f32 / BANNER_DROP_MS as f32).min(1.0);
    let eased = 1.0 - (1.0 - t).powi(3);
    let y = area.y + ((final_y - area.y) as f32 * eased) as u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y,
        width: popup_w,
        height: popup_h,
    };

    let settled = board.banner_settled(now);
    let hint = if settled {
        Line::from(Span::styled(
            " click anywhere for a new puzzle ",
            Style::default().fg(theme.main_fg),
        ))
    } else {
        Line::from("")
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " WELL DONE! ",
            Style::default().fg(Color::Black).bg(theme.title).bold(),
        )),
        Line::from(""),
        hint,
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.title).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());

    // Fade the banner area up from the background while it drops.
    let delta = banner_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let tfx_delta = TfxDuration::from_millis(delta.as_millis().min(u128::from(u32::MAX)) as u32);
    *banner_process_time = Some(now);
    // The fade covers the whole corridor the banner drops through.
    let corridor = Rect {
        x: popup.x,
        y: area.y,
        width: popup_w,
        height: (final_y - area.y) + popup_h,
    };
    if banner_effect.is_none() {
        let effect = fx::fade_from(theme.bg, theme.bg, (BANNER_FADE_MS, Interpolation::Linear))
            .with_area(corridor);
        *banner_effect = Some(effect);
    }
    if let Some(effect) = banner_effect {
        frame.render_effect(effect, corridor, tfx_delta);
    }
}

/// Linear RGB blend of `fg` over `bg`; non-RGB colours use coarse fallbacks,
/// same approach as shading anywhere else in the tree.
fn blend(fg: Color, bg: Color, alpha: f32) -> Color {
    let a = alpha.clamp(0.0, 1.0);
    let (fr, fg_, fb) = to_rgb(fg);
    let (br, bg_, bb) = to_rgb(bg);
    let mix = |f: u8, b: u8| (f as f32 * a + b as f32 * (1.0 - a)).round() as u8;
    Color::Rgb(mix(fr, br), mix(fg_, bg_), mix(fb, bb))
}

fn to_rgb(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Black => (0, 0, 0),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::Gray => (128, 128, 128),
        Color::DarkGray => (64, 64, 64),
        Color::White => (255, 255, 255),
        _ => (128, 128, 128),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumb_rects_do_not_overlap() {
        let area = Rect::new(0, 0, 120, 40);
        let rects = thumb_rects(area);
        for (i, a) in rects.iter().enumerate() {
            for b in rects.iter().skip(i + 1) {
                assert!(a.intersection(*b).is_empty());
            }
        }
    }

    #[test]
    fn test_pointer_to_px_maps_cell_centres() {
        let inner = Rect::new(10, 5, 40, 20);
        let (px, py) = pointer_to_px(inner, 10, 5);
        assert!((px - 4.0).abs() < f32::EPSILON);
        assert!((py - 8.0).abs() < f32::EPSILON);
        let (px2, _) = pointer_to_px(inner, 12, 5);
        assert!((px2 - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_blend_endpoints() {
        let fg = Color::Rgb(200, 100, 0);
        let bg = Color::Rgb(20, 30, 40);
        assert_eq!(blend(fg, bg, 1.0), fg);
        assert_eq!(blend(fg, bg, 0.0), bg);
    }
}

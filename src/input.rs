//! Key and mouse mapping: keys become actions, mouse events become pointer
//! events in terminal-cell coordinates.

use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Leave the current screen: board → menu, menu → exit.
    Back,
    /// Exit the program outright.
    Quit,
    None,
}

pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    match code {
        KeyCode::Char('c') if modifiers == KeyModifiers::CONTROL => Action::Quit,
        KeyCode::Char('q') | KeyCode::Esc if modifiers.is_empty() => Action::Back,
        _ => Action::None,
    }
}

/// Pointer lifecycle event, left button only. Coordinates are terminal cells;
/// the app converts them to board-space logical px.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down { col: u16, row: u16 },
    Drag { col: u16, row: u16 },
    Up { col: u16, row: u16 },
    Moved { col: u16, row: u16 },
}

pub fn mouse_to_pointer(ev: MouseEvent) -> Option<PointerEvent> {
    let (col, row) = (ev.column, ev.row);
    match ev.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(PointerEvent::Down { col, row }),
        MouseEventKind::Drag(MouseButton::Left) => Some(PointerEvent::Drag { col, row }),
        MouseEventKind::Up(MouseButton::Left) => Some(PointerEvent::Up { col, row }),
        MouseEventKind::Moved => Some(PointerEvent::Moved { col, row }),
        _ => None,
    }
}

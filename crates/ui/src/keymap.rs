use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use folio_application::NavDirection;

/// Actions available while browsing either view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shortcut {
    Quit,
    Navigate(NavDirection),
    Open,
    ToggleView,
    CycleTheme,
    CycleLanguage,
    ToggleReducedMotion,
    Contact,
    Help,
    Orbit { dx: i8, dy: i8 },
    Zoom(i8),
    ResetCamera,
}

/// Actions while the content modal is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModalShortcut {
    Close,
    Previous,
    Next,
    Scroll(i32),
}

pub(crate) fn main_shortcut(key: KeyEvent) -> Option<Shortcut> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Shortcut::Quit),
            _ => None,
        };
    }

    let shortcut = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Shortcut::Quit,
        KeyCode::Left => Shortcut::Navigate(NavDirection::Left),
        KeyCode::Right => Shortcut::Navigate(NavDirection::Right),
        KeyCode::Up => Shortcut::Navigate(NavDirection::Up),
        KeyCode::Down => Shortcut::Navigate(NavDirection::Down),
        KeyCode::Enter | KeyCode::Char(' ') => Shortcut::Open,
        KeyCode::Char('v') | KeyCode::Tab => Shortcut::ToggleView,
        KeyCode::Char('t') => Shortcut::CycleTheme,
        KeyCode::Char('l') => Shortcut::CycleLanguage,
        KeyCode::Char('m') => Shortcut::ToggleReducedMotion,
        KeyCode::Char('c') => Shortcut::Contact,
        KeyCode::Char('?') => Shortcut::Help,
        KeyCode::Char('a') => Shortcut::Orbit { dx: -1, dy: 0 },
        KeyCode::Char('d') => Shortcut::Orbit { dx: 1, dy: 0 },
        KeyCode::Char('w') => Shortcut::Orbit { dx: 0, dy: -1 },
        KeyCode::Char('s') => Shortcut::Orbit { dx: 0, dy: 1 },
        KeyCode::Char('+') | KeyCode::Char('=') => Shortcut::Zoom(1),
        KeyCode::Char('-') => Shortcut::Zoom(-1),
        KeyCode::Char('r') => Shortcut::ResetCamera,
        _ => return None,
    };
    Some(shortcut)
}

pub(crate) fn modal_shortcut(key: KeyEvent, page: u16) -> Option<ModalShortcut> {
    let page = i32::from(page.max(1));
    let shortcut = match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => ModalShortcut::Close,
        KeyCode::Left | KeyCode::Char('h') => ModalShortcut::Previous,
        KeyCode::Right | KeyCode::Char('l') => ModalShortcut::Next,
        KeyCode::Up | KeyCode::Char('k') => ModalShortcut::Scroll(-1),
        KeyCode::Down | KeyCode::Char('j') => ModalShortcut::Scroll(1),
        KeyCode::PageUp => ModalShortcut::Scroll(-page),
        KeyCode::PageDown | KeyCode::Char(' ') => ModalShortcut::Scroll(page),
        KeyCode::Home | KeyCode::Char('g') => ModalShortcut::Scroll(i32::MIN / 2),
        KeyCode::End | KeyCode::Char('G') => ModalShortcut::Scroll(i32::MAX / 2),
        _ => return None,
    };
    Some(shortcut)
}

pub(crate) fn help_lines() -> &'static [(&'static str, &'static str)] {
    &[
        ("←/→/↑/↓", "move between books"),
        ("Enter", "open notes"),
        ("v / Tab", "switch shelf / grid"),
        ("a d w s", "orbit camera"),
        ("+ / -", "zoom"),
        ("r", "reset camera"),
        ("t", "toggle theme"),
        ("l", "switch language"),
        ("m", "reduce motion"),
        ("c", "contact form"),
        ("q / Esc", "quit"),
    ]
}

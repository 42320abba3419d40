//! Platform abstraction layer
//!
//! Key mapping is shared by every target. The browser backend (canvas
//! surface, WebSocket transport, DOM HUD) lives in `web` and only builds
//! for wasm32.

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::sim::InputState;

/// Session-level commands bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CycleSpectate,
    Restart,
    Leaderboard,
    Menu,
}

/// Update held-key state; returns true if the key is a movement/combat key
pub fn apply_key(input: &mut InputState, key: &str, pressed: bool) -> bool {
    match key {
        "w" | "W" | "ArrowUp" => input.up = pressed,
        "s" | "S" | "ArrowDown" => input.down = pressed,
        "a" | "A" | "ArrowLeft" => input.left = pressed,
        "d" | "D" | "ArrowRight" => input.right = pressed,
        "r" | "R" => input.reload = pressed,
        _ => return false,
    }
    true
}

/// One-shot command for a key press
pub fn command_for_key(key: &str) -> Option<Command> {
    match key {
        "Tab" => Some(Command::CycleSpectate),
        "Enter" => Some(Command::Restart),
        "l" | "L" => Some(Command::Leaderboard),
        "Escape" => Some(Command::Menu),
        _ => None,
    }
}

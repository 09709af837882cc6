// Blocked-key policy kept as data so the restriction rules are testable
// independent of the event wiring.
use crate::platform::{InputContext, KeyEvent};

/// Keys swallowed regardless of modifiers or focus.
pub const BLOCKED_BARE_KEYS: &[&str] = &[
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
    "PrintScreen",
];

/// Keys swallowed outside editing surfaces only. Space scrolls the page and
/// Tab walks focus out of the exam content; both behave normally inside a
/// text input or the code editor.
pub const PAGE_ONLY_BLOCKED_KEYS: &[&str] = &[" ", "Space", "Tab"];

/// Letters and symbols swallowed with Ctrl/Cmd held: clipboard, select-all,
/// save/print/find, view-source, history/window management, zoom.
pub const PRIMARY_BLOCKED_KEYS: &[&str] = &[
    "a", "c", "v", "x", "s", "p", "u", "f", "g", "h", "j", "o", "r", "t", "n",
    "w", "d", "e", "k", "l", "+", "-", "=", "0",
];

/// Ctrl/Cmd+Shift combos: devtools, private windows, reopen-tab, task manager.
pub const PRIMARY_SHIFT_BLOCKED_KEYS: &[&str] = &[
    "i", "j", "c", "k", "e", "s", "p", "r", "n", "t", "Delete",
];

/// Alt + navigation keys: history traversal, window switching/closing.
pub const ALT_BLOCKED_KEYS: &[&str] = &["ArrowLeft", "ArrowRight", "Home", "F4", "Tab"];

/// Verdict for a single input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Pass through unmodified.
    Allow,
    /// preventDefault + stopPropagation.
    Block,
}

fn listed(list: &[&str], key: &str) -> bool {
    list.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Evaluates key events against the denylist tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyPolicy;

impl KeyPolicy {
    pub fn disposition(&self, event: &KeyEvent, context: InputContext) -> KeyDisposition {
        if listed(BLOCKED_BARE_KEYS, &event.key) {
            return KeyDisposition::Block;
        }

        if !context.is_editing_surface() && listed(PAGE_ONLY_BLOCKED_KEYS, &event.key) {
            return KeyDisposition::Block;
        }

        if event.primary_modifier() {
            // Ctrl+Alt combos are swallowed wholesale (AltGr-style chords
            // are not used inside the exam surface).
            if event.alt {
                return KeyDisposition::Block;
            }
            if event.shift && listed(PRIMARY_SHIFT_BLOCKED_KEYS, &event.key) {
                return KeyDisposition::Block;
            }
            if !event.shift && listed(PRIMARY_BLOCKED_KEYS, &event.key) {
                return KeyDisposition::Block;
            }
            return KeyDisposition::Allow;
        }

        if event.alt && listed(ALT_BLOCKED_KEYS, &event.key) {
            return KeyDisposition::Block;
        }

        KeyDisposition::Allow
    }

    /// Ctrl/Cmd + wheel is the zoom gesture; suppressed unconditionally.
    pub fn wheel_disposition(&self, primary_modifier: bool) -> KeyDisposition {
        if primary_modifier {
            KeyDisposition::Block
        } else {
            KeyDisposition::Allow
        }
    }
}

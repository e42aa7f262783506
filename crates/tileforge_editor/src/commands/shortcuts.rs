//! Keyboard shortcut handling

use crate::tools::EditorTool;

/// What a key press asks the session to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    SelectTool(EditorTool),
}

/// Keyboard modifier state at the time of a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Ctrl on Linux/Windows, Cmd on macOS
    pub ctrl: bool,
    pub shift: bool,
}

/// Map a key press to an action
pub fn resolve_shortcut(key: char, modifiers: Modifiers) -> Option<ShortcutAction> {
    let key = key.to_ascii_lowercase();

    if modifiers.ctrl {
        return match key {
            // Ctrl+Shift+Z or Ctrl+Y - Redo
            'z' if modifiers.shift => Some(ShortcutAction::Redo),
            'y' => Some(ShortcutAction::Redo),
            // Ctrl+Z - Undo
            'z' => Some(ShortcutAction::Undo),
            _ => None,
        };
    }

    EditorTool::from_shortcut(key).map(ShortcutAction::SelectTool)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
    };

    #[test]
    fn test_undo_redo_shortcuts() {
        assert_eq!(resolve_shortcut('z', CTRL), Some(ShortcutAction::Undo));
        assert_eq!(resolve_shortcut('y', CTRL), Some(ShortcutAction::Redo));
        assert_eq!(
            resolve_shortcut('Z', Modifiers { ctrl: true, shift: true }),
            Some(ShortcutAction::Redo)
        );
        assert_eq!(resolve_shortcut('b', CTRL), None);
    }

    #[test]
    fn test_tool_shortcuts() {
        let plain = Modifiers::default();
        assert_eq!(
            resolve_shortcut('f', plain),
            Some(ShortcutAction::SelectTool(EditorTool::Bucket))
        );
        assert_eq!(
            resolve_shortcut('P', plain),
            Some(ShortcutAction::SelectTool(EditorTool::Picker))
        );
        assert_eq!(resolve_shortcut('z', plain), None);
    }
}

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "taskboard-dev",
            Profile::Prod => "taskboard",
        }
    }
}

/// Get the configuration directory path
/// If profile is Dev, uses "taskboard-dev" instead of "taskboard"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "taskboard", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path (board document, database, session, log)
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "taskboard", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Path inside the data directory, with a home-relative fallback when the
/// platform directories cannot be determined
pub fn data_file(profile: Profile, file_name: &str) -> String {
    if let Some(data_dir) = get_data_dir(profile) {
        data_dir.join(file_name).to_string_lossy().to_string()
    } else {
        format!("~/.local/share/{}/{}", profile.app_name(), file_name)
    }
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parsed key binding information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKeyBinding {
    pub key_code: crossterm::event::KeyCode,
    pub requires_ctrl: bool,
}

/// Check if a key event has the primary modifier (Ctrl on Windows/Linux, Option/Alt on macOS)
pub fn has_primary_modifier(modifiers: crossterm::event::KeyModifiers) -> bool {
    #[cfg(target_os = "macos")]
    {
        modifiers.contains(crossterm::event::KeyModifiers::CONTROL)
            || modifiers.contains(crossterm::event::KeyModifiers::ALT)
    }

    #[cfg(not(target_os = "macos"))]
    {
        modifiers.contains(crossterm::event::KeyModifiers::CONTROL)
    }
}

/// Format a key binding string for display, showing the platform-appropriate modifier
pub fn format_key_binding_for_display(key_binding: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        key_binding.replace("Ctrl+", "Opt+")
    }

    #[cfg(not(target_os = "macos"))]
    {
        key_binding.to_string()
    }
}

/// Parse a key binding string from config into a ParsedKeyBinding
/// Supports: single keys ("q", "n", "j", "k"), special keys ("Enter", "Left", "Space"),
/// and modifiers ("Ctrl+r")
pub fn parse_key_binding(key_str: &str) -> Result<ParsedKeyBinding, String> {
    let key_str = key_str.trim();

    if let Some(key_part) = key_str.strip_prefix("Ctrl+") {
        let key_code = parse_key_code(key_part)?;
        return Ok(ParsedKeyBinding {
            key_code,
            requires_ctrl: true,
        });
    }

    let key_code = parse_key_code(key_str)?;
    Ok(ParsedKeyBinding {
        key_code,
        requires_ctrl: false,
    })
}

/// Parse a key code from a string (without modifiers)
fn parse_key_code(key_str: &str) -> Result<crossterm::event::KeyCode, String> {
    use crossterm::event::KeyCode;

    match key_str {
        "Enter" => Ok(KeyCode::Enter),
        "Esc" | "Escape" => Ok(KeyCode::Esc),
        "Backspace" => Ok(KeyCode::Backspace),
        "Tab" => Ok(KeyCode::Tab),
        "Space" | " " => Ok(KeyCode::Char(' ')),
        "Left" => Ok(KeyCode::Left),
        "Right" => Ok(KeyCode::Right),
        "Up" => Ok(KeyCode::Up),
        "Down" => Ok(KeyCode::Down),
        "Home" => Ok(KeyCode::Home),
        "End" => Ok(KeyCode::End),
        "Delete" => Ok(KeyCode::Delete),
        _ => {
            if let Some(n) = key_str.strip_prefix('F') {
                if let Ok(n) = n.parse::<u8>() {
                    if (1..=12).contains(&n) {
                        return Ok(KeyCode::F(n));
                    }
                }
            }
            let mut chars = key_str.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(KeyCode::Char(c)),
                _ => Err(format!("Unknown key binding: {}", key_str)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;

    #[test]
    fn test_parse_single_char() {
        let parsed = parse_key_binding("q").unwrap();
        assert_eq!(parsed.key_code, KeyCode::Char('q'));
        assert!(!parsed.requires_ctrl);
    }

    #[test]
    fn test_parse_named_keys() {
        assert_eq!(parse_key_binding("Space").unwrap().key_code, KeyCode::Char(' '));
        assert_eq!(parse_key_binding("Enter").unwrap().key_code, KeyCode::Enter);
        assert_eq!(parse_key_binding("F1").unwrap().key_code, KeyCode::F(1));
        assert_eq!(parse_key_binding("F12").unwrap().key_code, KeyCode::F(12));
    }

    #[test]
    fn test_parse_ctrl_modifier() {
        let parsed = parse_key_binding("Ctrl+r").unwrap();
        assert_eq!(parsed.key_code, KeyCode::Char('r'));
        assert!(parsed.requires_ctrl);
    }

    #[test]
    fn test_parse_unknown_key() {
        assert!(parse_key_binding("Hyper").is_err());
        assert!(parse_key_binding("F13").is_err());
    }

    #[test]
    fn test_expand_path_leaves_absolute_paths_alone() {
        assert_eq!(expand_path("/tmp/board.json"), PathBuf::from("/tmp/board.json"));
    }
}

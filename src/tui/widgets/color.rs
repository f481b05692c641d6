use ratatui::style::Color;

/// Parse a theme color string.
///
/// Accepts the terminal color names (`red`, `lightblue`, `darkgray`, ...),
/// `#RRGGBB`, `#RGB` and `rgb(r, g, b)`. Anything else falls back to white so
/// a typo in the config never stops the board from drawing.
pub fn parse_color(color_str: &str) -> Color {
    let s = color_str.trim().to_lowercase();

    let named = match s.as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        // ratatui has no separate light gray
        "gray" | "grey" | "lightgray" | "lightgrey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "lightred" => Some(Color::LightRed),
        "lightgreen" => Some(Color::LightGreen),
        "lightyellow" => Some(Color::LightYellow),
        "lightblue" => Some(Color::LightBlue),
        "lightmagenta" => Some(Color::LightMagenta),
        "lightcyan" => Some(Color::LightCyan),
        _ => None,
    };

    named
        .or_else(|| s.strip_prefix('#').and_then(parse_hex_color))
        .or_else(|| parse_rgb_color(&s))
        .unwrap_or(Color::White)
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => {
            // #abc is shorthand for #aabbcc
            let expand = |v: u8| (v << 4) | v;
            Some(Color::Rgb(expand(channel(0..1)?), expand(channel(1..2)?), expand(channel(2..3)?)))
        }
        _ => None,
    }
}

fn parse_rgb_color(s: &str) -> Option<Color> {
    let content = s.strip_prefix("rgb(")?.strip_suffix(')')?;
    let mut parts = content.split(',').map(|p| p.trim().parse::<u8>());
    let r = parts.next()?.ok()?;
    let g = parts.next()?.ok()?;
    let b = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Color::Rgb(r, g, b))
}

/// Format a Color back to the string form `parse_color` accepts
pub fn format_color_for_display(color: &Color) -> String {
    let name = match color {
        Color::Black => "black",
        Color::Red => "red",
        Color::Green => "green",
        Color::Yellow => "yellow",
        Color::Blue => "blue",
        Color::Magenta => "magenta",
        Color::Cyan => "cyan",
        Color::White => "white",
        Color::Gray => "gray",
        Color::DarkGray => "darkgray",
        Color::LightRed => "lightred",
        Color::LightGreen => "lightgreen",
        Color::LightYellow => "lightyellow",
        Color::LightBlue => "lightblue",
        Color::LightMagenta => "lightmagenta",
        Color::LightCyan => "lightcyan",
        Color::Rgb(r, g, b) => return format!("#{:02X}{:02X}{:02X}", r, g, b),
        Color::Indexed(_) => "indexed",
        Color::Reset => "reset",
    };
    name.to_string()
}

/// WCAG relative luminance of an RGB color, 0.0 (dark) to 1.0 (light)
fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// Black or white, whichever reads better on `background`
pub fn get_contrast_text_color(background: Color) -> Color {
    let dark = match background {
        Color::Rgb(r, g, b) => relative_luminance(r, g, b) < 0.5,
        // Gray renders light in most terminals
        other => matches!(other, Color::Black | Color::Blue | Color::Magenta | Color::Red),
    };
    if dark { Color::White } else { Color::Black }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_hex() {
        assert_eq!(parse_color("Blue"), Color::Blue);
        assert_eq!(parse_color("lightgrey"), Color::Gray);
        assert_eq!(parse_color("#FF8000"), Color::Rgb(255, 128, 0));
        assert_eq!(parse_color("#0f0"), Color::Rgb(0, 255, 0));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Color::Rgb(1, 2, 3));
    }

    #[test]
    fn test_unknown_falls_back_to_white() {
        assert_eq!(parse_color("not-a-color"), Color::White);
        assert_eq!(parse_color("#12"), Color::White);
        assert_eq!(parse_color("rgb(1,2)"), Color::White);
        assert_eq!(parse_color("rgb(1,2,3,4)"), Color::White);
    }

    #[test]
    fn test_format_matches_parse() {
        assert_eq!(format_color_for_display(&Color::DarkGray), "darkgray");
        assert_eq!(format_color_for_display(&Color::Rgb(18, 52, 86)), "#123456");
        assert_eq!(parse_color(&format_color_for_display(&Color::LightCyan)), Color::LightCyan);
    }

    #[test]
    fn test_contrast() {
        assert_eq!(get_contrast_text_color(Color::Black), Color::White);
        assert_eq!(get_contrast_text_color(Color::Yellow), Color::Black);
        assert_eq!(get_contrast_text_color(Color::Rgb(20, 20, 40)), Color::White);
        assert_eq!(get_contrast_text_color(Color::Rgb(240, 240, 240)), Color::Black);
    }
}

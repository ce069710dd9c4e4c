//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Header and status bar background.
pub const DEEP_BLUE: Color = Color::Rgb(7, 89, 133);
/// Completed tasks and inactive projects.
pub const MUTED: Color = Color::DarkGray;

/// Convert a goal's `#rrggbb` colour to a terminal colour.
/// Anything unparseable falls back to the default goal blue.
pub fn goal_color(hex: &str) -> Color {
    let parse = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.strip_prefix('#') {
        Some(h) if h.len() == 6 && h.is_ascii() => {
            match (parse(&h[0..2]), parse(&h[2..4]), parse(&h[4..6])) {
                (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
                _ => DEEP_BLUE,
            }
        }
        _ => DEEP_BLUE,
    }
}

/// Pick readable text for a background colour.
pub fn text_on(bg: Color) -> Color {
    match bg {
        Color::Rgb(r, g, b) if (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000 > 150 => {
            Color::Rgb(20, 20, 20)
        }
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_color() {
        assert_eq!(goal_color("#075985"), Color::Rgb(7, 89, 133));
        assert_eq!(goal_color("#FFD700"), Color::Rgb(255, 215, 0));
        assert_eq!(goal_color("bg-[#115E59]"), DEEP_BLUE);
        assert_eq!(goal_color("#12345"), DEEP_BLUE);
    }

    #[test]
    fn test_text_on() {
        assert_eq!(text_on(Color::Rgb(255, 215, 0)), Color::Rgb(20, 20, 20));
        assert_eq!(text_on(DEEP_BLUE), Color::White);
    }
}

//! Signal value synthesis
//!
//! Decides whether a scalar is visually observable and, if so, produces a
//! replacement that is maximally distinguishable from anything a real theme
//! would use. The classifier is biased towards false negatives: skipping a
//! visual property costs coverage, signalling a behavioural one corrupts diffs.

use crate::document::ScalarValue;
use serde_json::Number;

/// Sentinel color injected into color-like strings
pub const SIGNAL_COLOR: &str = "rgb(1, 2, 3)";

/// Exaggerated font size injected into pixel-size strings
pub const SIGNAL_FONT_SIZE: &str = "999px";

/// Offset added to visual numeric values
pub const NUMERIC_SIGNAL_OFFSET: i64 = 10;

/// Path keywords marking a number as visual
const VISUAL_NUMBER_KEYWORDS: [&str; 5] = ["size", "width", "radius", "opacity", "weight"];

/// Signal value for `current` at `path`, or `None` to skip the path
pub fn synthesize(path: &str, current: &ScalarValue) -> Option<ScalarValue> {
    let path_lower = path.to_lowercase();

    match current {
        // Flipping flags can change behaviour, not just appearance
        ScalarValue::Bool(_) => None,

        ScalarValue::String(value) => {
            if is_color_like(&path_lower, value) {
                return Some(ScalarValue::string(SIGNAL_COLOR));
            }
            if path_lower.contains("size") && has_pixel_length(value) {
                return Some(ScalarValue::string(SIGNAL_FONT_SIZE));
            }
            None
        }

        ScalarValue::Number(number) => {
            if !VISUAL_NUMBER_KEYWORDS.iter().any(|k| path_lower.contains(k)) {
                return None;
            }
            offset_number(number).map(ScalarValue::Number)
        }
    }
}

fn is_color_like(path_lower: &str, value: &str) -> bool {
    if path_lower.contains("color") || path_lower.contains("gradient") {
        return true;
    }
    let value = value.trim().to_lowercase();
    value.starts_with('#') || value.contains("rgb") || value.contains("hsl")
}

/// True if `value` contains a digit immediately followed by `px`
fn has_pixel_length(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes
        .windows(3)
        .any(|w| w[0].is_ascii_digit() && w[1] == b'p' && w[2] == b'x')
}

fn offset_number(number: &Number) -> Option<Number> {
    if let Some(int) = number.as_i64() {
        return int.checked_add(NUMERIC_SIGNAL_OFFSET).map(Number::from);
    }
    number
        .as_f64()
        .and_then(|f| Number::from_f64(f + NUMERIC_SIGNAL_OFFSET as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_paths_and_values() {
        let signal = Some(ScalarValue::string(SIGNAL_COLOR));
        assert_eq!(synthesize("/a/color", &"#111111".into()), signal);
        assert_eq!(synthesize("/header/backgroundColor", &"navy".into()), signal);
        assert_eq!(synthesize("/hero/gradient", &"linear".into()), signal);
        assert_eq!(synthesize("/accent", &"#abc".into()), signal);
        assert_eq!(synthesize("/accent", &"rgba(0,0,0,0.5)".into()), signal);
        assert_eq!(synthesize("/accent", &"hsl(120, 50%, 50%)".into()), signal);
    }

    #[test]
    fn test_pixel_font_size() {
        assert_eq!(
            synthesize("/title/fontSize", &"18px".into()),
            Some(ScalarValue::string(SIGNAL_FONT_SIZE))
        );
        // Size path without a pixel length is not observable
        assert_eq!(synthesize("/title/fontSize", &"large".into()), None);
        // Pixel length on a non-size path is not either
        assert_eq!(synthesize("/title/margin", &"4px".into()), None);
    }

    #[test]
    fn test_no_signal_for_booleans_and_plain_strings() {
        assert_eq!(synthesize("/header/color", &true.into()), None);
        assert_eq!(synthesize("/labels/title", &"Wallet".into()), None);
        assert_eq!(synthesize("/font/family", &"Inter".into()), None);
    }

    #[test]
    fn test_numbers_need_visual_keyword() {
        assert_eq!(synthesize("/card/borderRadius", &12.into()), Some(ScalarValue::from(22)));
        assert_eq!(synthesize("/text/weight", &400.into()), Some(ScalarValue::from(410)));
        assert_eq!(synthesize("/animation/duration", &300.into()), None);

        let opacity = ScalarValue::Number(Number::from_f64(0.5).unwrap());
        let expected = ScalarValue::Number(Number::from_f64(10.5).unwrap());
        assert_eq!(synthesize("/overlay/opacity", &opacity), Some(expected));
    }

    #[test]
    fn test_pixel_detection() {
        assert!(has_pixel_length("12px"));
        assert!(has_pixel_length("calc(100% - 8px)"));
        assert!(!has_pixel_length("px"));
        assert!(!has_pixel_length("1.5em"));
    }
}

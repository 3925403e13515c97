use crate::color::Rgb;

/// Parse `#rgb`, `#rrggbb` or a basic named colour.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let s = value.trim().to_ascii_lowercase();
    // HEX
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            return Some(Rgb { r, g, b });
        } else if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some(Rgb { r, g, b });
        }
        return None;
    }

    let (r, g, b) = match s.as_str() {
        "black" => (0, 0, 0),
        "gray" | "grey" => (128, 128, 128),
        "navy" => (0, 0, 128),
        "silver" => (192, 192, 192),
        "white" => (255, 255, 255),
        _ => return None,
    };
    Some(Rgb { r, g, b })
}

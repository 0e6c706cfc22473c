use crate::foundation::core::Rgba8;

/// Parse a template color string.
///
/// Accepts `#RGB`, `#RRGGBB`, `#RRGGBBAA` (the `#` is optional, hex is case-insensitive) and the
/// names `white`, `black` and `transparent`.
pub fn parse_color(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "white" => return Ok(Rgba8::WHITE),
        "black" => return Ok(Rgba8::BLACK),
        "transparent" => return Ok(Rgba8::TRANSPARENT),
        _ => {}
    }
    let hex = s.strip_prefix('#').unwrap_or(s);
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("invalid color \"{s}\""));
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    fn hex_nibble(c: &str) -> Result<u8, String> {
        let v = hex_byte(c)?;
        Ok(v * 17)
    }

    let (r, g, b, a) = match hex.len() {
        3 => (
            hex_nibble(&hex[0..1])?,
            hex_nibble(&hex[1..2])?,
            hex_nibble(&hex[2..3])?,
            255,
        ),
        6 => (
            hex_byte(&hex[0..2])?,
            hex_byte(&hex[2..4])?,
            hex_byte(&hex[4..6])?,
            255,
        ),
        8 => (
            hex_byte(&hex[0..2])?,
            hex_byte(&hex[2..4])?,
            hex_byte(&hex[4..6])?,
            hex_byte(&hex[6..8])?,
        ),
        _ => {
            return Err(format!(
                "color \"{s}\" must be #RGB, #RRGGBB or #RRGGBBAA (case-insensitive)"
            ));
        }
    };
    Ok(Rgba8 { r, g, b, a })
}

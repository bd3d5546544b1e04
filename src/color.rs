pub type Rgb = [u8; 3];

pub const BACKGROUND: Rgb = [0, 0, 0];
pub const TEXT: Rgb = [255, 255, 255];
pub const GRID: Rgb = [128, 0, 128];
pub const MARKER: Rgb = [128, 128, 0];
pub const INTERSECTION: Rgb = [0, 255, 0];
pub const EDIT: Rgb = [255, 0, 0];

/// Trace colors, reused in order when there are more channels.
pub const PALETTE: [Rgb; 6] = [
    [255, 255, 255],
    [0, 255, 255],
    [77, 0, 255],
    [255, 0, 179],
    [255, 102, 0],
    [255, 204, 0],
];

pub fn palette(index: usize) -> Rgb {
    PALETTE[index % PALETTE.len()]
}

/// Parse `RRGGBB`, optionally prefixed by `0x` and/or `#`.
pub fn parse_color(raw: &str) -> Option<Rgb> {
    let hex = raw.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    let hex = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some([(value >> 16) as u8, (value >> 8) as u8, value as u8])
}

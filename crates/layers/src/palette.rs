use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 8-bit sRGB colour.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Parses `#rrggbb`, `0xrrggbb` or bare `rrggbb`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_hex)
    }

    pub fn to_rgba_f32(self, alpha: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            alpha,
        ]
    }

    pub fn to_unit_f64(self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u32),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Rgb::parse(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid colour: {s}"))),
            Repr::Number(n) if n <= 0xff_ffff => Ok(Rgb::from_hex(n)),
            Repr::Number(n) => Err(serde::de::Error::custom(format!(
                "colour out of range: {n:#x}"
            ))),
        }
    }
}

/// Colours used by the compositor and the line layers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Rgb,
    pub ocean: Rgb,
    pub land: Rgb,
    pub borders: Rgb,
    pub borders_opacity: f32,
    pub selected_fill: Rgb,
    pub selected_stroke: Rgb,
    pub hover_fill: Rgb,
    pub hover_opacity: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb::from_hex(0x000000),
            ocean: Rgb::from_hex(0x0b3d91),
            land: Rgb::from_hex(0x2e8b57),
            borders: Rgb::from_hex(0xffffff),
            borders_opacity: 0.9,
            selected_fill: Rgb::from_hex(0xff3b30),
            selected_stroke: Rgb::from_hex(0xff3b30),
            hover_fill: Rgb::from_hex(0xffc04d),
            hover_opacity: 0.35,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Palette, Rgb};

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgb::parse("#0b3d91"), Some(Rgb::from_hex(0x0b3d91)));
        assert_eq!(Rgb::parse("0x2E8B57"), Some(Rgb::from_hex(0x2e8b57)));
        assert_eq!(Rgb::parse("ffc04d"), Some(Rgb::new(0xff, 0xc0, 0x4d)));
        assert_eq!(Rgb::parse("#fff"), None);
        assert_eq!(Rgb::from_hex(0xff3b30).to_string(), "#ff3b30");
    }

    #[test]
    fn palette_accepts_strings_and_numbers() {
        let p: Palette =
            serde_json::from_str(r##"{ "ocean": "#000080", "land": 65280 }"##).unwrap();
        assert_eq!(p.ocean, Rgb::from_hex(0x000080));
        assert_eq!(p.land, Rgb::from_hex(0x00ff00));
        assert_eq!(p.hover_opacity, 0.35);
        assert!(serde_json::from_str::<Palette>(r#"{ "land": "green" }"#).is_err());
    }
}

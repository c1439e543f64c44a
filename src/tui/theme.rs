//! Catppuccin-derived palette for the terminal reader.

use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeVariant {
    /// Dark (default)
    #[default]
    Mocha,
    /// Light
    Latte,
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub text: Color,
    pub subtext: Color,
    pub overlay: Color,
    pub surface: Color,
    pub base: Color,
    pub red: Color,
    pub green: Color,
    pub yellow: Color,
    pub sky: Color,
    pub blue: Color,
    pub lavender: Color,
    pub peach: Color,
}

impl Theme {
    pub fn new(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Mocha => Self {
                text: Color::Rgb(0xcd, 0xd6, 0xf4),
                subtext: Color::Rgb(0xba, 0xc2, 0xde),
                overlay: Color::Rgb(0x7f, 0x84, 0x9c),
                surface: Color::Rgb(0x31, 0x32, 0x44),
                base: Color::Rgb(0x1e, 0x1e, 0x2e),
                red: Color::Rgb(0xf3, 0x8b, 0xa8),
                green: Color::Rgb(0xa6, 0xe3, 0xa1),
                yellow: Color::Rgb(0xf9, 0xe2, 0xaf),
                sky: Color::Rgb(0x89, 0xdc, 0xeb),
                blue: Color::Rgb(0x89, 0xb4, 0xfa),
                lavender: Color::Rgb(0xb4, 0xbe, 0xfe),
                peach: Color::Rgb(0xfa, 0xb3, 0x87),
            },
            ThemeVariant::Latte => Self {
                text: Color::Rgb(0x4c, 0x4f, 0x69),
                subtext: Color::Rgb(0x5c, 0x5f, 0x77),
                overlay: Color::Rgb(0x8c, 0x8f, 0xa1),
                surface: Color::Rgb(0xcc, 0xd0, 0xda),
                base: Color::Rgb(0xef, 0xf1, 0xf5),
                red: Color::Rgb(0xd2, 0x0f, 0x39),
                green: Color::Rgb(0x40, 0xa0, 0x2b),
                yellow: Color::Rgb(0xdf, 0x8e, 0x1d),
                sky: Color::Rgb(0x04, 0xa5, 0xe5),
                blue: Color::Rgb(0x1e, 0x66, 0xf5),
                lavender: Color::Rgb(0x72, 0x87, 0xfd),
                peach: Color::Rgb(0xfe, 0x64, 0x0b),
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeVariant::default())
    }
}

//! Colour palettes for the sparkline plotter.

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Palette {
    pub name: &'static str,
    /// Body text
    pub text: Color,
    /// Header and status bar background
    pub bar: Color,
    /// The plotted trace
    pub trace: Color,
    /// Borders and key hints
    pub muted: Color,
    pub accent: Color,
    pub alert: Color,
}

impl Palette {
    pub const fn dark() -> Self {
        Self {
            name: "dark",
            text: Color::Rgb(205, 214, 244),
            bar: Color::Rgb(69, 71, 90),
            trace: Color::Rgb(166, 227, 161),
            muted: Color::Rgb(108, 112, 134),
            accent: Color::Rgb(203, 166, 247),
            alert: Color::Rgb(243, 139, 168),
        }
    }

    pub const fn light() -> Self {
        Self {
            name: "light",
            text: Color::Rgb(76, 79, 105),
            bar: Color::Rgb(204, 208, 218),
            trace: Color::Rgb(30, 102, 245),
            muted: Color::Rgb(140, 143, 161),
            accent: Color::Rgb(136, 57, 239),
            alert: Color::Rgb(210, 15, 57),
        }
    }

    pub const fn nord() -> Self {
        Self {
            name: "nord",
            text: Color::Rgb(216, 222, 233),
            bar: Color::Rgb(67, 76, 94),
            trace: Color::Rgb(136, 192, 208),
            muted: Color::Rgb(107, 112, 137),
            accent: Color::Rgb(180, 142, 173),
            alert: Color::Rgb(191, 97, 106),
        }
    }

    pub fn by_name(name: &str) -> Option<&'static Palette> {
        PALETTES.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::dark()
    }
}

pub static PALETTES: &[Palette] = &[Palette::dark(), Palette::light(), Palette::nord()];

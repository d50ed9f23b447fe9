//! Stable label colors.
//!
//! Every label maps to the same color in every graph, so a thread or task
//! action keeps its color across reports. Two hash families feed the theme
//! formulas:
//!
//! - **seeded**: the label is hashed with 32-bit FNV-1a, a ChaCha8 generator
//!   is seeded with that hash, and its first three `f64` draws become
//!   `v1`, `v2`, `v3`. The generator is seeded afresh on every call, so the
//!   three draws differ from each other but are identical on every run and
//!   every platform.
//! - **positional**: a weighted walk over the first characters of the label,
//!   which gives labels sharing a prefix similar hues.

use crate::utils::config::{DOUBLE_SEPARATOR_COLOR, SEPARATOR_COLOR};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// An RGB color, rendered as `rgb(r,g,b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    const fn from_tuple((r, g, b): (u8, u8, u8)) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Named color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Hot,
    Java,
    Mem,
    Io,
    Wakeup,
    Chain,
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Aqua,
    Orange,
}

impl Theme {
    pub const ALL: [Theme; 13] = [
        Theme::Hot,
        Theme::Java,
        Theme::Mem,
        Theme::Io,
        Theme::Wakeup,
        Theme::Chain,
        Theme::Red,
        Theme::Green,
        Theme::Blue,
        Theme::Yellow,
        Theme::Purple,
        Theme::Aqua,
        Theme::Orange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Hot => "hot",
            Theme::Java => "java",
            Theme::Mem => "mem",
            Theme::Io => "io",
            Theme::Wakeup => "wakeup",
            Theme::Chain => "chain",
            Theme::Red => "red",
            Theme::Green => "green",
            Theme::Blue => "blue",
            Theme::Yellow => "yellow",
            Theme::Purple => "purple",
            Theme::Aqua => "aqua",
            Theme::Orange => "orange",
        }
    }

    /// Exact theme lookup
    pub fn parse(name: &str) -> Option<Theme> {
        Theme::ALL.into_iter().find(|theme| theme.name() == name)
    }

    /// Theme lookup that falls back to `hot` for unknown names
    pub fn from_name(name: &str) -> Theme {
        Theme::parse(name).unwrap_or_default()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base hues shared by the single-hue themes and the `java` classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hue {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Aqua,
    Orange,
}

/// Which hash family produces the three draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashMode {
    #[default]
    Seeded,
    Positional,
}

/// The three values in [0, 1) combined by the theme formulas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draws {
    pub v1: f64,
    pub v2: f64,
    pub v3: f64,
}

impl Draws {
    /// Seeded draws for a label
    pub fn seeded(label: &str) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(label_seed(label)));
        Self {
            v1: rng.random(),
            v2: rng.random(),
            v3: rng.random(),
        }
    }

    /// Positional draws: forward hash, then the hash of the reversed label
    pub fn positional(label: &str) -> Self {
        let reversed: String = label.chars().rev().collect();
        let back = namehash(&reversed);
        Self {
            v1: namehash(label),
            v2: back,
            v3: back,
        }
    }

    fn for_mode(label: &str, mode: HashMode) -> Self {
        match mode {
            HashMode::Seeded => Self::seeded(label),
            HashMode::Positional => Self::positional(label),
        }
    }
}

/// 32-bit FNV-1a over the UTF-8 bytes of the label
pub fn label_seed(label: &str) -> u32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    label
        .bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(PRIME))
}

/// Weighted positional hash in [0, 1]
///
/// Text up to the last backtick (a module qualifier) is ignored. Early
/// characters weigh more than later ones, and only the first few count.
pub fn namehash(name: &str) -> f64 {
    let name = name.rsplit_once('`').map(|(_, rest)| rest).unwrap_or(name);

    let mut vector = 0.0;
    let mut weight = 1.0;
    let mut max = 1.0;
    let mut modulus: u32 = 10;

    for c in name.chars() {
        let i = f64::from(u32::from(c) % modulus);
        vector += (i / f64::from(modulus - 1)) * weight;
        max += weight;
        weight *= 0.70;
        if modulus > 12 {
            break;
        }
        modulus += 1;
    }

    1.0 - vector / max
}

static JAVA_PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(java|javax|jdk|net|org|com|io|sun)/").expect("valid regex")
});

/// Pick a base hue from frame annotations and naming conventions
pub fn classify_java(label: &str) -> Hue {
    if label.contains("_[j]") {
        Hue::Green // compiled
    } else if label.contains("_[i]") {
        Hue::Aqua // inlined
    } else if label.contains("_[k]") {
        Hue::Orange // kernel
    } else if JAVA_PACKAGE.is_match(label) || label.contains(":::") {
        Hue::Green
    } else if label.contains("::") {
        Hue::Yellow // C++
    } else {
        Hue::Red // system
    }
}

/// `base + trunc(scale * v)`, clamped to a channel
fn channel(base: u8, scale: f64, v: f64) -> u8 {
    (f64::from(base) + (scale * v).trunc()).clamp(0.0, 255.0) as u8
}

/// Single-hue formulas; only `v1` is used
pub fn hue_color(hue: Hue, v1: f64) -> Rgb {
    match hue {
        Hue::Red => {
            let x = channel(50, 80.0, v1);
            Rgb::new(channel(200, 55.0, v1), x, x)
        }
        Hue::Green => {
            let x = channel(50, 60.0, v1);
            Rgb::new(x, channel(200, 55.0, v1), x)
        }
        Hue::Blue => {
            let x = channel(80, 60.0, v1);
            Rgb::new(x, x, channel(205, 50.0, v1))
        }
        Hue::Yellow => {
            let x = channel(175, 55.0, v1);
            Rgb::new(x, x, channel(50, 20.0, v1))
        }
        Hue::Purple => {
            let x = channel(190, 65.0, v1);
            Rgb::new(x, channel(80, 60.0, v1), x)
        }
        Hue::Aqua => {
            let g = channel(165, 55.0, v1);
            Rgb::new(channel(50, 60.0, v1), g, g)
        }
        Hue::Orange => Rgb::new(channel(190, 65.0, v1), channel(90, 65.0, v1), 0),
    }
}

/// Color for a label under a theme, using seeded draws
///
/// **Public** - main entry point for coloring
pub fn color_for(label: &str, theme: Theme) -> Rgb {
    color_with_mode(label, theme, HashMode::Seeded)
}

/// Same as [`color_for`], with a theme given by name (unknown names use `hot`)
pub fn color_for_name(label: &str, theme: &str) -> Rgb {
    color_for(label, Theme::from_name(theme))
}

/// Color for a label under a theme and hash family
pub fn color_with_mode(label: &str, theme: Theme, mode: HashMode) -> Rgb {
    match label {
        "--" => return Rgb::from_tuple(DOUBLE_SEPARATOR_COLOR),
        "-" => return Rgb::from_tuple(SEPARATOR_COLOR),
        _ => {}
    }

    let Draws { v1, v2, v3 } = Draws::for_mode(label, mode);

    match theme {
        Theme::Hot => Rgb::new(
            channel(205, 50.0, v3),
            channel(0, 230.0, v1),
            channel(0, 55.0, v2),
        ),
        Theme::Mem => Rgb::new(0, channel(190, 50.0, v2), channel(0, 210.0, v1)),
        Theme::Io => {
            let x = channel(80, 60.0, v1);
            Rgb::new(x, x, channel(190, 55.0, v2))
        }
        Theme::Java => hue_color(classify_java(label), v1),
        Theme::Wakeup => hue_color(Hue::Aqua, v1),
        Theme::Chain if label.contains("_[w]") => hue_color(Hue::Aqua, v1),
        Theme::Chain => hue_color(Hue::Blue, v1),
        Theme::Red => hue_color(Hue::Red, v1),
        Theme::Green => hue_color(Hue::Green, v1),
        Theme::Blue => hue_color(Hue::Blue, v1),
        Theme::Yellow => hue_color(Hue::Yellow, v1),
        Theme::Purple => hue_color(Hue::Purple, v1),
        Theme::Aqua => hue_color(Hue::Aqua, v1),
        Theme::Orange => hue_color(Hue::Orange, v1),
    }
}

const COLD: Rgb = Rgb::new(65, 105, 225);
const HOT: Rgb = Rgb::new(220, 40, 30);

/// Hot-to-cold gradient for a share of the parent, in percent
///
/// 0% is cold blue, 100% hot red; values outside the range are clamped.
pub fn gradient_color(percentage: f64) -> Rgb {
    let t = if percentage.is_finite() {
        (percentage / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mix = |cold: u8, hot: u8| -> u8 {
        (f64::from(cold) + (f64::from(hot) - f64::from(cold)) * t).round() as u8
    };

    Rgb::new(mix(COLD.r, HOT.r), mix(COLD.g, HOT.g), mix(COLD.b, HOT.b))
}

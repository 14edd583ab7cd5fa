#![forbid(unsafe_code)]

//! Per-style options, loadable from TOML or JSON.
//!
//! Every top-level [`TabStyle`] carries its own [`Options`]. A change to a
//! single field is described by an [`OptionChange`]; the host screen reacts
//! to the matching [`OptionKind`].
//!
//! # Loading
//!
//! ```toml
//! # cellorama.toml
//! [grid]
//! columns = 3
//! items = 12
//!
//! [mixed]
//! animate = true
//! transitions = true
//! ```
//!
//! ```rust,ignore
//! let settings = Settings::from_toml_file("cellorama.toml")?;
//! let settings = Settings::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! Ten sections of twenty small leaves, one column, not animated. The grid
//! style defaults to two columns.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use cellorama_core::generate::{Fill, SectionStyle};
use cellorama_core::item::{Arrangement, DEFAULT_SEGMENTS, SizeClass};
use serde::{Deserialize, Serialize};

use crate::error::{CelloramaError, Result};

/// Upper bound for section and item counts.
pub const MAX_COUNT: usize = 100;

/// Upper bound for the column count.
pub const MAX_COLUMNS: u16 = 5;

/// Default animation period.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;

// ---------------------------------------------------------------------------
// Option kinds and changes
// ---------------------------------------------------------------------------

/// Which option changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionKind {
    Animate,
    Legacy,
    Sections,
    Items,
    Size,
    Columns,
    Transitions,
}

impl OptionKind {
    pub const ALL: [OptionKind; 7] = [
        OptionKind::Animate,
        OptionKind::Legacy,
        OptionKind::Sections,
        OptionKind::Items,
        OptionKind::Size,
        OptionKind::Columns,
        OptionKind::Transitions,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            OptionKind::Animate => "Animate",
            OptionKind::Legacy => "Legacy layout",
            OptionKind::Sections => "Section count",
            OptionKind::Items => "Item count",
            OptionKind::Size => "Card size",
            OptionKind::Columns => "Column count",
            OptionKind::Transitions => "Transitions",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A new value for one option.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "option", content = "value")]
pub enum OptionChange {
    Animate(bool),
    Legacy(bool),
    Sections(usize),
    Items(usize),
    Size(SizeClass),
    Columns(u16),
    Transitions(bool),
}

impl OptionChange {
    #[must_use]
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionChange::Animate(_) => OptionKind::Animate,
            OptionChange::Legacy(_) => OptionKind::Legacy,
            OptionChange::Sections(_) => OptionKind::Sections,
            OptionChange::Items(_) => OptionKind::Items,
            OptionChange::Size(_) => OptionKind::Size,
            OptionChange::Columns(_) => OptionKind::Columns,
            OptionChange::Transitions(_) => OptionKind::Transitions,
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Options for one tab style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Periodically randomize the tree.
    pub animate: bool,
    /// Use the flow family instead of the compositional one.
    pub legacy: bool,
    /// Sections under the root.
    pub sections: usize,
    /// Leaves per section.
    pub items: usize,
    /// Size class of every leaf.
    pub size: SizeClass,
    /// Columns of every grid.
    pub columns: u16,
    /// Re-roll section arrangements while animating.
    pub transitions: bool,
    /// Animation period in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            animate: false,
            legacy: false,
            sections: 10,
            items: 20,
            size: SizeClass::Small,
            columns: 1,
            transitions: false,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl Options {
    /// Store `change`, clamped to the allowed range.
    ///
    /// Returns whether the stored value changed.
    pub fn apply(&mut self, change: OptionChange) -> bool {
        fn store<T: PartialEq>(slot: &mut T, value: T) -> bool {
            let changed = *slot != value;
            *slot = value;
            changed
        }
        match change {
            OptionChange::Animate(v) => store(&mut self.animate, v),
            OptionChange::Legacy(v) => store(&mut self.legacy, v),
            OptionChange::Sections(v) => store(&mut self.sections, v.min(MAX_COUNT)),
            OptionChange::Items(v) => store(&mut self.items, v.min(MAX_COUNT)),
            OptionChange::Size(v) => store(&mut self.size, v),
            OptionChange::Columns(v) => store(&mut self.columns, v.clamp(1, MAX_COLUMNS)),
            OptionChange::Transitions(v) => store(&mut self.transitions, v),
        }
    }

    /// Validate all fields are within acceptable ranges.
    ///
    /// Returns a list of problems. An empty list means the options are
    /// valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.sections > MAX_COUNT {
            problems.push(format!(
                "sections must be in [0, {MAX_COUNT}], got {}",
                self.sections
            ));
        }
        if self.items > MAX_COUNT {
            problems.push(format!(
                "items must be in [0, {MAX_COUNT}], got {}",
                self.items
            ));
        }
        if !(1..=MAX_COLUMNS).contains(&self.columns) {
            problems.push(format!(
                "columns must be in [1, {MAX_COLUMNS}], got {}",
                self.columns
            ));
        }
        if self.tick_interval_ms == 0 {
            problems.push("tick_interval_ms must be > 0".into());
        }
        problems
    }

    /// How new nodes look under `style`.
    #[must_use]
    pub fn fill(&self, style: TabStyle) -> Fill {
        Fill {
            items: self.items,
            size: self.size,
            style: style.section_style(self.columns),
            transitions: self.transitions,
        }
    }
}

// ---------------------------------------------------------------------------
// TabStyle
// ---------------------------------------------------------------------------

/// Top-level arrangement style of a demo tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TabStyle {
    #[default]
    Zone,
    Grid,
    Carousel,
    Stack,
    Tab,
    /// Every section picks a random arrangement.
    Mixed,
}

impl TabStyle {
    pub const ALL: [TabStyle; 6] = [
        TabStyle::Zone,
        TabStyle::Grid,
        TabStyle::Carousel,
        TabStyle::Stack,
        TabStyle::Tab,
        TabStyle::Mixed,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TabStyle::Zone => "zone",
            TabStyle::Grid => "grid",
            TabStyle::Carousel => "carousel",
            TabStyle::Stack => "stack",
            TabStyle::Tab => "tab",
            TabStyle::Mixed => "mixed",
        }
    }

    /// Arrangement policy for sections of this style.
    #[must_use]
    pub fn section_style(self, columns: u16) -> SectionStyle {
        match self {
            TabStyle::Zone => SectionStyle::Fixed(Arrangement::Zone),
            TabStyle::Grid => SectionStyle::Fixed(Arrangement::grid(columns)),
            TabStyle::Carousel => SectionStyle::Fixed(Arrangement::Carousel),
            TabStyle::Stack => SectionStyle::Fixed(Arrangement::Stack),
            TabStyle::Tab => SectionStyle::Fixed(Arrangement::tab(DEFAULT_SEGMENTS)),
            TabStyle::Mixed => SectionStyle::Mixed { columns },
        }
    }
}

impl fmt::Display for TabStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TabStyle {
    type Err = CelloramaError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "random" => Ok(TabStyle::Mixed),
            _ => TabStyle::ALL
                .into_iter()
                .find(|style| style.name() == lower)
                .ok_or_else(|| CelloramaError::UnknownStyle { name: s.to_string() }),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Options for every tab style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub zone: Options,
    pub grid: Options,
    pub carousel: Options,
    pub stack: Options,
    pub tab: Options,
    pub mixed: Options,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zone: Options::default(),
            grid: Options {
                columns: 2,
                ..Options::default()
            },
            carousel: Options::default(),
            stack: Options::default(),
            tab: Options::default(),
            mixed: Options::default(),
        }
    }
}

impl Settings {
    /// Parse from a TOML string. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Load from disk, choosing the format by extension (`.json` or TOML
    /// otherwise), and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        tracing::debug!(path = %path.display(), "settings loaded");
        settings.validated()
    }

    /// `self` if every style validates, otherwise every problem found.
    pub fn validated(self) -> Result<Self> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(self)
        } else {
            Err(CelloramaError::InvalidOptions { problems })
        }
    }

    /// Problems across all styles, each prefixed with its style.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        TabStyle::ALL
            .into_iter()
            .flat_map(|style| {
                self.get(style)
                    .validate()
                    .into_iter()
                    .map(move |problem| format!("{style}.{problem}"))
            })
            .collect()
    }

    #[must_use]
    pub fn get(&self, style: TabStyle) -> &Options {
        match style {
            TabStyle::Zone => &self.zone,
            TabStyle::Grid => &self.grid,
            TabStyle::Carousel => &self.carousel,
            TabStyle::Stack => &self.stack,
            TabStyle::Tab => &self.tab,
            TabStyle::Mixed => &self.mixed,
        }
    }

    pub fn get_mut(&mut self, style: TabStyle) -> &mut Options {
        match style {
            TabStyle::Zone => &mut self.zone,
            TabStyle::Grid => &mut self.grid,
            TabStyle::Carousel => &mut self.carousel,
            TabStyle::Stack => &mut self.stack,
            TabStyle::Tab => &mut self.tab,
            TabStyle::Mixed => &mut self.mixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Options::default().validate().is_empty());
        assert!(Settings::default().validate().is_empty());
        assert_eq!(Settings::default().grid.columns, 2);
    }

    #[test]
    fn apply_reports_changes_and_clamps() {
        let mut options = Options::default();
        assert!(!options.apply(OptionChange::Sections(10)));
        assert!(options.apply(OptionChange::Sections(500)));
        assert_eq!(options.sections, MAX_COUNT);
        assert!(options.apply(OptionChange::Columns(0)));
        assert!(!options.apply(OptionChange::Columns(1)));
        assert!(options.apply(OptionChange::Columns(9)));
        assert_eq!(options.columns, MAX_COLUMNS);
        assert!(options.apply(OptionChange::Size(SizeClass::Large)));
        assert_eq!(options.size, SizeClass::Large);
    }

    #[test]
    fn change_kinds_cover_every_option() {
        let changes = [
            OptionChange::Animate(true),
            OptionChange::Legacy(true),
            OptionChange::Sections(1),
            OptionChange::Items(1),
            OptionChange::Size(SizeClass::Medium),
            OptionChange::Columns(2),
            OptionChange::Transitions(true),
        ];
        let kinds: Vec<OptionKind> = changes.iter().map(OptionChange::kind).collect();
        assert_eq!(kinds, OptionKind::ALL.to_vec());
    }

    #[test]
    fn validate_lists_every_problem() {
        let options = Options {
            sections: 101,
            items: 200,
            columns: 0,
            tick_interval_ms: 0,
            ..Options::default()
        };
        let problems = options.validate();
        assert_eq!(problems.len(), 4);
        assert!(problems[2].contains("columns"));
    }

    #[test]
    fn fill_follows_style() {
        let options = Options {
            columns: 3,
            items: 7,
            ..Options::default()
        };
        let fill = options.fill(TabStyle::Grid);
        assert_eq!(fill.items, 7);
        assert_eq!(fill.style, SectionStyle::Fixed(Arrangement::grid(3)));
        assert_eq!(
            options.fill(TabStyle::Mixed).style,
            SectionStyle::Mixed { columns: 3 }
        );
    }

    #[test]
    fn tab_style_parses_names() {
        for style in TabStyle::ALL {
            assert_eq!(style.name().parse::<TabStyle>().ok(), Some(style));
        }
        assert_eq!("Random".parse::<TabStyle>().ok(), Some(TabStyle::Mixed));
        assert!(matches!(
            "spiral".parse::<TabStyle>(),
            Err(CelloramaError::UnknownStyle { .. })
        ));
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [grid]
            columns = 3
            size = "large"

            [mixed]
            animate = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.grid.columns, 3);
        assert_eq!(settings.grid.size, SizeClass::Large);
        assert_eq!(settings.grid.sections, 10);
        assert!(settings.mixed.animate);
        assert_eq!(settings.zone, Options::default());
    }

    #[test]
    fn toml_output_parses_back() {
        let mut settings = Settings::default();
        settings.tab.size = SizeClass::XLarge;
        let text = settings.to_toml_string().unwrap();
        assert!(text.contains("[tab]"));
        assert_eq!(Settings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn json_round_trips() {
        let mut settings = Settings::default();
        settings.stack.items = 4;
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn validated_prefixes_style() {
        let mut settings = Settings::default();
        settings.carousel.columns = 0;
        let Err(CelloramaError::InvalidOptions { problems }) = settings.validated() else {
            panic!("expected invalid options");
        };
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("carousel.columns"));
    }

    #[test]
    fn option_change_serializes_tagged() {
        let json = serde_json::to_value(OptionChange::Columns(3)).unwrap();
        assert_eq!(json, serde_json::json!({"option": "columns", "value": 3}));
    }
}

#![forbid(unsafe_code)]

//! Responsive sidebar layout for chatdeck.
//!
//! A sidebar ([`AdaptiveLayout`]) lives in one of three [`LayoutPosition`]s.
//! The position follows the viewport width through [`ViewportBreakpoints`]
//! until the user picks one by hand. Buttons inside the sidebar
//! ([`AdaptiveButton`]) derive their presentation from that position, or
//! from their own measured width when they are not inside a sidebar.

pub mod adaptive;
pub mod button;

pub use adaptive::{
    AdaptiveLayout, AdaptiveLayoutConfig, Affix, AffixVisibility, LayoutChange, LayoutContext,
    LayoutPresentation, Section,
};
pub use button::{
    AdaptiveButton, ButtonConfig, ButtonId, ButtonPadding, ButtonPresentation, Justify,
};

/// Standalone buttons at or below this width render icon-only.
pub const COMPACT_BUTTON_MAX_WIDTH: u16 = 200;

/// The three sidebar states, ordered from narrowest to widest.
///
/// | Position    | Width | Labels | Typical viewport |
/// |-------------|-------|--------|------------------|
/// | `Collapsed` | 60    | hidden | < 640            |
/// | `Medium`    | 150   | shown  | 640–767          |
/// | `Expanded`  | 300   | shown  | 768+             |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LayoutPosition {
    /// Icon rail.
    Collapsed,
    /// Narrow sidebar.
    Medium,
    /// Full sidebar.
    #[default]
    Expanded,
}

impl LayoutPosition {
    /// All positions in ascending width order.
    pub const ALL: [LayoutPosition; 3] = [
        LayoutPosition::Collapsed,
        LayoutPosition::Medium,
        LayoutPosition::Expanded,
    ];

    /// Fixed sidebar width in pixels.
    #[must_use]
    pub const fn width_px(self) -> u16 {
        match self {
            LayoutPosition::Collapsed => 60,
            LayoutPosition::Medium => 150,
            LayoutPosition::Expanded => 300,
        }
    }

    /// Attribute spelling.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            LayoutPosition::Collapsed => "collapsed",
            LayoutPosition::Medium => "medium",
            LayoutPosition::Expanded => "expanded",
        }
    }

    /// Parse an attribute value. Unknown spellings map to `Medium`.
    #[must_use]
    pub fn from_attribute(value: &str) -> Self {
        match value.trim() {
            "collapsed" => LayoutPosition::Collapsed,
            "expanded" => LayoutPosition::Expanded,
            _ => LayoutPosition::Medium,
        }
    }

    /// One step wider, saturating at `Expanded`.
    #[must_use]
    pub const fn wider(self) -> Self {
        match self {
            LayoutPosition::Collapsed => LayoutPosition::Medium,
            LayoutPosition::Medium | LayoutPosition::Expanded => LayoutPosition::Expanded,
        }
    }

    /// One step narrower, saturating at `Collapsed`.
    #[must_use]
    pub const fn narrower(self) -> Self {
        match self {
            LayoutPosition::Expanded => LayoutPosition::Medium,
            LayoutPosition::Medium | LayoutPosition::Collapsed => LayoutPosition::Collapsed,
        }
    }
}

impl std::fmt::Display for LayoutPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Viewport width thresholds for automatic sidebar sizing.
///
/// Each field is the minimum viewport width for that position;
/// `Collapsed` implicitly starts at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportBreakpoints {
    /// Minimum width for `Medium`.
    pub medium: u16,
    /// Minimum width for `Expanded`.
    pub expanded: u16,
}

impl Default for ViewportBreakpoints {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ViewportBreakpoints {
    /// Default thresholds: 640 / 768.
    pub const DEFAULT: Self = Self {
        medium: 640,
        expanded: 768,
    };

    /// Create thresholds, sanitized to be non-decreasing.
    #[must_use]
    pub const fn new(medium: u16, expanded: u16) -> Self {
        let expanded = if expanded < medium { medium } else { expanded };
        Self { medium, expanded }
    }

    /// Map a viewport width to the position the sidebar should take.
    #[inline]
    #[must_use]
    pub const fn classify_width(self, width: u16) -> LayoutPosition {
        if width >= self.expanded {
            LayoutPosition::Expanded
        } else if width >= self.medium {
            LayoutPosition::Medium
        } else {
            LayoutPosition::Collapsed
        }
    }

    /// Minimum viewport width for a position.
    #[must_use]
    pub const fn threshold(self, position: LayoutPosition) -> u16 {
        match position {
            LayoutPosition::Collapsed => 0,
            LayoutPosition::Medium => self.medium,
            LayoutPosition::Expanded => self.expanded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_breakpoints_match_table() {
        let bp = ViewportBreakpoints::DEFAULT;
        assert_eq!(bp.classify_width(0), LayoutPosition::Collapsed);
        assert_eq!(bp.classify_width(639), LayoutPosition::Collapsed);
        assert_eq!(bp.classify_width(640), LayoutPosition::Medium);
        assert_eq!(bp.classify_width(767), LayoutPosition::Medium);
        assert_eq!(bp.classify_width(768), LayoutPosition::Expanded);
        assert_eq!(bp.classify_width(u16::MAX), LayoutPosition::Expanded);
    }

    #[test]
    fn breakpoints_sanitized() {
        let bp = ViewportBreakpoints::new(800, 500);
        assert_eq!(bp.expanded, 800);
        assert_eq!(bp.classify_width(799), LayoutPosition::Collapsed);
        assert_eq!(bp.classify_width(800), LayoutPosition::Expanded);
    }

    #[test]
    fn widths_are_fixed() {
        let widths: Vec<u16> = LayoutPosition::ALL.iter().map(|p| p.width_px()).collect();
        assert_eq!(widths, vec![60, 150, 300]);
    }

    #[test]
    fn attribute_parsing_falls_back_to_medium() {
        assert_eq!(
            LayoutPosition::from_attribute("collapsed"),
            LayoutPosition::Collapsed
        );
        assert_eq!(
            LayoutPosition::from_attribute("expanded"),
            LayoutPosition::Expanded
        );
        assert_eq!(LayoutPosition::from_attribute("huge"), LayoutPosition::Medium);
    }

    #[test]
    fn stepping_saturates() {
        assert_eq!(LayoutPosition::Expanded.wider(), LayoutPosition::Expanded);
        assert_eq!(LayoutPosition::Collapsed.narrower(), LayoutPosition::Collapsed);
        assert_eq!(LayoutPosition::Collapsed.wider(), LayoutPosition::Medium);
        assert_eq!(LayoutPosition::Expanded.narrower(), LayoutPosition::Medium);
    }

    #[test]
    fn threshold_round_trips_through_classify() {
        let bp = ViewportBreakpoints::DEFAULT;
        for pos in LayoutPosition::ALL {
            assert_eq!(bp.classify_width(bp.threshold(pos)), pos);
        }
    }
}

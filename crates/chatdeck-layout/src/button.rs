#![forbid(unsafe_code)]

//! Adaptive button.
//!
//! A button shows an icon, a label, or both depending on how much room it
//! has. Inside a sidebar the room is the sidebar's [`LayoutPosition`];
//! outside one it is the button's own measured width. The button holds no
//! layout state of its own: [`AdaptiveButton::presentation`] is recomputed
//! from the current inputs on every call.
//!
//! | Context          | collapsed / width <= 200 | medium | expanded              |
//! |------------------|--------------------------|--------|-----------------------|
//! | text visible     | no                       | no     | yes                   |
//! | icon visible     | yes                      | yes    | only if icon-and-text |
//! | justify          | center                   | center | normal                |

use std::rc::{Rc, Weak};

use chatdeck_core::attributes::Attributes;

use crate::adaptive::LayoutContext;
use crate::{COMPACT_BUTTON_MAX_WIDTH, LayoutPosition};

/// Index of a button owned by an [`AdaptiveLayout`](crate::AdaptiveLayout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonId(pub usize);

/// Attribute configuration of a button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonConfig {
    /// Label text.
    pub name: String,
    /// Icon class list.
    pub icon_class: String,
    /// Color/shape class list.
    pub button_class: String,
    /// Extra style classes; padding hints (`px-6`, `py-3`) are honored.
    pub styles: String,
    /// Keep the icon next to the label when expanded.
    pub icon_and_text: bool,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            name: "Chat".to_string(),
            icon_class: String::new(),
            button_class: "bg-chat-orange text-white".to_string(),
            styles: String::new(),
            icon_and_text: false,
        }
    }
}

impl ButtonConfig {
    /// Attribute names the button reacts to.
    pub const OBSERVED_ATTRIBUTES: [&'static str; 5] =
        ["name", "icon-class", "button-class", "styles", "icon-and-text"];

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn icon(mut self, icon_class: impl Into<String>) -> Self {
        self.icon_class = icon_class.into();
        self
    }

    #[must_use]
    pub fn button_class(mut self, class: impl Into<String>) -> Self {
        self.button_class = class.into();
        self
    }

    #[must_use]
    pub fn styles(mut self, styles: impl Into<String>) -> Self {
        self.styles = styles.into();
        self
    }

    #[must_use]
    pub fn icon_and_text(mut self, on: bool) -> Self {
        self.icon_and_text = on;
        self
    }

    /// Build from markup-style attributes.
    #[must_use]
    pub fn from_attributes(attrs: &Attributes) -> Self {
        let defaults = Self::default();
        Self {
            name: attrs.get_or("name", &defaults.name).to_string(),
            icon_class: attrs.get_or("icon-class", "").to_string(),
            button_class: attrs
                .get_or("button-class", &defaults.button_class)
                .to_string(),
            styles: attrs.get_or("styles", "").to_string(),
            icon_and_text: attrs.flag_default_off("icon-and-text"),
        }
    }

    /// Apply one attribute change. Returns `true` if the value changed.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        let before = self.clone();
        match name {
            "name" => self.name = value.to_string(),
            "icon-class" => self.icon_class = value.to_string(),
            "button-class" => self.button_class = value.to_string(),
            "styles" => self.styles = value.to_string(),
            "icon-and-text" => self.icon_and_text = value == "true",
            _ => return false,
        }
        *self != before
    }

    /// Padding used whenever the button is not in the compact rail.
    #[must_use]
    pub fn styled_padding(&self) -> ButtonPadding {
        let px6 = self.styles.contains("px-6");
        let py3 = self.styles.contains("py-3");
        if !self.styles.contains("px-") && !self.styles.contains("py-") {
            ButtonPadding::Default
        } else {
            ButtonPadding::Custom { px6, py3 }
        }
    }
}

/// Content alignment inside the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Normal,
    Center,
}

/// Padding treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPadding {
    /// Square icon-only button (`w-10 h-10 p-0`).
    Compact,
    /// `px-4 py-2`.
    Default,
    /// Padding taken from the configured styles.
    Custom { px6: bool, py3: bool },
}

impl ButtonPadding {
    /// Class names for this padding.
    #[must_use]
    pub fn classes(self) -> Vec<&'static str> {
        match self {
            ButtonPadding::Compact => vec!["w-10", "h-10", "p-0"],
            ButtonPadding::Default => vec!["px-4", "py-2"],
            ButtonPadding::Custom { px6, py3 } => {
                let mut out = Vec::new();
                if px6 {
                    out.push("px-6");
                }
                if py3 {
                    out.push("py-3");
                }
                out
            }
        }
    }
}

/// Everything a host needs to draw the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPresentation {
    pub text_visible: bool,
    pub icon_visible: bool,
    pub icon_enlarged: bool,
    pub justify: Justify,
    pub padding: ButtonPadding,
}

impl ButtonPresentation {
    /// Apply the rule table.
    ///
    /// `position` is the enclosing sidebar's state if there is one; otherwise
    /// `width` (the button's own measured width) decides.
    #[must_use]
    pub fn resolve(config: &ButtonConfig, position: Option<LayoutPosition>, width: u16) -> Self {
        let wide_icon = config.icon_and_text;
        match position {
            Some(LayoutPosition::Collapsed) => Self {
                text_visible: false,
                icon_visible: true,
                icon_enlarged: true,
                justify: Justify::Center,
                padding: ButtonPadding::Compact,
            },
            Some(LayoutPosition::Medium) => Self {
                text_visible: false,
                icon_visible: true,
                icon_enlarged: false,
                justify: Justify::Center,
                padding: config.styled_padding(),
            },
            Some(LayoutPosition::Expanded) => Self {
                text_visible: true,
                icon_visible: wide_icon,
                icon_enlarged: false,
                justify: Justify::Normal,
                padding: config.styled_padding(),
            },
            None if width <= COMPACT_BUTTON_MAX_WIDTH => Self {
                text_visible: false,
                icon_visible: true,
                icon_enlarged: false,
                justify: Justify::Center,
                padding: config.styled_padding(),
            },
            None => Self {
                text_visible: true,
                icon_visible: wide_icon,
                icon_enlarged: false,
                justify: Justify::Normal,
                padding: config.styled_padding(),
            },
        }
    }
}

/// A button that adapts to its sidebar or to its own width.
#[derive(Debug, Clone)]
pub struct AdaptiveButton {
    config: ButtonConfig,
    layout: Option<Weak<LayoutContext>>,
    measured_width: u16,
}

impl AdaptiveButton {
    /// A standalone button, sized by its own measured width.
    #[must_use]
    pub fn new(config: ButtonConfig) -> Self {
        Self {
            config,
            layout: None,
            measured_width: 0,
        }
    }

    /// A button that follows the given sidebar.
    #[must_use]
    pub fn attached(config: ButtonConfig, layout: &Rc<LayoutContext>) -> Self {
        Self {
            config,
            layout: Some(Rc::downgrade(layout)),
            measured_width: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ButtonConfig {
        &self.config
    }

    /// Apply an attribute change. Returns `true` if anything changed.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        let changed = self.config.set_attribute(name, value);
        if changed {
            chatdeck_core::trace!(attribute = name, "button attribute changed");
        }
        changed
    }

    /// Record the button's measured width (resize observation).
    pub fn on_resize(&mut self, width: u16) {
        self.measured_width = width;
    }

    #[must_use]
    pub fn measured_width(&self) -> u16 {
        self.measured_width
    }

    /// Sidebar position, if the button is inside a live sidebar.
    #[must_use]
    pub fn layout_position(&self) -> Option<LayoutPosition> {
        self.layout
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|ctx| ctx.position())
    }

    /// Current presentation, derived from the sidebar or measured width.
    #[must_use]
    pub fn presentation(&self) -> ButtonPresentation {
        ButtonPresentation::resolve(&self.config, self.layout_position(), self.measured_width)
    }
}

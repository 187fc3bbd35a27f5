#![forbid(unsafe_code)]

//! Click-to-open binding for a registered popup.

use std::time::Instant;

use chatdeck_core::event::MouseEvent;

use crate::popup::{OpenOptions, PopupError, PopupId, PopupRegistry};

/// Opens `target` at the click position, merged over preset options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupTrigger {
    target: PopupId,
    preset: OpenOptions,
    label: String,
}

impl PopupTrigger {
    #[must_use]
    pub fn new(target: PopupId) -> Self {
        Self {
            target,
            preset: OpenOptions::default(),
            label: String::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, preset: OpenOptions) -> Self {
        self.preset = preset;
        self
    }

    /// Button text when the trigger renders its own button.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn target(&self) -> &PopupId {
        &self.target
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Handle a click on the trigger. Non-click events are ignored.
    ///
    /// Returns `Ok(false)` when the event was not a left click.
    pub fn on_click(
        &self,
        registry: &mut PopupRegistry,
        mouse: &MouseEvent,
        now: Instant,
    ) -> Result<bool, PopupError> {
        if !mouse.is_left_click() {
            return Ok(false);
        }
        let options = OpenOptions::new()
            .position(mouse.position())
            .or(&self.preset);
        registry.open(&self.target, options, now)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::popup::{PopupConfig, PopupMode};
    use chatdeck_core::event::{MouseButton, MouseEventKind};
    use chatdeck_core::geometry::{Point, Rect, Size};

    #[test]
    fn click_opens_at_pointer() {
        let now = Instant::now();
        let mut reg = PopupRegistry::new(Size::new(400, 300));
        let menu = reg.register(PopupConfig::with_id("menu"));
        let trigger = PopupTrigger::new(menu.clone()).with_options(
            OpenOptions::new()
                .mode(PopupMode::Contextual)
                .title("Actions")
                .position(Point::new(1, 1)),
        );

        assert!(trigger.on_click(&mut reg, &MouseEvent::click(30, 40), now).unwrap());
        let popup = reg.get(&menu).unwrap();
        assert_eq!(popup.title(), "Actions");
        assert_eq!(popup.mode(), PopupMode::Contextual);
        let frame = reg.report_measured_size(&menu, Size::new(10, 10)).unwrap();
        assert_eq!(frame, Rect::new(30, 40, 10, 10));
    }

    #[test]
    fn non_click_is_ignored() {
        let now = Instant::now();
        let mut reg = PopupRegistry::default();
        let menu = reg.register(PopupConfig::with_id("menu"));
        let trigger = PopupTrigger::new(menu);
        let down = MouseEvent::new(MouseEventKind::Down(MouseButton::Left), 0, 0);
        assert!(!trigger.on_click(&mut reg, &down, now).unwrap());
        assert!(reg.stack().is_empty());
    }

    #[test]
    fn unknown_target_is_an_error() {
        let mut reg = PopupRegistry::default();
        let trigger = PopupTrigger::new(PopupId::new("missing"));
        let err = trigger
            .on_click(&mut reg, &MouseEvent::click(0, 0), Instant::now())
            .unwrap_err();
        assert_eq!(err, PopupError::UnknownPopup(PopupId::new("missing")));
    }
}

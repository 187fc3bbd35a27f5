//! Property-based invariant tests for placement geometry.
//!
//! 1. `clamp_within` never moves a rectangle that already fits.
//! 2. A clamped rectangle never extends past the bounds when it can fit.
//! 3. Clamping never moves the left/top edge further right/down.
//! 4. `centered` keeps the box inside the container when it fits.

use chatdeck_core::geometry::{Point, Rect, Size};
use proptest::prelude::*;

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (0u16..=2000, 0u16..=2000, 0u16..=800, 0u16..=800)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn bounds_strategy() -> impl Strategy<Value = Size> {
    (1u16..=2000, 1u16..=2000).prop_map(|(w, h)| Size::new(w, h))
}

proptest! {
    #[test]
    fn clamp_is_identity_when_fitting(
        (b, r) in bounds_strategy().prop_flat_map(|b| {
            (Just(b), (0..=b.width, 0..=b.height)).prop_flat_map(|(b, (x, y))| {
                (Just(b), (0..=b.width - x, 0..=b.height - y)
                    .prop_map(move |(w, h)| Rect::new(x, y, w, h)))
            })
        })
    ) {
        prop_assert_eq!(r.clamp_within(b), r);
    }

    #[test]
    fn clamped_rect_fits_when_possible(
        (b, r) in bounds_strategy().prop_flat_map(|b| {
            (Just(b), (0u16..=4000, 0u16..=4000, 0..=b.width, 0..=b.height)
                .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h)))
        })
    ) {
        let c = r.clamp_within(b);
        prop_assert!(c.right() <= b.width, "right overflow: {:?} in {:?}", c, b);
        prop_assert!(c.bottom() <= b.height, "bottom overflow: {:?} in {:?}", c, b);
    }

    #[test]
    fn clamp_only_moves_up_or_left(r in rect_strategy(), b in bounds_strategy()) {
        let c = r.clamp_within(b);
        prop_assert!(c.x <= r.x);
        prop_assert!(c.y <= r.y);
        prop_assert_eq!(c.size(), r.size());
    }

    #[test]
    fn centered_stays_inside(
        (w, h, bw, bh) in (1u16..=1500, 1u16..=1500)
            .prop_flat_map(|(w, h)| (Just(w), Just(h), 0..=w, 0..=h))
    ) {
        let container = Rect::new(0, 0, w, h);
        let placed = container.centered(Size::new(bw, bh));
        prop_assert!(container.contains(Point::new(placed.x, placed.y)) || placed.is_empty());
        prop_assert!(placed.right() <= container.right());
        prop_assert!(placed.bottom() <= container.bottom());
    }
}

//! Size selection: presets, custom mode and ratio-locked edits.

use crate::models::{clamp_dimension, find_preset, ImageSize, CUSTOM_LABEL, PRESET_SIZES};

/// Selects the preset whose label matches `ratio_id`, or the first preset
/// when nothing matches.
pub fn select_ratio(ratio_id: &str) -> ImageSize {
    match find_preset(ratio_id) {
        Some(preset) => ImageSize::from(preset),
        None => {
            log::warn!(
                "Unknown ratio '{}', using {}",
                ratio_id,
                PRESET_SIZES[0].label
            );
            ImageSize::from(&PRESET_SIZES[0])
        }
    }
}

/// Drops the ratio lock but keeps the current numbers.
pub fn switch_to_custom(current: &ImageSize) -> ImageSize {
    ImageSize::custom(current.width, current.height)
}

/// Handles a ratio-picker value: `custom` or a preset label.
pub fn select_size(current: &ImageSize, selection: &str) -> ImageSize {
    if selection.trim().eq_ignore_ascii_case(CUSTOM_LABEL) {
        switch_to_custom(current)
    } else {
        select_ratio(selection)
    }
}

pub fn set_width(current: &ImageSize, width: u32) -> ImageSize {
    match current.ratio {
        Some(ratio) => {
            let (low, high) = ratio.width_range();
            let width = width.clamp(low, high);
            ImageSize {
                width,
                height: ratio.height_for(width),
                ..current.clone()
            }
        }
        None => ImageSize {
            width: clamp_dimension(width),
            ..current.clone()
        },
    }
}

pub fn set_height(current: &ImageSize, height: u32) -> ImageSize {
    match current.ratio {
        Some(ratio) => {
            let (low, high) = ratio.height_range();
            let height = height.clamp(low, high);
            ImageSize {
                width: ratio.width_for(height),
                height,
                ..current.clone()
            }
        }
        None => ImageSize {
            height: clamp_dimension(height),
            ..current.clone()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectRatio, MAX_DIMENSION, MIN_DIMENSION};
    use proptest::prelude::*;

    #[test]
    fn select_ratio_uses_preset_values() {
        let size = select_ratio("16:9");
        assert_eq!((size.width, size.height), (1024, 576));
        assert_eq!(size.ratio, Some(AspectRatio::new(16, 9)));
        assert_eq!(size.label, "16:9");
    }

    #[test]
    fn unknown_ratio_falls_back_to_first_preset() {
        let size = select_ratio("4:3");
        assert_eq!(size, ImageSize::from(&PRESET_SIZES[0]));
    }

    #[test]
    fn width_edit_recomputes_height_under_ratio() {
        let size = set_width(&select_ratio("3:2"), 512);
        assert_eq!((size.width, size.height), (512, 341));
        let size = set_height(&select_ratio("9:16"), 1024);
        assert_eq!((size.width, size.height), (576, 1024));
    }

    #[test]
    fn custom_mode_keeps_numbers_and_unlocks_ratio() {
        let locked = set_width(&select_ratio("16:9"), 768);
        let custom = select_size(&locked, "custom");
        assert_eq!((custom.width, custom.height), (768, 432));
        assert!(custom.is_custom());
        assert_eq!(custom.label, "custom");

        let custom = set_width(&custom, 640);
        assert_eq!((custom.width, custom.height), (640, 432));
        let custom = set_height(&custom, 900);
        assert_eq!((custom.width, custom.height), (640, 900));
    }

    #[test]
    fn edits_are_clamped() {
        let custom = switch_to_custom(&ImageSize::default());
        assert_eq!(set_width(&custom, 0).width, MIN_DIMENSION);
        assert_eq!(set_height(&custom, 10_000).height, MAX_DIMENSION);

        // 16:9 at width 64 would need height 36.
        let wide = set_width(&select_ratio("16:9"), 64);
        assert_eq!((wide.width, wide.height), (114, 64));
        let tall = set_width(&select_ratio("9:16"), 2048);
        assert_eq!((tall.width, tall.height), (1152, 2048));
    }

    fn arb_preset() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("1:1"),
            Just("3:2"),
            Just("2:3"),
            Just("16:9"),
            Just("9:16"),
        ]
    }

    /// A preset together with a width anywhere in its feasible range.
    fn arb_preset_width() -> impl Strategy<Value = (&'static str, u32)> {
        arb_preset().prop_flat_map(|label| {
            let (low, high) = select_ratio(label)
                .ratio
                .map_or((MIN_DIMENSION, MAX_DIMENSION), |ratio| ratio.width_range());
            (Just(label), low..=high)
        })
    }

    #[test]
    fn round_trip_holds_at_range_edges() {
        for (label, width) in [("16:9", 114), ("16:9", 2048), ("9:16", 64), ("9:16", 1152)] {
            let derived = set_width(&select_ratio(label), width);
            assert_eq!(derived.width, width);
            let back = set_height(&derived, derived.height);
            assert!(back.width.abs_diff(width) <= 1, "{} at {}", label, width);
        }
    }

    proptest! {
        #[test]
        fn prop_width_edit_derives_rounded_height((label, width) in arb_preset_width()) {
            let preset = select_ratio(label);
            let ratio = preset.ratio.unwrap();
            let size = set_width(&preset, width);
            prop_assert_eq!(size.width, width);
            let expected = ((width as f64) * ratio.height as f64 / ratio.width as f64).round() as u32;
            prop_assert_eq!(size.height, expected);
        }

        #[test]
        fn prop_height_edit_round_trips_width((label, width) in arb_preset_width()) {
            let preset = select_ratio(label);
            let derived = set_width(&preset, width);
            let back = set_height(&derived, derived.height);
            prop_assert!(back.width.abs_diff(width) <= 1, "{} -> {} -> {}", width, derived.height, back.width);
            prop_assert_eq!(back.height, derived.height);
        }
    }
}

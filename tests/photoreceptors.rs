use foveate::filter::color::luminance;
use foveate::sampler::sample_count;
use foveate::{
    apply_pixel_effect, build_retina_masks, select_random_pixels, Frame, PixelEffect, RetinaError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn make_frame(size: usize) -> Frame {
    Frame::from_fn(size, size, |x, y| {
        [(x * 9) as u8, (y * 13) as u8, ((x + y) * 5) as u8]
    })
}

#[test]
fn zero_percent_selects_nothing() {
    let masks = build_retina_masks(30, (15, 15), 8).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(select_random_pixels(0.0, &masks.fovea, &mut rng)
        .unwrap()
        .is_empty());
}

#[test]
fn full_percent_selects_every_pixel_once() {
    let masks = build_retina_masks(30, (15, 15), 8).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let selected = select_random_pixels(100.0, &masks.periphery, &mut rng).unwrap();

    assert_eq!(selected.len(), masks.periphery.count_nonzero());
    let unique: HashSet<_> = selected.iter().copied().collect();
    assert_eq!(unique.len(), selected.len());
    for &(x, y) in &selected {
        assert_eq!(masks.periphery.get(x, y), Some(1.0));
    }
}

#[test]
fn partial_selection_is_distinct_subset() {
    let masks = build_retina_masks(40, (20, 20), 10).unwrap();
    let available = masks.fovea.count_nonzero();
    let mut rng = StdRng::seed_from_u64(42);
    let selected = select_random_pixels(37.5, &masks.fovea, &mut rng).unwrap();

    assert_eq!(selected.len(), sample_count(37.5, available));
    assert_eq!(selected.len(), (0.375 * available as f64).floor() as usize);
    let unique: HashSet<_> = selected.iter().copied().collect();
    assert_eq!(unique.len(), selected.len());
    assert!(selected
        .iter()
        .all(|&(x, y)| masks.fovea.get(x, y) == Some(1.0)));

    let again = select_random_pixels(37.5, &masks.fovea, &mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(selected, again);
}

#[test]
fn out_of_range_percentage_is_rejected() {
    let masks = build_retina_masks(10, (5, 5), 2).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    for p in [-0.1f32, 100.1, f32::NAN] {
        assert!(matches!(
            select_random_pixels(p, &masks.fovea, &mut rng),
            Err(RetinaError::InvalidConfig { .. })
        ));
    }
}

#[test]
fn effects_touch_only_selected_pixels() {
    let frame = make_frame(12);
    let mut image = frame.to_processed();
    image.set_pixel(1, 1, [0, 0, 0]);
    image.set_pixel(2, 2, [0, 0, 0]);

    apply_pixel_effect(&mut image, &frame, &[(1, 1)], PixelEffect::Color).unwrap();
    assert_eq!(image.pixel(1, 1), frame.pixel(1, 1).map(u16::from));
    assert_eq!(image.pixel(2, 2), [0, 0, 0]);

    apply_pixel_effect(&mut image, &frame, &[(5, 3)], PixelEffect::Grayscale).unwrap();
    let l = u16::from(luminance(frame.pixel(5, 3)));
    assert_eq!(image.pixel(5, 3), [l, l, l]);
    assert_eq!(image.pixel(5, 4), frame.pixel(5, 4).map(u16::from));
}

#[test]
fn effect_rejects_bad_coordinates() {
    let frame = make_frame(4);
    let mut image = frame.to_processed();
    let err = apply_pixel_effect(&mut image, &frame, &[(4, 0)], PixelEffect::Color)
        .err()
        .unwrap();
    assert!(matches!(err, RetinaError::Computation { .. }));
    assert!(!err.is_fatal());
}

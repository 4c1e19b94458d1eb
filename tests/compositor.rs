use foveate::composite::{blend, blend_alpha, degrade_periphery};
use foveate::filter::color::luminance;
use foveate::{build_retina_masks, composite_foveated, Frame, RetinaConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn make_frame(size: usize) -> Frame {
    Frame::from_fn(size, size, |x, y| {
        [
            ((x * 7 + y * 3) % 256) as u8,
            ((x * x + y * 11) % 256) as u8,
            ((x ^ (y * 5)) % 256) as u8,
        ]
    })
}

fn plain_config(size: usize) -> RetinaConfig {
    let mut config = RetinaConfig {
        resolution: size,
        fovea_center: (size as i32 / 2, size as i32 / 2),
        fovea_radius: (size / 5) as u32,
        peripheral_grayscale: false,
        ..RetinaConfig::default()
    };
    config.blur.enabled = false;
    config.clutter.enabled = false;
    config
}

#[test]
fn disabled_treatments_are_identity() {
    let frame = make_frame(48);
    let config = plain_config(48);
    let masks = build_retina_masks(48, config.fovea_center, config.fovea_radius).unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    let out = composite_foveated(&frame, &masks.fovea, &config, &mut rng).unwrap();
    assert_eq!(out, frame.to_processed());
}

#[test]
fn grayscale_periphery_keeps_fovea_exact() {
    let frame = make_frame(40);
    let mut config = plain_config(40);
    config.peripheral_grayscale = true;
    let masks = build_retina_masks(40, config.fovea_center, config.fovea_radius).unwrap();
    let mut rng = StdRng::seed_from_u64(2);

    let out = composite_foveated(&frame, &masks.fovea, &config, &mut rng).unwrap();
    for y in 0..40 {
        for x in 0..40 {
            let src = frame.pixel(x, y);
            let got = out.pixel(x, y);
            if masks.fovea.get(x, y) == Some(1.0) {
                assert_eq!(got, src.map(u16::from), "fovea pixel ({x}, {y})");
            } else {
                let l = u16::from(luminance(src));
                assert_eq!(got, [l, l, l], "periphery pixel ({x}, {y})");
            }
        }
    }
}

#[test]
fn soft_alpha_only_with_blur() {
    let mut config = plain_config(32);
    let masks = build_retina_masks(32, (16, 16), 6).unwrap();

    let hard = blend_alpha(&masks.fovea, &config);
    assert_eq!(hard, masks.fovea);

    config.blur.enabled = true;
    config.blur.blend_kernel = (9, 9);
    let soft = blend_alpha(&masks.fovea, &config);
    let fractional = soft
        .data()
        .iter()
        .filter(|&&a| a > 0.0 && a < 1.0)
        .count();
    assert!(fractional > 0);
    assert!(soft.data().iter().all(|&a| (0.0..=1.0 + 1e-5).contains(&a)));
    // Far corners stay fully peripheral.
    assert!(soft.get(0, 0).unwrap() < 1e-6);
}

#[test]
fn blur_flattens_periphery_texture() {
    let frame = Frame::from_fn(32, 32, |x, y| {
        let v = if (x + y) % 2 == 0 { 200 } else { 20 };
        [v, v, v]
    });
    let mut config = plain_config(32);
    config.blur.enabled = true;
    config.blur.kernel = (7, 7);
    let mut rng = StdRng::seed_from_u64(3);

    let degraded = degrade_periphery(&frame, &config, &mut rng);
    let variation = |f: &Frame| -> u64 {
        let mut total = 0u64;
        for y in 0..32 {
            for x in 1..32 {
                let a = f.pixel(x, y)[0] as i64;
                let b = f.pixel(x - 1, y)[0] as i64;
                total += (a - b).unsigned_abs();
            }
        }
        total
    };
    assert!(variation(&degraded) < variation(&frame));
}

#[test]
fn blend_rejects_mismatched_inputs() {
    let frame = make_frame(16);
    let other = make_frame(8);
    let masks = build_retina_masks(16, (8, 8), 3).unwrap();
    assert!(blend(&frame, &other, &masks.fovea).is_err());

    let out = blend(&frame, &frame, &masks.fovea).unwrap();
    assert_eq!(out, frame.to_processed());
}

#[test]
fn clutter_is_reproducible_per_seed() {
    let frame = make_frame(32);
    let mut config = plain_config(32);
    config.clutter.enabled = true;
    config.clutter.intensity = 1.0;
    config.clutter.max_distortion = 4.0;

    let a = degrade_periphery(&frame, &config, &mut StdRng::seed_from_u64(9));
    let b = degrade_periphery(&frame, &config, &mut StdRng::seed_from_u64(9));
    assert_eq!(a, b);
    assert_ne!(a, frame);
}

use foveate::flow::{argmax_cell, fixation_from_flow, grid_mean_magnitude};
use foveate::{dense_flow, locate_fixation, FlowParams, Frame, RetinaError};

const SIZE: usize = 64;

fn blob_frame(cx: f32, cy: f32) -> Frame {
    Frame::from_fn(SIZE, SIZE, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let v = 20.0 + 200.0 * (-(dx * dx + dy * dy) / 32.0).exp();
        let v = v.round() as u8;
        [v, v, v]
    })
}

#[test]
fn identical_frames_keep_fallback_center() {
    let frame = blob_frame(20.0, 40.0);
    let params = FlowParams::default();
    let fixation = locate_fixation(&frame, &frame, (4, 4), &params, (7, 9)).unwrap();
    assert_eq!(fixation.center, (7, 9));
    assert_eq!(fixation.cell, None);
}

#[test]
fn identical_frames_give_zero_flow() {
    let gray = blob_frame(30.0, 30.0).to_gray();
    let flow = dense_flow(gray.view(), gray.view(), &FlowParams::default()).unwrap();
    assert_eq!(flow.width(), SIZE);
    assert_eq!(flow.height(), SIZE);
    assert!(flow.magnitude().iter().all(|&m| m == 0.0));
}

#[test]
fn flow_follows_horizontal_motion() {
    let prev = blob_frame(48.0, 16.0).to_gray();
    let next = blob_frame(50.0, 16.0).to_gray();
    let flow = dense_flow(prev.view(), next.view(), &FlowParams::default()).unwrap();

    let mut sum_u = 0.0f32;
    let mut sum_v = 0.0f32;
    for y in 8..25 {
        for x in 40..59 {
            let (u, v) = flow.at(x, y).unwrap();
            sum_u += u;
            sum_v += v;
        }
    }
    assert!(sum_u > 0.0, "expected rightward motion, got {sum_u}");
    assert!(sum_u > sum_v.abs());

    let (magnitude, angle) = flow.to_polar();
    assert_eq!(magnitude.len(), SIZE * SIZE);
    assert!(angle
        .iter()
        .all(|&a| (0.0..std::f32::consts::TAU).contains(&a)));
}

#[test]
fn moving_blob_wins_its_cell() {
    let current = blob_frame(48.0, 16.0);
    let next = blob_frame(50.0, 16.0);
    let params = FlowParams::default();

    let fixation = locate_fixation(&current, &next, (2, 2), &params, (32, 32)).unwrap();
    assert_eq!(fixation.cell, Some((0, 1)));
    assert_eq!(fixation.center, (48, 16));
    assert!(fixation.mean_magnitude > params.min_motion);
}

#[test]
fn single_cell_grid_centers_the_frame() {
    let current = blob_frame(10.0, 10.0);
    let next = blob_frame(12.0, 11.0);
    let fixation =
        locate_fixation(&current, &next, (1, 1), &FlowParams::default(), (0, 0)).unwrap();
    assert_eq!(fixation.center, (32, 32));
    assert_eq!(fixation.cell, Some((0, 0)));
}

#[test]
fn mismatched_frames_are_rejected() {
    let current = blob_frame(10.0, 10.0);
    let small = Frame::from_fn(32, 32, |_, _| [0, 0, 0]);
    let err = locate_fixation(&current, &small, (2, 2), &FlowParams::default(), (0, 0))
        .err()
        .unwrap();
    assert_eq!(
        err,
        RetinaError::InvalidDimensions {
            width: 32,
            height: 32,
        }
    );
}

#[test]
fn grid_means_use_integer_cell_bounds() {
    // 5x3 field, 2x2 grid: rows [0,1) [1,3), cols [0,2) [2,5).
    let mut magnitude = vec![0.0f32; 15];
    for x in 2..5 {
        for y in 1..3 {
            magnitude[y * 5 + x] = 2.0;
        }
    }
    let means = grid_mean_magnitude(&magnitude, 5, 3, (2, 2)).unwrap();
    assert_eq!(means, vec![0.0, 0.0, 0.0, 2.0]);
    assert_eq!(argmax_cell(&means), Some(3));
    assert!(grid_mean_magnitude(&magnitude, 5, 3, (4, 1)).is_err());
}

#[test]
fn static_scene_threshold_applies_to_existing_flow() {
    let gray = blob_frame(30.0, 30.0).to_gray();
    let flow = dense_flow(gray.view(), gray.view(), &FlowParams::default()).unwrap();
    let fixation = fixation_from_flow(&flow, (3, 3), 0.0, (1, 2)).unwrap();
    assert_eq!(fixation.center, (1, 2));
    assert_eq!(fixation.mean_magnitude, 0.0);
}

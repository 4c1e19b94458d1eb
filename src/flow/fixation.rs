//! Grid-based fixation from flow magnitude.
//!
//! The frame is split into `rows x cols` cells with integer bounds
//! `[i * h / rows, (i + 1) * h / rows)`. The new fixation is the pixel center
//! of the cell with the largest mean magnitude. Ties go to the first cell in
//! row-major order. When no cell exceeds `min_motion` the fallback center is
//! kept.

use crate::flow::horn_schunck::dense_flow_within;
use crate::flow::{FlowField, FlowParams};
use crate::image::Frame;
use crate::pipeline::Deadline;
use crate::trace::{trace_event, trace_span};
use crate::util::{RetinaError, RetinaResult};

/// Outcome of one fixation estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fixation {
    /// Fixation center `(x, y)` in pixels.
    pub center: (i32, i32),
    /// Winning cell `(row, col)`, `None` when the fallback was kept.
    pub cell: Option<(usize, usize)>,
    /// Mean magnitude of the winning cell (0 when the fallback was kept).
    pub mean_magnitude: f32,
}

/// Mean of `magnitude` over each grid cell, row-major `rows * cols`.
pub fn grid_mean_magnitude(
    magnitude: &[f32],
    width: usize,
    height: usize,
    grid: (usize, usize),
) -> RetinaResult<Vec<f32>> {
    let (rows, cols) = grid;
    if rows == 0 || cols == 0 || rows > height || cols > width {
        return Err(RetinaError::config("foveation.grid", "dimensions must be in [1, size]"));
    }
    if magnitude.len() != width * height {
        return Err(RetinaError::BufferTooSmall {
            needed: width * height,
            got: magnitude.len(),
        });
    }

    let mut means = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        let (y0, y1) = (i * height / rows, (i + 1) * height / rows);
        for j in 0..cols {
            let (x0, x1) = (j * width / cols, (j + 1) * width / cols);
            let mut sum = 0.0f64;
            for y in y0..y1 {
                let row = &magnitude[y * width + x0..y * width + x1];
                sum += row.iter().map(|&m| f64::from(m)).sum::<f64>();
            }
            let count = ((y1 - y0) * (x1 - x0)).max(1);
            means.push((sum / count as f64) as f32);
        }
    }
    Ok(means)
}

/// Index of the largest value; the first occurrence wins ties.
pub fn argmax_cell(means: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &m) in means.iter().enumerate() {
        match best {
            Some((_, best_m)) if m <= best_m => {}
            _ => best = Some((idx, m)),
        }
    }
    best.map(|(idx, _)| idx)
}

fn cell_center(row: usize, col: usize, width: usize, height: usize, grid: (usize, usize)) -> (i32, i32) {
    let (rows, cols) = grid;
    let x = col * width / cols + width / (2 * cols);
    let y = row * height / rows + height / (2 * rows);
    (x as i32, y as i32)
}

/// Picks a fixation from an existing flow field.
pub fn fixation_from_flow(
    flow: &FlowField,
    grid: (usize, usize),
    min_motion: f32,
    fallback: (i32, i32),
) -> RetinaResult<Fixation> {
    let (width, height) = (flow.width(), flow.height());
    let (magnitude, _angle) = flow.to_polar();
    let means = grid_mean_magnitude(&magnitude, width, height, grid)?;
    let Some(best) = argmax_cell(&means) else {
        return Ok(Fixation {
            center: fallback,
            cell: None,
            mean_magnitude: 0.0,
        });
    };
    let mean_magnitude = means[best];
    if mean_magnitude <= min_motion {
        return Ok(Fixation {
            center: fallback,
            cell: None,
            mean_magnitude: 0.0,
        });
    }
    let (row, col) = (best / grid.1, best % grid.1);
    Ok(Fixation {
        center: cell_center(row, col, width, height, grid),
        cell: Some((row, col)),
        mean_magnitude,
    })
}

/// Estimates the next fixation from frames `t` and `t + 1`.
pub fn locate_fixation(
    current: &Frame,
    next: &Frame,
    grid: (usize, usize),
    params: &FlowParams,
    fallback: (i32, i32),
) -> RetinaResult<Fixation> {
    locate_fixation_within(current, next, grid, params, fallback, None)
}

pub(crate) fn locate_fixation_within(
    current: &Frame,
    next: &Frame,
    grid: (usize, usize),
    params: &FlowParams,
    fallback: (i32, i32),
    deadline: Option<&Deadline>,
) -> RetinaResult<Fixation> {
    let _span = trace_span!("fixation", rows = grid.0, cols = grid.1).entered();
    let prev_gray = current.to_gray();
    let next_gray = next.to_gray();
    let flow = dense_flow_within(prev_gray.view(), next_gray.view(), params, deadline)?;
    let fixation = fixation_from_flow(&flow, grid, params.min_motion, fallback)?;
    trace_event!(
        "fixation_selected",
        x = fixation.center.0,
        y = fixation.center.1,
        mean_magnitude = fixation.mean_magnitude
    );
    Ok(fixation)
}

#[cfg(test)]
mod tests {
    use super::{argmax_cell, cell_center, grid_mean_magnitude};

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax_cell(&[0.0, 0.0, 0.0]), Some(0));
        assert_eq!(argmax_cell(&[1.0, 3.0, 3.0, 2.0]), Some(1));
        assert_eq!(argmax_cell(&[]), None);
    }

    #[test]
    fn grid_means_follow_integer_cell_bounds() {
        // 4x2 image, 1x2 grid: left half ones, right half threes.
        let mag = [1.0, 1.0, 3.0, 3.0, 1.0, 1.0, 3.0, 3.0];
        let means = grid_mean_magnitude(&mag, 4, 2, (1, 2)).unwrap();
        assert_eq!(means, vec![1.0, 3.0]);
    }

    #[test]
    fn cell_center_matches_grid_layout() {
        assert_eq!(cell_center(0, 0, 100, 100, (1, 1)), (50, 50));
        assert_eq!(cell_center(1, 2, 100, 100, (2, 4)), (50 + 12, 50 + 25));
    }
}

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use quizlens_config::CircleParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// Number of multiple-choice bullets; no detection result means zero
pub fn marker_count(circles: Option<Vec<Circle>>) -> usize {
    circles.map_or(0, |c| c.len())
}

/// Hough gradient circle detection on an already blurred grayscale image
///
/// Every Canny edge pixel votes for centers along its gradient, in both
/// directions, for each radius in range. Centers are accumulator maxima above
/// `votes`, taken strongest first and at least `min_dist` apart. Returns
/// `None` when nothing qualifies.
pub fn detect_circles(blurred: &GrayImage, params: &CircleParams) -> Option<Vec<Circle>> {
    let (width, height) = blurred.dimensions();
    if width < 3 || height < 3 || params.max_radius < params.min_radius {
        return None;
    }

    let dp = params.dp.max(1.0);
    let edges = canny(blurred, params.canny_high / 2.0, params.canny_high);
    let gx = horizontal_sobel(blurred);
    let gy = vertical_sobel(blurred);

    let acc_w = (width as f32 / dp).ceil() as usize + 1;
    let acc_h = (height as f32 / dp).ceil() as usize + 1;
    let mut acc = vec![0u32; acc_w * acc_h];
    let mut edge_points = Vec::new();

    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }

        let dx = gx.get_pixel(x, y)[0] as f32;
        let dy = gy.get_pixel(x, y)[0] as f32;
        let magnitude = (dx * dx + dy * dy).sqrt();
        if magnitude < f32::EPSILON {
            continue;
        }

        let (x, y) = (x as f32, y as f32);
        edge_points.push((x, y));
        let (ux, uy) = (dx / magnitude, dy / magnitude);

        for r in params.min_radius..=params.max_radius {
            for sign in [1.0f32, -1.0] {
                let cx = x + sign * ux * r as f32;
                let cy = y + sign * uy * r as f32;
                if cx < 0.0 || cy < 0.0 || cx >= width as f32 || cy >= height as f32 {
                    continue;
                }
                let ax = (cx / dp).round() as usize;
                let ay = (cy / dp).round() as usize;
                acc[ay * acc_w + ax] += 1;
            }
        }
    }

    let mut centers = Vec::new();
    for ay in 0..acc_h {
        for ax in 0..acc_w {
            let votes = acc[ay * acc_w + ax];
            if votes > params.votes && is_local_max(&acc, acc_w, acc_h, ax, ay) {
                centers.push((ax, ay, votes));
            }
        }
    }
    centers.sort_by(|a, b| b.2.cmp(&a.2));

    let min_dist_sq = params.min_dist * params.min_dist;
    let mut circles: Vec<Circle> = Vec::new();
    for (ax, ay, _) in centers {
        let (cx, cy) = (ax as f32 * dp, ay as f32 * dp);
        let too_close = circles
            .iter()
            .any(|c| (c.x - cx).powi(2) + (c.y - cy).powi(2) < min_dist_sq);
        if too_close {
            continue;
        }

        if let Some(radius) = best_radius(cx, cy, &edge_points, params) {
            circles.push(Circle {
                x: cx,
                y: cy,
                radius,
            });
        }
    }

    if circles.is_empty() {
        None
    } else {
        Some(circles)
    }
}

fn is_local_max(acc: &[u32], acc_w: usize, acc_h: usize, ax: usize, ay: usize) -> bool {
    let votes = acc[ay * acc_w + ax];
    let x_range = ax.saturating_sub(1)..=(ax + 1).min(acc_w - 1);

    (ay.saturating_sub(1)..=(ay + 1).min(acc_h - 1)).all(|ny| {
        x_range
            .clone()
            .all(|nx| (nx == ax && ny == ay) || acc[ny * acc_w + nx] <= votes)
    })
}

/// Radius with the most edge support around a center
///
/// Needs at least half the vote threshold of edge pixels within a pixel of
/// that radius, which drops centers that only collected stray votes.
fn best_radius(cx: f32, cy: f32, edge_points: &[(f32, f32)], params: &CircleParams) -> Option<f32> {
    let min_support = (params.votes / 2).max(1) as usize;

    (params.min_radius..=params.max_radius)
        .map(|r| {
            let r = r as f32;
            let support = edge_points
                .iter()
                .filter(|(x, y)| {
                    let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
                    (d - r).abs() <= 1.0
                })
                .count();
            (r, support)
        })
        .filter(|&(_, support)| support >= min_support)
        .max_by_key(|&(_, support)| support)
        .map(|(r, _)| r)
}

//! Deterministic tiling geometry for a single screenshot (§3, §4.3).
//!
//! Built fresh for every screenshot and threaded explicitly through the
//! grounding callbacks — never placed at process scope (§9: the original's
//! process-level singleton is a latent bug under parallel sessions).

pub const TILE_SIDE_PX: u32 = 768;

/// Labels the long axis along which tiles step, per the literal rule in §3:
/// `vertical` when `w > h`, `horizontal` otherwise (including `w == h`). The
/// stepping axis used for coordinate math is always the image's actual long
/// axis, independent of this label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Vertical,
    Horizontal,
}

/// A normalized [0, 1000] bounding box as returned by the grounding model,
/// `[ymin, xmin, ymax, xmax]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedBox {
    pub ymin: i32,
    pub xmin: i32,
    pub ymax: i32,
    pub xmax: i32,
}

/// What `to_screen_coord` converts: either a single normalized point or a box
/// (whose integer-floor center is used).
#[derive(Debug, Clone, Copy)]
pub enum GroundingTarget {
    Point { cx: i32, cy: i32 },
    Box(NormalizedBox),
}

impl GroundingTarget {
    fn center(&self) -> (i32, i32) {
        match self {
            GroundingTarget::Point { cx, cy } => (*cx, *cy),
            GroundingTarget::Box(b) => ((b.xmin + b.xmax) / 2, (b.ymin + b.ymax) / 2),
        }
    }
}

/// A screen coordinate produced by de-normalizing a grounding target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenCoord {
    pub x: i64,
    pub y: i64,
}

/// The tiling derived from one screenshot's native resolution.
#[derive(Debug, Clone)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
    pub tile_side: u32,
    pub direction: Direction,
    /// Top-left `(x0, y0)` of each tile, in native-resolution pixels, in order.
    pub starting_points: Vec<(i64, i64)>,
}

impl ScreenGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        let tile_side = width.min(height);
        let direction = if width > height {
            Direction::Vertical
        } else {
            Direction::Horizontal
        };
        let long_axis_len = width.max(height) as i64;
        let s = tile_side as i64;
        let step = ((s as f64) * 0.5).round() as i64;
        let step = step.max(1);

        let mut offsets = Vec::new();
        let mut pos: i64 = 0;
        while pos + s <= long_axis_len {
            offsets.push(pos);
            pos += step;
        }
        if offsets.is_empty() {
            offsets.push(0);
        }
        let extra = long_axis_len - s;
        if extra > *offsets.last().unwrap() {
            offsets.push(extra);
        }

        let long_axis_is_width = width >= height;
        let starting_points = offsets
            .into_iter()
            .map(|offset| if long_axis_is_width { (offset, 0) } else { (0, offset) })
            .collect();

        Self {
            width,
            height,
            tile_side,
            direction,
            starting_points,
        }
    }

    pub fn tile_count(&self) -> usize {
        self.starting_points.len()
    }

    /// De-normalizes a grounding target within `tile_index` into a screen coordinate.
    pub fn to_screen_coord(&self, tile_index: usize, target: GroundingTarget) -> Option<ScreenCoord> {
        let (x0, y0) = *self.starting_points.get(tile_index)?;
        let (cx, cy) = target.center();
        let s = self.tile_side as f64;
        let x = x0 + ((cx as f64) * s / 1000.0).round() as i64;
        let y = y0 + ((cy as f64) * s / 1000.0).round() as i64;
        Some(ScreenCoord { x, y })
    }

    /// The de-normalized rectangle `(x0, y0, x1, y1)` for `box` within `tile_index`,
    /// in native-resolution pixel coordinates, used by the highlight operations.
    pub fn to_screen_rect(&self, tile_index: usize, b: NormalizedBox) -> Option<(i64, i64, i64, i64)> {
        let (x0, y0) = *self.starting_points.get(tile_index)?;
        let s = self.tile_side as f64;
        let denorm = |v: i32| ((v as f64) * s / 1000.0).round() as i64;
        Some((x0 + denorm(b.xmin), y0 + denorm(b.ymin), x0 + denorm(b.xmax), y0 + denorm(b.ymax)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_image_is_single_tile_horizontal() {
        let g = ScreenGeometry::new(1000, 1000);
        assert_eq!(g.direction, Direction::Horizontal);
        assert_eq!(g.starting_points, vec![(0, 0)]);
        assert_eq!(g.tile_side, 1000);
    }

    #[test]
    fn wide_image_is_vertical_and_multi_tile() {
        let g = ScreenGeometry::new(1920, 1080);
        assert_eq!(g.direction, Direction::Vertical);
        assert_eq!(g.tile_side, 1080);
        assert!(g.tile_count() >= 2);
        assert_eq!(g.starting_points.first(), Some(&(0, 0)));
        let (last_x, _) = *g.starting_points.last().unwrap();
        assert_eq!(last_x, 1920 - 1080);
    }

    #[test]
    fn tall_image_steps_along_height() {
        let g = ScreenGeometry::new(1080, 1920);
        assert_eq!(g.direction, Direction::Horizontal);
        for &(x0, _) in &g.starting_points {
            assert_eq!(x0, 0);
        }
    }

    #[test]
    fn extra_start_point_only_added_when_strictly_past_last_step() {
        // s = 100, step = 50, long axis = 200: steps land on 0, 50, 100 (100+100=200<=200 fits).
        // extra = 200-100 = 100, equal to last step -> not added.
        let g = ScreenGeometry::new(200, 100);
        assert_eq!(g.starting_points, vec![(0, 0), (50, 0), (100, 0)]);
    }

    #[test]
    fn to_screen_coord_point_denormalizes_within_tile() {
        let g = ScreenGeometry::new(1920, 1080);
        let coord = g
            .to_screen_coord(1, GroundingTarget::Point { cx: 500, cy: 500 })
            .unwrap();
        let (x0, y0) = g.starting_points[1];
        assert_eq!(coord.x, x0 + 540);
        assert_eq!(coord.y, y0 + 540);
    }

    #[test]
    fn to_screen_coord_box_uses_floor_center() {
        let g = ScreenGeometry::new(1000, 1000);
        let b = NormalizedBox { ymin: 100, xmin: 101, ymax: 300, xmax: 300 };
        // center = ((101+300)/2, (100+300)/2) = (200, 200) via integer floor division.
        let coord = g.to_screen_coord(0, GroundingTarget::Box(b)).unwrap();
        assert_eq!(coord.x, 200);
        assert_eq!(coord.y, 200);
    }

    #[test]
    fn to_screen_coord_out_of_range_tile_is_none() {
        let g = ScreenGeometry::new(1000, 1000);
        assert!(g.to_screen_coord(5, GroundingTarget::Point { cx: 0, cy: 0 }).is_none());
    }
}

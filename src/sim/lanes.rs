//! Lane geometry
//!
//! Maps a lane index to the horizontal center of that lane. Recomputed
//! whenever the view width changes.

use serde::{Deserialize, Serialize};

use crate::consts::LANE_COUNT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneGeometry {
    view_width: f32,
    side_padding: f32,
    lane_width: f32,
    centers: [f32; LANE_COUNT],
}

impl LaneGeometry {
    pub fn new(view_width: f32, side_padding: f32) -> Self {
        let mut lanes = Self {
            view_width,
            side_padding,
            lane_width: 0.0,
            centers: [0.0; LANE_COUNT],
        };
        lanes.recalc();
        lanes
    }

    pub fn set_view_width(&mut self, width: f32) {
        self.view_width = width;
        self.recalc();
    }

    fn recalc(&mut self) {
        let inner = (self.view_width - self.side_padding * 2.0).max(0.0);
        self.lane_width = inner / LANE_COUNT as f32;
        for (i, center) in self.centers.iter_mut().enumerate() {
            *center = self.side_padding + self.lane_width * i as f32 + self.lane_width / 2.0;
        }
    }

    /// Clamp any lane index into `[0, LANE_COUNT - 1]`
    #[inline]
    pub fn clamp_lane(i: i64) -> usize {
        i.clamp(0, LANE_COUNT as i64 - 1) as usize
    }

    /// Lane index shifted by `dir` steps, clamped to the corridor
    #[inline]
    pub fn shifted(lane: usize, dir: i32) -> usize {
        Self::clamp_lane(lane as i64 + dir as i64)
    }

    pub fn lane_center_x(&self, i: usize) -> f32 {
        self.centers[i.min(LANE_COUNT - 1)]
    }

    pub fn lane_width(&self) -> f32 {
        self.lane_width
    }

    pub fn view_width(&self) -> f32 {
        self.view_width
    }
}

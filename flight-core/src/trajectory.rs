use std::f32::consts::TAU;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Waypoint;

/// Number of setpoints published when holding a maneuver for `duration` at `rate_hz`
pub fn sample_count(duration: Duration, rate_hz: f32) -> usize {
    if rate_hz <= 0.0 {
        return 0;
    }
    (duration.as_secs_f32() * rate_hz).round() as usize
}

/// One full turn around the origin at a fixed height
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub radius: f32,
    pub height: f32,
    pub duration: Duration,
}

impl Circle {
    pub fn new(radius: f32, height: f32, duration: Duration) -> Circle {
        Self {
            radius,
            height,
            duration,
        }
    }
    /// Sweep angle in radians after `elapsed`, clamped to one full turn
    pub fn angle_at(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() {
            return TAU;
        }
        let fraction = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        fraction.clamp(0.0, 1.0) * TAU
    }
    /// Point on the circle for a sweep angle; yaw follows the angle in degrees
    pub fn point(&self, angle: f32) -> Waypoint {
        Waypoint::new(
            self.radius * angle.cos(),
            self.radius * angle.sin(),
            self.height,
            angle.to_degrees(),
        )
    }
    pub fn point_at(&self, elapsed: Duration) -> Waypoint {
        self.point(self.angle_at(elapsed))
    }
    /// The setpoints to publish at `rate_hz`. Sample i sits at angle (i/N)·2π
    pub fn samples(&self, rate_hz: f32) -> CircleSamples {
        CircleSamples {
            circle: *self,
            index: 0,
            count: sample_count(self.duration, rate_hz),
        }
    }
}

/// Iterator over the published points of a [Circle]
#[derive(Clone, Debug)]
pub struct CircleSamples {
    circle: Circle,
    index: usize,
    count: usize,
}

impl CircleSamples {
    pub fn angle(&self, index: usize) -> f32 {
        index as f32 / self.count as f32 * TAU
    }
}

impl Iterator for CircleSamples {
    type Item = Waypoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let point = self.circle.point(self.angle(self.index));
        self.index += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for CircleSamples {}

/// Closed square starting and ending at the origin, each corner held for `hold`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Square {
    pub side: f32,
    pub height: f32,
    pub hold: Duration,
}

impl Square {
    pub fn new(side: f32, height: f32, hold: Duration) -> Square {
        Self { side, height, hold }
    }
    pub fn waypoints(&self) -> [Waypoint; 5] {
        let s = self.side;
        let h = self.height;
        [
            Waypoint::new(0.0, 0.0, h, 0.0),
            Waypoint::new(s, 0.0, h, 0.0),
            Waypoint::new(s, s, h, 0.0),
            Waypoint::new(0.0, s, h, 0.0),
            Waypoint::new(0.0, 0.0, h, 0.0),
        ]
    }
    /// Setpoints published per corner
    pub fn hold_samples(&self, rate_hz: f32) -> usize {
        sample_count(self.hold, rate_hz)
    }
}

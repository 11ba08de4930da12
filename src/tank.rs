//! Tank geometry and volume conversion
//!
//! The tank is a horizontal cylinder with an ultrasonic sensor mounted above
//! the liquid. The sensor reports the distance to the surface; subtracting it
//! from the empty-tank distance gives the fill height, and the circular
//! segment cross-section at that height gives the volume. The ideal cylinder
//! volume rarely matches the manufacturer's nominal capacity (dished ends,
//! fittings), so results are scaled such that a full tank reads exactly the
//! nominal capacity.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Physical dimensions of the monitored tank, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankGeometry {
    /// Nominal capacity the full tank is scaled to
    #[serde(default = "default_total_volume")]
    pub total_volume_liters: f64,

    /// Internal diameter
    #[serde(default = "default_diameter")]
    pub diameter_cm: f64,

    /// Internal length
    #[serde(default = "default_length")]
    pub length_cm: f64,

    /// Sensor-to-surface clearance when the tank is full
    #[serde(default = "default_air_gap")]
    pub full_air_gap_cm: f64,
}

impl Default for TankGeometry {
    fn default() -> Self {
        Self {
            total_volume_liters: default_total_volume(),
            diameter_cm: default_diameter(),
            length_cm: default_length(),
            full_air_gap_cm: default_air_gap(),
        }
    }
}

impl TankGeometry {
    /// Liquid height above the tank floor for a sensor distance, in cm.
    ///
    /// The sensor sits `full_air_gap_cm` above the internal ceiling, so the
    /// empty-tank distance is `full_air_gap_cm + diameter_cm`. The result is
    /// clamped to `[0, diameter_cm]`: shorter distances read as full, longer
    /// ones as empty.
    pub fn height_from_distance(&self, distance_cm: f64) -> f64 {
        let d_empty = self.full_air_gap_cm + self.diameter_cm;
        (d_empty - distance_cm).clamp(0.0, self.diameter_cm.max(0.0))
    }

    /// Liquid volume for a sensor distance, in liters.
    ///
    /// Cross-section at height `h` is the circular segment
    /// `A = r²·acos((r−h)/r) − (r−h)·√(2rh − h²)`; the raw volume `A·L` is
    /// scaled so a full tank equals `total_volume_liters` exactly, and the
    /// result is clamped to `[0, total_volume_liters]`. Degenerate dimensions
    /// yield `0.0` rather than an error.
    pub fn volume_from_distance(&self, distance_cm: f64) -> f64 {
        let full = self.full_cylinder_liters();
        if full <= 0.0 || self.total_volume_liters <= 0.0 {
            return 0.0;
        }

        let r = self.diameter_cm / 100.0 / 2.0;
        let l = self.length_cm / 100.0;
        // Negative or NaN diameter reads as empty; the clamp bound stays valid
        let h = (self.height_from_distance(distance_cm) / 100.0).clamp(0.0, (2.0 * r).max(0.0));

        if h == 0.0 {
            return 0.0;
        }
        let v_raw = if h == 2.0 * r {
            full
        } else {
            let segment = r * r * ((r - h) / r).acos() - (r - h) * (2.0 * r * h - h * h).sqrt();
            segment * l * 1000.0
        };

        let scale = self.total_volume_liters / full;
        (v_raw * scale).clamp(0.0, self.total_volume_liters.max(0.0))
    }

    /// Fill level as a percentage of nominal capacity, if defined
    pub fn fill_percent(&self, volume_liters: f64) -> Option<f64> {
        if self.total_volume_liters > 0.0 {
            Some(volume_liters / self.total_volume_liters * 100.0)
        } else {
            None
        }
    }

    /// Ideal volume of the bare cylinder, in liters
    fn full_cylinder_liters(&self) -> f64 {
        let r = self.diameter_cm / 100.0 / 2.0;
        let l = self.length_cm / 100.0;
        PI * r * r * l * 1000.0
    }
}

fn default_total_volume() -> f64 {
    10_000.0
}

fn default_diameter() -> f64 {
    184.5
}

fn default_length() -> f64 {
    436.4
}

fn default_air_gap() -> f64 {
    20.0
}

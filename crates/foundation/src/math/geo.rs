/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub const fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    /// Longitude wrapped into `[-180, 180)`.
    pub fn wrapped(self) -> Self {
        let lon = (self.lon_deg + 180.0).rem_euclid(360.0) - 180.0;
        Self::new(lon, self.lat_deg.clamp(-90.0, 90.0))
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are finite and within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lng >= -180.0
            && self.lng <= 180.0
    }

    /// Converts to a geo coordinate (x = longitude, y = latitude)
    pub fn to_coord(self) -> geo_types::Coord<f64> {
        geo_types::Coord {
            x: self.lng,
            y: self.lat,
        }
    }

    pub fn from_coord(coord: geo_types::Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<h3o::LatLng> for LatLng {
    fn from(ll: h3o::LatLng) -> Self {
        Self::new(ll.lat(), ll.lng())
    }
}

/// Represents a bounding box of geographical coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    pub fn south(&self) -> f64 {
        self.south_west.lat
    }

    pub fn west(&self) -> f64 {
        self.south_west.lng
    }

    pub fn north(&self) -> f64 {
        self.north_east.lat
    }

    pub fn east(&self) -> f64 {
        self.north_east.lng
    }

    /// Returns a new bounds grown by `amount` degrees on every side
    pub fn padded(&self, amount: f64) -> LatLngBounds {
        LatLngBounds::from_coords(
            self.south() - amount,
            self.west() - amount,
            self.north() + amount,
            self.east() + amount,
        )
    }

    /// Closed rectangle ring in counter-clockwise order (SW, SE, NE, NW, SW)
    pub fn ring(&self) -> Vec<LatLng> {
        vec![
            LatLng::new(self.south(), self.west()),
            LatLng::new(self.south(), self.east()),
            LatLng::new(self.north(), self.east()),
            LatLng::new(self.north(), self.west()),
            LatLng::new(self.south(), self.west()),
        ]
    }

    /// Converts the rectangle to a geo polygon in degrees
    pub fn to_polygon(&self) -> geo_types::Polygon<f64> {
        let exterior: Vec<geo_types::Coord<f64>> =
            self.ring().into_iter().map(LatLng::to_coord).collect();
        geo_types::Polygon::new(geo_types::LineString::from(exterior), Vec::new())
    }
}

/// The visible map window reported by the map surface: a center plus the
/// angular span covered in each axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: LatLng,
    pub lat_span: f64,
    pub lng_span: f64,
}

impl Region {
    pub fn new(center: LatLng, lat_span: f64, lng_span: f64) -> Self {
        Self {
            center,
            lat_span,
            lng_span,
        }
    }

    pub fn from_parts(center_lat: f64, center_lng: f64, lat_span: f64, lng_span: f64) -> Self {
        Self::new(LatLng::new(center_lat, center_lng), lat_span, lng_span)
    }

    /// The zoom metric fed to the resolution selector
    pub fn zoom_span(&self) -> f64 {
        self.lat_span.max(self.lng_span)
    }

    /// Finite center and strictly positive finite spans
    pub fn is_valid(&self) -> bool {
        self.center.lat.is_finite()
            && self.center.lng.is_finite()
            && self.lat_span.is_finite()
            && self.lng_span.is_finite()
            && self.lat_span > 0.0
            && self.lng_span > 0.0
    }

    /// Bounds of the region with both spans scaled by `multiplier`
    pub fn bounds(&self, multiplier: f64) -> LatLngBounds {
        let half_lat = self.lat_span * multiplier / 2.0;
        let half_lng = self.lng_span * multiplier / 2.0;
        LatLngBounds::from_coords(
            self.center.lat - half_lat,
            self.center.lng - half_lng,
            self.center.lat + half_lat,
            self.center.lng + half_lng,
        )
    }

    /// Region moved by whole spans along each axis
    pub fn offset_by_spans(&self, lat_steps: f64, lng_steps: f64) -> Region {
        Region::new(
            LatLng::new(
                self.center.lat + lat_steps * self.lat_span,
                self.center.lng + lng_steps * self.lng_span,
            ),
            self.lat_span,
            self.lng_span,
        )
    }

    pub fn scaled(&self, factor: f64) -> Region {
        Region::new(self.center, self.lat_span * factor, self.lng_span * factor)
    }
}

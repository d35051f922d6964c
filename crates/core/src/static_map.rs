use url::form_urlencoded::Serializer;

use crate::models::LatLng;

const STATIC_MAP_BASE: &str = "https://maps.googleapis.com/maps/api/staticmap";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSize {
    pub width: u32,
    pub height: u32,
}

impl MapSize {
    pub const STOP: MapSize = MapSize {
        width: 600,
        height: 300,
    };
    pub const LEG: MapSize = MapSize {
        width: 600,
        height: 240,
    };

    fn as_param(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker<'a> {
    pub color: &'a str,
    pub label: char,
}

impl Marker<'_> {
    fn as_param(&self, at: LatLng) -> String {
        format!("color:{}|label:{}|{}", self.color, self.label, at.as_param())
    }
}

pub const STOP_MARKER: Marker<'static> = Marker {
    color: "red",
    label: 'S',
};
pub const LEG_START_MARKER: Marker<'static> = Marker {
    color: "green",
    label: 'A',
};
pub const LEG_END_MARKER: Marker<'static> = Marker {
    color: "red",
    label: 'B',
};

const PATH_STYLE: &str = "color:0x4285F4ff|weight:5";

/// Map image centered on `center` with a single marker.
pub fn point_map_url(
    center: LatLng,
    zoom: u8,
    size: MapSize,
    marker: Marker<'_>,
    api_key: &str,
) -> String {
    let query = Serializer::new(String::new())
        .append_pair("center", &center.as_param())
        .append_pair("zoom", &zoom.to_string())
        .append_pair("size", &size.as_param())
        .append_pair("markers", &marker.as_param(center))
        .append_pair("key", api_key)
        .finish();
    format!("{STATIC_MAP_BASE}?{query}")
}

/// Map image drawing a path from `from` to `to`, with distinct end markers.
/// Zoom is left to the renderer so both ends stay in frame.
pub fn path_map_url(
    from: LatLng,
    to: LatLng,
    size: MapSize,
    start: Marker<'_>,
    end: Marker<'_>,
    api_key: &str,
) -> String {
    let query = Serializer::new(String::new())
        .append_pair("size", &size.as_param())
        .append_pair(
            "path",
            &format!("{PATH_STYLE}|{}|{}", from.as_param(), to.as_param()),
        )
        .append_pair("markers", &start.as_param(from))
        .append_pair("markers", &end.as_param(to))
        .append_pair("key", api_key)
        .finish();
    format!("{STATIC_MAP_BASE}?{query}")
}

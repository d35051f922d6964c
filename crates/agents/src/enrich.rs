use stroll_core::static_map::{
    path_map_url, point_map_url, MapSize, LEG_END_MARKER, LEG_START_MARKER, STOP_MARKER,
};
use stroll_core::StructuredItinerary;

const STOP_ZOOM: u8 = 16;

/// Attaches static map images where coordinates allow. Stops or legs without
/// usable coordinates are left untouched. Returns the number of images set.
pub fn attach_map_images(itinerary: &mut StructuredItinerary, maps_api_key: &str) -> usize {
    let mut attached = 0;

    for stop in &mut itinerary.stops {
        if let Some(center) = stop.coordinates().filter(|coords| coords.is_valid()) {
            stop.image_url = Some(point_map_url(
                center,
                STOP_ZOOM,
                MapSize::STOP,
                STOP_MARKER,
                maps_api_key,
            ));
            attached += 1;
        }
    }

    for direction in &mut itinerary.directions {
        let endpoints = direction
            .from_lat_lng
            .zip(direction.to_lat_lng)
            .filter(|(from, to)| from.is_valid() && to.is_valid());
        if let Some((from, to)) = endpoints {
            direction.map_url = Some(path_map_url(
                from,
                to,
                MapSize::LEG,
                LEG_START_MARKER,
                LEG_END_MARKER,
                maps_api_key,
            ));
            attached += 1;
        }
    }

    attached
}

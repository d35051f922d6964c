use std::collections::HashSet;

use url::Url;

const MAPS_SEARCH_BASE: &str = "https://www.google.com/maps/search/";
const MAPS_DIRECTIONS_BASE: &str = "https://www.google.com/maps/dir/";

/// First-seen order, exact-string duplicates removed.
pub fn unique_places<'a, I>(titles: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    titles
        .into_iter()
        .filter(|title| seen.insert(*title))
        .collect()
}

/// Walking route through the places, in order: a search link for a single
/// place, a directions link with pipe-delimited waypoints for two or more.
pub fn route_url<'a, I>(titles: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let places = unique_places(titles);

    match places.as_slice() {
        [] => None,
        [only] => Url::parse_with_params(MAPS_SEARCH_BASE, [("api", "1"), ("query", *only)])
            .ok()
            .map(String::from),
        [origin, interior @ .., destination] => {
            let mut params = vec![
                ("api", "1".to_string()),
                ("origin", origin.to_string()),
                ("destination", destination.to_string()),
            ];
            if !interior.is_empty() {
                params.push(("waypoints", interior.join("|")));
            }
            params.push(("travelmode", "walking".to_string()));

            Url::parse_with_params(MAPS_DIRECTIONS_BASE, params)
                .ok()
                .map(String::from)
        }
    }
}

use serde_json::{json, Value};

fn lat_lng_schema(description: &str) -> Value {
    json!({
        "type": "OBJECT",
        "description": description,
        "properties": {
            "latitude": { "type": "NUMBER" },
            "longitude": { "type": "NUMBER" }
        },
        "required": ["latitude", "longitude"]
    })
}

/// Response schema for structured mode, in the model's OpenAPI-subset dialect.
pub fn itinerary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "tourName": { "type": "STRING", "description": "A catchy name for the tour." },
            "summary": { "type": "STRING", "description": "Two or three sentences describing the walk." },
            "totalDistance": { "type": "STRING", "description": "Approximate walking distance, e.g. '2.4 km'." },
            "stops": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "timeToSpend": { "type": "STRING", "description": "e.g. '20 minutes'" },
                        "lat": { "type": "NUMBER" },
                        "lng": { "type": "NUMBER" }
                    },
                    "required": ["name", "description", "timeToSpend", "lat", "lng"],
                    "propertyOrdering": ["name", "description", "timeToSpend", "lat", "lng"]
                }
            },
            "directions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "from": { "type": "STRING" },
                        "to": { "type": "STRING" },
                        "instructions": { "type": "STRING" },
                        "fromLatLng": lat_lng_schema("Coordinates of the leg's starting stop."),
                        "toLatLng": lat_lng_schema("Coordinates of the leg's ending stop.")
                    },
                    "required": ["from", "to", "instructions", "fromLatLng", "toLatLng"]
                }
            }
        },
        "required": ["tourName", "summary", "totalDistance", "stops", "directions"],
        "propertyOrdering": ["tourName", "summary", "totalDistance", "stops", "directions"]
    })
}

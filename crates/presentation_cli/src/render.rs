//! Terminal output helpers

use domain::{AddressCandidate, Coordinate, RouteOption};

/// Parse `"lat, lon"` typed by the user
pub fn parse_coordinate(input: &str) -> Option<Coordinate> {
    let (lat, lon) = input.split_once(',')?;
    let lat = lat.trim().parse().ok()?;
    let lon = lon.trim().parse().ok()?;
    Coordinate::new(lat, lon).ok()
}

pub fn candidate_line(index: usize, candidate: &AddressCandidate) -> String {
    let name = if candidate.name.is_empty() {
        "(unnamed)"
    } else {
        candidate.name.as_str()
    };
    format!(
        "{:>2}. {name}\n    {}\n    {}",
        index + 1,
        candidate.formatted_address,
        candidate.coordinate
    )
}

pub fn route_line(index: usize, route: &RouteOption) -> String {
    format!(
        "{:>2}. {}  ({})\n    {}",
        index + 1,
        route.format_summary(),
        route.id,
        route.description
    )
}

/// Multi-line description of one cached route
pub fn route_details(route: &RouteOption) -> String {
    let mut out = format!(
        "{}\n  id:        {}\n  type:      {}\n  duration:  {}\n  distance:  {}\n  price:     {}\n  points:    {}",
        route.name,
        route.id,
        route.transport_type,
        route.format_duration(),
        route.distance,
        route.format_price(),
        route.points.len()
    );
    if !route.description.is_empty() {
        out.push_str(&format!("\n  about:     {}", route.description));
    }
    if let Some(bbox) = route.bounding_box() {
        let center = bbox.center();
        out.push_str(&format!(
            "\n  viewport:  N {:.4}  S {:.4}  E {:.4}  W {:.4}\n  center:    {:.4}, {:.4}",
            bbox.north,
            bbox.south,
            bbox.east,
            bbox.west,
            center.latitude(),
            center.longitude()
        ));
    }
    out
}

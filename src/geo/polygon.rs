use super::LatLng;

/// Appends the first vertex when the ring is open. Empty input stays empty.
pub fn close_ring(mut ring: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}

pub fn is_closed(ring: &[[f64; 2]]) -> bool {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => ring.len() > 1 && first == last,
        _ => false,
    }
}

/// Number of vertices ignoring the closing duplicate.
pub fn distinct_vertex_count(ring: &[[f64; 2]]) -> usize {
    let mut vertices: Vec<[f64; 2]> = Vec::with_capacity(ring.len());
    for vertex in ring {
        if !vertices.contains(vertex) {
            vertices.push(*vertex);
        }
    }
    vertices.len()
}

/// Ray casting over `[lat, lng]` vertices, lng on the x axis.
pub fn contains(ring: &[[f64; 2]], point: LatLng) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (yi, xi) = (ring[i][0], ring[i][1]);
        let (yj, xj) = (ring[j][0], ring[j][1]);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

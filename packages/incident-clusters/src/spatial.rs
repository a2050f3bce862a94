//! Greedy grid clustering in Web Mercator pixel space.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::encoder::dominant_type;
use crate::layer::Marker;
use crate::types::cluster::Cluster;
use crate::types::incident::{IncidentType, LatLng};
use crate::zoom::ActiveBand;

const TILE_SIZE: f64 = 256.0;

/// Mercator is undefined at the poles.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Project a position to world pixel coordinates at `zoom`.
pub fn project(position: LatLng, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat = position.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (position.lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}

struct Seed {
    x: f64,
    y: f64,
    members: Vec<usize>,
}

/// Group markers for the given band.
///
/// Markers are visited in order. Each joins the nearest seed within
/// `radius_px` among the neighbouring grid cells, or starts a new one.
/// Aggregates are rebuilt from full membership on every call.
pub fn cluster_markers(markers: &[Marker], band: &ActiveBand) -> Vec<Cluster> {
    if !band.clustering_enabled() || band.radius_px <= 0.0 {
        return (0..markers.len())
            .map(|i| aggregate(markers, vec![i]))
            .collect();
    }

    let radius = band.radius_px;
    let radius_sq = radius * radius;
    let mut seeds: Vec<Seed> = Vec::new();
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();

    for (index, marker) in markers.iter().enumerate() {
        let (x, y) = project(marker.point.position, band.zoom);
        let cell = ((x / radius).floor() as i64, (y / radius).floor() as i64);

        let mut nearest: Option<(usize, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(candidates) = grid.get(&(cell.0 + dx, cell.1 + dy)) else {
                    continue;
                };
                for &seed_index in candidates {
                    let seed = &seeds[seed_index];
                    let dist_sq = (seed.x - x).powi(2) + (seed.y - y).powi(2);
                    if dist_sq <= radius_sq && nearest.map_or(true, |(_, best)| dist_sq < best) {
                        nearest = Some((seed_index, dist_sq));
                    }
                }
            }
        }

        match nearest {
            Some((seed_index, _)) => seeds[seed_index].members.push(index),
            None => {
                grid.entry(cell).or_default().push(seeds.len());
                seeds.push(Seed {
                    x,
                    y,
                    members: vec![index],
                });
            }
        }
    }

    seeds
        .into_iter()
        .map(|seed| aggregate(markers, seed.members))
        .collect()
}

fn aggregate(markers: &[Marker], members: Vec<usize>) -> Cluster {
    let count = members.len();
    let mut lat_sum = 0.0;
    let mut lng_sum = 0.0;
    let mut weight_sum = 0.0;
    let mut severity_sum = 0u32;

    for &i in &members {
        let marker = &markers[i];
        lat_sum += marker.point.position.lat;
        lng_sum += marker.point.position.lng;
        weight_sum += marker.weight;
        severity_sum += u32::from(marker.point.severity.value());
    }

    let n = count.max(1) as f64;
    Cluster {
        centroid: LatLng::new(lat_sum / n, lng_sum / n),
        member_weight_sum: weight_sum,
        member_count: count,
        dominant_type: dominant_type(members.iter().map(|&i| markers[i].point.incident_type))
            .unwrap_or(IncidentType::Other),
        average_severity: f64::from(severity_sum) / n,
        members,
    }
}

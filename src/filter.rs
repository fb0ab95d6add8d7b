use crate::types::GeoPoint;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::{MultiPolygon, Point, Polygon};
use rayon::iter::Either;
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};

/// One part of the boundary, indexed by its bounding box.
pub struct BoundaryPart(Polygon<f64>);

impl RTreeObject for BoundaryPart {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        match self.0.bounding_rect() {
            Some(rect) => AABB::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            ),
            None => AABB::from_point([0.0, 0.0]),
        }
    }
}

/// R-tree over a boundary's parts, for batched point-in-polygon checks.
///
/// Membership is strict-interior ("within"): a point exactly on an edge is
/// not contained. The envelope pass rejects most outside points before any
/// exact ring test runs.
pub struct BoundaryIndex {
    tree: RTree<BoundaryPart>,
}

impl BoundaryIndex {
    pub fn new(boundary: &MultiPolygon<f64>) -> Self {
        let parts: Vec<BoundaryPart> = boundary.iter().map(|p| BoundaryPart(p.clone())).collect();
        BoundaryIndex { tree: RTree::bulk_load(parts) }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let point = Point::new(lon, lat);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .any(|part| part.0.contains(&point))
    }

    /// Splits `points` into the contained subset and the original indices of
    /// the rest. Pure; every input lands in exactly one half.
    pub fn partition(&self, points: &[GeoPoint]) -> (Vec<GeoPoint>, Vec<usize>) {
        points
            .par_iter()
            .enumerate()
            .partition_map(|(pos, point)| {
                if self.contains(point.lat, point.lon) {
                    Either::Left(*point)
                } else {
                    Either::Right(point.original_index.unwrap_or(pos))
                }
            })
    }
}

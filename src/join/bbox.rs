use geo::{BoundingRect, Rect};
use rstar::{RTree, RTreeObject, AABB};

use crate::layer::FeatureCollection;

/// A bounding box in an R-tree, associated with a feature by index.
#[derive(Debug, Clone)]
pub(super) struct BoundingBox {
    idx: usize, // Index of corresponding feature in the layer
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(super) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Get the index of the corresponding feature.
    pub(super) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Finite bounding rectangle of a feature geometry, if it has one.
pub(super) fn finite_bounds(geometry: &geo::MultiPolygon<f64>) -> Option<Rect<f64>> {
    geometry.bounding_rect().filter(|rect| {
        rect.min().x.is_finite() && rect.min().y.is_finite() && rect.max().x.is_finite() && rect.max().y.is_finite()
    })
}

/// R-tree over the bounding boxes of a layer's features.
pub(super) struct LayerIndex {
    rtree: RTree<BoundingBox>,
}

impl LayerIndex {
    /// Bulk-load the index; features without a finite bounding box are left out.
    pub(super) fn new(layer: &FeatureCollection) -> Self {
        Self {
            rtree: RTree::bulk_load(
                layer.features().iter().enumerate()
                    .filter_map(|(i, feature)| finite_bounds(&feature.geometry).map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
        }
    }

    /// Indices of features whose bounding box intersects `rect`, in ascending order.
    pub(super) fn candidates(&self, rect: &Rect<f64>) -> Vec<usize> {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        let mut found: Vec<usize> = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(BoundingBox::idx)
            .collect();
        found.sort_unstable();
        found
    }

    #[inline] pub(super) fn len(&self) -> usize { self.rtree.size() }
}

//! Rasterization of classified features into per-type probability surfaces.
//!
//! Each feature spreads its `area_probability` evenly over the bins it covers. Polygons
//! cover the bins whose centers fall inside them, lines and points cover the bins whose
//! centers lie within a fixed radius. Bins whose center falls outside the region are masked.
//! A feature that touches the region but reaches no unmasked bin is credited to the bin
//! holding a point it shares with the region, so no feature's mass is lost.
use std::collections::BTreeMap;

use geo::{BoundingRect, LineString, Polygon};
use glam::DVec2;
use tracing::debug;

use super::grid::BinGrid;
use super::raster::Heatmap;
use crate::features::{CategorySet, Feature, FeatureCategory, Footprint};
use crate::geometry::{distance_to_segment, to_dvec, FeatureGeometry, Region};

/// Rasterizes features onto a fixed grid inside a region.
#[derive(Clone, Debug)]
pub struct SurfaceBuilder {
    region: Region,
    grid: BinGrid,
    mask: Vec<bool>,
}

impl SurfaceBuilder {
    pub fn new(region: &Region, grid: BinGrid) -> Self {
        let mask = region_mask(region, &grid);
        Self {
            region: region.clone(),
            grid,
            mask,
        }
    }

    pub fn grid(&self) -> &BinGrid {
        &self.grid
    }

    /// One flag per bin, `true` where the bin center lies inside the region.
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Number of bins inside the region.
    pub fn cells_inside(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }

    /// Row-major indices of the in-region bins covered by a projected geometry, sorted and
    /// without duplicates.
    ///
    /// When every covered bin is masked out but the geometry still touches the region, the
    /// result is the single bin holding a shared point, mask or not. Empty only for geometry
    /// disjoint from the region.
    pub fn covered_cells(&self, local: &FeatureGeometry, footprint: Footprint) -> Vec<usize> {
        let half_bin = self.grid.bin_size * 0.5;
        let mut cells = match local {
            FeatureGeometry::Polygon(p) => {
                let mut cells = Vec::new();
                for_each_cell_inside(p, &self.grid, |i| cells.push(i));
                if cells.is_empty() {
                    cells.extend(self.cell_at(local.representative_point()));
                }
                cells
            }
            FeatureGeometry::Line(l) => {
                line_cells(l, (footprint.line_width_m * 0.5).max(half_bin), &self.grid)
            }
            FeatureGeometry::Point(p) => {
                let center = to_dvec(p.0);
                let radius = footprint.point_radius_m.max(half_bin);
                let mut cells = disc_cells(center, radius, &self.grid);
                if cells.is_empty() {
                    cells.extend(self.cell_at(Some(center)));
                }
                cells
            }
        };
        cells.sort_unstable();
        cells.dedup();
        cells.retain(|i| self.mask[*i]);
        if cells.is_empty() {
            cells.extend(self.anchor_cell(local));
        }
        cells
    }

    fn cell_at(&self, p: Option<DVec2>) -> Option<usize> {
        let (ix, iy) = self.grid.world_to_index(p?);
        self.grid.index(ix, iy)
    }

    /// The bin holding a point shared by the geometry and the region. Points on the grid's
    /// outer edge map to the nearest bin.
    fn anchor_cell(&self, local: &FeatureGeometry) -> Option<usize> {
        if self.grid.is_empty() {
            return None;
        }
        let p = self.region.touch_point_local(local)?;
        let (ix, iy) = self.grid.world_to_index(p);
        self.grid.index(
            ix.clamp(0, self.grid.width as isize - 1),
            iy.clamp(0, self.grid.height as isize - 1),
        )
    }

    /// Bakes the normalized surface of a group of features. The result is all zeros when
    /// none of them touches the region with positive weight.
    pub fn bake_type<'f>(
        &self,
        features: impl IntoIterator<Item = &'f Feature>,
        footprint: Footprint,
    ) -> Heatmap {
        let mut heatmap = Heatmap::new(self.grid.clone());
        for feature in features {
            let local = feature.geometry.project(self.region.frame());
            let cells = self.covered_cells(&local, footprint);
            if cells.is_empty() {
                continue;
            }
            let share = feature.area_probability / cells.len() as f64;
            for i in cells {
                heatmap.data[i] += share;
            }
        }
        if heatmap.normalize().is_err() {
            heatmap.data.fill(0.0);
        }
        heatmap
    }

    /// Bakes one surface for every category of `set` and every category present in
    /// `features`.
    pub fn bake_all(
        &self,
        features: &[Feature],
        set: &CategorySet,
    ) -> BTreeMap<FeatureCategory, Heatmap> {
        let mut categories: Vec<FeatureCategory> = set.categories().collect();
        categories.extend(features.iter().map(|f| f.feature_type));
        categories.sort_unstable();
        categories.dedup();

        categories
            .into_iter()
            .map(|category| {
                let members = features.iter().filter(|f| f.feature_type == category);
                let heatmap = self.bake_type(members, set.footprint(category));
                debug!(
                    "Baked '{}' surface ({}x{}, empty: {}).",
                    category,
                    self.grid.width,
                    self.grid.height,
                    heatmap.is_zero()
                );
                (category, heatmap)
            })
            .collect()
    }
}

/// Flags the bins whose center lies inside the region.
pub fn region_mask(region: &Region, grid: &BinGrid) -> Vec<bool> {
    let mut mask = vec![false; grid.len()];
    match region.local_polygon() {
        Some(polygon) => for_each_cell_inside(polygon, grid, |i| mask[i] = true),
        None => {
            let (min, max) = region.bounds();
            if let Some((x0, x1, y0, y1)) = grid.index_span(min, max) {
                for iy in y0..=y1 {
                    for ix in x0..=x1 {
                        let center = grid.index_to_world(ix as isize, iy as isize);
                        if region.contains_local(center) {
                            mask[iy * grid.width + ix] = true;
                        }
                    }
                }
            }
        }
    }
    mask
}

/// Visits every in-grid bin whose center lies inside `polygon`, using an even-odd scanline
/// through the bin centers of each row. Holes are honoured.
pub fn for_each_cell_inside(
    polygon: &Polygon<f64>,
    grid: &BinGrid,
    mut visit: impl FnMut(usize),
) {
    let Some(rect) = polygon.bounding_rect() else {
        return;
    };
    let Some((x0, x1, y0, y1)) = grid.index_span(to_dvec(rect.min()), to_dvec(rect.max())) else {
        return;
    };

    let rings: Vec<&LineString<f64>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .collect();
    let mut crossings: Vec<f64> = Vec::new();

    for iy in y0..=y1 {
        let cy = grid.index_to_world(0, iy as isize).y;
        crossings.clear();
        for ring in &rings {
            for seg in ring.lines() {
                let (a, b) = (seg.start, seg.end);
                if (a.y > cy) != (b.y > cy) {
                    crossings.push(a.x + (cy - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            // Bins with center x in [span[0], span[1]).
            let start = ((span[0] - grid.origin.x) / grid.bin_size - 0.5).ceil();
            let end = ((span[1] - grid.origin.x) / grid.bin_size - 0.5).ceil();
            let start = start.max(x0 as f64);
            let end = end.min((x1 + 1) as f64);
            if start >= end {
                continue;
            }
            for ix in start as usize..end as usize {
                visit(iy * grid.width + ix);
            }
        }
    }
}

/// Bins whose center lies within `radius` of the polyline.
///
/// Each segment is clipped to the grid (padded by the radius) and walked bin by bin; only
/// a small window around every walked bin is tested against the exact segment distance.
fn line_cells(line: &LineString<f64>, radius: f64, grid: &BinGrid) -> Vec<usize> {
    if line.0.len() == 1 {
        return disc_cells(to_dvec(line.0[0]), radius, grid);
    }
    if grid.is_empty() {
        return Vec::new();
    }
    let (min, max) = grid.bounds();
    let pad = DVec2::splat(radius + grid.bin_size);
    // A bin center within `radius` of a segment point is at most this many bins away.
    let reach = (radius / grid.bin_size).ceil() as isize + 1;

    let mut cells = Vec::new();
    for seg in line.lines() {
        let (a, b) = (to_dvec(seg.start), to_dvec(seg.end));
        let Some((from, to)) = clip_segment(a, b, min - pad, max + pad) else {
            continue;
        };
        walk_segment(from, to, grid, |ix, iy| {
            for wy in iy - reach..=iy + reach {
                for wx in ix - reach..=ix + reach {
                    let Some(i) = grid.index(wx, wy) else {
                        continue;
                    };
                    if distance_to_segment(grid.index_to_world(wx, wy), a, b) <= radius {
                        cells.push(i);
                    }
                }
            }
        });
    }
    cells
}

/// Liang-Barsky clipping of segment `a`-`b` to the box `min`..`max`.
fn clip_segment(a: DVec2, b: DVec2, min: DVec2, max: DVec2) -> Option<(DVec2, DVec2)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((a + d * t0, a + d * t1))
}

/// Visits the `(column, row)` of every bin the segment passes through, in order, with a
/// grid traversal (Amanatides-Woo). Indices may lie outside the grid.
fn walk_segment(a: DVec2, b: DVec2, grid: &BinGrid, mut visit: impl FnMut(isize, isize)) {
    let to_grid = |p: DVec2| {
        DVec2::new(
            (p.x - grid.origin.x) / grid.bin_size,
            (grid.origin.y - p.y) / grid.bin_size,
        )
    };
    let (ga, gb) = (to_grid(a), to_grid(b));
    let (mut ix, mut iy) = (ga.x.floor() as isize, ga.y.floor() as isize);
    let (ex, ey) = (gb.x.floor() as isize, gb.y.floor() as isize);

    let d = gb - ga;
    let (step_x, delta_x, mut next_x) = axis_walk(ga.x, d.x, ix);
    let (step_y, delta_y, mut next_y) = axis_walk(ga.y, d.y, iy);

    visit(ix, iy);
    let steps = (ex - ix).abs() + (ey - iy).abs();
    for _ in 0..steps {
        // The step count ends the walk on the end bin even if float noise misorders a crossing.
        let along_x = if ix == ex {
            false
        } else if iy == ey {
            true
        } else {
            next_x < next_y
        };
        if along_x {
            ix += step_x;
            next_x += delta_x;
        } else {
            iy += step_y;
            next_y += delta_y;
        }
        visit(ix, iy);
    }
}

/// `(step, t between crossings, t of the first crossing)` along one axis.
fn axis_walk(start: f64, delta: f64, cell: isize) -> (isize, f64, f64) {
    if delta > 0.0 {
        (1, 1.0 / delta, ((cell + 1) as f64 - start) / delta)
    } else if delta < 0.0 {
        (-1, -1.0 / delta, (cell as f64 - start) / delta)
    } else {
        (0, f64::INFINITY, f64::INFINITY)
    }
}

fn disc_cells(center: DVec2, radius: f64, grid: &BinGrid) -> Vec<usize> {
    let reach = DVec2::splat(radius);
    let Some((x0, x1, y0, y1)) = grid.index_span(center - reach, center + reach) else {
        return Vec::new();
    };
    let mut cells = Vec::new();
    for iy in y0..=y1 {
        for ix in x0..=x1 {
            if grid.index_to_world(ix as isize, iy as isize).distance(center) <= radius {
                cells.push(iy * grid.width + ix);
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use geo::{line_string, point, polygon, Coord};

    use super::*;
    use crate::geometry::LonLat;

    // 4 x 3 bins of 30 m, centers at x = 15, 45, 75, 105 and y = 75, 45, 15.
    fn grid() -> BinGrid {
        BinGrid::covering(DVec2::new(0.0, 0.0), DVec2::new(120.0, 90.0), 30.0)
    }

    fn collect_inside(polygon: &Polygon<f64>) -> Vec<usize> {
        let mut cells = Vec::new();
        for_each_cell_inside(polygon, &grid(), |i| cells.push(i));
        cells.sort_unstable();
        cells
    }

    #[test]
    fn scanline_selects_bins_by_center() {
        let half = polygon![
            (x: 0.0, y: 0.0),
            (x: 60.0, y: 0.0),
            (x: 60.0, y: 90.0),
            (x: 0.0, y: 90.0)
        ];
        assert_eq!(collect_inside(&half), vec![0, 1, 4, 5, 8, 9]);
    }

    #[test]
    fn scanline_skips_holes() {
        let exterior = LineString::from(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 120.0, y: 0.0 },
            Coord { x: 120.0, y: 90.0 },
            Coord { x: 0.0, y: 90.0 },
            Coord { x: 0.0, y: 0.0 },
        ]);
        let hole = LineString::from(vec![
            Coord { x: 35.0, y: 35.0 },
            Coord { x: 85.0, y: 35.0 },
            Coord { x: 85.0, y: 55.0 },
            Coord { x: 35.0, y: 55.0 },
            Coord { x: 35.0, y: 35.0 },
        ]);
        let cells = collect_inside(&Polygon::new(exterior, vec![hole]));
        assert_eq!(cells.len(), 10);
        assert!(!cells.contains(&5));
        assert!(!cells.contains(&6));
    }

    #[test]
    fn scanline_clamps_to_grid() {
        let big = polygon![
            (x: -500.0, y: -500.0),
            (x: 500.0, y: -500.0),
            (x: 500.0, y: 500.0),
            (x: -500.0, y: 500.0)
        ];
        assert_eq!(collect_inside(&big), (0..12).collect::<Vec<_>>());
    }

    // Every bin of `grid()` lies well inside this circle.
    fn unmasked(grid: BinGrid) -> SurfaceBuilder {
        let mask = vec![true; grid.len()];
        SurfaceBuilder {
            region: Region::circle(LonLat::new(0.0, 0.0), 1_000.0).unwrap(),
            grid,
            mask,
        }
    }

    #[test]
    fn tiny_polygon_falls_back_to_its_centroid_bin() {
        let builder = unmasked(grid());
        let tiny = FeatureGeometry::Polygon(polygon![
            (x: 80.0, y: 10.0),
            (x: 84.0, y: 10.0),
            (x: 84.0, y: 14.0),
            (x: 80.0, y: 14.0)
        ]);
        assert_eq!(builder.covered_cells(&tiny, Footprint::DEFAULT), vec![10]);
    }

    #[test]
    fn line_covers_bins_within_half_a_bin() {
        let builder = unmasked(grid());
        let road = FeatureGeometry::Line(line_string![(x: 0.0, y: 45.0), (x: 120.0, y: 45.0)]);
        assert_eq!(builder.covered_cells(&road, Footprint::DEFAULT), vec![4, 5, 6, 7]);

        let wide = Footprint {
            line_width_m: 61.0,
            point_radius_m: 10.0,
        };
        assert_eq!(builder.covered_cells(&road, wide).len(), 12);
    }

    #[test]
    fn point_on_a_bin_edge_covers_both_neighbours() {
        let builder = unmasked(grid());
        let house = FeatureGeometry::Point(point!(x: 60.0, y: 45.0));
        assert_eq!(builder.covered_cells(&house, Footprint::DEFAULT), vec![5, 6]);
    }

    #[test]
    fn geometry_outside_the_grid_covers_nothing() {
        let builder = unmasked(grid());
        let far = FeatureGeometry::Point(point!(x: 1000.0, y: 1000.0));
        assert!(builder.covered_cells(&far, Footprint::DEFAULT).is_empty());
    }

    #[test]
    fn circle_mask_keeps_bins_near_the_center() {
        let region = Region::circle(LonLat::new(10.0, 55.0), 40.0).unwrap();
        let (min, max) = region.bounds();
        let grid = BinGrid::covering(min, max, 30.0);
        assert_eq!((grid.width, grid.height), (3, 3));
        let mask = region_mask(&region, &grid);
        // Corner bin centers sit ~42 m from the center.
        assert_eq!(
            mask,
            vec![false, true, false, true, true, true, false, true, false]
        );
    }

    #[test]
    fn masked_out_feature_keeps_its_anchor_bin() {
        let region = Region::circle(LonLat::new(10.0, 55.0), 40.0).unwrap();
        let (min, max) = region.bounds();
        let builder = SurfaceBuilder::new(&region, BinGrid::covering(min, max, 30.0));
        assert!(!builder.mask()[2]);

        // Inside the circle, but the only bin center in reach is the masked corner.
        let house = FeatureGeometry::Point(point!(x: 28.0, y: 28.0));
        assert_eq!(builder.covered_cells(&house, Footprint::DEFAULT), vec![2]);

        let outside = FeatureGeometry::Point(point!(x: 38.0, y: 38.0));
        assert!(builder.covered_cells(&outside, Footprint::DEFAULT).is_empty());
    }

    fn scanned_line_cells(line: &LineString<f64>, radius: f64, grid: &BinGrid) -> Vec<usize> {
        let mut cells = Vec::new();
        for seg in line.lines() {
            let (a, b) = (to_dvec(seg.start), to_dvec(seg.end));
            for i in 0..grid.len() {
                let (ix, iy) = ((i % grid.width) as isize, (i / grid.width) as isize);
                if distance_to_segment(grid.index_to_world(ix, iy), a, b) <= radius {
                    cells.push(i);
                }
            }
        }
        cells.sort_unstable();
        cells.dedup();
        cells
    }

    #[test]
    fn walked_lines_match_a_full_scan() {
        let grid = BinGrid::covering(DVec2::new(0.0, 0.0), DVec2::new(600.0, 450.0), 30.0);
        let lines = [
            line_string![(x: 3.0, y: -40.0), (x: 117.0, y: 88.0), (x: 590.0, y: 20.0)],
            line_string![(x: -300.0, y: -200.0), (x: 900.0, y: 700.0)],
            line_string![(x: 580.0, y: 440.0), (x: 10.0, y: 12.0)],
            line_string![(x: 301.0, y: -90.0), (x: 302.0, y: 900.0)],
            line_string![(x: -50.0, y: 225.0), (x: 650.0, y: 225.0)],
            line_string![(x: 60.0, y: 60.0), (x: 60.0, y: 60.0), (x: 240.0, y: 90.0)],
            line_string![(x: -900.0, y: -900.0), (x: -800.0, y: 900.0)],
        ];
        for line in &lines {
            for radius in [15.0, 30.5, 95.0] {
                let mut walked = line_cells(line, radius, &grid);
                walked.sort_unstable();
                walked.dedup();
                assert_eq!(walked, scanned_line_cells(line, radius, &grid), "{line:?} r={radius}");
            }
        }
    }

    #[test]
    fn baked_surfaces_are_normalized_or_empty() {
        let region = Region::circle(LonLat::new(10.0, 55.0), 300.0).unwrap();
        let (min, max) = region.bounds();
        let builder = SurfaceBuilder::new(&region, BinGrid::covering(min, max, 30.0));
        assert!(builder.cells_inside() > 0);

        let features = vec![
            Feature {
                feature_type: FeatureCategory::Structure,
                area_probability: 0.4,
                geometry: FeatureGeometry::Point(point!(x: 10.0, y: 55.0)),
            },
            Feature {
                feature_type: FeatureCategory::Structure,
                area_probability: 0.6,
                geometry: FeatureGeometry::Point(point!(x: 10.001, y: 55.001)),
            },
        ];
        let set = crate::features::category_set(
            crate::config::Climate::Temperate,
            crate::config::EnvironmentType::Flat,
        )
        .unwrap();
        let surfaces = builder.bake_all(&features, set);

        assert!(surfaces[&FeatureCategory::Structure].is_normalized());
        assert!(surfaces[&FeatureCategory::Woodland].is_zero());
        assert_eq!(surfaces.len(), set.categories().count());
    }
}

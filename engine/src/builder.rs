use ndarray::Zip;
use rayon::prelude::*;

use crate::color_band::{ColorBand, ColorBandList};
use crate::error::{Result, TerrainError};
use crate::grid::VertexGrid;
use crate::height_field::compute_elevation;
use crate::noise_source::NoiseSource;
use crate::params::{Calibration, TerrainParameters, WorldDimensions};

/// A finished terrain: displaced grid plus everything a renderer needs to
/// shade it. Replaced wholesale on every rebuild.
#[derive(Debug, Clone)]
pub struct TerrainSurface {
    grid: VertexGrid,
    bands: ColorBandList,
    calibration: Calibration,
    normals: Vec<[f32; 3]>,
    tints: Vec<[f32; 3]>,
    flat_shading: bool,
    generation: u64,
    dirty: bool,
}

impl TerrainSurface {
    fn new(grid: VertexGrid, bands: ColorBandList, params: &TerrainParameters) -> Self {
        let mut surface = Self {
            grid,
            bands,
            calibration: params.calibration,
            normals: Vec::new(),
            tints: Vec::new(),
            flat_shading: params.flat_shading,
            generation: 0,
            dirty: true,
        };
        surface.recompute_tints();
        surface.recompute_normals();
        surface
    }

    pub fn grid(&self) -> &VertexGrid {
        &self.grid
    }

    pub fn bands(&self) -> &ColorBandList {
        &self.bands
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn tints(&self) -> &[[f32; 3]] {
        &self.tints
    }

    pub fn flat_shading(&self) -> bool {
        self.flat_shading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn vertex_count(&self) -> usize {
        self.grid.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns the dirty flag and clears it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Smooth per-vertex normals in Y-up world space, from central differences
    /// of the height channel (one-sided on the border).
    pub fn recompute_normals(&mut self) {
        let g = &self.grid;
        let (cols, rows) = (g.columns(), g.rows());
        let mut normals = Vec::with_capacity(g.len());

        for row in 0..rows {
            let (r0, r1) = (row.saturating_sub(1), (row + 1).min(rows - 1));
            for col in 0..cols {
                let (c0, c1) = (col.saturating_sub(1), (col + 1).min(cols - 1));

                let dhdx = (g.elevation(c1, row) - g.elevation(c0, row)) / (g.x_at(c1) - g.x_at(c0));
                let dhdy = (g.elevation(col, r1) - g.elevation(col, r0)) / (g.y_at(r1) - g.y_at(r0));

                // Plane-local (-dh/dx, -dh/dy, 1) rotated so that local z becomes world y.
                let n = [-dhdx, 1.0, dhdy];
                let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
                normals.push([n[0] / len, n[1] / len, n[2] / len]);
            }
        }

        self.normals = normals;
        self.dirty = true;
    }

    pub fn recompute_tints(&mut self) {
        let (bands, calibration) = (&self.bands, &self.calibration);
        self.tints = self
            .grid
            .elevations()
            .as_slice()
            .unwrap_or_default()
            .par_iter()
            .map(|&h| bands.tint_for_elevation(f64::from(h), calibration))
            .collect();
        self.dirty = true;
    }

    /// Vertex positions with y up: plane-local `(x, y, z)` becomes `(x, z, -y)`.
    pub fn world_positions(&self) -> Vec<[f32; 3]> {
        self.grid.positions().map(|[x, y, z]| [x, z, -y]).collect()
    }

    /// Two counter-clockwise (seen from above) triangles per grid cell.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let g = &self.grid;
        let (cols, rows) = (g.columns(), g.rows());
        let mut indices = Vec::with_capacity((cols - 1) * (rows - 1) * 6);
        for row in 0..rows - 1 {
            for col in 0..cols - 1 {
                let a = g.index(col, row) as u32;
                let b = g.index(col + 1, row) as u32;
                let c = g.index(col, row + 1) as u32;
                let d = g.index(col + 1, row + 1) as u32;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }
        indices
    }

    /// Texture coordinates repeating `tile` times across the plane.
    pub fn uvs(&self, tile: f32) -> Vec<[f32; 2]> {
        let (res_x, res_z) = self.grid.resolution();
        let cols = self.grid.columns();
        (0..self.grid.len())
            .map(|i| {
                let (col, row) = (i % cols, i / cols);
                [
                    col as f32 / res_x as f32 * tile,
                    row as f32 / res_z as f32 * tile,
                ]
            })
            .collect()
    }
}

/// Builds a terrain surface from parameters and a colour band list.
pub struct TerrainBuilder<'a> {
    params: &'a TerrainParameters,
    bands: &'a ColorBandList,
}

impl<'a> TerrainBuilder<'a> {
    pub fn new(params: &'a TerrainParameters, bands: &'a ColorBandList) -> Self {
        Self { params, bands }
    }

    pub fn build(
        &self,
        world_width: f32,
        world_height: f32,
        resolution_x: u32,
        resolution_z: u32,
    ) -> Result<TerrainSurface> {
        self.params.validate()?;
        let mut grid = VertexGrid::new(world_width, world_height, resolution_x, resolution_z)?;

        let noise = NoiseSource::new(self.params.seed, self.params.noise_kind);
        let xs: Vec<f64> = (0..grid.columns()).map(|c| f64::from(grid.x_at(c))).collect();
        let ys: Vec<f64> = (0..grid.rows()).map(|r| f64::from(grid.y_at(r))).collect();
        let params = self.params;

        Zip::indexed(grid.elevations_mut()).par_for_each(|(row, col), h| {
            *h = compute_elevation(&noise, xs[col], ys[row], params) as f32;
        });

        Ok(TerrainSurface::new(grid, self.bands.clone(), self.params))
    }

    pub fn build_for(&self, dims: &WorldDimensions) -> Result<TerrainSurface> {
        dims.validate()?;
        let (size, segments) = (dims.size(), dims.segments());
        self.build(size, size, segments, segments)
    }
}

/// Owns the live terrain parameters and the one current surface.
///
/// Any accepted change marks the state stale; `rebuild` replaces the current
/// surface in one step. A rejected change or failed rebuild leaves the last
/// good surface in place.
#[derive(Debug)]
pub struct TerrainState {
    params: TerrainParameters,
    bands: ColorBandList,
    dims: WorldDimensions,
    current: Option<TerrainSurface>,
    stale: bool,
    generation: u64,
    last_error: Option<String>,
}

impl Default for TerrainState {
    fn default() -> Self {
        Self::new(TerrainParameters::default(), ColorBandList::default(), WorldDimensions::default())
    }
}

impl TerrainState {
    pub fn new(params: TerrainParameters, bands: ColorBandList, dims: WorldDimensions) -> Self {
        Self {
            params,
            bands,
            dims,
            current: None,
            stale: true,
            generation: 0,
            last_error: None,
        }
    }

    pub fn params(&self) -> &TerrainParameters {
        &self.params
    }

    pub fn bands(&self) -> &ColorBandList {
        &self.bands
    }

    pub fn dimensions(&self) -> &WorldDimensions {
        &self.dims
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current(&self) -> Option<&TerrainSurface> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut TerrainSurface> {
        self.current.as_mut()
    }

    pub fn set_params(&mut self, params: TerrainParameters) -> Result<()> {
        self.record(params.validate())?;
        if params != self.params {
            self.params = params;
            self.stale = true;
        }
        Ok(())
    }

    pub fn set_bands(&mut self, bands: Vec<ColorBand>) -> Result<()> {
        let bands = self.record(ColorBandList::new(bands))?;
        if bands != self.bands {
            self.bands = bands;
            self.stale = true;
        }
        Ok(())
    }

    pub fn set_dimensions(&mut self, dims: WorldDimensions) -> Result<()> {
        self.record(dims.validate())?;
        if dims != self.dims {
            self.dims = dims;
            self.stale = true;
        }
        Ok(())
    }

    /// Rebuilds if stale and returns the current surface.
    pub fn rebuild(&mut self) -> Result<&TerrainSurface> {
        if self.stale || self.current.is_none() {
            let built = TerrainBuilder::new(&self.params, &self.bands).build_for(&self.dims);
            let mut surface = self.record(built)?;
            self.generation += 1;
            self.last_error = None;
            surface.generation = self.generation;
            surface.mark_dirty();
            self.stale = false;
            self.current = Some(surface);
        }
        self.current
            .as_ref()
            .ok_or_else(|| TerrainError::InvalidGrid("no terrain surface has been built".to_string()))
    }

    /// Keeps the message of a rejected change until the next successful rebuild.
    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.last_error = Some(e.to_string());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_state() -> TerrainState {
        let dims = WorldDimensions { scale: 1, base_size: 400.0, base_segments: 8 };
        TerrainState::new(TerrainParameters { seed: 5, ..Default::default() }, ColorBandList::default(), dims)
    }

    #[test]
    fn build_fills_every_vertex() {
        let params = TerrainParameters { seed: 9, smoothing: 1.0, ..Default::default() };
        let bands = ColorBandList::default();
        let s = TerrainBuilder::new(&params, &bands).build(100.0, 100.0, 6, 4).unwrap();
        assert_eq!(s.vertex_count(), 7 * 5);
        assert_eq!(s.normals().len(), 35);
        assert_eq!(s.tints().len(), 35);
        assert_eq!(s.triangle_indices().len(), 6 * 4 * 6);
        let noise = NoiseSource::perlin(9);
        for row in 0..5 {
            for col in 0..7 {
                let g = s.grid();
                let want = compute_elevation(&noise, f64::from(g.x_at(col)), f64::from(g.y_at(row)), &params) as f32;
                assert_eq!(g.elevation(col, row), want);
            }
        }
    }

    #[test]
    fn flat_grid_has_upward_normals() {
        let params = TerrainParameters::default();
        let grid = VertexGrid::new(10.0, 10.0, 2, 2).unwrap();
        let s = TerrainSurface::new(grid, ColorBandList::default(), &params);
        for n in s.normals() {
            assert_eq!(*n, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn sloped_grid_normals_lean_downhill() {
        let params = TerrainParameters::default();
        let mut grid = VertexGrid::new(4.0, 4.0, 4, 4).unwrap();
        for row in 0..grid.rows() {
            for col in 0..grid.columns() {
                let x = grid.x_at(col);
                grid.set_elevation(col, row, x);
            }
        }
        let s = TerrainSurface::new(grid, ColorBandList::default(), &params);
        let s2 = std::f32::consts::FRAC_1_SQRT_2;
        for n in s.normals() {
            assert!((n[0] + s2).abs() < 1e-6 && (n[1] - s2).abs() < 1e-6 && n[2].abs() < 1e-6);
        }
    }

    #[test]
    fn triangles_face_up() {
        let params = TerrainParameters::default();
        let grid = VertexGrid::new(10.0, 10.0, 3, 3).unwrap();
        let s = TerrainSurface::new(grid, ColorBandList::default(), &params);
        let p = s.world_positions();
        for tri in s.triangle_indices().chunks(3) {
            let (a, b, c) = (p[tri[0] as usize], p[tri[1] as usize], p[tri[2] as usize]);
            let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let ny = u[2] * v[0] - u[0] * v[2];
            assert!(ny > 0.0);
        }
    }

    #[test]
    fn rebuild_replaces_surface_and_bumps_generation() {
        let mut state = small_state();
        assert!(state.is_stale());
        let first = state.rebuild().unwrap().clone();
        assert_eq!(first.generation(), 1);
        assert!(!state.is_stale());

        // No change, no rebuild.
        assert_eq!(state.rebuild().unwrap().generation(), 1);

        let mut p = state.params().clone();
        p.peak = 900.0;
        state.set_params(p).unwrap();
        assert!(state.is_stale());
        let second = state.rebuild().unwrap();
        assert_eq!(second.generation(), 2);
        assert_ne!(first.grid().elevations(), second.grid().elevations());
    }

    #[test]
    fn rejected_change_keeps_last_good_surface() {
        let mut state = small_state();
        state.rebuild().unwrap();
        let mut p = state.params().clone();
        p.smoothing = 0.0;
        let err = state.set_params(p).unwrap_err();
        assert!(matches!(err, TerrainError::InvalidParameter { name: "smoothing", .. }));
        assert!(!state.is_stale());
        assert_eq!(state.params().smoothing, 100.0);
        assert_eq!(state.current().unwrap().generation(), 1);
        assert!(state.last_error().unwrap().contains("smoothing"));

        assert!(state.set_bands(vec![]).is_err());
        assert_eq!(state.bands(), &ColorBandList::default());
    }

    #[test]
    fn failed_rebuild_keeps_previous_surface() {
        let mut state = small_state();
        state.rebuild().unwrap();
        state.dims.scale = 0;
        state.stale = true;

        assert!(matches!(state.rebuild(), Err(TerrainError::InvalidGrid(_))));
        assert!(state.is_stale());
        assert_eq!(state.current().unwrap().generation(), 1);
        assert!(state.last_error().unwrap().contains("empty grid"));
    }

    #[test]
    fn rejection_message_lasts_until_next_rebuild() {
        let mut state = small_state();
        state.rebuild().unwrap();
        assert!(state.set_bands(vec![]).is_err());
        let mut p = state.params().clone();
        p.seed = 6;
        state.set_params(p).unwrap();
        assert!(state.last_error().is_some());
        state.rebuild().unwrap();
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn take_dirty_clears_flag() {
        let mut state = small_state();
        state.rebuild().unwrap();
        let s = state.current_mut().unwrap();
        assert!(s.take_dirty());
        assert!(!s.take_dirty());
        s.mark_dirty();
        assert!(s.is_dirty());
    }

    #[test]
    fn uvs_span_tile_count() {
        let params = TerrainParameters::default();
        let grid = VertexGrid::new(10.0, 10.0, 2, 2).unwrap();
        let s = TerrainSurface::new(grid, ColorBandList::default(), &params);
        let uv = s.uvs(10.0);
        assert_eq!(uv[0], [0.0, 0.0]);
        assert_eq!(uv[8], [10.0, 10.0]);
    }
}

use ndarray::Array2;

use crate::error::{Result, TerrainError};

/// Regular plane of `(res_x + 1) x (res_z + 1)` vertices centred on the origin.
///
/// Coordinates are plane-local: x runs left to right across columns, y runs
/// from `+height / 2` on row 0 down to `-height / 2` on the last row, and z is
/// the elevation channel, the only one that changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGrid {
    width: f32,
    height: f32,
    res_x: u32,
    res_z: u32,
    /// Indexed `[row, col]`.
    elevation: Array2<f32>,
}

impl VertexGrid {
    pub fn new(width: f32, height: f32, res_x: u32, res_z: u32) -> Result<Self> {
        if res_x == 0 || res_z == 0 {
            return Err(TerrainError::InvalidGrid(format!(
                "resolution {res_x}x{res_z} must be at least 1x1"
            )));
        }
        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(TerrainError::InvalidGrid(format!(
                "world size {width}x{height} must be finite and > 0"
            )));
        }
        let shape = (res_z as usize + 1, res_x as usize + 1);
        Ok(Self {
            width,
            height,
            res_x,
            res_z,
            elevation: Array2::zeros(shape),
        })
    }

    pub fn columns(&self) -> usize {
        self.res_x as usize + 1
    }

    pub fn rows(&self) -> usize {
        self.res_z as usize + 1
    }

    pub fn len(&self) -> usize {
        self.columns() * self.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.res_x, self.res_z)
    }

    /// Horizontal spacing between neighbouring columns and rows.
    pub fn spacing(&self) -> (f32, f32) {
        (self.width / self.res_x as f32, self.height / self.res_z as f32)
    }

    /// Planar x of column `col`.
    #[inline]
    pub fn x_at(&self, col: usize) -> f32 {
        col as f32 * self.spacing().0 - self.width * 0.5
    }

    /// Planar y of row `row`.
    #[inline]
    pub fn y_at(&self, row: usize) -> f32 {
        self.height * 0.5 - row as f32 * self.spacing().1
    }

    pub fn elevation(&self, col: usize, row: usize) -> f32 {
        self.elevation[[row, col]]
    }

    pub fn set_elevation(&mut self, col: usize, row: usize, value: f32) {
        self.elevation[[row, col]] = value;
    }

    pub fn elevations(&self) -> &Array2<f32> {
        &self.elevation
    }

    pub fn elevations_mut(&mut self) -> &mut Array2<f32> {
        &mut self.elevation
    }

    /// `(x, y, z)` of a vertex with z as elevation.
    pub fn position(&self, col: usize, row: usize) -> [f32; 3] {
        [self.x_at(col), self.y_at(row), self.elevation(col, row)]
    }

    /// Row-major iterator over every vertex position.
    pub fn positions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        let cols = self.columns();
        (0..self.len()).map(move |i| self.position(i % cols, i / cols))
    }

    #[inline]
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.columns() + col
    }
}

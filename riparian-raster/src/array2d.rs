//! A minimal generic grid used for visited flags and label scratch space
//! during raster traversals.

use std::ops::{Index, IndexMut};

#[derive(Debug, Clone)]
pub struct Array2D<T: Copy> {
    pub rows: isize,
    pub columns: isize,
    nodata: T,
    data: Vec<T>,
}

impl<T: Copy> Array2D<T> {
    pub fn new(rows: isize, columns: isize, initial: T, nodata: T) -> Array2D<T> {
        Array2D {
            rows,
            columns,
            nodata,
            data: vec![initial; (rows * columns) as usize],
        }
    }

    pub fn get_value(&self, row: isize, column: isize) -> T {
        if row < 0 || row >= self.rows || column < 0 || column >= self.columns {
            return self.nodata;
        }
        self.data[(row * self.columns + column) as usize]
    }

    pub fn set_value(&mut self, row: isize, column: isize, value: T) {
        if row >= 0 && row < self.rows && column >= 0 && column < self.columns {
            self.data[(row * self.columns + column) as usize] = value;
        }
    }
}

impl<T: Copy> Index<(isize, isize)> for Array2D<T> {
    type Output = T;

    fn index(&self, (row, column): (isize, isize)) -> &T {
        &self.data[(row * self.columns + column) as usize]
    }
}

impl<T: Copy> IndexMut<(isize, isize)> for Array2D<T> {
    fn index_mut(&mut self, (row, column): (isize, isize)) -> &mut T {
        &mut self.data[(row * self.columns + column) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_returns_nodata() {
        let grid: Array2D<i32> = Array2D::new(2, 3, 0, -1);
        assert_eq!(grid.get_value(-1, 0), -1);
        assert_eq!(grid.get_value(0, 3), -1);
        assert_eq!(grid.get_value(1, 2), 0);
    }

    #[test]
    fn test_index_round_trip() {
        let mut grid: Array2D<u8> = Array2D::new(4, 4, 0, 0);
        grid[(2, 3)] = 9;
        assert_eq!(grid[(2, 3)], 9);
        assert_eq!(grid.get_value(2, 3), 9);
    }
}

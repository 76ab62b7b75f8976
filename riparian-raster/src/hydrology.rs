//! Hydrological derivatives. The D8 pointer uses the base-2 direction
//! encoding (1 = NE, proceeding clockwise to 128 = N); cell offsets follow
//! the usual dx/dy tables so pointer value 2^n maps to offset n.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{Array2D, Raster, RasterError};

pub const DX: [isize; 8] = [1, 1, 1, 0, -1, -1, -1, 0];
pub const DY: [isize; 8] = [-1, 0, 1, 1, 1, 0, -1, -1];

/// Maps pointer values onto cell offsets. Only 8 of the 129 slots are
/// meaningful but the table lookup beats recomputing logs per cell.
pub fn pointer_matches() -> [usize; 129] {
    let mut matches = [0usize; 129];
    for n in 0..8 {
        matches[1usize << n] = n;
    }
    matches
}

struct GridCell {
    priority: f64,
    row: isize,
    column: isize,
}

impl PartialEq for GridCell {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for GridCell {}

impl PartialOrd for GridCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GridCell {
    // Reversed so the std max-heap pops the lowest elevation first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.total_cmp(&self.priority)
    }
}

/// Priority-flood depression filling. Cells are raised to the lowest
/// elevation at which they can drain to the grid edge.
pub fn fill_depressions(dem: &Raster) -> Raster {
    let rows = dem.configs.rows as isize;
    let columns = dem.configs.columns as isize;
    let nodata = dem.configs.nodata;
    let mut output = Raster::initialize_using_config(&dem.file_name, &dem.configs);
    let mut visited: Array2D<u8> = Array2D::new(rows, columns, 0u8, 0u8);
    let mut heap: BinaryHeap<GridCell> = BinaryHeap::new();

    let mut seed = |row: isize, col: isize, heap: &mut BinaryHeap<GridCell>,
                    visited: &mut Array2D<u8>| {
        if visited[(row, col)] == 0 {
            visited[(row, col)] = 1;
            let z = dem.get_value(row, col);
            heap.push(GridCell {
                priority: z,
                row,
                column: col,
            });
        }
    };

    // Seed from the grid border and from every cell touching nodata; both
    // act as outlets.
    for row in 0..rows {
        for col in 0..columns {
            if dem.get_value(row, col) == nodata {
                visited[(row, col)] = 1;
                continue;
            }
            let on_border = row == 0 || row == rows - 1 || col == 0 || col == columns - 1;
            let touches_nodata = (0..8).any(|n| {
                let r = row + DY[n];
                let c = col + DX[n];
                r >= 0 && r < rows && c >= 0 && c < columns && dem.get_value(r, c) == nodata
            });
            if on_border || touches_nodata {
                seed(row, col, &mut heap, &mut visited);
            }
        }
    }

    while let Some(cell) = heap.pop() {
        output.set_value(cell.row, cell.column, cell.priority);
        for n in 0..8 {
            let r = cell.row + DY[n];
            let c = cell.column + DX[n];
            if r >= 0 && r < rows && c >= 0 && c < columns && visited[(r, c)] == 0 {
                visited[(r, c)] = 1;
                let z = dem.get_value(r, c).max(cell.priority);
                heap.push(GridCell {
                    priority: z,
                    row: r,
                    column: c,
                });
            }
        }
    }
    output
}

/// D8 flow pointer from a depressionless DEM. Cells with no downslope
/// neighbor get pointer 0.
pub fn d8_pointer(filled: &Raster) -> Raster {
    let rows = filled.configs.rows as isize;
    let columns = filled.configs.columns as isize;
    let nodata = filled.configs.nodata;
    let resx = filled.configs.resolution_x;
    let resy = filled.configs.resolution_y;
    let diag = (resx * resx + resy * resy).sqrt();
    let distances = [diag, resx, diag, resy, diag, resx, diag, resy];

    let mut pntr = Raster::initialize_using_config(&filled.file_name, &filled.configs);
    for row in 0..rows {
        for col in 0..columns {
            let z = filled.get_value(row, col);
            if z == nodata {
                continue;
            }
            let mut max_slope = 0.0;
            let mut direction: Option<usize> = None;
            for n in 0..8 {
                let zn = filled.get_value(row + DY[n], col + DX[n]);
                if zn == nodata {
                    continue;
                }
                let slope = (z - zn) / distances[n];
                if slope > max_slope {
                    max_slope = slope;
                    direction = Some(n);
                }
            }
            match direction {
                Some(n) => pntr.set_value(row, col, (1usize << n) as f64),
                None => pntr.set_value(row, col, 0.0),
            }
        }
    }
    pntr
}

/// Labels every cell with the pour-point identifier its flow path reaches,
/// by tracing the D8 pointer downslope and back-filling the traversed path.
/// Cells whose path exits the grid or dead-ends before reaching a pour
/// point stay nodata.
pub fn watershed(d8_pntr: &Raster, pour_points: &Raster) -> Result<Raster, RasterError> {
    if !d8_pntr.configs.share_geometry(&pour_points.configs) {
        return Err(RasterError::GeometryMismatch);
    }
    let rows = d8_pntr.configs.rows as isize;
    let columns = d8_pntr.configs.columns as isize;
    let pntr_nodata = d8_pntr.configs.nodata;
    let pour_nodata = pour_points.configs.nodata;
    let matches = pointer_matches();

    let mut output = Raster::initialize_using_config(&pour_points.file_name, &pour_points.configs);
    // 0 = unresolved, 1 = resolved (labeled or known dead end).
    let mut resolved: Array2D<u8> = Array2D::new(rows, columns, 0u8, 0u8);

    for row in 0..rows {
        for col in 0..columns {
            let v = pour_points.get_value(row, col);
            if v != pour_nodata {
                output.set_value(row, col, v);
                resolved[(row, col)] = 1;
            }
        }
    }

    for row in 0..rows {
        for col in 0..columns {
            if resolved[(row, col)] == 1 || d8_pntr.get_value(row, col) == pntr_nodata {
                continue;
            }
            let mut path: Vec<(isize, isize)> = Vec::new();
            let (mut r, mut c) = (row, col);
            let label = loop {
                if resolved[(r, c)] == 1 {
                    break output.get_value(r, c);
                }
                path.push((r, c));
                let dir_val = d8_pntr.get_value(r, c);
                if dir_val == pntr_nodata || dir_val <= 0.0 {
                    break output.configs.nodata;
                }
                let dir = dir_val as usize;
                if dir > 128 {
                    break output.configs.nodata;
                }
                let n = matches[dir];
                let rn = r + DY[n];
                let cn = c + DX[n];
                if rn < 0 || rn >= rows || cn < 0 || cn >= columns {
                    break output.configs.nodata;
                }
                r = rn;
                c = cn;
            };
            for (pr, pc) in path {
                output.set_value(pr, pc, label);
                resolved[(pr, pc)] = 1;
            }
        }
    }
    Ok(output)
}

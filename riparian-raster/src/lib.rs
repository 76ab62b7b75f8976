/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Raster side of the geoprocessing engine: a simple float grid with ESRI
//! ASCII (`.asc`) and binary float (`.flt`/`.hdr`) I/O, hydrological
//! derivatives (depression filling, D8 pointer, watershed labeling), a
//! percent-rise slope surface, zonal statistics, and vector/raster
//! conversion.

pub mod array2d;
pub mod conversion;
pub mod hydrology;
pub mod surface;

pub use array2d::Array2D;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::ops::{Index, IndexMut};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("unsupported raster format '{0}'")]
    Format(String),

    #[error("invalid raster header: {0}")]
    Header(String),

    #[error("raster grids do not share geometry")]
    GeometryMismatch,

    #[error("cannot rasterize: {0}")]
    Rasterize(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterConfigs {
    pub rows: usize,
    pub columns: usize,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub resolution_x: f64,
    pub resolution_y: f64,
    pub nodata: f64,
}

impl RasterConfigs {
    pub fn share_geometry(&self, other: &RasterConfigs) -> bool {
        self.rows == other.rows
            && self.columns == other.columns
            && (self.north - other.north).abs() < 1e-6
            && (self.south - other.south).abs() < 1e-6
            && (self.east - other.east).abs() < 1e-6
            && (self.west - other.west).abs() < 1e-6
    }
}

#[derive(Debug, Clone)]
pub struct Raster {
    pub file_name: String,
    pub configs: RasterConfigs,
    data: Vec<f64>,
}

impl Raster {
    /// Opens an existing raster. Only read mode is supported; the format is
    /// selected by extension (`.asc` or `.flt`).
    pub fn new(file_name: &str, mode: &str) -> Result<Raster, RasterError> {
        if mode != "r" {
            return Err(RasterError::Format(format!(
                "unsupported raster mode '{}'",
                mode
            )));
        }
        let lower = file_name.to_lowercase();
        if lower.ends_with(".asc") {
            Raster::read_asc(file_name)
        } else if lower.ends_with(".flt") {
            Raster::read_flt(file_name)
        } else {
            Err(RasterError::Format(file_name.to_string()))
        }
    }

    /// Creates a raster matching `configs`, filled with nodata.
    pub fn initialize_using_config(file_name: &str, configs: &RasterConfigs) -> Raster {
        Raster {
            file_name: file_name.to_string(),
            configs: configs.clone(),
            data: vec![configs.nodata; configs.rows * configs.columns],
        }
    }

    pub fn num_cells(&self) -> usize {
        self.configs.rows * self.configs.columns
    }

    pub fn cell_area(&self) -> f64 {
        self.configs.resolution_x * self.configs.resolution_y
    }

    pub fn get_value(&self, row: isize, column: isize) -> f64 {
        if row < 0
            || row >= self.configs.rows as isize
            || column < 0
            || column >= self.configs.columns as isize
        {
            return self.configs.nodata;
        }
        self.data[row as usize * self.configs.columns + column as usize]
    }

    pub fn set_value(&mut self, row: isize, column: isize, value: f64) {
        if row >= 0
            && row < self.configs.rows as isize
            && column >= 0
            && column < self.configs.columns as isize
        {
            self.data[row as usize * self.configs.columns + column as usize] = value;
        }
    }

    pub fn get_row_from_y(&self, y: f64) -> isize {
        ((self.configs.north - y) / self.configs.resolution_y).floor() as isize
    }

    pub fn get_column_from_x(&self, x: f64) -> isize {
        ((x - self.configs.west) / self.configs.resolution_x).floor() as isize
    }

    /// Cell-center x of a column.
    pub fn get_x_from_column(&self, column: isize) -> f64 {
        self.configs.west + (column as f64 + 0.5) * self.configs.resolution_x
    }

    /// Cell-center y of a row.
    pub fn get_y_from_row(&self, row: isize) -> f64 {
        self.configs.north - (row as f64 + 0.5) * self.configs.resolution_y
    }

    pub fn write(&self) -> Result<(), RasterError> {
        let lower = self.file_name.to_lowercase();
        if lower.ends_with(".asc") {
            self.write_asc(&self.file_name)
        } else if lower.ends_with(".flt") {
            self.write_flt(&self.file_name)
        } else {
            Err(RasterError::Format(self.file_name.clone()))
        }
    }

    fn read_asc(file_name: &str) -> Result<Raster, RasterError> {
        let file = File::open(file_name)?;
        let reader = BufReader::new(file);
        let mut ncols: Option<usize> = None;
        let mut nrows: Option<usize> = None;
        let mut xll: Option<f64> = None;
        let mut yll: Option<f64> = None;
        let mut cellsize: Option<f64> = None;
        let mut nodata = -9999.0f64;
        let mut values: Vec<f64> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut tokens = trimmed.split_whitespace();
            let first = match tokens.next() {
                Some(t) => t,
                None => continue,
            };
            let key = first.to_lowercase();
            let parse_header = |tokens: &mut std::str::SplitWhitespace| -> Result<f64, RasterError> {
                tokens
                    .next()
                    .and_then(|t| t.parse::<f64>().ok())
                    .ok_or_else(|| RasterError::Header(format!("bad value for '{}'", first)))
            };
            match key.as_str() {
                "ncols" => ncols = Some(parse_header(&mut tokens)? as usize),
                "nrows" => nrows = Some(parse_header(&mut tokens)? as usize),
                "xllcorner" => xll = Some(parse_header(&mut tokens)?),
                "yllcorner" => yll = Some(parse_header(&mut tokens)?),
                "cellsize" => cellsize = Some(parse_header(&mut tokens)?),
                "nodata_value" => nodata = parse_header(&mut tokens)?,
                _ => {
                    // Data row; the first token is part of the data.
                    let v: f64 = first
                        .parse()
                        .map_err(|_| RasterError::Header(format!("bad cell value '{}'", first)))?;
                    values.push(v);
                    for t in tokens {
                        values.push(t.parse().map_err(|_| {
                            RasterError::Header(format!("bad cell value '{}'", t))
                        })?);
                    }
                }
            }
        }

        let columns = ncols.ok_or_else(|| RasterError::Header("missing ncols".to_string()))?;
        let rows = nrows.ok_or_else(|| RasterError::Header("missing nrows".to_string()))?;
        let west = xll.ok_or_else(|| RasterError::Header("missing xllcorner".to_string()))?;
        let south = yll.ok_or_else(|| RasterError::Header("missing yllcorner".to_string()))?;
        let res = cellsize.ok_or_else(|| RasterError::Header("missing cellsize".to_string()))?;
        if values.len() != rows * columns {
            return Err(RasterError::Header(format!(
                "expected {} cells, found {}",
                rows * columns,
                values.len()
            )));
        }
        Ok(Raster {
            file_name: file_name.to_string(),
            configs: RasterConfigs {
                rows,
                columns,
                north: south + rows as f64 * res,
                south,
                east: west + columns as f64 * res,
                west,
                resolution_x: res,
                resolution_y: res,
                nodata,
            },
            data: values,
        })
    }

    fn write_asc(&self, file_name: &str) -> Result<(), RasterError> {
        let mut writer = BufWriter::new(File::create(file_name)?);
        let c = &self.configs;
        writeln!(writer, "ncols {}", c.columns)?;
        writeln!(writer, "nrows {}", c.rows)?;
        writeln!(writer, "xllcorner {}", c.west)?;
        writeln!(writer, "yllcorner {}", c.south)?;
        writeln!(writer, "cellsize {}", c.resolution_x)?;
        writeln!(writer, "NODATA_value {}", c.nodata)?;
        for row in 0..c.rows {
            let line: Vec<String> = (0..c.columns)
                .map(|col| format!("{}", self.data[row * c.columns + col]))
                .collect();
            writeln!(writer, "{}", line.join(" "))?;
        }
        Ok(())
    }

    fn hdr_path(file_name: &str) -> String {
        let p = Path::new(file_name);
        p.with_extension("hdr").to_string_lossy().to_string()
    }

    fn read_flt(file_name: &str) -> Result<Raster, RasterError> {
        let hdr = File::open(Raster::hdr_path(file_name))?;
        let mut ncols: Option<usize> = None;
        let mut nrows: Option<usize> = None;
        let mut xll: Option<f64> = None;
        let mut yll: Option<f64> = None;
        let mut cellsize: Option<f64> = None;
        let mut nodata = -9999.0f64;
        for line in BufReader::new(hdr).lines() {
            let line = line?;
            let mut tokens = line.split_whitespace();
            let key = match tokens.next() {
                Some(k) => k.to_lowercase(),
                None => continue,
            };
            let value = tokens.next().map(|t| t.to_string());
            let as_f64 = |v: &Option<String>| -> Option<f64> {
                v.as_ref().and_then(|t| t.parse::<f64>().ok())
            };
            match key.as_str() {
                "ncols" => ncols = as_f64(&value).map(|v| v as usize),
                "nrows" => nrows = as_f64(&value).map(|v| v as usize),
                "xllcorner" => xll = as_f64(&value),
                "yllcorner" => yll = as_f64(&value),
                "cellsize" => cellsize = as_f64(&value),
                "nodata_value" => {
                    if let Some(v) = as_f64(&value) {
                        nodata = v;
                    }
                }
                _ => {}
            }
        }
        let columns = ncols.ok_or_else(|| RasterError::Header("missing ncols".to_string()))?;
        let rows = nrows.ok_or_else(|| RasterError::Header("missing nrows".to_string()))?;
        let west = xll.ok_or_else(|| RasterError::Header("missing xllcorner".to_string()))?;
        let south = yll.ok_or_else(|| RasterError::Header("missing yllcorner".to_string()))?;
        let res = cellsize.ok_or_else(|| RasterError::Header("missing cellsize".to_string()))?;

        let mut reader = BufReader::new(File::open(file_name)?);
        let mut data = Vec::with_capacity(rows * columns);
        for _ in 0..rows * columns {
            data.push(reader.read_f32::<LittleEndian>()? as f64);
        }
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest)?;
        if !rest.is_empty() {
            return Err(RasterError::Header(format!(
                "{}: trailing bytes after grid data",
                file_name
            )));
        }
        Ok(Raster {
            file_name: file_name.to_string(),
            configs: RasterConfigs {
                rows,
                columns,
                north: south + rows as f64 * res,
                south,
                east: west + columns as f64 * res,
                west,
                resolution_x: res,
                resolution_y: res,
                nodata,
            },
            data,
        })
    }

    fn write_flt(&self, file_name: &str) -> Result<(), RasterError> {
        let c = &self.configs;
        let mut hdr = BufWriter::new(File::create(Raster::hdr_path(file_name))?);
        writeln!(hdr, "ncols {}", c.columns)?;
        writeln!(hdr, "nrows {}", c.rows)?;
        writeln!(hdr, "xllcorner {}", c.west)?;
        writeln!(hdr, "yllcorner {}", c.south)?;
        writeln!(hdr, "cellsize {}", c.resolution_x)?;
        writeln!(hdr, "NODATA_value {}", c.nodata)?;
        writeln!(hdr, "byteorder LSBFIRST")?;

        let mut writer = BufWriter::new(File::create(file_name)?);
        for v in &self.data {
            writer.write_f32::<LittleEndian>(*v as f32)?;
        }
        Ok(())
    }
}

impl Index<(isize, isize)> for Raster {
    type Output = f64;

    fn index(&self, (row, column): (isize, isize)) -> &f64 {
        &self.data[row as usize * self.configs.columns + column as usize]
    }
}

impl IndexMut<(isize, isize)> for Raster {
    fn index_mut(&mut self, (row, column): (isize, isize)) -> &mut f64 {
        &mut self.data[row as usize * self.configs.columns + column as usize]
    }
}

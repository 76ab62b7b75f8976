//! Terrain surface derivatives and zonal summaries.

use crate::{Raster, RasterError};

/// Slope as percent rise using Horn's third-order finite difference on the
/// 3x3 neighborhood. Missing or nodata neighbors take the center elevation.
pub fn slope_percent_rise(dem: &Raster) -> Raster {
    let rows = dem.configs.rows as isize;
    let columns = dem.configs.columns as isize;
    let nodata = dem.configs.nodata;
    let eight_resx = 8.0 * dem.configs.resolution_x;
    let eight_resy = 8.0 * dem.configs.resolution_y;

    let mut output = Raster::initialize_using_config(&dem.file_name, &dem.configs);
    let mut window = [0f64; 9];
    for row in 0..rows {
        for col in 0..columns {
            let z = dem.get_value(row, col);
            if z == nodata {
                continue;
            }
            let mut i = 0;
            for dr in -1..=1isize {
                for dc in -1..=1isize {
                    let zn = dem.get_value(row + dr, col + dc);
                    window[i] = if zn == nodata { z } else { zn };
                    i += 1;
                }
            }
            // Window layout:
            //   0 1 2      a b c
            //   3 4 5  =   d e f
            //   6 7 8      g h i
            let dz_dx = ((window[2] + 2.0 * window[5] + window[8])
                - (window[0] + 2.0 * window[3] + window[6]))
                / eight_resx;
            let dz_dy = ((window[6] + 2.0 * window[7] + window[8])
                - (window[0] + 2.0 * window[1] + window[2]))
                / eight_resy;
            let rise = 100.0 * (dz_dx * dz_dx + dz_dy * dz_dy).sqrt();
            output.set_value(row, col, rise);
        }
    }
    output
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZonalStat {
    pub zone_id: i64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

/// Min/max/mean of `values` per zone in `zones`. Cells that are nodata in
/// either grid are skipped. Results are ordered by ascending zone id.
pub fn zonal_statistics(values: &Raster, zones: &Raster) -> Result<Vec<ZonalStat>, RasterError> {
    if !values.configs.share_geometry(&zones.configs) {
        return Err(RasterError::GeometryMismatch);
    }
    let rows = values.configs.rows as isize;
    let columns = values.configs.columns as isize;
    let value_nodata = values.configs.nodata;
    let zone_nodata = zones.configs.nodata;

    let mut stats: Vec<ZonalStat> = Vec::new();
    let mut zone_slot: std::collections::HashMap<i64, usize> = std::collections::HashMap::new();
    let mut sums: Vec<f64> = Vec::new();

    for row in 0..rows {
        for col in 0..columns {
            let zone = zones.get_value(row, col);
            let value = values.get_value(row, col);
            if zone == zone_nodata || value == value_nodata {
                continue;
            }
            let zone_id = zone as i64;
            let slot = *zone_slot.entry(zone_id).or_insert_with(|| {
                stats.push(ZonalStat {
                    zone_id,
                    min: f64::INFINITY,
                    max: f64::NEG_INFINITY,
                    mean: 0.0,
                    count: 0,
                });
                sums.push(0.0);
                stats.len() - 1
            });
            let s = &mut stats[slot];
            if value < s.min {
                s.min = value;
            }
            if value > s.max {
                s.max = value;
            }
            s.count += 1;
            sums[slot] += value;
        }
    }

    for (slot, s) in stats.iter_mut().enumerate() {
        s.mean = sums[slot] / s.count as f64;
    }
    stats.sort_by_key(|s| s.zone_id);
    Ok(stats)
}

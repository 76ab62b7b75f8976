/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Command-line parsing. Arguments are positional, in the order the
//! original field tooling expects, with `#` standing in for an omitted
//! optional value.

use serde_derive::Serialize;

use crate::errors::AnalysisError;

pub const USAGE: &str = "usage: riparian_analysis aoi_file aoi_fld aoi_name vri tsa tfl private \
bec fwa lake_ha harvest buffers dem roads streams bridges fish gdb \
[--log_level {DEBUG|INFO|WARNING|ERROR}] [--log_dir DIR] ('#' omits an optional value)";

#[derive(Debug, Clone, Serialize)]
pub struct RunParameters {
    pub aoi_file: String,
    pub aoi_field: Option<String>,
    pub aoi_name: Option<String>,
    pub vri: String,
    pub tsa: String,
    pub tfl: String,
    pub private_land: String,
    pub bec: String,
    pub fwa: String,
    pub lake_ha: Option<f64>,
    pub harvest: String,
    pub buffers: String,
    pub dem: String,
    pub roads: String,
    pub streams: String,
    pub bridges: Option<String>,
    pub fish: String,
    pub gdb: String,
    pub log_level: String,
    pub log_dir: Option<String>,
}

fn optional(value: &str) -> Option<String> {
    if value == "#" {
        None
    } else {
        Some(value.to_string())
    }
}

impl RunParameters {
    pub fn parse(args: &[String]) -> Result<RunParameters, AnalysisError> {
        let mut positional: Vec<String> = Vec::new();
        let mut log_level = "INFO".to_string();
        let mut log_dir: Option<String> = None;

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            if let Some(flag) = arg.strip_prefix("--") {
                let (name, inline) = match flag.split_once('=') {
                    Some((n, v)) => (n, Some(v.to_string())),
                    None => (flag, None),
                };
                let value = match inline {
                    Some(v) => v,
                    None => {
                        i += 1;
                        args.get(i)
                            .cloned()
                            .ok_or_else(|| {
                                AnalysisError::Input(format!("flag '--{}' needs a value", name))
                            })?
                    }
                };
                match name {
                    "log_level" => {
                        if !["DEBUG", "INFO", "WARNING", "ERROR"].contains(&value.as_str()) {
                            return Err(AnalysisError::Input(format!(
                                "invalid log level '{}'",
                                value
                            )));
                        }
                        log_level = value;
                    }
                    "log_dir" => log_dir = Some(value),
                    _ => {
                        return Err(AnalysisError::Input(format!("unknown flag '--{}'", name)));
                    }
                }
            } else {
                positional.push(arg.clone());
            }
            i += 1;
        }

        if positional.len() != 18 {
            return Err(AnalysisError::Input(format!(
                "expected 18 positional arguments, got {}\n{}",
                positional.len(),
                USAGE
            )));
        }

        let lake_ha = match optional(&positional[9]) {
            Some(text) => Some(text.parse::<f64>().map_err(|_| {
                AnalysisError::Input(format!("invalid minimum lake size '{}'", text))
            })?),
            None => None,
        };

        Ok(RunParameters {
            aoi_file: positional[0].clone(),
            aoi_field: optional(&positional[1]),
            aoi_name: optional(&positional[2]),
            vri: positional[3].clone(),
            tsa: positional[4].clone(),
            tfl: positional[5].clone(),
            private_land: positional[6].clone(),
            bec: positional[7].clone(),
            fwa: positional[8].clone(),
            lake_ha,
            harvest: positional[10].clone(),
            buffers: positional[11].clone(),
            dem: positional[12].clone(),
            roads: positional[13].clone(),
            streams: positional[14].clone(),
            bridges: optional(&positional[15]),
            fish: positional[16].clone(),
            gdb: positional[17].clone(),
            log_level,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_argument_set() {
        let args = argv(&[
            "aoi.geojson", "NAME", "Omineca;Skeena", "vri.geojson", "tsa.geojson",
            "tfl.geojson", "private.geojson", "bec.geojson", "fwa.geojson", "25.5",
            "OWNER_TYPE = 'Crown'", "10, 30", "dem.asc", "roads.geojson",
            "streams.geojson", "bridges.geojson", "fish.geojson", "work",
            "--log_level", "DEBUG",
        ]);
        let p = RunParameters::parse(&args).unwrap();
        assert_eq!(p.aoi_field.as_deref(), Some("NAME"));
        assert_eq!(p.lake_ha, Some(25.5));
        assert_eq!(p.log_level, "DEBUG");
        assert_eq!(p.gdb, "work");
    }

    #[test]
    fn test_hash_marks_optionals_omitted() {
        let args = argv(&[
            "aoi.geojson", "#", "#", "vri.geojson", "tsa.geojson", "tfl.geojson",
            "private.geojson", "bec.geojson", "fwa.geojson", "#", "NONE", "10",
            "dem.asc", "roads.geojson", "streams.geojson", "#", "fish.geojson",
            "work",
        ]);
        let p = RunParameters::parse(&args).unwrap();
        assert!(p.aoi_field.is_none());
        assert!(p.aoi_name.is_none());
        assert!(p.lake_ha.is_none());
        assert!(p.bridges.is_none());
        assert_eq!(p.harvest, "NONE");
    }

    #[test]
    fn test_wrong_arity_and_bad_values_rejected() {
        assert!(RunParameters::parse(&argv(&["only", "three", "args"])).is_err());
        let mut args = argv(&[
            "aoi.geojson", "#", "#", "vri.geojson", "tsa.geojson", "tfl.geojson",
            "private.geojson", "bec.geojson", "fwa.geojson", "not_a_number", "NONE",
            "10", "dem.asc", "roads.geojson", "streams.geojson", "#",
            "fish.geojson", "work",
        ]);
        assert!(RunParameters::parse(&args).is_err());
        args[9] = "#".to_string();
        args.push("--log_level".to_string());
        args.push("CHATTY".to_string());
        assert!(RunParameters::parse(&args).is_err());
    }
}

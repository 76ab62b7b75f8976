/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Stage 4: criteria selection. Four-way branch on the minimum-area
//! threshold and the administrative predicate; an empty selection falls
//! back to the full lake collection for every downstream stage.

use riparian_vector::predicate::{select, Predicate};
use riparian_vector::FeatureCollection;
use tracing::info;

use crate::args::RunParameters;
use crate::errors::AnalysisError;
use crate::fields;
use crate::store::{StageScratch, WorkingStore};

pub struct CriteriaOutput {
    pub criteria: Option<FeatureCollection>,
    /// The collection the downstream stages operate on: the criteria
    /// selection when it is non-empty, otherwise the full lake set.
    pub effective: FeatureCollection,
    pub scratch: StageScratch,
}

pub fn run(
    params: &RunParameters,
    store: &WorkingStore,
    lakes_final: &FeatureCollection,
) -> Result<CriteriaOutput, AnalysisError> {
    let scratch = StageScratch::new();
    let no_harvest = params.harvest == "NONE";

    info!("-------------------------------------");
    let criteria = match (params.lake_ha, no_harvest) {
        (None, true) => {
            info!("No criteria selection was used");
            None
        }
        (None, false) => {
            info!(
                "Extracting Lakes using Administrative Boundary Criteria ({})",
                params.harvest
            );
            Some(apply(lakes_final, &params.harvest)?)
        }
        (Some(ha), true) => {
            info!(
                "Extracting Lakes using Minimum Lake Size Criteria (Area >= {} Ha)",
                ha
            );
            Some(apply(
                lakes_final,
                &format!("{} >= {}", fields::LAKE_AREA, ha),
            )?)
        }
        (Some(ha), false) => {
            info!(
                "Extracting Lakes using Administrative Boundary ({}) and \
                 Minimum Lake Size Criteria (Area >= {} Ha)",
                params.harvest, ha
            );
            Some(apply(
                lakes_final,
                &format!("({}) AND {} >= {}", params.harvest, fields::LAKE_AREA, ha),
            )?)
        }
    };

    let selected = criteria.as_ref().map_or(0, FeatureCollection::len);
    info!("There are {} lake(s) that have been selected", selected);

    if let Some(fc) = &criteria {
        store.save_vector("Lakes_Criteria", fc)?;
    }

    let effective = match &criteria {
        Some(fc) if !fc.is_empty() => fc.clone(),
        _ => {
            info!("Criteria selection is empty; continuing with the full lake collection");
            lakes_final.clone()
        }
    };

    Ok(CriteriaOutput {
        criteria,
        effective,
        scratch,
    })
}

fn apply(fc: &FeatureCollection, text: &str) -> Result<FeatureCollection, AnalysisError> {
    let predicate = Predicate::parse(text)?;
    Ok(select(fc, &predicate)?)
}

/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Riparian lakes analysis: extracts lakes from VRI land cover within an
//! area of interest, attaches administrative and ecological attributes,
//! delineates the watershed draining to each lake from an elevation
//! surface, and exports per-watershed statistics tables.

pub mod args;
pub mod errors;
pub mod fields;
pub mod logging;
pub mod overlay;
pub mod pipeline;
pub mod stages;
pub mod store;

//! Client for the clinical records system.
//!
//! Exports the fields needed to resolve linked-study visits and judge visit
//! completeness, cleans them into an [`nps_model::ExternalTable`], and
//! imports harvested rows back as CSV.

mod client;
mod error;
mod export;

pub use client::{
    RawRecord, RecordsSource, RedcapClient, RedcapConfig, decode_records, import_outcome,
};
pub use error::{RedcapError, Result};
pub use export::{FORM_DATE_COLUMN, clean_export};

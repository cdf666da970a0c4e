//! Identity resolution, accumulation and reconciliation of summary sheets.
//!
//! The stages run in order:
//!
//! 1. [`harvest`] walks a [`nps_ingest::FileSource`], resolves each sheet's
//!    participant and visit with an [`IdentityResolver`] and extracts its fields.
//! 2. [`reconcile`] keys, deduplicates and reshapes the records, then keeps
//!    only visits that are complete in the records system.
//! 3. [`build_frame`] lays the rows out as a polars frame for
//!    [`write_output`] or upload.

pub mod accumulate;
pub mod dedupe;
pub mod error;
pub mod frame;
pub mod identity;
pub mod reconcile;
pub mod reshape;
pub mod row;

pub use accumulate::{AccumulateStats, Accumulated, accumulate, harvest};
pub use dedupe::dedupe_by_key;
pub use error::{Result, TransformError};
pub use frame::{
    OUTPUT_STEM, OutputColumn, OutputSchema, build_frame, frame_to_csv, output_file_name,
    write_output,
};
pub use identity::{Identity, IdentityResolver, IdentityScheme, visit_number};
pub use reconcile::{
    ReconcileContext, ReconcileStats, Reconciled, attach_modalities, eligible_keys,
    is_complete_visit, join_eligible, reconcile, resolve_keys,
};
pub use reshape::{coerce_integers, integer_columns, split_visit_specific};
pub use row::{VisitKey, VisitRow};

//! Data model for harvesting neuropsych summary sheets.

pub mod error;
pub mod external;
pub mod field;
pub mod ids;
pub mod options;
pub mod record;

pub use error::{ModelError, Result};
pub use external::{
    COMPLETE, EVENT_COLUMN, ExternalRecord, ExternalTable, PARTICIPANT_COLUMN, VisitModality,
};
pub use field::{AnchorMatcher, AnchorMode, CompiledField, DType, FieldMap, FieldSpec, FieldValue};
pub use ids::{DEFAULT_PARTICIPANT_PREFIX, EventLabel, ParticipantId, is_canonical};
pub use options::{
    IdentityOptions, PhaseChecklist, PhaseScope, PrefixGroup, ReconcileOptions,
    default_drop_columns,
};
pub use record::{ExtractedRecord, RecordSet};

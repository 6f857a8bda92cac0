//! Multi-step trip form: schema, field widgets, wizard navigation

pub mod field;
pub mod schema;
pub mod state;
pub mod wizard;

pub use field::{Control, FormField};
pub use schema::{FieldSchema, FieldType, FormDefinition, StepSchema};
pub use state::FormState;
pub use wizard::{FormError, Step, StepWizard};

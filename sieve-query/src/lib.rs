pub mod dynamic;
pub mod filters;
pub mod filterset;
pub mod forms;
pub mod group;
pub mod lookups;
pub mod memory;
pub mod query;
pub mod schema;
pub mod values;

pub use crate::filters::{FilterDescriptor, FilterFactory};
pub use crate::filterset::{ConfigError, FilterSet, FilterSetBuilder, FilterSetDef, OrderBy};
pub use crate::forms::{QueryMap, ValidationError};
pub use crate::group::FilterSetGroup;
pub use crate::lookups::{Lookup, LookupOp};
pub use crate::query::{Predicate, Queryset};
pub use crate::values::FilterValue;

//! Consistency checks for decoded records.

use crate::decode::SliceDescriptor;
use crate::error::ValidationError;
use crate::layout::Field;
use crate::record::ModuleRecord;

/// Cross-checks a record against the first function entry found in the
/// function table, and checks that each slice header is well formed.
///
/// A text mismatch usually means the version or width guess was wrong, or the
/// binary has been tampered with.
pub fn validate(md: &ModuleRecord, first_func_entry: u64) -> Result<(), ValidationError> {
    if md.text_va != first_func_entry {
        return Err(ValidationError::TextMismatch {
            found: md.text_va,
            expected: first_func_entry,
        });
    }

    let slices: [(Field, &SliceDescriptor); 4] = [
        (Field::Typelinks, &md.typelinks),
        (Field::ITablinks, &md.itablinks),
        (Field::LegacyTypes, &md.legacy_types),
        (Field::InitTasks, &md.inittasks),
    ];
    for (field, slice) in slices {
        if !slice.is_well_formed() {
            return Err(ValidationError::SliceOverflow {
                field,
                length: slice.length,
                capacity: slice.capacity,
            });
        }
    }

    tracing::debug!("moduledata at text {:#x} passed validation", md.text_va);
    Ok(())
}

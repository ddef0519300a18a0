//! Overlay of sparse client options onto typed backend options.
//!
//! Each sparse/target pair declares the fields they share with
//! [`overlay_fields!`]. A sparse field is copied only when it is present
//! (`Some`), so explicit `false` / `0` / `""` values are applied while absent
//! ones leave the target's default in place. Sparse fields missing from the
//! table are ignored.

use crate::error::MergeError;

/// Applies the present fields of `self` onto a `T`.
///
/// Implementations are all-or-nothing: on error `target` is left as it was.
pub trait Overlay<T> {
    fn overlay(&self, target: &mut T) -> Result<(), MergeError>;
}

/// Merge `source` onto `target`, returning the merged target.
pub fn merge<S, T>(source: &S, mut target: T) -> Result<T, MergeError>
where
    S: Overlay<T>,
{
    source.overlay(&mut target)?;
    Ok(target)
}

/// Checked conversion of one present field. Anything that would narrow or
/// lose data is a schema mismatch.
#[doc(hidden)]
pub fn assign<S, T>(field: &'static str, value: &S) -> Result<T, MergeError>
where
    S: Clone,
    T: TryFrom<S>,
{
    T::try_from(value.clone()).map_err(|_| MergeError::SchemaMismatch {
        field,
        from: std::any::type_name::<S>(),
        to: std::any::type_name::<T>(),
    })
}

/// Declares the shared fields of a sparse/target pair and derives its
/// [`Overlay`] impl. Every listed field must be an `Option<_>` on the sparse
/// side; the target must be `Clone` so a failed merge can be discarded.
macro_rules! overlay_fields {
    ($source:ty => $target:ty { $($field:ident),* $(,)? }) => {
        impl $crate::merge::Overlay<$target> for $source {
            fn overlay(
                &self,
                target: &mut $target,
            ) -> Result<(), $crate::error::MergeError> {
                let mut staged = target.clone();
                $(
                    if let Some(value) = self.$field.as_ref() {
                        staged.$field = $crate::merge::assign(stringify!($field), value)?;
                    }
                )*
                *target = staged;
                Ok(())
            }
        }
    };
}

pub(crate) use overlay_fields;

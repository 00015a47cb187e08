//! Derive macro for `structeq-core`.
//!
//! `#[derive(EqualityDefinition)]` turns field markers into a static member table and
//! wires the std comparison traits through it.

use proc_macro::TokenStream;

/// Equality definition derive implementation.
mod definition;

/// Derives the member table and std trait impls for a struct.
///
/// Field attributes:
/// * `#[equality]` - the field participates in equality and hashing
/// * `#[equality(rename = "name")]` - same, reported under another name
/// * `#[equality(base)]` - inherit every member of the field's type, listed first
///
/// Container attributes:
/// * `#[equality(custom)]` - skip the `EqualityDefinition` impl; the type writes its
///   own `try_is_equal_to` / `try_hash_code`
///
/// ```ignore
/// #[derive(EqualityDefinition)]
/// pub struct LabeledReading {
///     #[equality(base)]
///     reading: Reading,
///     #[equality]
///     label: String,
///     note: String,
/// }
/// ```
///
/// Generates `Members`, `EqualityDefinition` (unless `custom`), `Canonicalize`
/// (so the type can itself be a member of another type), `PartialEq`, `Eq` and
/// `Hash`.
#[proc_macro_derive(EqualityDefinition, attributes(equality))]
pub fn derive_equality_definition(input: TokenStream) -> TokenStream {
    definition::derive_equality_definition(input)
}

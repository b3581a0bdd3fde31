use proc_macro::TokenStream;

mod dispatch_bundle;
mod serialize;

/// Transform attached enum into a "bundle".
///
/// *What is a bundle?*
///
/// Bundles are used to accomplish dynamic dispatch in resource constrained systems (no_std).
/// A bundle holds one of a closed set of types that implement a common trait.
/// The size of the bundle is known at compile time and equal to the size of the largest type in the bundle.
///
/// Unit variants are turned into tuple variants holding the type of the same name.
/// The macro emits `From` for every held type and implements
/// `dispatch_bundle::Bundle<dyn Trait>` for the enum.
///
/// # Note
///
/// Requires `dispatch_bundle` to be in scope with that name.
#[proc_macro_attribute]
pub fn bundle(attr: TokenStream, item: TokenStream) -> TokenStream {
    dispatch_bundle::bundle(attr, item)
}

/// Generates `SerializeIter<E>` for every encoding `E` all fields
/// (or the `#[repr(...)]` type of a fieldless enum) support.
///
/// Enums are serialized as their discriminant.
///
/// # Note
///
/// Requires `cookie_cutter` to be in scope with that name.
#[proc_macro_derive(SerializeIter)]
pub fn serialize_iter(item: TokenStream) -> TokenStream {
    serialize::serialize_iter(item)
}

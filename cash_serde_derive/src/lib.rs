//! Derive macros for the wire-serialization traits: structs gain
//! `CashSerialize`/`CashDeserialize` impls that handle every field in
//! declaration order. The traits themselves live in the chain crate; the
//! generated code expects them in scope at the derive site.

extern crate proc_macro;
use proc_macro::TokenStream;
use syn::parse_macro_input;

mod deserialize;
mod serialize;

#[proc_macro_derive(CashDeserialize)]
pub fn deserializable(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as syn::DeriveInput);
    deserialize::impl_deser_macro(&ast)
}

#[proc_macro_derive(CashSerialize)]
pub fn serializable(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as syn::DeriveInput);
    serialize::impl_ser_macro(&ast)
}

use proc_macro::TokenStream;
use quote::quote;

pub fn impl_deser_macro(ast: &syn::DeriveInput) -> TokenStream {
    let name = &ast.ident;
    let fields = match &ast.data {
        syn::Data::Struct(data) => &data.fields,
        _ => panic!("CashDeserialize can only be derived for structs"),
    };

    // Each field reads itself in declaration order; the constructor shape
    // (braced, tuple, or unit) follows the struct being derived.
    let reads = fields.iter().map(|field| {
        let ty = &field.ty;
        let read = quote! { <#ty as CashDeserialize>::cash_deserialize(&mut target)? };
        match &field.ident {
            Some(ident) => quote! { #ident: #read, },
            None => quote! { #read, },
        }
    });
    let constructor = match fields {
        syn::Fields::Unnamed(_) => quote! { #name( #(#reads)* ) },
        _ => quote! { #name { #(#reads)* } },
    };

    let expanded = quote! {
        impl CashDeserialize for #name {
            fn cash_deserialize<R: std::io::Read>(mut target: R) -> Result<Self, SerializationError> {
                Ok(#constructor)
            }
        }
    };
    expanded.into()
}

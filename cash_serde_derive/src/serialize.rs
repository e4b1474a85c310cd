use proc_macro::TokenStream;
use quote::quote;

pub fn impl_ser_macro(ast: &syn::DeriveInput) -> TokenStream {
    let name = &ast.ident;
    let fields = match &ast.data {
        syn::Data::Struct(data) => &data.fields,
        _ => panic!("CashSerialize can only be derived for structs"),
    };

    // Fields write themselves in declaration order; tuple structs are
    // addressed by position.
    let writes = fields.iter().enumerate().map(|(position, field)| match &field.ident {
        Some(ident) => quote! { self.#ident.cash_serialize(&mut target)?; },
        None => {
            let position = syn::Index::from(position);
            quote! { self.#position.cash_serialize(&mut target)?; }
        }
    });

    let expanded = quote! {
        impl CashSerialize for #name {
            fn cash_serialize<W: std::io::Write>(&self, mut target: W) -> Result<(), std::io::Error> {
                #(#writes)*
                Ok(())
            }
        }
    };
    expanded.into()
}

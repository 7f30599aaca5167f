use crate::decode_column::ColumnMetadata;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ItemStruct;

pub(crate) fn entity_trait(item: &ItemStruct, columns: &[ColumnMetadata]) -> TokenStream {
    let struct_name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let names = columns.iter().map(|c| &c.name);
    let arms = columns.iter().map(|c| {
        let name = &c.name;
        let ident = &c.ident;
        let ty = &c.ty;
        quote! {
            #name => ::shard::decode_into::<#ty>(&mut self.#ident, column, cell)?,
        }
    });
    quote! {
        impl #impl_generics ::shard::Entity for #struct_name #ty_generics #where_clause {
            fn columns() -> &'static [&'static str] {
                &[#(#names),*]
            }
            fn assign(&mut self, column: &str, cell: &::shard::Cell) -> ::shard::Result<bool> {
                match column {
                    #(#arms)*
                    _ => return Ok(false),
                }
                Ok(true)
            }
        }
    }
}

use proc_macro2::TokenStream;
use quote::quote;
use syn::ItemStruct;

/// Entities accept any column set: unknown columns are skipped while filling.
pub(crate) fn from_row_trait(item: &ItemStruct) -> TokenStream {
    let struct_name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    quote! {
        impl #impl_generics ::shard::FromRow for #struct_name #ty_generics #where_clause {
            fn check_columns(_columns: &[String]) -> ::shard::Result<()> {
                Ok(())
            }
            fn from_row(row: &::shard::Row) -> ::shard::Result<Self> {
                ::shard::entity_from_row(row)
            }
        }
    }
}

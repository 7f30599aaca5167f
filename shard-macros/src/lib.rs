mod decode_column;
mod entity_trait;
mod from_row_trait;

use decode_column::decode_column;
use entity_trait::entity_trait;
use from_row_trait::from_row_trait;
use proc_macro::TokenStream;
use quote::quote;
use syn::{Fields, ItemStruct, parse_macro_input};

/// Maps the named fields of a struct to result set columns.
///
/// Each field matches the column with the same name, a leading underscore is
/// dropped. Field types must implement `shard::Column`.
/// - `#[shard(name = "column")]` matches a different column name.
/// - `#[shard(skip)]` never assigns the field, it keeps its default value.
#[proc_macro_derive(Entity, attributes(shard))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let Fields::Named(..) = &item.fields else {
        panic!("Entity can only be derived for structs with named fields");
    };
    let columns = item
        .fields
        .iter()
        .map(decode_column)
        .filter(|c| !c.skip)
        .collect::<Vec<_>>();
    if let Some((_, column)) = columns
        .iter()
        .enumerate()
        .find(|(i, c)| columns[..*i].iter().any(|v| v.name == c.name))
    {
        panic!("Column `{}` is mapped by more than one field", column.name);
    }
    let entity = entity_trait(&item, &columns);
    let from_row = from_row_trait(&item);
    quote! {
        #entity
        #from_row
    }
    .into()
}

use syn::{Field, Ident, LitStr, Type, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) skip: bool,
}

pub fn decode_column(field: &Field) -> ColumnMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let mut metadata = ColumnMetadata {
        name: ident.to_string(),
        ident,
        ty: field.ty.clone(),
        skip: false,
    };
    if metadata.name.starts_with("r#") {
        metadata.name.drain(..2);
    }
    if metadata.name.starts_with('_') {
        metadata.name.remove(0);
    }
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("shard") {
            let Ok(list) = meta.require_list() else {
                panic!(
                    "Error while parsing `shard`, use it like: `#[shard(attribute = value, ...)]`",
                );
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `name`, use it like: `#[shard(name = \"my_column\")]`"
                        );
                    };
                    metadata.name = v.value();
                } else if arg.path.is_ident("skip") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `skip`, use it like: `#[shard(skip)]`");
                    };
                    metadata.skip = true;
                } else {
                    panic!(
                        "Unknown attribute `{}` inside shard macro",
                        arg.path
                            .get_ident()
                            .map(|v| v.to_string())
                            .unwrap_or_default()
                    );
                }
                Ok(())
            });
        }
    }
    metadata
}

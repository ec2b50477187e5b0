use proc_macro::{Span, TokenStream};
use quote::{quote, ToTokens};
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, Field, Fields, Ident, Lit, LitStr,
    Meta, NestedMeta, Type, Visibility,
};

#[derive(Debug, Default)]
struct TypeAttribs {
    name: Option<LitStr>,
    serialize_hook: Option<Ident>,
    field_filter: Option<Ident>,
    deserialize_hook: Option<Ident>,
    after_hydrate: Option<Ident>,
}

#[derive(Debug, Default)]
struct FieldAttribs {
    skip: bool,
    base: bool,
    default: Option<Expr>,
}

// Must match `HookSet` bits.
const HOOK_SERIALIZE: u8 = 1;
const HOOK_FIELD_FILTER: u8 = 1 << 1;
const HOOK_DESERIALIZE: u8 = 1 << 2;
const HOOK_AFTER_HYDRATE: u8 = 1 << 3;

pub fn derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    if !ast.generics.params.is_empty() {
        panic!("Reflect cannot be derived for generic types");
    }
    let attribs = parse_type_attribs(&ast.attrs);
    let name = &ast.ident;
    let type_name = match &attribs.name {
        Some(value) => quote! { #value },
        None => {
            let ident = name.to_string();
            quote! { concat!(module_path!(), "::", #ident) }
        }
    };
    let fields = match ast.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named.into_iter().collect::<Vec<_>>(),
            Fields::Unit => vec![],
            Fields::Unnamed(_) => panic!("Reflect can be derived only for structs with named fields"),
        },
        _ => panic!("Reflect can be derived only for structs"),
    };

    let mut base: Option<(Ident, Type)> = None;
    let mut infos = vec![];
    let mut blanks = vec![];
    let mut getters = vec![];
    let mut setters = vec![];
    for field in &fields {
        let attribs = parse_field_attribs(&field.attrs);
        let ident = field.ident.as_ref().unwrap();
        let ty = &field.ty;
        let key = ident.to_string();
        if attribs.base {
            if base.is_some() {
                panic!("Only one field can be marked as `base`");
            }
            base = Some((ident.clone(), ty.clone()));
            blanks.push(match &attribs.default {
                Some(expr) => quote! { #ident: #expr },
                None => quote! { #ident: <#ty as serde_graph::Typed>::blank() },
            });
            continue;
        }
        let visibility = visibility(field);
        if attribs.skip {
            infos.push(quote! {
                serde_graph::FieldInfo::new(#key)
                    .visibility(serde_graph::Visibility::#visibility)
                    .static_field()
            });
            blanks.push(match &attribs.default {
                Some(expr) => quote! { #ident: #expr },
                None => quote! { #ident: Default::default() },
            });
            continue;
        }
        infos.push(quote! {
            serde_graph::FieldInfo::new(#key).visibility(serde_graph::Visibility::#visibility)
        });
        blanks.push(match &attribs.default {
            Some(expr) => quote! { #ident: #expr },
            None => quote! { #ident: <#ty as serde_graph::FieldValue>::blank() },
        });
        getters.push(quote! {
            #key => Some(serde_graph::FieldValue::to_value(&self.#ident)),
        });
        setters.push(quote! {
            #key => {
                self.#ident = serde_graph::FieldValue::from_value(value)?;
                Ok(())
            }
        });
    }

    let (base_descriptor, base_get, base_set) = match &base {
        Some((ident, ty)) => (
            quote! { Some(<#ty as serde_graph::Typed>::descriptor) },
            quote! { serde_graph::Reflect::field(&self.#ident, name) },
            quote! { serde_graph::Reflect::set_field(&mut self.#ident, name, value) },
        ),
        None => (
            quote! { None },
            quote! { None },
            quote! {
                Err(serde_graph::Error::UnknownField {
                    type_name: <Self as serde_graph::Typed>::descriptor().name,
                    field: name.to_owned(),
                })
            },
        ),
    };

    let mut hooks = 0u8;
    let serialize_hook = attribs.serialize_hook.map(|method| {
        hooks |= HOOK_SERIALIZE;
        quote! {
            fn serialize_hook(&self) -> serde_graph::Result<serde_graph::Document> {
                self.#method()
            }
        }
    });
    let field_filter = attribs.field_filter.map(|method| {
        hooks |= HOOK_FIELD_FILTER;
        quote! {
            fn excluded_fields(&self) -> Vec<String> {
                self.#method()
            }
        }
    });
    let deserialize_hook = attribs.deserialize_hook.map(|method| {
        hooks |= HOOK_DESERIALIZE;
        quote! {
            fn deserialize_hook(&mut self, record: &serde_graph::Document) -> serde_graph::Result<()> {
                self.#method(record)
            }
        }
    });
    let after_hydrate = attribs.after_hydrate.map(|method| {
        hooks |= HOOK_AFTER_HYDRATE;
        quote! {
            fn after_hydrate(&mut self) {
                self.#method();
            }
        }
    });

    quote! {
        impl serde_graph::Typed for #name {
            fn descriptor() -> &'static serde_graph::TypeDescriptor {
                fn allocate() -> Box<dyn serde_graph::Reflect> {
                    Box::new(<#name as serde_graph::Typed>::blank())
                }

                static FIELDS: &[serde_graph::FieldInfo] = &[ #( #infos ),* ];
                static DESCRIPTOR: serde_graph::TypeDescriptor = serde_graph::TypeDescriptor {
                    name: #type_name,
                    fields: FIELDS,
                    base: #base_descriptor,
                    hooks: serde_graph::HookSet::from_bits_retain(#hooks),
                    allocate,
                };
                &DESCRIPTOR
            }

            fn blank() -> Self {
                Self {
                    #( #blanks, )*
                }
            }
        }

        impl serde_graph::Reflect for #name {
            fn type_descriptor(&self) -> &'static serde_graph::TypeDescriptor {
                <Self as serde_graph::Typed>::descriptor()
            }

            fn field(&self, name: &str) -> Option<serde_graph::Value> {
                match name {
                    #( #getters )*
                    _ => #base_get,
                }
            }

            fn set_field(&mut self, name: &str, value: serde_graph::Value) -> serde_graph::Result<()> {
                match name {
                    #( #setters )*
                    _ => #base_set,
                }
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }

            #serialize_hook

            #field_filter

            #deserialize_hook

            #after_hydrate
        }
    }
    .into()
}

fn visibility(field: &Field) -> Ident {
    let name = match &field.vis {
        Visibility::Public(_) => "Public",
        Visibility::Inherited => "Private",
        _ => "Protected",
    };
    Ident::new(name, Span::call_site().into())
}

fn method_name(value: &Lit) -> Option<Ident> {
    match value {
        Lit::Str(value) => Some(Ident::new(&value.value(), Span::call_site().into())),
        _ => None,
    }
}

fn parse_type_attribs(attrs: &[Attribute]) -> TypeAttribs {
    let mut result = TypeAttribs::default();
    for attrib in attrs {
        if !attrib.path.is_ident("reflect") {
            continue;
        }
        match attrib.parse_meta() {
            Err(error) => panic!(
                "Could not parse attribute `{}`: {:?}",
                attrib.to_token_stream(),
                error
            ),
            Ok(Meta::List(meta)) => {
                for meta in meta.nested {
                    if let NestedMeta::Meta(Meta::NameValue(meta)) = &meta {
                        if meta.path.is_ident("name") {
                            if let Lit::Str(value) = &meta.lit {
                                result.name = Some(value.clone());
                            }
                        } else if meta.path.is_ident("serialize_hook") {
                            result.serialize_hook = method_name(&meta.lit);
                        } else if meta.path.is_ident("field_filter") {
                            result.field_filter = method_name(&meta.lit);
                        } else if meta.path.is_ident("deserialize_hook") {
                            result.deserialize_hook = method_name(&meta.lit);
                        } else if meta.path.is_ident("after_hydrate") {
                            result.after_hydrate = method_name(&meta.lit);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    result
}

fn parse_field_attribs(attrs: &[Attribute]) -> FieldAttribs {
    let mut result = FieldAttribs::default();
    for attrib in attrs {
        if !attrib.path.is_ident("reflect") {
            continue;
        }
        match attrib.parse_meta() {
            Err(error) => panic!(
                "Could not parse attribute `{}`: {:?}",
                attrib.to_token_stream(),
                error
            ),
            Ok(Meta::List(meta)) => {
                for meta in meta.nested {
                    match &meta {
                        NestedMeta::Meta(Meta::Path(path)) => {
                            if path.is_ident("skip") {
                                result.skip = true;
                            } else if path.is_ident("base") {
                                result.base = true;
                            }
                        }
                        NestedMeta::Meta(Meta::NameValue(meta)) => {
                            if meta.path.is_ident("default") {
                                if let Lit::Str(value) = &meta.lit {
                                    match value.parse::<Expr>() {
                                        Ok(expr) => result.default = Some(expr),
                                        Err(error) => panic!(
                                            "Could not parse default value `{}`: {:?}",
                                            value.value(),
                                            error
                                        ),
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    result
}

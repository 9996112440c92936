//! # Userial Derive Macros
//!
//! This crate provides the procedural macro for `userial`. It implements the
//! `Reflect` trait for structs and enums: the type identifier, the conversion to
//! and from `userial::Value`, and registration of the type descriptor.
//!
//! Compatible with `syn 2.0`.
//!
//! ## Attributes
//!
//! Container:
//! *   `#[userial(name = "...")]` overrides the identifier (default
//!     `module_path!()::TypeName`).
//! *   `#[userial(default)]` adds a zero-argument initializer backed by
//!     `Default` (structs only).
//!
//! Field:
//! *   `#[userial(parent)]` marks the field holding the parent type. Its fields
//!     are inherited and encoded after the type's own.
//! *   `#[userial(skip)]` describes the field without encoding it. It is
//!     rebuilt with `Default`.
//! *   `#[userial(rename = "...")]` changes the field name.
//!
//! Variant:
//! *   `#[userial(rename = "...")]` changes the constant name.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Member, parse_macro_input};

/// Derives `userial::Reflect`.
#[proc_macro_derive(Reflect, attributes(userial))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "Reflect cannot be derived for generic types; implement it by hand",
        ));
    }

    let container = parse_container_attributes(&input.attrs)?;
    let identifier = match &container.name {
        Some(lit) => quote! { #lit },
        None => {
            let short = name.unraw().to_string();
            quote! { concat!(module_path!(), "::", #short) }
        }
    };

    match &input.data {
        Data::Struct(ds) => {
            let layout = StructLayout::parse(&ds.fields)?;
            Ok(generate_struct(name, &identifier, &container, &layout))
        }
        Data::Enum(de) => {
            if container.default {
                return Err(syn::Error::new(
                    name.span(),
                    "`default` only applies to structs",
                ));
            }
            if de.variants.is_empty() {
                return Err(syn::Error::new(
                    name.span(),
                    "Reflect cannot be derived for an enum without variants",
                ));
            }
            let mut variants = Vec::new();
            for variant in &de.variants {
                variants.push(VariantLayout::parse(variant)?);
            }
            Ok(generate_enum(name, &identifier, &variants))
        }
        Data::Union(_) => Err(syn::Error::new(
            name.span(),
            "Reflect only supports structs and enums",
        )),
    }
}

// --- Internal Data Structures ---

#[derive(Default)]
struct ContainerAttributes {
    name: Option<LitStr>,
    default: bool,
}

#[derive(Default)]
struct FieldAttributes {
    parent: bool,
    skip: bool,
    rename: Option<String>,
}

enum Role {
    Encoded,
    Parent,
    Skipped,
}

struct FieldModel {
    member: Member,
    binding: syn::Ident,
    wire_name: String,
    ty: syn::Type,
    role: Role,
}

enum Shape {
    Named,
    Unnamed,
    Unit,
}

struct StructLayout {
    shape: Shape,
    fields: Vec<FieldModel>,
}

struct VariantLayout {
    ident: syn::Ident,
    constant: String,
    layout: StructLayout,
}

impl StructLayout {
    fn parse(fields: &Fields) -> syn::Result<Self> {
        let shape = match fields {
            Fields::Named(_) => Shape::Named,
            Fields::Unnamed(_) => Shape::Unnamed,
            Fields::Unit => Shape::Unit,
        };

        let mut specs = Vec::new();
        let mut has_parent = false;
        for (index, field) in fields.iter().enumerate() {
            let attrs = parse_field_attributes(&field.attrs)?;
            let (member, binding, default_name) = match &field.ident {
                Some(ident) => (
                    Member::Named(ident.clone()),
                    format_ident!("__userial_{}", ident),
                    ident.unraw().to_string(),
                ),
                None => (
                    Member::Unnamed(syn::Index::from(index)),
                    format_ident!("__userial_{}", index),
                    index.to_string(),
                ),
            };

            let role = match (attrs.parent, attrs.skip) {
                (true, true) => {
                    return Err(syn::Error::new(
                        field.span(),
                        "a field cannot be both `parent` and `skip`",
                    ));
                }
                (true, false) => {
                    if has_parent {
                        return Err(syn::Error::new(
                            field.span(),
                            "only one field can be marked `parent`",
                        ));
                    }
                    if attrs.rename.is_some() {
                        return Err(syn::Error::new(
                            field.span(),
                            "the `parent` field has no name of its own to rename",
                        ));
                    }
                    has_parent = true;
                    Role::Parent
                }
                (false, true) => Role::Skipped,
                (false, false) => Role::Encoded,
            };

            specs.push(FieldModel {
                member,
                binding,
                wire_name: attrs.rename.unwrap_or(default_name),
                ty: field.ty.clone(),
                role,
            });
        }

        Ok(Self {
            shape,
            fields: specs,
        })
    }

    fn encoded(&self) -> impl Iterator<Item = &FieldModel> {
        self.fields.iter().filter(|f| matches!(f.role, Role::Encoded))
    }

    fn parent(&self) -> Option<&FieldModel> {
        self.fields.iter().find(|f| matches!(f.role, Role::Parent))
    }

    /// `Path { a: x, b: y }`, `Path(x, y)` or `Path` over the field bindings.
    fn construct(&self, path: &TokenStream2) -> TokenStream2 {
        let bindings = self.fields.iter().map(|f| &f.binding);
        match self.shape {
            Shape::Named => {
                let members = self.fields.iter().map(|f| &f.member);
                quote! { #path { #(#members: #bindings),* } }
            }
            Shape::Unnamed => quote! { #path ( #(#bindings),* ) },
            Shape::Unit => quote! { #path },
        }
    }
}

impl VariantLayout {
    fn parse(variant: &syn::Variant) -> syn::Result<Self> {
        let mut constant = variant.ident.unraw().to_string();
        for attr in &variant.attrs {
            if attr.path().is_ident("userial") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        let s: LitStr = meta.value()?.parse()?;
                        constant = s.value();
                        return Ok(());
                    }
                    Err(meta.error("Unknown userial variant attribute. Supported: rename"))
                })?;
            }
        }

        let layout = StructLayout::parse(&variant.fields)?;
        if let Some(parent) = layout.parent() {
            return Err(syn::Error::new(
                parent.ty.span(),
                "`parent` is not supported on enum variants",
            ));
        }

        Ok(Self {
            ident: variant.ident.clone(),
            constant,
            layout,
        })
    }
}

// --- Attribute Parsing ---

fn parse_container_attributes(attrs: &[Attribute]) -> syn::Result<ContainerAttributes> {
    let mut out = ContainerAttributes::default();
    for attr in attrs {
        if attr.path().is_ident("userial") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let s: LitStr = meta.value()?.parse()?;
                    if s.value().is_empty() {
                        return Err(meta.error("the type identifier cannot be empty"));
                    }
                    out.name = Some(s);
                    return Ok(());
                }

                if meta.path.is_ident("default") {
                    out.default = true;
                    return Ok(());
                }
                Err(meta.error("Unknown userial container attribute. Supported: name, default"))
            })?;
        }
    }
    Ok(out)
}

fn parse_field_attributes(attrs: &[Attribute]) -> syn::Result<FieldAttributes> {
    let mut out = FieldAttributes::default();
    for attr in attrs {
        if attr.path().is_ident("userial") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("parent") {
                    out.parent = true;
                    return Ok(());
                }

                if meta.path.is_ident("skip") {
                    out.skip = true;
                    return Ok(());
                }

                if meta.path.is_ident("rename") {
                    let s: LitStr = meta.value()?.parse()?;
                    out.rename = Some(s.value());
                    return Ok(());
                }
                Err(meta.error("Unknown userial field attribute. Supported: parent, skip, rename"))
            })?;
        }
    }
    Ok(out)
}

// --- Generator: Structs ---

fn generate_struct(
    name: &syn::Ident,
    identifier: &TokenStream2,
    container: &ContainerAttributes,
    layout: &StructLayout,
) -> TokenStream2 {
    // to_value
    let own_fields = layout.encoded().map(|f| {
        let member = &f.member;
        let wire = &f.wire_name;
        quote! {
            userial::Field::new(
                __owner.clone(),
                #wire,
                userial::Reflect::to_value(&self.#member)?,
            )
        }
    });
    let inherit = layout.parent().map(|p| {
        let member = &p.member;
        let pty = &p.ty;
        quote! {
            let __parent = userial::Reflect::to_value(&self.#member)?
                .into_composite(&<#pty as userial::Reflect>::type_identifier())?;
            __composite.extend_inherited(__parent);
        }
    });

    // from_value: own fields in declaration order, the parent last.
    let take_fields = layout.fields.iter().map(|f| {
        let binding = &f.binding;
        let ty = &f.ty;
        let wire = &f.wire_name;
        match f.role {
            Role::Encoded => quote! {
                let #binding: #ty = userial::rt::take_field(&mut __composite, &__owner, #wire)?;
            },
            Role::Skipped => quote! {
                let #binding: #ty = ::core::default::Default::default();
            },
            Role::Parent => quote! {},
        }
    });
    let take_parent = layout.parent().map(|p| {
        let binding = &p.binding;
        let ty = &p.ty;
        quote! {
            let #binding: #ty = userial::rt::take_parent(__composite)?;
        }
    });
    let construct = layout.construct(&quote! { Self });

    // register
    let descriptor_fields = layout.fields.iter().filter_map(field_descriptor);
    let with_parent = layout.parent().map(|p| {
        let pty = &p.ty;
        quote! { .with_parent(<#pty as userial::Reflect>::type_identifier()) }
    });
    let with_default = container.default.then(|| {
        quote! {
            .with_initializer(userial::Initializer::Nullary(userial::rt::default_value::<Self>))
        }
    });
    let register_referenced = layout
        .fields
        .iter()
        .filter(|f| !matches!(f.role, Role::Skipped))
        .map(|f| {
            let ty = &f.ty;
            quote! { <#ty as userial::Reflect>::register(registry)?; }
        });

    quote! {
        impl userial::Reflect for #name {
            fn type_identifier() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#identifier)
            }

            fn to_value(&self) -> userial::Result<userial::Value> {
                let __owner = <Self as userial::Reflect>::type_identifier();
                #[allow(unused_mut)]
                let mut __composite = userial::Composite::new(
                    __owner.clone(),
                    vec![#(#own_fields),*],
                );
                #inherit
                Ok(userial::Value::Composite(__composite))
            }

            fn from_value(value: userial::Value) -> userial::Result<Self> {
                let __owner = <Self as userial::Reflect>::type_identifier();
                #[allow(unused_mut, unused_variables)]
                let mut __composite = value.into_composite(&__owner)?;
                #(#take_fields)*
                #take_parent
                Ok(#construct)
            }

            fn register(registry: &mut userial::TypeRegistry) -> userial::Result<()> {
                let __owner = <Self as userial::Reflect>::type_identifier();
                if registry.contains(&__owner) {
                    return Ok(());
                }
                let descriptor = userial::TypeDescriptor::composite(__owner.clone())
                    #(.with_field(#descriptor_fields))*
                    #with_parent
                    .with_initializer(userial::Initializer::Memberwise)
                    #with_default;
                registry.insert(descriptor)?;
                #(#register_referenced)*
                Ok(())
            }
        }
    }
}

/// The `FieldDescriptor` expression for one field; `None` for the parent.
fn field_descriptor(f: &FieldModel) -> Option<TokenStream2> {
    let ty = &f.ty;
    let wire = &f.wire_name;
    match f.role {
        Role::Encoded => Some(quote! {
            userial::FieldDescriptor::new(
                __owner.clone(),
                #wire,
                <#ty as userial::Reflect>::type_identifier(),
            )
            .nullable(<#ty as userial::Reflect>::NULLABLE)
        }),
        Role::Skipped => Some(quote! {
            userial::FieldDescriptor::new(__owner.clone(), #wire, ::core::any::type_name::<#ty>())
                .skipped()
        }),
        Role::Parent => None,
    }
}

// --- Generator: Enums ---

fn generate_enum(
    name: &syn::Ident,
    identifier: &TokenStream2,
    variants: &[VariantLayout],
) -> TokenStream2 {
    let to_value_arms = variants.iter().map(|v| {
        let constant = &v.constant;
        let pattern = pattern_for(v);
        let payload = v.layout.encoded().map(|f| {
            let binding = &f.binding;
            let wire = &f.wire_name;
            quote! {
                userial::Field::new(__owner.clone(), #wire, userial::Reflect::to_value(#binding)?)
            }
        });
        quote! {
            #pattern => userial::EnumValue::new(
                __owner.clone(),
                #constant,
                vec![#(#payload),*],
            ),
        }
    });

    let from_value_arms = variants.iter().map(|v| {
        let ident = &v.ident;
        let constant = &v.constant;
        let take_fields = v.layout.fields.iter().map(|f| {
            let binding = &f.binding;
            let ty = &f.ty;
            let wire = &f.wire_name;
            match f.role {
                Role::Encoded => quote! {
                    let #binding: #ty = userial::rt::take_constant_field(&mut __value, #wire)?;
                },
                _ => quote! {
                    let #binding: #ty = ::core::default::Default::default();
                },
            }
        });
        let construct = v.layout.construct(&quote! { Self::#ident });
        quote! {
            #constant => {
                #(#take_fields)*
                Ok(#construct)
            }
        }
    });

    let constants = variants.iter().map(|v| {
        let constant = &v.constant;
        let fields = v.layout.fields.iter().filter_map(field_descriptor);
        quote! {
            userial::EnumConstant::new(#constant, vec![#(#fields),*])
        }
    });

    let register_referenced = variants
        .iter()
        .flat_map(|v| v.layout.encoded())
        .map(|f| {
            let ty = &f.ty;
            quote! { <#ty as userial::Reflect>::register(registry)?; }
        });

    quote! {
        impl userial::Reflect for #name {
            fn type_identifier() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#identifier)
            }

            fn to_value(&self) -> userial::Result<userial::Value> {
                let __owner = <Self as userial::Reflect>::type_identifier();
                let __constant = match self {
                    #(#to_value_arms)*
                };
                Ok(userial::Value::Enum(__constant))
            }

            fn from_value(value: userial::Value) -> userial::Result<Self> {
                let __owner = <Self as userial::Reflect>::type_identifier();
                #[allow(unused_mut)]
                let mut __value = value.into_enum(&__owner)?;
                let __constant = __value.constant.clone();
                match __constant.as_str() {
                    #(#from_value_arms)*
                    other => Err(userial::rt::unknown_constant(&__owner, other)),
                }
            }

            fn register(registry: &mut userial::TypeRegistry) -> userial::Result<()> {
                let __owner = <Self as userial::Reflect>::type_identifier();
                if registry.contains(&__owner) {
                    return Ok(());
                }
                let descriptor = userial::TypeDescriptor::enumeration(
                    __owner.clone(),
                    vec![#(#constants),*],
                );
                registry.insert(descriptor)?;
                #(#register_referenced)*
                Ok(())
            }
        }
    }
}

/// Match pattern binding the encoded payload fields of a variant by reference.
fn pattern_for(v: &VariantLayout) -> TokenStream2 {
    let ident = &v.ident;
    let bound = v.layout.fields.iter().map(|f| match f.role {
        Role::Encoded => {
            let binding = &f.binding;
            quote! { #binding }
        }
        _ => quote! { _ },
    });
    match v.layout.shape {
        Shape::Named => {
            let members = v.layout.fields.iter().map(|f| &f.member);
            quote! { Self::#ident { #(#members: #bound),* } }
        }
        Shape::Unnamed => quote! { Self::#ident ( #(#bound),* ) },
        Shape::Unit => quote! { Self::#ident },
    }
}

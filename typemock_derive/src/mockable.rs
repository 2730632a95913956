// vim: tw=80
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    *,
    spanned::Spanned
};

use crate::{compile_error, gen_mock_ident};

/// Does the type contain `impl Trait` anywhere at its top level?
fn is_impl_trait(ty: &Type) -> bool {
    match ty {
        Type::ImplTrait(_) => true,
        Type::Reference(r) => is_impl_trait(&r.elem),
        Type::Paren(p) => is_impl_trait(&p.elem),
        _ => false
    }
}

/// One method of the mocked trait
struct MockableMethod {
    /// Signature used for the mock's implementation
    sig: Signature,
    /// Argument names and types, excluding the receiver
    args: Vec<(Ident, Type)>,
    output: Type,
}

impl MockableMethod {
    fn new(sig: &Signature) -> Option<Self> {
        if !sig.generics.params.is_empty() {
            compile_error(sig.generics.span(),
                "#[mockable] does not support generic methods");
            return None;
        }
        if sig.receiver().is_none() {
            compile_error(sig.span(),
                "#[mockable] does not support static methods");
            return None;
        }
        if let Some(v) = &sig.variadic {
            compile_error(v.span(),
                "#[mockable] does not support variadic methods");
            return None;
        }
        let mut sig = sig.clone();
        let mut args = Vec::new();
        for fn_arg in sig.inputs.iter_mut() {
            let FnArg::Typed(pt) = fn_arg else {
                continue;
            };
            match pt.pat.as_mut() {
                Pat::Ident(pat_ident) => {
                    if let Some(r) = &pat_ident.by_ref {
                        compile_error(r.span(),
                            "#[mockable] does not support by-reference argument bindings");
                        return None;
                    }
                    if let Some((_at, subpat)) = &pat_ident.subpat {
                        compile_error(subpat.span(),
                            "#[mockable] does not support subpattern bindings");
                        return None;
                    }
                    pat_ident.mutability = None;
                    if is_impl_trait(&pt.ty) {
                        compile_error(pt.ty.span(),
                            "#[mockable] does not support impl Trait arguments");
                        return None;
                    }
                    args.push((pat_ident.ident.clone(), (*pt.ty).clone()));
                },
                _ => {
                    compile_error(pt.span(),
                        "Mocked methods must have named arguments");
                    return None;
                }
            }
        }
        let output = match &sig.output {
            ReturnType::Default => parse_quote!(()),
            ReturnType::Type(_, ty) if is_impl_trait(ty) => {
                compile_error(ty.span(),
                    "#[mockable] does not support impl Trait return types");
                return None;
            },
            ReturnType::Type(_, ty) => (**ty).clone()
        };
        Some(MockableMethod{sig, args, output})
    }

    fn name(&self) -> String {
        self.sig.ident.to_string()
    }

    fn is_async(&self) -> bool {
        self.sig.asyncness.is_some()
    }

    /// An expression building this method's `MethodSpec`
    fn description(&self) -> TokenStream {
        let name = self.name();
        let params = self.args.iter().map(|(ident, ty)| {
            let pname = ident.to_string();
            quote!(.param(::typemock::Param::new(#pname)
                .typed(<#ty as ::typemock::Typed>::type_descriptor())))
        });
        let output = &self.output;
        let asynchronous = if self.is_async() {
            quote!(.asynchronous())
        } else {
            TokenStream::new()
        };
        quote!(
            ::typemock::MethodSpec::new(#name)
                #(#params)*
                .returns(<#output as ::typemock::Typed>::type_descriptor())
                #asynchronous
        )
    }

    /// The method's implementation on the mock struct
    fn implementation(&self) -> TokenStream {
        let sig = &self.sig;
        let name = self.name();
        let argnames = self.args.iter().map(|(ident, _)| ident);
        let args = quote!(::typemock::Args::new() #(.arg(#argnames))*);
        let body = if self.is_async() {
            quote!(::typemock::__private::replay_async(&self.mock, #name,
                                                       #args).await)
        } else {
            quote!(::typemock::__private::replay(&self.mock, #name, #args))
        };
        quote!(#sig { #body })
    }
}

/// A trait annotated with `#[mockable]`
struct MockableTrait {
    ident: Ident,
    vis: Visibility,
    unsafety: Option<Token![unsafe]>,
    methods: Vec<MockableMethod>,
}

impl MockableTrait {
    fn new(item: &ItemTrait) -> Option<Self> {
        if !item.generics.params.is_empty() {
            compile_error(item.generics.span(),
                "#[mockable] does not support generic traits");
            return None;
        }
        if !item.supertraits.is_empty() {
            compile_error(item.supertraits.span(),
                "#[mockable] does not support supertraits");
            return None;
        }
        let mut methods = Vec::new();
        for trait_item in item.items.iter() {
            match trait_item {
                TraitItem::Fn(f) => methods.push(MockableMethod::new(&f.sig)?),
                TraitItem::Const(c) => {
                    compile_error(c.span(),
                        "#[mockable] does not support associated constants");
                    return None;
                },
                TraitItem::Type(t) => {
                    compile_error(t.span(),
                        "#[mockable] does not support associated types");
                    return None;
                },
                _ => {
                    compile_error(trait_item.span(), "Unsupported trait item");
                    return None;
                }
            }
        }
        Some(MockableTrait {
            ident: item.ident.clone(),
            vis: item.vis.clone(),
            unsafety: item.unsafety,
            methods
        })
    }

    fn gen(&self) -> TokenStream {
        let ident = &self.ident;
        let mock_ident = gen_mock_ident(ident);
        let vis = &self.vis;
        let unsafety = &self.unsafety;
        let name = ident.to_string();
        let docstr = format!("Mock version of the `{}` trait", ident);
        let descriptions = self.methods.iter().map(MockableMethod::description);
        let implementations = self.methods.iter()
            .map(MockableMethod::implementation);
        quote!(
            #[doc = #docstr]
            #[allow(dead_code)]
            #[derive(Debug)]
            #vis struct #mock_ident {
                mock: ::typemock::MockObject,
            }

            #[allow(dead_code)]
            impl #mock_ident {
                /// Create a mock in the default `Strict` mode.
                #vis fn new() -> ::typemock::Result<Self> {
                    Self::with_type_safety(::typemock::TypeSafety::default())
                }

                /// Create a mock with the given type safety mode.
                #vis fn with_type_safety(type_safety: ::typemock::TypeSafety)
                    -> ::typemock::Result<Self>
                {
                    let mock = ::typemock::tmock(
                        <Self as ::typemock::Mockable>::description(),
                        type_safety)?;
                    ::std::result::Result::Ok(#mock_ident{mock})
                }
            }

            impl ::std::ops::Deref for #mock_ident {
                type Target = ::typemock::MockObject;

                fn deref(&self) -> &::typemock::MockObject {
                    &self.mock
                }
            }

            impl ::typemock::Mockable for #mock_ident {
                fn description() -> ::typemock::ClassDescription {
                    ::typemock::ClassDescription::new(#name)
                        #(.method(#descriptions))*
                }
            }

            #unsafety impl #ident for #mock_ident {
                #(#implementations)*
            }
        )
    }
}

pub(crate) fn do_mockable(attrs: TokenStream, input: TokenStream)
    -> TokenStream
{
    if !attrs.is_empty() {
        compile_error(attrs.span(), "#[mockable] does not take arguments");
        return TokenStream::new();
    }
    let item: ItemTrait = match parse2(input) {
        Ok(item) => item,
        Err(err) => return err.to_compile_error()
    };
    match MockableTrait::new(&item) {
        Some(t) => t.gen(),
        None => TokenStream::new()
    }
}

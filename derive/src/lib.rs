extern crate proc_macro;

mod reflect;

use proc_macro::TokenStream;

#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    crate::reflect::derive(input)
}

//! Derive macros for the chaos-tree renderer.
//!
//! This crate provides one derive macro:
//!
//! - [`PointAttributes`] - Describes a per-point vertex struct to the GPU
//!
//! # Usage
//!
//! The macro is re-exported from the main `chaos_tree` crate. You don't need
//! to add this crate directly:
//!
//! ```ignore
//! use chaos_tree::prelude::*;
//!
//! #[repr(C)]
//! #[derive(Clone, Copy, Pod, Zeroable, PointAttributes)]
//! struct Glint {
//!     chaos: Vec3,
//!     target: Vec3,
//!     seed: f32,
//! }
//! ```
//!
//! # The PointAttributes Macro
//!
//! Point fields hand the rendering backend one attribute buffer per field.
//! Every point carries its chaos position, its target position and a random
//! seed, plus whatever decoration data the field needs. The macro generates:
//!
//! - `ATTRIBUTES` - a `wgpu::VertexAttribute` table with byte offsets
//! - `STRIDE` - the byte size of one point
//! - `WGSL_INPUT` - the matching WGSL vertex-input struct
//!
//! Attributes are tightly packed (vertex buffers have no 16-byte `vec3`
//! alignment rule), so the struct must be `#[repr(C)]` with only 4-byte
//! aligned fields. A compile-time assertion checks the computed stride
//! against `size_of`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Type};

/// Layout info for a supported field type.
struct AttributeInfo {
    /// `wgpu::VertexFormat` variant name.
    format: &'static str,
    /// WGSL type used in the vertex-input struct.
    wgsl_type: &'static str,
    /// Size in bytes.
    size: u64,
}

fn attribute_info(ty: &Type) -> AttributeInfo {
    let type_str = quote!(#ty).to_string().replace(' ', "");
    match type_str.as_str() {
        "f32" => AttributeInfo {
            format: "Float32",
            wgsl_type: "f32",
            size: 4,
        },
        "u32" => AttributeInfo {
            format: "Uint32",
            wgsl_type: "u32",
            size: 4,
        },
        "Vec2" | "glam::Vec2" | "[f32;2]" => AttributeInfo {
            format: "Float32x2",
            wgsl_type: "vec2<f32>",
            size: 8,
        },
        "Vec3" | "glam::Vec3" | "[f32;3]" => AttributeInfo {
            format: "Float32x3",
            wgsl_type: "vec3<f32>",
            size: 12,
        },
        "[f32;4]" => AttributeInfo {
            format: "Float32x4",
            wgsl_type: "vec4<f32>",
            size: 16,
        },
        other => panic!(
            "PointAttributes: unsupported field type `{}`. \
             Supported: f32, u32, Vec2, Vec3, [f32; 2], [f32; 3], [f32; 4]",
            other
        ),
    }
}

/// Derive macro for per-point attribute structs.
///
/// # Supported Types
///
/// | Rust Type | Vertex Format | WGSL Type | Size |
/// |-----------|---------------|-----------|------|
/// | `f32` | `Float32` | `f32` | 4 bytes |
/// | `u32` | `Uint32` | `u32` | 4 bytes |
/// | `Vec2`, `[f32; 2]` | `Float32x2` | `vec2<f32>` | 8 bytes |
/// | `Vec3`, `[f32; 3]` | `Float32x3` | `vec3<f32>` | 12 bytes |
/// | `[f32; 4]` | `Float32x4` | `vec4<f32>` | 16 bytes |
///
/// `glam::Vec4` is rejected because it is 16-byte aligned on SIMD targets.
///
/// # Shader Locations
///
/// Fields are bound to consecutive `@location`s in declaration order,
/// starting at 0. Use `#[point(location = N)]` on the struct to start at a
/// different location (e.g. when a per-vertex buffer occupies the first slots).
///
/// # Generated Code
///
/// ```ignore
/// impl chaos_tree::field::PointLayout for Glint {
///     const ATTRIBUTES: &'static [wgpu::VertexAttribute] = &[ ... ];
///     const STRIDE: u64 = 28;
///     const WGSL_INPUT: &'static str = "struct PointInput { ... }";
/// }
/// ```
///
/// # Panics
///
/// The macro panics at compile time if:
/// - Applied to an enum or a tuple struct
/// - Any field has an unsupported type
#[proc_macro_derive(PointAttributes, attributes(point))]
pub fn derive_point_attributes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("PointAttributes derive only supports structs with named fields"),
        },
        _ => panic!("PointAttributes derive only supports structs"),
    };

    let start_location = parse_start_location(&input.attrs);

    let mut attributes = Vec::new();
    let mut wgsl_fields = Vec::new();
    let mut offset = 0u64;

    for (i, field) in fields.iter().enumerate() {
        let field_name = field
            .ident
            .as_ref()
            .map(|ident| ident.to_string())
            .unwrap_or_default();
        let info = attribute_info(&field.ty);
        let location = start_location + i as u32;
        let format = syn::Ident::new(info.format, proc_macro2::Span::call_site());

        attributes.push(quote! {
            chaos_tree::wgpu::VertexAttribute {
                format: chaos_tree::wgpu::VertexFormat::#format,
                offset: #offset,
                shader_location: #location,
            }
        });
        wgsl_fields.push(format!(
            "    @location({}) {}: {},",
            location, field_name, info.wgsl_type
        ));

        offset += info.size;
    }

    let wgsl_input = format!("struct PointInput {{\n{}\n}};\n", wgsl_fields.join("\n"));
    let stride = offset;

    let expanded = quote! {
        impl chaos_tree::field::PointLayout for #name {
            const ATTRIBUTES: &'static [chaos_tree::wgpu::VertexAttribute] = &[
                #(#attributes),*
            ];
            const STRIDE: u64 = #stride;
            const WGSL_INPUT: &'static str = #wgsl_input;
        }

        const _: () = assert!(
            ::core::mem::size_of::<#name>() as u64 == #stride,
            "PointAttributes: struct must be #[repr(C)] and tightly packed"
        );
    };

    TokenStream::from(expanded)
}

/// Read `#[point(location = N)]` from the struct attributes.
fn parse_start_location(attrs: &[syn::Attribute]) -> u32 {
    let mut location = 0u32;
    for attr in attrs {
        if !attr.path().is_ident("point") {
            continue;
        }
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("location") {
                let lit: syn::LitInt = meta.value()?.parse()?;
                location = lit.base10_parse()?;
                Ok(())
            } else {
                Err(meta.error("unsupported point attribute, expected `location = N`"))
            }
        });
        if let Err(e) = result {
            panic!("PointAttributes: {}", e);
        }
    }
    location
}

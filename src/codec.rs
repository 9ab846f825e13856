//! Tag-driven packet codec (spec.md §4.2).
//!
//! A packet schema is an ordered `(field_name, field_tag)` list. Rather than
//! interpret that list at runtime (the source's reflection-based approach,
//! see spec.md §9), `packet!` is a compile-time field-list descriptor: each
//! invocation expands to a plain struct plus `encode`/`decode` methods that
//! walk the field list in declaration order, dispatching each field to its
//! tag's wire function from `crate::wire`. A tag identifier the macro does
//! not recognize fails to match any arm of `tag_ty!`/`tag_encode!`/
//! `tag_decode!` and is therefore a compile-time error — no schema-load-time
//! validation is needed.
//!
//! Recognized tags: `varint | varlong | i8 | u8 | i16 | u16 | i32 | i64 |
//! f32 | f64 | bool | string | uuid | position | bytearray | rest`.

#[macro_export]
macro_rules! tag_ty {
    (varint) => { i32 };
    (varlong) => { i64 };
    (i8) => { i8 };
    (u8) => { u8 };
    (i16) => { i16 };
    (u16) => { u16 };
    (i32) => { i32 };
    (i64) => { i64 };
    (f32) => { f32 };
    (f64) => { f64 };
    (bool) => { bool };
    (string) => { String };
    (uuid) => { uuid::Uuid };
    (position) => { (i32, i32, i32) };
    (bytearray) => { Vec<u8> };
    (rest) => { Vec<u8> };
}

#[macro_export]
macro_rules! tag_encode {
    (varint, $val:expr, $dst:expr) => { $crate::wire::write_varint(*$val, $dst) };
    (varlong, $val:expr, $dst:expr) => { $crate::wire::write_varlong(*$val, $dst) };
    (i8, $val:expr, $dst:expr) => { $crate::wire::write_i8(*$val, $dst) };
    (u8, $val:expr, $dst:expr) => { $crate::wire::write_u8(*$val, $dst) };
    (i16, $val:expr, $dst:expr) => { $crate::wire::write_i16(*$val, $dst) };
    (u16, $val:expr, $dst:expr) => { $crate::wire::write_u16(*$val, $dst) };
    (i32, $val:expr, $dst:expr) => { $crate::wire::write_i32(*$val, $dst) };
    (i64, $val:expr, $dst:expr) => { $crate::wire::write_i64(*$val, $dst) };
    (f32, $val:expr, $dst:expr) => { $crate::wire::write_f32(*$val, $dst) };
    (f64, $val:expr, $dst:expr) => { $crate::wire::write_f64(*$val, $dst) };
    (bool, $val:expr, $dst:expr) => { $crate::wire::write_bool(*$val, $dst) };
    (string, $val:expr, $dst:expr) => { $crate::wire::write_string($val, $dst) };
    (uuid, $val:expr, $dst:expr) => { $crate::wire::write_uuid(*$val, $dst) };
    (bytearray, $val:expr, $dst:expr) => { $crate::wire::write_bytearray($val, $dst) };
    (rest, $val:expr, $dst:expr) => {
        (|| -> $crate::error::Result<()> {
            use std::io::Write as _;
            $dst.write_all($val)?;
            Ok(())
        })()
    };
    (position, $val:expr, $dst:expr) => {
        (|| -> $crate::error::Result<()> {
            let (x, y, z) = *$val;
            $crate::wire::write_position(x, y, z, $dst)
        })()
    };
}

#[macro_export]
macro_rules! tag_decode {
    (varint, $src:expr) => { $crate::wire::read_varint($src) };
    (varlong, $src:expr) => { $crate::wire::read_varlong($src) };
    (i8, $src:expr) => { $crate::wire::read_i8($src) };
    (u8, $src:expr) => { $crate::wire::read_u8($src) };
    (i16, $src:expr) => { $crate::wire::read_i16($src) };
    (u16, $src:expr) => { $crate::wire::read_u16($src) };
    (i32, $src:expr) => { $crate::wire::read_i32($src) };
    (i64, $src:expr) => { $crate::wire::read_i64($src) };
    (f32, $src:expr) => { $crate::wire::read_f32($src) };
    (f64, $src:expr) => { $crate::wire::read_f64($src) };
    (bool, $src:expr) => { $crate::wire::read_bool($src) };
    (string, $src:expr) => { $crate::wire::read_string($src) };
    (uuid, $src:expr) => { $crate::wire::read_uuid($src) };
    (bytearray, $src:expr) => { $crate::wire::read_bytearray($src) };
    (rest, $src:expr) => { $crate::wire::read_rest($src) };
    (position, $src:expr) => { $crate::wire::read_position($src) };
}

/// Declares a packet struct plus `encode`/`decode`, given a numeric ID and an
/// ordered `field: tag` list (spec.md §4.2, §4.5).
#[macro_export]
macro_rules! packet {
    ($(#[$meta:meta])* $name:ident, $id:expr, { $($field:ident : $tag:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            $(pub $field: $crate::tag_ty!($tag)),*
        }

        impl $name {
            pub const ID: i32 = $id;

            #[allow(unused_variables)]
            pub fn encode(&self, dst: &mut dyn std::io::Write) -> $crate::error::Result<()> {
                $($crate::tag_encode!($tag, &self.$field, dst)?;)*
                Ok(())
            }

            #[allow(unused_variables)]
            pub fn decode(src: &mut dyn std::io::Read) -> $crate::error::Result<Self> {
                Ok(Self {
                    $($field: $crate::tag_decode!($tag, src)?,)*
                })
            }
        }
    };
}

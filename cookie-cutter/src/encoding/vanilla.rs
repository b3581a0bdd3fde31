//! Little-endian byte encoding.
//!
//! Most `no_std` targets are little-endian native,
//! so this is the default encoding.

use super::Encoding;

pub struct Vanilla;

impl Encoding for Vanilla {
    type Word = u8;
}

// isize/usize have platform specific size!
impl_numbers!(
    Vanilla,
    to_le_bytes,
    from_le_bytes,
    (u8, 1),
    (u16, 2),
    (u32, 4),
    (u64, 8),
    (i8, 1),
    (i16, 2),
    (i32, 4),
    (i64, 8),
    (f32, 4),
    (f64, 8),
);

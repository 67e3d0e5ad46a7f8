//! Host byte order handling
//!
//! Every multi-byte scalar travels least-significant byte first. The codec
//! starts from the host's native representation and reverses it when the
//! host is big-endian, so the encoding is identical on every platform.
//!
//! `ByteOrder` is a parameter rather than a `cfg!` branch hidden inside the
//! codec, which lets callers drive the big-endian path on any machine.

/// Native byte order of a host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Byte order of the machine this crate was compiled for
pub const HOST_ORDER: ByteOrder = if cfg!(target_endian = "big") {
    ByteOrder::Big
} else {
    ByteOrder::Little
};

impl ByteOrder {
    /// Convert a native representation (in `self` order) to wire order
    ///
    /// A full reversal of all N bytes; for 8-byte doubles this swaps
    /// (0,7) (1,6) (2,5) (3,4).
    #[inline]
    pub fn native_to_wire<const N: usize>(self, mut bytes: [u8; N]) -> [u8; N] {
        if self == ByteOrder::Big {
            bytes.reverse();
        }
        bytes
    }

    /// Convert wire-order bytes back to a native representation in `self` order
    #[inline]
    pub fn wire_to_native<const N: usize>(self, bytes: [u8; N]) -> [u8; N] {
        // Reversal is its own inverse
        self.native_to_wire(bytes)
    }
}

/// Generates native <-> wire helpers for a fixed-width numeric type
macro_rules! wire_numeric {
    ($to:ident, $from:ident, $ty:ty, $n:expr) => {
        /// Encode as little-endian wire bytes, starting from `order`'s native layout
        #[inline]
        pub fn $to(value: $ty, order: ByteOrder) -> [u8; $n] {
            let native = match order {
                ByteOrder::Little => value.to_le_bytes(),
                ByteOrder::Big => value.to_be_bytes(),
            };
            order.native_to_wire(native)
        }

        /// Decode little-endian wire bytes through `order`'s native layout
        #[inline]
        pub fn $from(bytes: [u8; $n], order: ByteOrder) -> $ty {
            let native = order.wire_to_native(bytes);
            match order {
                ByteOrder::Little => <$ty>::from_le_bytes(native),
                ByteOrder::Big => <$ty>::from_be_bytes(native),
            }
        }
    };
}

wire_numeric!(i16_to_wire, i16_from_wire, i16, 2);
wire_numeric!(u16_to_wire, u16_from_wire, u16, 2);
wire_numeric!(i32_to_wire, i32_from_wire, i32, 4);
wire_numeric!(u32_to_wire, u32_from_wire, u32, 4);
wire_numeric!(f32_to_wire, f32_from_wire, f32, 4);
wire_numeric!(f64_to_wire, f64_from_wire, f64, 8);

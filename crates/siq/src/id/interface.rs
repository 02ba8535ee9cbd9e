use core::{fmt, hash::Hash};

/// A trait for types that wrap a primitive scalar identifier.
///
/// Implemented by [`Siq`](crate::Siq) (`u128`) and
/// [`SnowflakeId`](crate::SnowflakeId) (`u64`); shared helpers such as the
/// serde adapters are written against it.
pub trait Id:
    Copy + Clone + fmt::Display + fmt::Debug + PartialOrd + Ord + PartialEq + Eq + Hash
{
    /// Scalar type backing the id.
    type Ty: Copy + fmt::Debug + fmt::Display + Ord + Hash;

    /// Converts this id into its raw representation.
    fn to_raw(&self) -> Self::Ty;

    /// Wraps a raw value without checking reserved bits.
    fn from_raw(raw: Self::Ty) -> Self;

    /// Returns `true` if no reserved or padding bit is set.
    fn is_valid(&self) -> bool;
}

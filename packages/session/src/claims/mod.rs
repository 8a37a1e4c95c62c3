//! Session claims: keyed values with a fetcher, stored as `{v, t}` entries
//!
//! The value shapes are closed: scalar primitives ([`PrimitiveClaim`],
//! [`BooleanClaim`]) and arrays of primitives ([`PrimitiveArrayClaim`]).
//! Each claim kind owns a validator factory producing configured validators.

pub mod base;
pub mod boolean;
pub mod primitive;
pub mod primitive_array;

pub use base::Claim;
pub use boolean::{BooleanClaim, BooleanClaimValidators};
pub use primitive::{HasValueValidator, PrimitiveClaim, PrimitiveClaimValidators};
pub use primitive_array::{
    ArrayValidatorMode, ExpectedValues, PrimitiveArrayClaim, PrimitiveArrayClaimValidators,
    PrimitiveArrayValidator,
};

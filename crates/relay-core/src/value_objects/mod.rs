//! Value objects - immutable types that represent domain concepts

mod phone;
mod snowflake;

pub use phone::normalize_phone_digits;
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};

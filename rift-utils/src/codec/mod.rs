//! Wire codecs shared by packet encoders.

mod var_int;

pub use var_int::VarInt;

//! Physical cell encodings: fixed-width padding ([`pad`]) and CSV quoting ([`quote`]).

pub mod pad;
pub mod quote;

pub use pad::{PadPolicy, Padder};
pub use quote::{QuoteMode, Quoter};

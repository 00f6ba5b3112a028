// Listing title parsing: contract type detection and location extraction.
// Pure functions only; nothing here touches the network.

pub mod contract_type;
pub mod title;

pub use contract_type::ContractType;
pub use title::{parse_title, ParsedTitle};

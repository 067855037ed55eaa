pub mod errors;
pub mod pair;
pub mod provider;

pub use errors::KeyError;
pub use pair::KeyPair;
pub use pair::SigningKeys;
pub use provider::KeyProvider;
pub use provider::KeyStatus;

// file: src/aws/mod.rs
// description: AWS credentials and request signing
// reference: internal module structure

pub mod credentials;
pub mod sigv4;

pub use credentials::CredentialSource;
pub use sigv4::SigningScope;

pub mod jwt;
pub mod role;

pub use jwt::{Claims, JwtVerifier};
pub use role::Role;

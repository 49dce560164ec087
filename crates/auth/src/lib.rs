//! `stockkeep-auth`: authentication and authorization for administrative actions.
//!
//! No storage or front-end dependencies.

pub mod authorize;
pub mod credentials;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use credentials::{
    AuthError, Authenticator, Credentials, DenyAllAuthenticator, PasswordAuthenticator,
    DEFAULT_HASH_COST, hash_password,
};
pub use permissions::Permission;
pub use principal::{Principal, PrincipalId};
pub use roles::Role;

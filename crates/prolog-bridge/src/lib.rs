//! Host-side bridge to the embedded Prolog engine
//!
//! The bridge exposes a dynamically-typed value model ([`HostValue`]) and a
//! [`Session`] that owns one engine instance. Values cross the boundary
//! through a lossy codec: host strings become atoms, atoms come back as
//! strings, unbound variables become null. Queries can be posed either as
//! raw goal text or as a predicate name with encoded arguments; when every
//! argument is a variable name, solutions come back as name to value
//! bindings instead of whole solved goals.
//!
//! All operations fail quietly. A parse error, a missing predicate or an
//! uninitialized session yields false, an empty list or null, with the
//! message retained for [`Session::last_error`].

mod bootstrap;
mod codec;
mod config;
mod error;
mod goal;
mod session;
mod value;

pub use codec::{decode, encode, extract_bindings};
pub use config::{parse_size, Disposition, InitOptions};
pub use error::BridgeError;
pub use goal::{build_query, is_variable_name};
pub use session::Session;
pub use value::{HostValue, Solution};

//! SIP header and method types used by outbound messages
//!
//! Only the headers the shim has to look at are typed; everything else is
//! carried as a name/value pair.

pub mod call_id;
pub mod header;
pub mod header_name;
pub mod method;
pub mod via;

pub use call_id::CallId;
pub use header::Header;
pub use header_name::HeaderName;
pub use method::Method;
pub use via::Via;

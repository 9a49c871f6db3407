//! PLCALL Bind - host/wire value conversion and bind dispatch
//!
//! Sits between the host-side `Value` and the driver-side `WireValue`:
//!
//! - `TypeConverter` - bidirectional value conversion, driven by a
//!   declared `SqlTag` or by a value's runtime shape
//! - `tag_for_data_type` - catalog type name to wire tag
//! - `set_bind` / `get_bind` - typed dispatch onto a `BindTarget`,
//!   one method per wire tag
//! - `HostValue` - fetch result, a plain value or a live cursor handle

mod bind;
mod convert;

pub use bind::{get_bind, set_bind};
pub use convert::{tag_for_data_type, HostValue, TimeZoneMode, TypeConverter};

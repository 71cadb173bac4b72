//! Version-aware client for the PAN-OS and Panorama XML API.
//!
//! PAN-OS exposes its whole configuration as one XML tree addressed by
//! XPath. The same logical object (an address, a security rule, an ethernet
//! interface) has a different XML shape depending on the software release the
//! device runs. This library hides both problems: callers work with one
//! stable value type per kind, and the library picks the right schema era
//! for the connected device on every read and write.
//!
//! # Architecture
//!
//! ## Core
//!
//! - [`xpath`]: XPath construction for every location (vsys, shared,
//!   device group, template, template stack) and tree selection helpers
//! - [`codec`]: the per-kind contract of stable value, path builder and the
//!   version-dispatched normalizer/specifier pair
//! - [`wire`]: shared XML encoding helpers, raw passthrough of unmodeled
//!   subtrees, and response parsing
//! - [`version`]: PAN-OS versions and installed plugin records
//! - [`error`]: the [`PangoError`](error::PangoError) type
//!
//! ## Operations
//!
//! - [`namespace`]: Standard, Importable, Policy, Plugin and Singleton
//!   operation sets, generic over the kind
//! - [`client`]: the transport contract every namespace is written against
//! - [`offline`]: an in-memory device serving a saved configuration
//! - [`ops`]: commit, jobs, locks, licenses, logs, user-ID, registered IPs,
//!   hit counts and audit comments
//!
//! ## Kinds
//!
//! - [`objs`]: addresses, address groups, services, service groups, tags
//! - [`poli`]: security and NAT rules
//! - [`netw`]: interfaces, virtual routers, static routes, zones, ARP,
//!   IKE/IPsec crypto profiles
//! - [`dev`]: general settings, VM information sources, certificates
//! - [`pnrm`]: Panorama device groups, templates, template stacks and the
//!   GCP plugin account
//!
//! ## Utilities
//!
//! - [`settings`]: TOML settings for the command line tool
//!
//! # Example
//!
//! ```
//! use pango::namespace::Standard;
//! use pango::objs::{Address, AddressValue};
//! use pango::offline::OfflineDevice;
//! use pango::version::V9_0;
//! use pango::xpath::ObjectScope;
//!
//! let device = OfflineDevice::new(V9_0);
//! let addresses: Standard<'_, Address> = Standard::new(&device);
//! let web = Address {
//!     name: "web".to_string(),
//!     value: AddressValue::IpNetmask("10.0.0.10/32".to_string()),
//!     ..Address::default()
//! };
//! addresses.set(&ObjectScope::vsys("vsys1"), &[web.clone()]).unwrap();
//! assert_eq!(addresses.get(&ObjectScope::vsys("vsys1"), "web").unwrap(), web);
//! ```

pub mod client;
pub mod codec;
pub mod dev;
pub mod error;
pub mod namespace;
pub mod netw;
pub mod objs;
pub mod offline;
pub mod ops;
pub mod pnrm;
pub mod poli;
pub mod settings;
pub mod version;
pub mod wire;
pub mod xpath;

#[cfg(test)]
mod testing;

//! Network configuration: interfaces, routing, zones and IPsec crypto.
//!
//! Interfaces and virtual routers live in the device-wide network tree and
//! are attached to a vsys separately, so their namespaces are
//! [`Importable`](crate::namespace::Importable).

pub mod arp;
pub mod crypto;
pub mod ethernet;
pub mod ike_crypto;
pub mod ipsec_crypto;
mod l3;
pub mod layer3;
pub mod loopback;
pub mod router;
pub mod static_route;
pub mod tunnel;
pub mod zone;

pub use arp::{Arp, ArpScope};
pub use crypto::EncryptionEra;
pub use ethernet::Ethernet;
pub use ike_crypto::IkeCryptoProfile;
pub use ipsec_crypto::IpsecCryptoProfile;
pub use layer3::{Layer3Subinterface, SubinterfaceScope};
pub use loopback::Loopback;
pub use router::{AdminDistances, VirtualRouter};
pub use static_route::{NextHop, RouterScope, StaticRoute};
pub use tunnel::Tunnel;
pub use zone::Zone;

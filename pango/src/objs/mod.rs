//! Policy objects: addresses, services, their groups and tags.

pub mod address;
pub mod addrgrp;
pub mod srvc;
pub mod srvcgrp;
pub mod tags;

pub use address::{Address, AddressValue};
pub use addrgrp::AddressGroup;
pub use srvc::Service;
pub use srvcgrp::ServiceGroup;
pub use tags::Tag;

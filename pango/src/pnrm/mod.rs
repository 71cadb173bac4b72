//! Panorama-only configuration: device groups, templates, template stacks
//! and plugin-owned objects.
//!
//! These live directly under Panorama's device entry, so their namespaces
//! take `()` as the location.

pub mod device_group;
pub mod gcp_account;
pub mod template;
pub mod template_stack;

pub use device_group::DeviceGroup;
pub use gcp_account::GcpAccount;
pub use template::Template;
pub use template_stack::TemplateStack;

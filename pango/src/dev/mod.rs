//! Device-level configuration: system settings, VM information sources and
//! certificates.

pub mod certificate;
pub mod general;
pub mod vminfosource;

pub use certificate::{export_pem, import_pem, Certificate, CertificateScope, PemImport};
pub use general::General;
pub use vminfosource::{AwsVpc, GoogleCompute, VmInfoSource, VmwareSource};

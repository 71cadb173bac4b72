//! Operational verbs: requests against live device state rather than
//! addressable configuration.

pub mod audit;
pub mod commit;
pub mod hitcount;
pub mod job;
pub mod license;
pub mod lock;
pub mod logs;
pub mod registered_ip;
pub mod userid;

pub use audit::AuditComment;
pub use commit::{commit, commit_and_wait, Commit};
pub use hitcount::HitCount;
pub use job::{show_job, wait_for_job, Job, JobResponse};
pub use license::{licenses, License};
pub use lock::{Lock, LockKind};
pub use logs::LogEntry;
pub use registered_ip::RegisteredIp;
pub use userid::{TimedTag, UserIdMessage};

mod binary;
mod crash_record;
mod host;
mod proxy_supervisor;
mod running_child;
mod supervisor_command;
mod supervisor_state;

pub use binary::{build_arguments, locate_binary};
pub use crash_record::{CrashDecision, CrashRecord};
pub use host::{HostControl, SystemHost, parse_network_services, reset_system_proxies};
pub use proxy_supervisor::ProxySupervisor;
pub use supervisor_state::SupervisorState;

pub(crate) use running_child::RunningChild;
pub(crate) use supervisor_command::SupervisorCommand;

/// Requests from the exit watcher to the supervisor's command handler.
///
/// The watcher runs detached from any caller, so restarts are routed
/// through a channel and executed on the supervisor's control path.
#[derive(Debug)]
pub(crate) enum SupervisorCommand {
    /// Relaunch after the crash of launch `generation`
    Restart { generation: u64, attempt: u32 },
}

//! Translation of raw service-control output into semantic outcomes.
//!
//! One function per operation, each pure over the captured output so
//! the matching can be tested without touching the OS.

use crate::error::LifecycleErrorKind;
use crate::executor::{sanitize_output, ToolOutput};

use super::status::Status;

/// An instance of the service is already running.
pub const ERROR_SERVICE_ALREADY_RUNNING: u32 = 1056;
/// The specified service does not exist as an installed service.
pub const ERROR_SERVICE_DOES_NOT_EXIST: u32 = 1060;
/// The service has not been started.
pub const ERROR_SERVICE_NOT_ACTIVE: u32 = 1062;
/// The specified service has been marked for deletion.
pub const ERROR_SERVICE_MARKED_FOR_DELETE: u32 = 1072;
/// The specified service already exists.
pub const ERROR_SERVICE_EXISTS: u32 = 1073;

const DIAGNOSTIC_MAX_LINES: usize = 8;

/// Extract the failure code from a tool result.
///
/// The `FAILED <code>` marker in the output wins; otherwise a non-zero
/// exit status is taken as the code.
pub fn failure_code(output: &ToolOutput) -> Option<u32> {
    if output.success {
        return None;
    }

    let text = output.combined();
    let marked = text.split("FAILED").skip(1).find_map(|rest| {
        let digits: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse::<u32>().ok()
    });

    marked.or_else(|| {
        output
            .exit_code
            .filter(|code| *code > 0)
            .map(|code| code as u32)
    })
}

/// Sanitized diagnostic text for error messages.
pub fn diagnostic(output: &ToolOutput) -> String {
    let text = sanitize_output(&output.combined(), DIAGNOSTIC_MAX_LINES);
    if text.is_empty() {
        match output.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated without exit code".to_string(),
        }
    } else {
        text
    }
}

/// Map a query result to a status. A failed query means the service
/// is not registered.
pub fn classify_query(output: &ToolOutput) -> Status {
    if !output.success {
        return Status::NotInstalled;
    }

    let Some(value) = field_value(&output.stdout, "STATE") else {
        return Status::Unknown;
    };

    let mut tokens = value.split_whitespace();
    match tokens.next() {
        Some("1") => Status::Stopped,
        Some("2") => Status::StartPending,
        Some("3") => Status::StopPending,
        Some("4") => Status::Running,
        Some(first) => match tokens.next().unwrap_or(first) {
            "STOPPED" => Status::Stopped,
            "START_PENDING" => Status::StartPending,
            "STOP_PENDING" => Status::StopPending,
            "RUNNING" => Status::Running,
            _ => Status::Unknown,
        },
        None => Status::Unknown,
    }
}

/// Process id from an extended query; `None` when absent or zero.
pub fn parse_pid(output: &ToolOutput) -> Option<u32> {
    if !output.success {
        return None;
    }
    field_value(&output.stdout, "PID")
        .and_then(|value| value.split_whitespace().next())
        .and_then(|token| token.parse::<u32>().ok())
        .filter(|pid| *pid > 0)
}

pub fn classify_create(service: &str, output: &ToolOutput) -> Result<(), LifecycleErrorKind> {
    match failure_code(output) {
        None => Ok(()),
        Some(ERROR_SERVICE_EXISTS) => Err(LifecycleErrorKind::Conflict {
            service: service.to_string(),
            output: diagnostic(output),
        }),
        Some(_) => Err(LifecycleErrorKind::Registration {
            output: diagnostic(output),
        }),
    }
}

pub fn classify_start(service: &str, output: &ToolOutput) -> Result<(), LifecycleErrorKind> {
    match failure_code(output) {
        None => Ok(()),
        Some(ERROR_SERVICE_ALREADY_RUNNING) => Err(LifecycleErrorKind::AlreadyRunning {
            service: service.to_string(),
        }),
        Some(ERROR_SERVICE_DOES_NOT_EXIST) => Err(LifecycleErrorKind::NotInstalled {
            service: service.to_string(),
        }),
        Some(_) => Err(LifecycleErrorKind::Start {
            output: diagnostic(output),
        }),
    }
}

pub fn classify_stop(service: &str, output: &ToolOutput) -> Result<(), LifecycleErrorKind> {
    match failure_code(output) {
        None => Ok(()),
        Some(ERROR_SERVICE_NOT_ACTIVE) => Err(LifecycleErrorKind::NotRunning {
            service: service.to_string(),
        }),
        Some(ERROR_SERVICE_DOES_NOT_EXIST) => Err(LifecycleErrorKind::NotInstalled {
            service: service.to_string(),
        }),
        Some(_) => Err(LifecycleErrorKind::Stop {
            output: diagnostic(output),
        }),
    }
}

pub fn classify_delete(service: &str, output: &ToolOutput) -> Result<(), LifecycleErrorKind> {
    match failure_code(output) {
        None => Ok(()),
        Some(ERROR_SERVICE_DOES_NOT_EXIST) => Err(LifecycleErrorKind::NotInstalled {
            service: service.to_string(),
        }),
        Some(ERROR_SERVICE_MARKED_FOR_DELETE) => Err(LifecycleErrorKind::PendingDeletion {
            service: service.to_string(),
        }),
        Some(_) => Err(LifecycleErrorKind::Deregistration {
            output: diagnostic(output),
        }),
    }
}

/// Value of a `NAME : value` line.
fn field_value<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == name).then(|| value.trim())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY_RUNNING: &str = "\r\nSERVICE_NAME: R2k_BasculaServicio_Local \r\n        TYPE               : 10  WIN32_OWN_PROCESS  \r\n        STATE              : 4  RUNNING \r\n                                (STOPPABLE, NOT_PAUSABLE, ACCEPTS_SHUTDOWN)\r\n        WIN32_EXIT_CODE    : 0  (0x0)\r\n";

    #[test]
    fn test_query_states() {
        assert_eq!(classify_query(&ToolOutput::ok(QUERY_RUNNING)), Status::Running);
        assert_eq!(
            classify_query(&ToolOutput::ok("STATE : 1  STOPPED")),
            Status::Stopped
        );
        assert_eq!(
            classify_query(&ToolOutput::ok("STATE : 2  START_PENDING")),
            Status::StartPending
        );
        assert_eq!(
            classify_query(&ToolOutput::ok("STATE : 3  STOP_PENDING")),
            Status::StopPending
        );
        assert_eq!(
            classify_query(&ToolOutput::ok("STATE : 7  PAUSED")),
            Status::Unknown
        );
        assert_eq!(classify_query(&ToolOutput::ok("garbage")), Status::Unknown);
    }

    #[test]
    fn test_query_state_name_fallback() {
        assert_eq!(
            classify_query(&ToolOutput::ok("STATE : x STOP_PENDING")),
            Status::StopPending
        );
    }

    #[test]
    fn test_failed_query_is_not_installed() {
        let output = ToolOutput::failed(
            1060,
            "[SC] EnumQueryServicesStatus:OpenService FAILED 1060:\n\nThe specified service does not exist as an installed service.",
        );
        assert_eq!(classify_query(&output), Status::NotInstalled);
    }

    #[test]
    fn test_failure_code_from_marker_or_exit_status() {
        let marked = ToolOutput::failed(1, "[SC] StartService FAILED 1056:\n\nAn instance of the service is already running.");
        assert_eq!(failure_code(&marked), Some(1056));

        let bare = ToolOutput::failed(1062, "");
        assert_eq!(failure_code(&bare), Some(1062));

        assert_eq!(failure_code(&ToolOutput::ok("[SC] StartService SUCCESS")), None);
    }

    #[test]
    fn test_parse_pid() {
        assert_eq!(
            parse_pid(&ToolOutput::ok("STATE : 3  STOP_PENDING\n        PID                : 4242\n")),
            Some(4242)
        );
        assert_eq!(parse_pid(&ToolOutput::ok("PID : 0")), None);
        assert_eq!(parse_pid(&ToolOutput::failed(1060, "PID : 12")), None);
    }

    #[test]
    fn test_classify_start() {
        assert!(classify_start("svc", &ToolOutput::ok("")).is_ok());
        assert!(matches!(
            classify_start("svc", &ToolOutput::failed(1056, "FAILED 1056:")),
            Err(LifecycleErrorKind::AlreadyRunning { .. })
        ));
        assert!(matches!(
            classify_start("svc", &ToolOutput::failed(1060, "FAILED 1060:")),
            Err(LifecycleErrorKind::NotInstalled { .. })
        ));
        match classify_start("svc", &ToolOutput::failed(1053, "[SC] StartService FAILED 1053:\n\nThe service did not respond.")) {
            Err(LifecycleErrorKind::Start { output }) => assert!(output.contains("1053")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_classify_stop() {
        assert!(matches!(
            classify_stop("svc", &ToolOutput::failed(1062, "[SC] ControlService FAILED 1062:")),
            Err(LifecycleErrorKind::NotRunning { .. })
        ));
        assert!(matches!(
            classify_stop("svc", &ToolOutput::failed(1061, "[SC] ControlService FAILED 1061:")),
            Err(LifecycleErrorKind::Stop { .. })
        ));
    }

    #[test]
    fn test_classify_create() {
        assert!(matches!(
            classify_create("svc", &ToolOutput::failed(1073, "[SC] CreateService FAILED 1073:")),
            Err(LifecycleErrorKind::Conflict { .. })
        ));
        assert!(matches!(
            classify_create("svc", &ToolOutput::failed(5, "[SC] OpenSCManager FAILED 5:\n\nAccess is denied.")),
            Err(LifecycleErrorKind::Registration { .. })
        ));
    }

    #[test]
    fn test_classify_delete() {
        assert!(classify_delete("svc", &ToolOutput::ok("[SC] DeleteService SUCCESS")).is_ok());
        assert!(matches!(
            classify_delete("svc", &ToolOutput::failed(1060, "FAILED 1060:")),
            Err(LifecycleErrorKind::NotInstalled { .. })
        ));
        assert!(matches!(
            classify_delete("svc", &ToolOutput::failed(1072, "FAILED 1072:")),
            Err(LifecycleErrorKind::PendingDeletion { .. })
        ));
        assert!(matches!(
            classify_delete("svc", &ToolOutput::failed(1, "boom")),
            Err(LifecycleErrorKind::Deregistration { .. })
        ));
    }

    #[test]
    fn test_diagnostic_falls_back_to_exit_code() {
        assert_eq!(diagnostic(&ToolOutput::failed(87, "")), "exit code 87");
    }
}

//! git-dispatch entry point.

use std::ffi::OsString;
use std::process::ExitCode;

use git_dispatch::dispatch::{Dispatcher, Host, Invocation, SystemHost, NO_DEFAULTS_FLAG};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "GIT_DISPATCH_LOG";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so the backend's stdout is untouched. The filter comes
/// from `GIT_DISPATCH_LOG`; the default only shows warnings.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("git_dispatch=warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let raw: Vec<OsString> = std::env::args_os().skip(1).collect();
    let host = SystemHost::from_env();

    tracing::debug!("git-dispatch starting with args: {:?}", raw);

    let parsed: Result<Vec<String>, _> = raw.iter().map(|a| a.clone().into_string()).collect();

    let invocation = match parsed {
        Ok(argv) => match Dispatcher::new(&host).plan(&argv) {
            Ok(invocation) => invocation,
            Err(e) => {
                eprintln!("git-dispatch: {}", e);
                return ExitCode::from(1);
            }
        },
        // Arguments that are not valid UTF-8 cannot be matched; hand them
        // to the backend untouched apart from our own control flag.
        Err(_) => Invocation::new(host.primary(), without_control_flag(raw)),
    };

    let err = invocation.exec();
    eprintln!("git-dispatch: {}", err);
    ExitCode::from(1)
}

/// `raw` minus a leading `--nodefaults`, which is never passed on.
fn without_control_flag(mut raw: Vec<OsString>) -> Vec<OsString> {
    if raw.first().is_some_and(|first| first == NO_DEFAULTS_FLAG) {
        raw.remove(0);
    }
    raw
}

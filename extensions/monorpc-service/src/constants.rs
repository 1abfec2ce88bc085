use std::time::Duration;

pub use monorpc::constants::DEFAULT_MAX_FRAME_SIZE;

/// Hosts listen on the loopback interface unless told otherwise.
pub const DEFAULT_BIND_HOST: &str = "127.0.0.1";

/// How long a keep-alive connection may sit between requests before the host
/// closes it.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// How long `stop` waits for connections that are mid-dispatch before
/// aborting them.
pub const DEFAULT_SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause after a failed `accept`, so resource exhaustion (e.g. `EMFILE`)
/// does not turn the accept loop into a busy spin.
pub const DEFAULT_ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

use std::fs::File;
use std::io;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Return true for transient/retriable I/O errors often seen on Windows when
/// filter drivers (AV/backup), USB/NAS volumes, or sharing violations occur.
fn is_retriable_io_error(e: &io::Error) -> bool {
    match e.raw_os_error() {
        // Common Windows transient codes:
        //   5   = Access is denied (often AV/share)
        //   32  = Sharing violation
        //   33  = Lock violation
        //   225 = AV/PUA blocked file
        //   433 = A device which does not exist was specified
        //   1006= Volume externally altered; handle invalid
        //   1117= I/O device error
        //   1224= The requested operation cannot be performed on a file with a user-mapped section open
        //   21  = Device not ready
        Some(5) | Some(32) | Some(33) | Some(225) | Some(433) | Some(1006) | Some(1117)
        | Some(1224) | Some(21) => true,
        _ => false,
    }
}

/// Open a file with retries/backoff for transient errors.
pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    let mut last_err: Option<io::Error> = None;
    let tries = tries.max(1);
    for i in 0..tries {
        match File::open(path) {
            Ok(f) => return Ok(f),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
                continue;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "open failed")))
}

/// Create a file with retries/backoff for transient errors.
pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    let mut last_err: Option<io::Error> = None;
    let tries = tries.max(1);
    for i in 0..tries {
        match File::create(path) {
            Ok(f) => return Ok(f),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
                continue;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "create failed")))
}

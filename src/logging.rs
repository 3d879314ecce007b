//! Global subscriber set-up. Installed before the configuration is read so
//! events from config loading reach the output; the configured level is
//! applied afterwards through a reload handle.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber. `RUST_LOG` wins, otherwise `info`.
pub fn init() -> FilterHandle {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    handle
}

/// Switch to `server.log_level`, unless `RUST_LOG` was given
pub fn apply_level(handle: &FilterHandle, configured: &str) -> Result<()> {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return Ok(());
    }
    reload_level(handle, configured)
}

fn reload_level(handle: &FilterHandle, level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)?;
    handle.reload(filter)?;
    Ok(())
}

/// In-memory writer for asserting on log output
#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    pub(crate) struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

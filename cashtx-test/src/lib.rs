//! Shared test bootstrap.
//!
//! Tests call [`init`] first so that failures carry spantraces and panic
//! reports are readable. Installing the subscriber twice would panic, so
//! the setup runs behind a `lazy_static` guard.

use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

lazy_static::lazy_static! {
    static ref INSTALLED: () = {
        tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer())
            .with(EnvFilter::from_default_env())
            .with(ErrorLayer::default())
            .init();

        color_eyre::install().expect("color_eyre installs only once");
    };
}

/// Initialize per-process test state. Idempotent.
pub fn init() {
    lazy_static::initialize(&INSTALLED);
}

#![allow(dead_code)]

pub mod etag_server;

use std::sync::OnceLock;

use cget_core::Global;

/// One transfer-library guard shared by every test in the binary.
pub fn global() -> &'static Global {
    static GLOBAL: OnceLock<Global> = OnceLock::new();
    GLOBAL.get_or_init(|| Global::init().expect("global init"))
}

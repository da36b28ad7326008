//! Shared components. `pico` holds the presentation primitives, `qr_scanner`
//! the scanner widget built on them.
pub mod pico;
pub mod qr_scanner;

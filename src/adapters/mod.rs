//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements            | Connects to                |
//! |-------------|-----------------------|----------------------------|
//! | `entities`  | TextOutput, ModeSelect| Serial log / memory        |
//! | `log_sink`  | EventSink             | Serial log output          |
//! | `time`      | Clock                 | ESP32 high-res timer       |

pub mod entities;
pub mod log_sink;
pub mod time;

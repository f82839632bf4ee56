//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter       | Implements   | Connects to                       |
//! |---------------|--------------|-----------------------------------|
//! | `clock`       | ClockSync    | System wall clock (SNTP / OS)     |
//! | `fs`          | FileStore    | Directory (host), NVS (ESP-IDF)   |
//! | `local_sync`  | PropSync     | JSON document in the file store   |
//! | `log_sink`    | (subscriber) | stderr via tracing (host)         |
//! | `net`         | Transport    | Nothing (offline)                 |
//! |               | WifiControl  |                                   |
//! | `sleep`       | SleepClock   | Uptime timer, deep sleep, console |
//! | `wifi`        | WifiControl  | ESP-IDF Wi-Fi STA                 |

pub mod clock;
pub mod fs;
pub mod local_sync;
#[cfg(not(target_os = "espidf"))]
pub mod log_sink;
pub mod net;
pub mod sleep;
pub mod wifi;

pub use net::{NullTransport, NullWifi};

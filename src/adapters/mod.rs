//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements          | Connects to                 |
//! |----------------|---------------------|-----------------------------|
//! | `log_sink`     | EventSink           | Serial log output           |
//! | `mdns`         | NameAdvertiser      | ESP-IDF mDNS component      |
//! | `nvs`          | KeyValueStore       | NVS / in-memory store       |
//! | `portal`       | ProvisioningPortal  | `EspHttpServer`, POST /config |
//! | `reset_input`  | ResetInput          | GPIO0, falling-edge ISR     |
//! | `sntp`         | TimeSyncPort        | LwIP SNTP client            |
//! | `system`       | SystemPort          | heap caps, `esp_restart`    |
//! | `thing_server` | ThingServerPort     | Thing server handoff        |
//! | `time`         | ClockPort           | libc TZ / localtime         |
//! | `wifi`         | RadioPort           | ESP-IDF WiFi STA / AP       |
//! |                | (link events)       | WIFI_EVENT / IP_EVENT loop  |

pub mod log_sink;
pub mod mdns;
pub mod nvs;
pub mod portal;
pub mod reset_input;
pub mod sntp;
pub mod system;
pub mod thing_server;
pub mod time;
pub mod wifi;

//! Local wall-clock adapter.
//!
//! - **`target_os = "espidf"`**: `TZ` + `tzset()` for the zone,
//!   `gettimeofday()` + `localtime_r()` for the timestamp.
//! - **all other targets**: the zone is only recorded; the timestamp is
//!   derived from uptime so log lines still advance.

use log::info;

use crate::app::ports::ClockPort;

/// Render broken-down time as `YYYY/MM/DD HH:MM:SS`.
pub fn format_timestamp(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> String {
    format!(
        "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
        year, month, day, hour, min, sec
    )
}

pub struct ClockAdapter {
    timezone: Option<String>,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for ClockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockAdapter {
    pub fn new() -> Self {
        Self {
            timezone: None,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }
}

#[cfg(target_os = "espidf")]
impl ClockPort for ClockAdapter {
    fn set_timezone(&mut self, tz: &str) {
        // SAFETY: called from the liveness task before any other thread
        // reads the environment.
        unsafe {
            std::env::set_var("TZ", tz);
            esp_idf_svc::sys::tzset();
        }
        info!("Clock: timezone {}", tz);
        self.timezone = Some(tz.into());
    }

    fn local_timestamp(&self) -> String {
        use esp_idf_svc::sys::{gettimeofday, localtime_r, time_t, timeval, tm};

        let mut tv = timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return format_timestamp(1970, 1, 1, 0, 0, 0);
        }
        let secs = tv.tv_sec as time_t;
        let mut t: tm = unsafe { core::mem::zeroed() };
        if unsafe { localtime_r(&secs, &mut t) }.is_null() {
            return format_timestamp(1970, 1, 1, 0, 0, 0);
        }
        format_timestamp(
            t.tm_year + 1900,
            (t.tm_mon + 1) as u32,
            t.tm_mday as u32,
            t.tm_hour as u32,
            t.tm_min as u32,
            t.tm_sec as u32,
        )
    }
}

#[cfg(not(target_os = "espidf"))]
impl ClockPort for ClockAdapter {
    fn set_timezone(&mut self, tz: &str) {
        info!("Clock(sim): timezone {}", tz);
        self.timezone = Some(tz.into());
    }

    /// Uptime rendered from the epoch, e.g. `1970/01/01 00:00:05`.
    fn local_timestamp(&self) -> String {
        let up = self.start.elapsed().as_secs();
        let days = (up / 86_400) as u32;
        let rem = (up % 86_400) as u32;
        format_timestamp(1970, 1, 1 + days.min(30), rem / 3600, (rem / 60) % 60, rem % 60)
    }
}

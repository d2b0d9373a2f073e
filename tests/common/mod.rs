//! Shared crash log fixtures.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use crashgroup::parser::CrashSubmission;

pub const BUNDLE: &str = "com.foo.MyApp";
pub const APP: &str = "MyApp";

/// A PLCrashReporter style log crashing on the main queue in `frame`
pub fn main_queue_log(frame: &str) -> String {
    format!(
        "Incident Identifier: 6F1A2B3C-0000-4D3E-9F00-112233445566
Hardware Model:      iPhone15,2
Process:         MyApp [1234]
Identifier:      com.foo.MyApp
Version:         1.0 (42)

Exception Type:  EXC_CRASH (SIGABRT)
Exception Codes: 0x00000000, 0x00000000
Crashed Thread:  0

Application Specific Information:
*** Terminating app due to uncaught exception 'NSRangeException', reason: 'index 3 beyond bounds [0 .. 2]'

Thread 0 Crashed:  Dispatch queue: com.apple.main-thread
0   CoreFoundation      0x30d2ae6f __exceptionPreprocess + 118
1   libobjc.A.dylib     0x3302ef7e objc_exception_throw + 22
2   MyApp               0x000a1b2c uncaught_exception_handler (PLCrashReporter.m:137)
{frame}
4   UIKit               0x31e6c8ab -[UIApplication sendAction:to:from:forEvent:] + 62
5   MyApp               0x00002b8e main (main.m:14)

Thread 1:
0   libsystem_kernel.dylib  0x34a1c004 kevent + 24
1   MyApp               0x00011111 -[Worker run] (Worker.m:9)

Binary Images:
0x1000 - 0x5ffff +MyApp armv7 <a1b2c3> /var/mobile/Applications/MyApp.app/MyApp
"
    )
}

pub fn submission(version: &str, log_text: String) -> CrashSubmission {
    CrashSubmission {
        bundle_identifier: BUNDLE.to_string(),
        application_name: APP.to_string(),
        affected_version: version.to_string(),
        system_version: "17.2".to_string(),
        platform: "iPhone15,2".to_string(),
        log_text,
        timestamp: at(12),
    }
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
}

pub const READER_FRAME: &str =
    "3   MyApp               0x00036e51 -[LiveUpdateReader databaseActions:] (LiveUpdateReader.m:62)";
pub const READER_PATTERN: &str = "[LiveUpdateReader databaseActions:] (LiveUpdateReader.m:62)";

pub const CACHE_FRAME: &str = "3   MyApp               0x00041a20 +[ImageCache purge] (ImageCache.m:88)";
pub const CACHE_PATTERN: &str = "[ImageCache purge] (ImageCache.m:88)";

/// An app frame without symbols
pub const RAW_FRAME: &str = "3   MyApp               0x00036e51 0x1000 + 224849";

// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/utils/format.rs
// Version: 1.1.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file provides utility functions for formatting statistics in the solo
// pool, located in the utils subdirectory. It formats hashrate, difficulty,
// durations and counters for consistent output in logs.
//
// Tree Location:
// - src/utils/format.rs (formatting utilities)
// - Depends on: std

use std::time::Duration;

const HASHRATE_UNITS: [(f64, &str); 6] = [
    (1e18, "EH/s"),
    (1e15, "PH/s"),
    (1e12, "TH/s"),
    (1e9, "GH/s"),
    (1e6, "MH/s"),
    (1e3, "KH/s"),
];

const DIFFICULTY_UNITS: [(f64, &str); 5] = [
    (1e15, "P"),
    (1e12, "T"),
    (1e9, "G"),
    (1e6, "M"),
    (1e3, "K"),
];

/// Utility functions for formatting pool statistics
pub struct FormatUtils;

impl FormatUtils {
    /// Format hashrate in appropriate units (H/s up to EH/s)
    pub fn format_hashrate(hashrate: f64) -> String {
        for (scale, unit) in HASHRATE_UNITS {
            if hashrate >= scale {
                return format!("{:.2} {}", hashrate / scale, unit);
            }
        }
        format!("{:.2} H/s", hashrate)
    }

    /// Format a share or network difficulty with a K/M/G/T/P suffix.
    /// Sub-unit difficulties keep enough precision to stay readable.
    pub fn format_difficulty(difficulty: f64) -> String {
        for (scale, unit) in DIFFICULTY_UNITS {
            if difficulty >= scale {
                return format!("{:.2}{}", difficulty / scale, unit);
            }
        }
        if difficulty >= 1.0 || difficulty == 0.0 {
            format!("{:.2}", difficulty)
        } else {
            format!("{:.6}", difficulty)
        }
    }

    /// Format elapsed time since an event (seconds, minutes, hours)
    pub fn format_duration(duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{}s ago", secs)
        } else if secs < 3600 {
            format!("{}m ago", secs / 60)
        } else {
            format!("{}h ago", secs / 3600)
        }
    }

    /// Format process uptime as `HH:MM:SS`, prefixed with days once past 24h
    pub fn format_uptime(duration: Duration) -> String {
        let secs = duration.as_secs();
        let (days, rem) = (secs / 86_400, secs % 86_400);
        let clock = format!("{:02}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);
        if days > 0 {
            format!("{}d {}", days, clock)
        } else {
            clock
        }
    }

    /// Format large numbers with suffixes (K, M, B)
    pub fn format_number(num: u64) -> String {
        if num >= 1_000_000_000 {
            format!("{:.1}B", num as f64 / 1_000_000_000.0)
        } else if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }
}


// Changelog:
// - v1.1.0 (2026-10-17): Pool-scale units.
//   - Hashrate up to EH/s, difficulty suffixes, uptime clock.
// - v1.0.0 (2025-06-14): Extracted from monolithic main.rs.

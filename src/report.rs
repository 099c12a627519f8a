//! Console output. Nothing outside this module formats text for the user.

use crate::model::{DiffResult, Identifier, Profile, UserRecord};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::collections::HashMap;
use std::fmt::{Display, Write};

pub const TIMESTAMP_FORMAT: &str = "%-I:%M%P, %m/%d/%Y";

/// Everything a reconciliation run found
#[derive(Debug, Clone)]
pub struct ForensicsReport {
    /// `None` when Twitter rate limited the fetch
    pub total_followers: Option<usize>,
    pub diff: DiffResult,
    /// Profiles for every id in `diff`
    pub fresh: HashMap<Identifier, Profile>,
    pub recent_followers: Vec<UserRecord>,
    pub recent_unfollowers: Vec<UserRecord>,
    pub checked_at: DateTime<Utc>,
}

pub trait Reporter {
    fn forensics(&self, report: &ForensicsReport);

    fn must_wait(&self, minutes: i64);

    fn non_mutuals(&self, profiles: &[Profile]);
}

/// Prints reports to stdout, times shown in the local timezone
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn forensics(&self, report: &ForensicsReport) {
        print!("{}", render_forensics(report, &Local));
    }

    fn must_wait(&self, minutes: i64) {
        println!("you must wait {} more minutes", minutes);
    }

    fn non_mutuals(&self, profiles: &[Profile]) {
        print!("{}", render_non_mutuals(profiles));
    }
}

pub fn format_timestamp<Tz>(instant: DateTime<Utc>, tz: &Tz, format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format(format).to_string()
}

fn describe(profile: &Profile) -> String {
    format!("{} @{}", profile.name, profile.handle)
}

fn render_section<Tz>(
    out: &mut String,
    title: &str,
    marker: char,
    ids: &[Identifier],
    report: &ForensicsReport,
    recent: &[UserRecord],
    tz: &Tz,
) where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let checked_at = format_timestamp(report.checked_at, tz, TIMESTAMP_FORMAT);
    writeln!(out, "{}", title).ok();
    for id in ids {
        let profile = report
            .fresh
            .get(id)
            .cloned()
            .unwrap_or_else(Profile::unknown);
        writeln!(out, " {} {} | {}", marker, describe(&profile), checked_at).ok();
    }
    for record in recent {
        writeln!(
            out,
            "    {} @{} | {}",
            record.name,
            record.handle,
            format_timestamp(record.last_seen, tz, TIMESTAMP_FORMAT)
        )
        .ok();
    }
    if ids.is_empty() && recent.is_empty() {
        writeln!(out, "          Nobody recently").ok();
    }
}

pub fn render_forensics<Tz>(report: &ForensicsReport, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    writeln!(out, "\nTwitter Follower Forensics").ok();
    writeln!(out, "Total Followers").ok();
    match report.total_followers {
        None => writeln!(out, "   (request limit hit, cooling down)").ok(),
        Some(total) => {
            let delta = match report.diff.delta() {
                d if d > 0 => format!(" +{}", d),
                d if d < 0 => format!(" {}", d),
                _ => String::new(),
            };
            writeln!(out, "    {}{}", total, delta).ok()
        }
    };
    writeln!(out).ok();
    render_section(
        &mut out,
        "Recent Followers",
        '+',
        &report.diff.gained,
        report,
        &report.recent_followers,
        tz,
    );
    writeln!(out).ok();
    render_section(
        &mut out,
        "Recent Unfollowers",
        '-',
        &report.diff.lost,
        report,
        &report.recent_unfollowers,
        tz,
    );
    out
}

pub fn render_non_mutuals(profiles: &[Profile]) -> String {
    let mut out = String::new();
    writeln!(out, "\nNot Following Back").ok();
    for profile in profiles {
        writeln!(out, "    {}", describe(profile)).ok();
    }
    if profiles.is_empty() {
        writeln!(out, "          Nobody").ok();
    }
    out
}

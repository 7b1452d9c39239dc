//! Line-oriented statistics report
//!
//! For every statistic, in report order:
//!
//! ```text
//! <name>.n <int>
//! <name>.max <int>
//! <name>.sum <int>
//! <name>.mean <float>
//! <name>.histogram <lower> <upper> <count>    (one per non-empty bucket)
//! ```
//!
//! The mean always carries a fractional part (`2.0`, not `2`); an empty
//! statistic prints `NaN`.

use crate::stats::StatisticsSnapshot;
use std::io::{self, Write};

/// Write the summary lines of a single statistic
pub fn write_statistic<W: Write>(
    out: &mut W,
    name: &str,
    snapshot: &StatisticsSnapshot,
) -> io::Result<()> {
    writeln!(out, "{}.n {}", name, snapshot.n)?;
    writeln!(out, "{}.max {}", name, snapshot.max)?;
    writeln!(out, "{}.sum {}", name, snapshot.sum)?;
    writeln!(out, "{}.mean {:?}", name, snapshot.mean())?;
    for bucket in &snapshot.buckets {
        writeln!(
            out,
            "{}.histogram {} {} {}",
            name, bucket.lower, bucket.upper, bucket.count
        )?;
    }
    Ok(())
}

/// Write the full report
pub fn write_report<W: Write>(
    out: &mut W,
    statistics: &[(&'static str, StatisticsSnapshot)],
) -> io::Result<()> {
    for (name, snapshot) in statistics {
        write_statistic(out, name, snapshot)?;
    }
    Ok(())
}

/// Render the full report into a string
pub fn render_report(statistics: &[(&'static str, StatisticsSnapshot)]) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_report(&mut out, statistics);
    String::from_utf8_lossy(&out).into_owned()
}

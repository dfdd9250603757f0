//! Report formatting for finished ingestion runs

use crate::ingest::IngestReport;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print the report to stdout in human-readable form
pub fn print_report(report: &IngestReport) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_report(&mut stdout, report)
}

/// Print the report to stdout as pretty JSON
pub fn print_report_json(report: &IngestReport) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, report)?;
    writeln!(stdout)
}

/// Render the report into any color-capable writer
pub fn write_report<W: WriteColor>(out: &mut W, report: &IngestReport) -> io::Result<()> {
    heading(out, "Ingest")?;
    writeln!(out, "  Path:      {}", report.root.display())?;
    writeln!(out, "  Strategy:  {} (steal: {})", report.strategy, report.steal_policy)?;
    writeln!(
        out,
        "  Topology:  {} node(s), {} tokenizer thread(s)",
        report.node_count, report.num_threads
    )?;
    writeln!(
        out,
        "  Files:     {} crawled ({}), {} loaded, {} skipped, {} failed",
        report.files_crawled,
        format_bytes(report.dataset_bytes),
        report.files_loaded,
        report.files_skipped,
        report.files_failed
    )?;
    writeln!(out, "  Load time: {:.4} seconds", report.load_time.as_secs_f64())?;
    writeln!(out)?;

    heading(out, "Tokenizer threads")?;
    for t in &report.threads {
        writeln!(
            out,
            "  Thread {} (node {}) tokenization time: {:.4} seconds",
            t.thread_id,
            t.node,
            t.tokenization_time.as_secs_f64()
        )?;
        write!(out, "  Thread {} processed {} bytes", t.thread_id, t.bytes_processed)?;
        if t.files_stolen > 0 {
            write!(out, " ({} file(s) stolen)", t.files_stolen)?;
        }
        writeln!(out)?;
    }
    if let Some(slowest) = report.slowest_thread() {
        writeln!(
            out,
            "  Thread {} took the longest time for tokenization: {:.4} seconds",
            slowest.thread_id,
            slowest.tokenization_time.as_secs_f64()
        )?;
    }
    writeln!(out)?;

    heading(out, "Totals")?;
    writeln!(
        out,
        "  Total execution time (create and join threads): {:.4} seconds",
        report.tokenize_time.as_secs_f64()
    )?;
    writeln!(out, "  Completed indexing {} bytes of data", report.total_bytes)?;
    writeln!(out, "  Completed indexing {} tokens", report.total_tokens)?;
    writeln!(out, "  Average Throughput: {:.4} MiB/s", report.throughput_mib_s)?;

    if report.files_unprocessed > 0 {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        writeln!(
            out,
            "  {} buffer(s) were not tokenized (no thread served their node)",
            report.files_unprocessed
        )?;
        out.reset()?;
    }

    Ok(())
}

fn heading<W: WriteColor>(out: &mut W, title: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    writeln!(out, "{}", title)?;
    out.reset()
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

use std::collections::HashSet;
use std::io::{self, Write};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::filter::fields;
use crate::models::packet::{LoadedRecord, PacketRecordDetail};
use crate::store::{PacketStore, RecordRef};
use crate::view::PacketView;

const INFO_WIDTH: usize = 60;

fn endpoint(address: Option<&str>, port: Option<u16>) -> String {
    match (address, port) {
        (Some(address), Some(port)) => format!("{}:{}", address, port),
        (Some(address), None) => address.to_string(),
        (None, _) => "-".to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    }
}

/// One table row, without color
pub fn format_row(loaded: &LoadedRecord, marked: bool) -> String {
    format!(
        "{} {:>6} {:>10.6} {:<22} {:<22} {:<8} {:>6} {}",
        if marked { '*' } else { ' ' },
        loaded.sequence_number,
        loaded.relative_time,
        endpoint(loaded.source_address.as_deref(), loaded.source_port),
        endpoint(loaded.destination_address.as_deref(), loaded.destination_port),
        loaded.protocol_tag,
        loaded.byte_length,
        truncate(&loaded.summary_info, INFO_WIDTH)
    )
}

fn header() -> String {
    format!(
        "  {:>6} {:>10} {:<22} {:<22} {:<8} {:>6} {}",
        "No.", "Time", "Source", "Destination", "Protocol", "Length", "Info"
    )
}

/// Print `rows` as a packet table; search matches and marks are highlighted
pub fn print_rows<W: WriteColor>(
    out: &mut W,
    store: &PacketStore,
    rows: &[RecordRef],
    view: &PacketView,
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "{}", header())?;
    out.reset()?;

    // Rows need not be the display order (e.g. a followed stream)
    let matches: HashSet<RecordRef> = view.search_matches().into_iter().collect();
    let current = view.current_match();
    for &index in rows {
        let Some(loaded) = store.record_at(index) else {
            continue;
        };
        let marked = view.marks().is_marked(loaded.sequence_number);

        let mut spec = ColorSpec::new();
        if matches.contains(&index) {
            spec.set_fg(Some(Color::Yellow));
            if current == Some(index) {
                spec.set_bold(true);
            }
        } else if marked {
            spec.set_fg(Some(Color::Cyan));
        }

        out.set_color(&spec)?;
        write!(out, "{}", format_row(loaded, marked))?;
        out.reset()?;
        writeln!(out)?;
    }

    Ok(())
}

/// Print the view's display order plus a status line
pub fn print_view<W: WriteColor>(
    out: &mut W,
    store: &PacketStore,
    view: &PacketView,
) -> io::Result<()> {
    print_rows(out, store, view.display(), view)?;
    print_status(out, store, view)
}

pub fn print_status<W: WriteColor>(
    out: &mut W,
    store: &PacketStore,
    view: &PacketView,
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(
        out,
        "Displayed: {} of {} loaded ({} in capture)",
        view.display().len(),
        store.loaded_count(),
        store.total_count()
    )?;
    if !view.filter().is_match_all() {
        write!(out, " | Filter: {}", view.filter_text().trim())?;
    }
    if !view.search().term().is_empty() {
        write!(
            out,
            " | Search '{}': {} matches",
            view.search().term(),
            view.search().len()
        )?;
    }
    if !view.marks().is_empty() {
        write!(out, " | Marked: {}", view.marks().len())?;
    }
    out.reset()?;
    writeln!(out)
}

/// Pretty-print the detail of one record
pub fn print_detail<W: WriteColor>(out: &mut W, detail: &PacketRecordDetail) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(
        out,
        "Packet {} ({} bytes, {})",
        detail.record.sequence_number, detail.record.byte_length, detail.record.protocol_tag
    )?;
    out.reset()?;

    let layers = serde_json::to_string_pretty(&detail.layers)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(out, "{}", layers)
}

/// Print the registered filter fields with their descriptions
pub fn print_fields<W: WriteColor>(out: &mut W) -> io::Result<()> {
    for def in fields::registered() {
        out.set_color(ColorSpec::new().set_bold(true))?;
        write!(out, "{:<10}", def.name)?;
        out.reset()?;
        writeln!(out, " {}", def.description)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::packet::fixtures::{page, record, tcp, udp};
    use termcolor::Buffer;

    fn store() -> PacketStore {
        let mut store = PacketStore::new("cap", 10);
        store.reset(page(
            vec![
                tcp(1, "10.0.0.5", 50100, "93.184.216.34", 443),
                udp(2, "10.0.0.5", 53001, "8.8.8.8", 53),
                record(3, None, None, "ARP", "Who has 10.0.0.1?"),
            ],
            5,
        ));
        store
    }

    #[test]
    fn test_row_formatting() {
        let store = store();
        let row = format_row(store.record_at(2).unwrap(), true);
        assert!(row.starts_with('*'));
        assert!(row.contains(" - "));
        assert!(row.contains("ARP"));

        let row = format_row(store.record_at(0).unwrap(), false);
        assert!(row.contains("10.0.0.5:50100"));
        assert!(row.contains("93.184.216.34:443"));
    }

    #[test]
    fn test_long_info_is_truncated() {
        let long = "x".repeat(100);
        let cut = truncate(&long, INFO_WIDTH);
        assert_eq!(cut.chars().count(), INFO_WIDTH);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_followed_stream_highlights_matching_records_only() {
        let mut store = PacketStore::new("cap", 10);
        store.reset(page(
            vec![
                udp(1, "10.0.0.5", 53001, "8.8.8.8", 53),
                tcp(2, "10.0.0.5", 50100, "93.184.216.34", 443),
                tcp(3, "93.184.216.34", 443, "10.0.0.5", 50100),
            ],
            3,
        ));
        let mut view = PacketView::new();
        view.sync(&store);
        view.set_search(&store, "udp");
        assert_eq!(view.search().positions(), &[0]);

        let stream = view.follow(&store, 1);
        assert_eq!(stream, vec![1, 2]);

        let mut out = Buffer::ansi();
        print_rows(&mut out, &store, &stream, &view).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(!text.contains("\x1b[33m"), "stream rows highlighted: {:?}", text);

        let mut out = Buffer::ansi();
        print_rows(&mut out, &store, view.display(), &view).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        let first_row = text.lines().nth(1).unwrap_or_default();
        assert!(first_row.contains("\x1b[33m"));
        assert!(first_row.contains("UDP"));
    }

    #[test]
    fn test_print_fields() {
        let mut out = Buffer::no_color();
        print_fields(&mut out).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("ip.addr "));
        assert!(lines[0].ends_with("Source or destination address"));
        assert!(lines[4].starts_with("udp.port"));
    }

    #[test]
    fn test_status_shows_only_active_filter() {
        let store = store();
        let mut view = PacketView::new();
        view.set_filter(&store, "   ").unwrap();

        let mut out = Buffer::no_color();
        print_status(&mut out, &store, &view).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(!text.contains("Filter:"));

        view.set_filter(&store, " arp ").unwrap();
        let mut out = Buffer::no_color();
        print_status(&mut out, &store, &view).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("Displayed: 1 of 3 loaded"));
        assert!(text.contains("| Filter: arp"));
    }

    #[test]
    fn test_print_view() {
        let store = store();
        let mut view = PacketView::new();
        view.set_filter(&store, "ip.src==10.0.0.5").unwrap();
        view.set_search(&store, "udp");
        view.marks_mut().toggle(1);

        let mut out = Buffer::no_color();
        print_view(&mut out, &store, &view).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Destination"));
        assert!(lines[1].starts_with('*'));
        assert!(lines[3].contains("Displayed: 2 of 3 loaded (5 in capture)"));
        assert!(lines[3].contains("Search 'udp': 1 matches"));
        assert!(lines[3].contains("Marked: 1"));
    }
}

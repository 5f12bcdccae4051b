//! Text exposition of snapshots.
//!
//! Pure formatting over already-produced values; nothing here touches a
//! metric cell or a lock.

use crate::data::{Key, MetricValue, Snapshot, Statistics};
use std::io::{self, Write};

/// Writes a snapshot in text exposition format.
///
/// Counters and gauges emit one sample line each; labels emit an info-style
/// line carrying the text as a tag; distributions emit their six summary
/// fields as suffixed sample lines.  Metric names have `.` folded to `_`,
/// and tags render in sorted key order, so output is deterministic.
pub fn write_text<W: Write>(snapshot: &Snapshot, writer: &mut W) -> io::Result<()> {
    for (key, value) in snapshot.iter() {
        let name = sanitize(key.name());
        match value {
            MetricValue::Counter(v) => {
                writeln!(writer, "# TYPE {} counter", name)?;
                writeln!(writer, "{}{} {}", name, tags(key, &[]), v)?;
            }
            MetricValue::Gauge(v) => {
                writeln!(writer, "# TYPE {} gauge", name)?;
                writeln!(writer, "{}{} {}", name, tags(key, &[]), v)?;
            }
            MetricValue::Label(v) => {
                writeln!(writer, "# TYPE {} gauge", name)?;
                let extra = [("value", v.as_str())];
                writeln!(writer, "{}{} 1", name, tags(key, &extra))?;
            }
            MetricValue::Distribution(stats) => {
                writeln!(writer, "# TYPE {} summary", name)?;
                write_statistics(writer, &name, key, stats)?;
            }
        }
    }

    Ok(())
}

/// Renders a snapshot to a `String`.
pub fn render_text(snapshot: &Snapshot) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    write_text(snapshot, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn write_statistics<W: Write>(
    writer: &mut W, name: &str, key: &Key, stats: &Statistics,
) -> io::Result<()> {
    let tags = tags(key, &[]);
    writeln!(writer, "{}_count{} {}", name, tags, stats.count)?;
    writeln!(writer, "{}_sum{} {}", name, tags, stats.sum)?;
    writeln!(writer, "{}_mean{} {}", name, tags, stats.mean)?;
    writeln!(writer, "{}_variance{} {}", name, tags, stats.variance)?;
    writeln!(writer, "{}_min{} {}", name, tags, stats.min)?;
    writeln!(writer, "{}_max{} {}", name, tags, stats.max)?;
    Ok(())
}

fn sanitize(name: &str) -> String { name.replace('.', "_") }

fn tags(key: &Key, extra: &[(&str, &str)]) -> String {
    if key.tags().is_empty() && extra.is_empty() {
        return String::new();
    }

    let mut rendered = String::from("{");
    let mut first = true;
    for (tag, value) in key
        .tags()
        .iter()
        .map(|(t, v)| (t.as_str(), v.as_str()))
        .chain(extra.iter().cloned())
    {
        if !first {
            rendered.push(',');
        }
        rendered.push_str(tag);
        rendered.push_str("=\"");
        rendered.push_str(value);
        rendered.push('"');
        first = false;
    }
    rendered.push('}');
    rendered
}

#[cfg(test)]
mod tests {
    use super::render_text;
    use crate::data::{Key, MetricValue, Snapshot, Statistics};

    #[test]
    fn test_counter_and_gauge_lines() {
        let mut snapshot = Snapshot::default();
        snapshot.set(Key::from_name("app.requests"), MetricValue::Counter(42));
        snapshot.set(Key::from_name("connections"), MetricValue::Gauge(-3));

        let text = render_text(&snapshot);
        assert!(text.contains("# TYPE app_requests counter\napp_requests 42\n"));
        assert!(text.contains("# TYPE connections gauge\nconnections -3\n"));
    }

    #[test]
    fn test_tagged_counter() {
        let mut snapshot = Snapshot::default();
        snapshot.set(
            Key::with_tags(
                "hits",
                vec![
                    ("status".to_owned(), "200".to_owned()),
                    ("route".to_owned(), "/".to_owned()),
                ],
            ),
            MetricValue::Counter(7),
        );

        let text = render_text(&snapshot);
        assert!(text.contains("hits{route=\"/\",status=\"200\"} 7\n"));
    }

    #[test]
    fn test_label_line() {
        let mut snapshot = Snapshot::default();
        snapshot.set(
            Key::from_name("version"),
            MetricValue::Label("v1.2.3".to_owned()),
        );

        let text = render_text(&snapshot);
        assert!(text.contains("version{value=\"v1.2.3\"} 1\n"));
    }

    #[test]
    fn test_distribution_lines() {
        let mut snapshot = Snapshot::default();
        snapshot.set(
            Key::from_name("latency"),
            MetricValue::Distribution(Statistics {
                count: 10,
                sum: 55.0,
                mean: 5.5,
                variance: 8.25,
                min: 1.0,
                max: 10.0,
            }),
        );

        let text = render_text(&snapshot);
        assert!(text.contains("# TYPE latency summary\n"));
        assert!(text.contains("latency_count 10\n"));
        assert!(text.contains("latency_sum 55\n"));
        assert!(text.contains("latency_mean 5.5\n"));
        assert!(text.contains("latency_variance 8.25\n"));
        assert!(text.contains("latency_min 1\n"));
        assert!(text.contains("latency_max 10\n"));
    }
}

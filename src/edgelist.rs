use crate::{Edge, Error, Result};
use anyhow::Context;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Node ids are `u32`, so a graph holds at most this many vertices.
pub const MAX_VERTEX_COUNT: usize = u32::MAX as usize;

/// Maps textual node identifiers to integer ids in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct NodeTable {
    ids: HashMap<String, u32>,
    labels: Vec<String>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of the given label, assigning the next free one if it has not been seen.
    pub fn resolve(&mut self, label: &str) -> Result<u32> {
        if let Some(&id) = self.ids.get(label) {
            return Ok(id);
        }
        let id = next_node_id(self.labels.len())?;
        self.ids.insert(label.to_owned(), id);
        self.labels.push(label.to_owned());
        Ok(id)
    }

    pub fn get(&self, label: &str) -> Option<u32> {
        self.ids.get(label).copied()
    }

    pub fn label(&self, id: u32) -> Option<&str> {
        self.labels.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A zero-indexed edge list, the interchange format between the raw pair parser and [`crate::Graph`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeList {
    pub vertex_count: usize,
    pub edges: Vec<Edge>,
}

impl EdgeList {
    /// Builds an edge list from raw source/destination pairs.
    ///
    /// Lines that are blank or start with `#` or `/` are skipped. Every other line must carry at
    /// least two whitespace separated tokens; further tokens are ignored. Pairs resolving to the
    /// same id are dropped, repeated pairs are kept.
    ///
    /// The vertex count is the size of `table` once the input is consumed, so a table reused
    /// across several inputs keeps numbering where the previous one stopped.
    pub fn build<R: BufRead>(reader: R, table: &mut NodeTable) -> Result<EdgeList> {
        let mut edges = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('/') {
                continue;
            }

            let mut tokens = trimmed.split_whitespace();
            let (src, dst) = match (tokens.next(), tokens.next()) {
                (Some(src), Some(dst)) => (src, dst),
                _ => return Err(Error::format(i + 1, "expected a source and a destination")),
            };

            let src = table.resolve(src)?;
            let dst = table.resolve(dst)?;
            if src == dst {
                log::trace!("line {}: dropping self-loop on node {src}", i + 1);
                continue;
            }
            edges.push(Edge::new(src, dst));
        }

        Ok(EdgeList {
            vertex_count: table.len(),
            edges,
        })
    }

    pub fn from_raw_str(text: &str, table: &mut NodeTable) -> Result<EdgeList> {
        Self::build(text.as_bytes(), table)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Writes the `|v|:` / `|e|:` header followed by one `src dst` line per edge.
    pub fn write_canonical<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "|v|: {}", self.vertex_count)?;
        writeln!(writer, "|e|: {}", self.edges.len())?;
        for e in self.edges.iter() {
            writeln!(writer, "{} {}", e.src, e.dst)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_canonical_string(&self) -> String {
        let mut out = format!("|v|: {}\n|e|: {}\n", self.vertex_count, self.edges.len());
        for e in self.edges.iter() {
            out.push_str(&format!("{} {}\n", e.src, e.dst));
        }
        out
    }

    /// Parses the canonical text form. Every edge gets weight 1.
    pub fn parse_canonical<R: BufRead>(reader: R) -> Result<EdgeList> {
        let mut lines = reader.lines().enumerate();

        let vertex_count = parse_header(lines.next(), "|v|:")?;
        if vertex_count > MAX_VERTEX_COUNT {
            return Err(Error::format(
                1,
                format!("{vertex_count} vertices exceed the limit of {MAX_VERTEX_COUNT}"),
            ));
        }
        let edge_count = parse_header(lines.next(), "|e|:")?;

        // The announced count is untrusted, so it is only compared against, never allocated.
        let mut edges = Vec::new();
        for (i, line) in lines {
            let line = line?;
            let mut tokens = line.split_whitespace();
            let (src, dst) = match (tokens.next(), tokens.next()) {
                (None, _) => continue,
                (Some(src), Some(dst)) => (src, dst),
                (Some(_), None) => return Err(Error::format(i + 1, "expected two node ids")),
            };
            if tokens.next().is_some() {
                return Err(Error::format(i + 1, "unexpected trailing token"));
            }

            let src = parse_node_id(src, i + 1, vertex_count)?;
            let dst = parse_node_id(dst, i + 1, vertex_count)?;
            if src == dst {
                return Err(Error::format(i + 1, format!("self-loop on node {src}")));
            }
            edges.push(Edge::new(src, dst));
        }

        if edges.len() != edge_count {
            return Err(Error::Format(format!(
                "header announces {edge_count} edges but {} were found",
                edges.len()
            )));
        }

        Ok(EdgeList {
            vertex_count,
            edges,
        })
    }
}

fn parse_header(
    line: Option<(usize, std::io::Result<String>)>,
    label: &str,
) -> Result<usize> {
    let (i, line) = line.ok_or_else(|| Error::Format(format!("missing `{label}` header")))?;
    let line = line?;
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some(label) {
        return Err(Error::format(i + 1, format!("expected `{label}` header")));
    }
    let count = tokens
        .next()
        .ok_or_else(|| Error::format(i + 1, format!("missing count after `{label}`")))?;
    if tokens.next().is_some() {
        return Err(Error::format(i + 1, "unexpected trailing token"));
    }
    count
        .parse::<usize>()
        .map_err(|_| Error::format(i + 1, format!("`{count}` is not a valid count")))
}

fn parse_node_id(token: &str, line: usize, vertex_count: usize) -> Result<u32> {
    let id = token
        .parse::<u64>()
        .map_err(|_| Error::format(line, format!("`{token}` is not a valid node id")))?;
    if id >= vertex_count as u64 {
        return Err(Error::OutOfRange { id, vertex_count });
    }
    u32::try_from(id).map_err(|_| Error::OutOfRange { id, vertex_count })
}

fn next_node_id(assigned: usize) -> Result<u32> {
    if assigned >= MAX_VERTEX_COUNT {
        return Err(Error::Format(format!(
            "more than {MAX_VERTEX_COUNT} distinct node labels"
        )));
    }
    Ok(assigned as u32)
}

/// Converts a raw pair file into `<out_dir>/<input stem>.edgelist` and returns the written path.
pub fn convert_raw_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    out_dir: Q,
) -> anyhow::Result<PathBuf> {
    let input = input.as_ref();
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("could not open {}", input.display()))?,
    );

    let mut table = NodeTable::new();
    let edge_list = EdgeList::build(reader, &mut table)
        .with_context(|| format!("could not parse {}", input.display()))?;

    let stem = input
        .file_stem()
        .with_context(|| format!("{} has no file name", input.display()))?;
    let mut file_name = stem.to_os_string();
    file_name.push(".edgelist");
    let output = out_dir.as_ref().join(file_name);
    let writer = BufWriter::new(
        File::create(&output).with_context(|| format!("could not create {}", output.display()))?,
    );
    edge_list.write_canonical(writer)?;

    log::info!(
        "wrote {} ({} vertices, {} edges)",
        output.display(),
        edge_list.vertex_count,
        edge_list.edge_count()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_ids_in_first_seen_order() {
        let mut table = NodeTable::new();
        let list = EdgeList::from_raw_str("a b\nb c\na c\n", &mut table).unwrap();

        assert_eq!(list.vertex_count, 3);
        assert_eq!(list.edge_count(), 3);
        assert_eq!(
            list.edges,
            vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(0, 2)]
        );
        assert_eq!(table.get("c"), Some(2));
        assert_eq!(table.label(1), Some("b"));
    }

    #[test]
    fn drops_self_loops_but_keeps_the_node() {
        let mut table = NodeTable::new();
        let list = EdgeList::from_raw_str("x x\n", &mut table).unwrap();

        assert_eq!(list.vertex_count, 1);
        assert_eq!(list.edge_count(), 0);
        assert_eq!(list.to_canonical_string(), "|v|: 1\n|e|: 0\n");
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let raw = "# FromNodeId ToNodeId\n\n   \n// generated\n  # indented comment\n7 9 extra\n";
        let mut table = NodeTable::new();
        let list = EdgeList::from_raw_str(raw, &mut table).unwrap();

        assert_eq!(list.vertex_count, 2);
        assert_eq!(list.edges, vec![Edge::new(0, 1)]);
        assert_eq!(table.get("7"), Some(0));
    }

    #[test]
    fn keeps_repeated_pairs() {
        let mut table = NodeTable::new();
        let list = EdgeList::from_raw_str("a b\nb a\na b\n", &mut table).unwrap();

        assert_eq!(list.edge_count(), 3);
        assert_eq!(list.edges[1], Edge::new(1, 0));
    }

    #[test]
    fn rejects_lines_with_a_single_token() {
        let mut table = NodeTable::new();
        let err = EdgeList::from_raw_str("a b\nlonely\n", &mut table).unwrap_err();
        assert!(matches!(err, Error::Format(ref msg) if msg.contains("line 2")));
    }

    #[test]
    fn shared_table_continues_numbering() {
        let mut table = NodeTable::new();
        EdgeList::from_raw_str("a b\n", &mut table).unwrap();
        let second = EdgeList::from_raw_str("b c\n", &mut table).unwrap();

        assert_eq!(second.vertex_count, 3);
        assert_eq!(second.edges, vec![Edge::new(1, 2)]);
    }

    #[test]
    fn writer_and_string_agree() {
        let mut table = NodeTable::new();
        let list = EdgeList::from_raw_str("p q\nq r\n", &mut table).unwrap();

        let mut buf = Vec::new();
        list.write_canonical(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), list.to_canonical_string());
        assert_eq!(list.to_canonical_string(), "|v|: 3\n|e|: 2\n0 1\n1 2\n");
    }

    #[test]
    fn parses_canonical_text() {
        let list = EdgeList::parse_canonical("|v|: 3\n|e|: 2\n0 1\n2 1\n\n".as_bytes()).unwrap();
        assert_eq!(list.vertex_count, 3);
        assert_eq!(list.edges, vec![Edge::new(0, 1), Edge::new(2, 1)]);
    }

    #[test]
    fn rejects_out_of_range_ids() {
        let err = EdgeList::parse_canonical("|v|: 2\n|e|: 1\n0 2\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfRange {
                id: 2,
                vertex_count: 2
            }
        ));
    }

    #[test]
    fn rejects_malformed_headers() {
        for text in [
            "",
            "|v|: 2\n",
            "|v|:\n|e|: 0\n",
            "|v|: two\n|e|: 0\n",
            "|e|: 0\n|v|: 2\n",
            "|v|: 2\n|e|: -1\n",
            "|v|: 2 3\n|e|: 0\n",
        ] {
            let err = EdgeList::parse_canonical(text.as_bytes()).unwrap_err();
            assert!(matches!(err, Error::Format(_)), "accepted {text:?}");
        }
    }

    #[test]
    fn rejects_count_mismatch_and_bad_edge_lines() {
        for text in [
            "|v|: 2\n|e|: 2\n0 1\n",
            "|v|: 2\n|e|: 0\n0 1\n",
            "|v|: 2\n|e|: 1\n0\n",
            "|v|: 2\n|e|: 1\n0 x\n",
            "|v|: 2\n|e|: 1\n1 1\n",
            "|v|: 2\n|e|: 18446744073709551615\n0 1\n",
        ] {
            let err = EdgeList::parse_canonical(text.as_bytes()).unwrap_err();
            assert!(matches!(err, Error::Format(_)), "accepted {text:?}");
        }
    }

    #[test]
    fn rejects_vertex_counts_beyond_u32_ids() {
        let err = EdgeList::parse_canonical("|v|: 4294967300\n|e|: 1\n4294967296 1\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::Format(ref msg) if msg.contains("line 1")));

        let list = EdgeList::parse_canonical("|v|: 4294967295\n|e|: 1\n4294967294 0\n".as_bytes())
            .unwrap();
        assert_eq!(list.edges, vec![Edge::new(u32::MAX - 1, 0)]);
    }

    #[test]
    fn node_ids_stop_at_the_u32_limit() {
        assert_eq!(next_node_id(0).unwrap(), 0);
        assert_eq!(next_node_id(MAX_VERTEX_COUNT - 1).unwrap(), u32::MAX - 1);
        assert!(matches!(next_node_id(MAX_VERTEX_COUNT), Err(Error::Format(_))));
    }

    #[test]
    fn converts_raw_file_next_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("web-Google.txt");
        std::fs::write(&input, "# comment\nn1 n2\nn2 n3\n").unwrap();

        let output = convert_raw_file(&input, dir.path()).unwrap();

        assert_eq!(output, dir.path().join("web-Google.edgelist"));
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "|v|: 3\n|e|: 2\n0 1\n1 2\n"
        );
    }
}

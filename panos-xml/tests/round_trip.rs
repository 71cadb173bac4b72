use panos_xml::{parse, parse_file, write, write_file, write_pretty};
use pretty_assertions::assert_eq;

const RUNNING: &str = r#"<?xml version="1.0"?>
<config version="10.0.0">
  <devices>
    <entry name="localhost.localdomain">
      <vsys>
        <entry name="vsys1">
          <address>
            <entry name="web"><ip-netmask>10.0.0.5/32</ip-netmask><description>a &amp; b</description></entry>
          </address>
        </entry>
      </vsys>
    </entry>
  </devices>
</config>"#;

#[test]
fn parse_write_parse_round_trip_preserves_tree_shape() {
    let first = parse(RUNNING.as_bytes()).expect("initial parse should succeed");

    let written = write(&first).expect("write should succeed");
    let second = parse(&written).expect("re-parse should succeed");

    assert_eq!(first, second);
    assert_eq!(
        second.get_text(&["devices", "entry", "vsys", "entry", "address", "entry", "description"]),
        Some("a & b")
    );
}

#[test]
fn compact_write_matches_display() {
    let node = parse(br#"<entry name="a"><tag><member>t1</member></tag></entry>"#).expect("parse");
    let bytes = write(&node).expect("write");
    assert_eq!(String::from_utf8(bytes).expect("utf8"), node.to_string());
}

#[test]
fn pretty_write_reparses_identically() {
    let node = parse(RUNNING.as_bytes()).expect("parse");
    let pretty = write_pretty(&node).expect("pretty");
    assert_eq!(parse(&pretty).expect("reparse"), node);
}

#[test]
fn parse_and_write_file_round_trip() {
    let out_dir = tempfile::tempdir().expect("tempdir should be created");
    let out_path = out_dir.path().join("roundtrip.xml");

    let node = parse(RUNNING.as_bytes()).expect("parse should succeed");
    write_file(&node, &out_path).expect("write_file should succeed");

    let reparsed = parse_file(&out_path).expect("parse_file should succeed");
    assert_eq!(node, reparsed);
}

#[test]
fn saved_file_carries_a_declaration() {
    let out_dir = tempfile::tempdir().expect("tempdir should be created");
    let out_path = out_dir.path().join("running.xml");
    let node = parse(br#"<config version="10.0.0"><shared/></config>"#).expect("parse");
    write_file(&node, &out_path).expect("write_file should succeed");

    let saved = std::fs::read_to_string(&out_path).expect("read back");
    assert!(saved.starts_with(r#"<?xml version="1.0"?>"#));
    assert!(saved.contains("\n<config version=\"10.0.0\">"));
    assert!(saved.ends_with("</config>\n"));
}

#[test]
fn write_file_reports_the_path() {
    let out_dir = tempfile::tempdir().expect("tempdir should be created");
    let out_path = out_dir.path().join("missing").join("running.xml");
    let node = parse(b"<config/>").expect("parse");
    let err = write_file(&node, &out_path).expect_err("missing directory");
    assert!(err.to_string().contains("running.xml"));
}

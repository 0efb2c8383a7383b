//! End-to-end scenario tests against the in-memory `RepositoryProbe`
//! fixture, one per seed case in the testable-properties section.

use dsvnfilter_core::fixture::{FixtureNode, FixtureProbe};
use dsvnfilter_core::{Driver, FilterConfig, MatchModeConfig, NodeKind, PropertyBlock};
use std::io::Cursor;

fn config(mode: MatchModeConfig, prefixes: &[&str]) -> FilterConfig {
    FilterConfig {
        mode,
        prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
        preserve_empty: false,
        stop_renumbering: false,
        strip_mergeinfo: false,
        start_revision: 0,
    }
}

fn revision(n: u64) -> String {
    let props = "K 10\nsvn:author\nV 3\nbob\nPROPS-END\n";
    format!("Revision-number: {n}\nProp-content-length: {}\nContent-length: {}\n\n{}\n", props.len(), props.len(), props)
}

fn add_file(path: &str, content: &str) -> String {
    format!(
        "Node-path: {path}\nNode-kind: file\nNode-action: add\nText-content-length: {}\nContent-length: {}\n\n{}\n\n",
        content.len(),
        content.len(),
        content
    )
}

fn copy_file(path: &str, src_rev: u64, src_path: &str) -> String {
    format!(
        "Node-path: {path}\nNode-kind: file\nNode-action: add\nNode-copyfrom-rev: {src_rev}\nNode-copyfrom-path: {src_path}\n\n\n"
    )
}

fn run(input: &str, cfg: &FilterConfig, probe: &mut FixtureProbe) -> String {
    let driver = Driver::new(cfg, probe);
    let parser = dsvnfilter_core::DumpParser::new(Cursor::new(input.as_bytes().to_vec()));
    let mut out = Vec::new();
    driver.run(parser, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn s1_empty_revisions_are_removed_and_surviving_ones_renumbered() {
    let mut input = String::from("SVN-fs-dump-format-version: 3\n\n");
    input.push_str(&revision(1));
    input.push_str(&add_file("trunk/a", "keep-1"));
    input.push_str(&revision(2));
    input.push_str(&add_file("foo/x", "dropped"));
    input.push_str(&revision(3));
    input.push_str(&add_file("trunk/b", "keep-2"));
    input.push_str(&revision(4));
    input.push_str(&add_file("foo/y", "dropped"));
    input.push_str(&revision(5));
    input.push_str(&add_file("foo/z", "dropped"));

    let cfg = config(MatchModeConfig::Exclude, &["foo"]);
    let mut probe = FixtureProbe::new();
    let out = run(&input, &cfg, &mut probe);

    assert!(out.contains("Revision-number: 1\n"));
    assert!(out.contains("Revision-number: 2\n"));
    assert!(!out.contains("Revision-number: 3\n"));
    assert!(!out.contains("Revision-number: 4\n"));
    assert!(!out.contains("Revision-number: 5\n"));
    assert!(out.contains("keep-1"));
    assert!(out.contains("keep-2"));
    assert!(!out.contains("dropped"));
}

#[test]
fn s2_preserve_empty_keeps_all_five_revisions() {
    let mut input = String::from("SVN-fs-dump-format-version: 3\n\n");
    for n in 1..=5u64 {
        input.push_str(&revision(n));
        if n % 2 == 1 {
            input.push_str(&add_file("trunk/a", "keep"));
        } else {
            input.push_str(&add_file("foo/x", "dropped"));
        }
    }

    let mut cfg = config(MatchModeConfig::Exclude, &["foo"]);
    cfg.preserve_empty = true;
    let mut probe = FixtureProbe::new();
    let out = run(&input, &cfg, &mut probe);

    for n in 1..=5u64 {
        assert!(out.contains(&format!("Revision-number: {n}\n")), "missing revision {n}");
    }
}

#[test]
fn s3_preserve_empty_and_stop_renumbering_keep_input_numbers() {
    let mut input = String::from("SVN-fs-dump-format-version: 3\n\n");
    for n in 1..=5u64 {
        input.push_str(&revision(n));
        if n % 2 == 1 {
            input.push_str(&add_file("trunk/a", "keep"));
        } else {
            input.push_str(&add_file("foo/x", "dropped"));
        }
    }

    let mut cfg = config(MatchModeConfig::Exclude, &["foo"]);
    cfg.preserve_empty = true;
    cfg.stop_renumbering = true;
    let mut probe = FixtureProbe::new();
    let out = run(&input, &cfg, &mut probe);

    for n in 1..=5u64 {
        assert!(out.contains(&format!("Revision-number: {n}\n")));
    }
}

#[test]
fn s4_untangles_a_copy_from_an_excluded_file() {
    let mut input = String::from("SVN-fs-dump-format-version: 3\n\n");
    for n in 1..=9u64 {
        input.push_str(&revision(n));
    }
    input.push_str(&revision(10));
    input.push_str(&copy_file("a/x", 7, "b/y"));

    let cfg = config(MatchModeConfig::Include, &["a"]);
    let mut probe = FixtureProbe::new();
    probe.insert(7, "b/y", FixtureNode { kind: NodeKind::File, props: PropertyBlock::new(), content: Some(b"from-repo".to_vec()) });
    let out = run(&input, &cfg, &mut probe);

    assert!(out.contains("Node-path: a/x\n"));
    assert!(out.contains("Node-action: add\n"));
    assert!(!out.contains("Node-copyfrom"));
    assert!(out.contains("from-repo"));
    assert!(out.contains("svndumpfilter generated"));
}

#[test]
fn s5_untangles_a_copy_from_an_excluded_directory() {
    let mut input = String::from("SVN-fs-dump-format-version: 3\n\n");
    for n in 1..=9u64 {
        input.push_str(&revision(n));
    }
    input.push_str(&revision(10));
    input.push_str(&copy_file("a/x", 7, "b/y").replace("Node-kind: file", "Node-kind: dir"));

    let cfg = config(MatchModeConfig::Include, &["a"]);
    let mut probe = FixtureProbe::new();
    probe.insert(7, "b/y", FixtureNode { kind: NodeKind::Dir, props: PropertyBlock::new(), content: None });
    probe.insert(7, "b/y/c", FixtureNode { kind: NodeKind::File, props: PropertyBlock::new(), content: Some(b"C".to_vec()) });
    probe.insert(7, "b/y/d", FixtureNode { kind: NodeKind::File, props: PropertyBlock::new(), content: Some(b"D".to_vec()) });
    let out = run(&input, &cfg, &mut probe);

    let pos_a = out.find("Node-path: a\n").unwrap();
    let pos_dir = out.find("Node-path: a/x\n").unwrap();
    let pos_c = out.find("Node-path: a/x/c\n").unwrap();
    let pos_d = out.find("Node-path: a/x/d\n").unwrap();
    assert!(pos_a < pos_dir);
    assert!(pos_dir < pos_c);
    assert!(pos_c < pos_d);
    // Dependent-directory synthesis (§4.6) still applies to the untangled
    // destination root per §4.7 point 4: "a" never appears on its own in
    // the input, so it is synthesized ahead of "a/x" alongside the three
    // records the untangler itself produces.
    assert_eq!(out.matches("svndumpfilter generated").count(), 4);
}

#[test]
fn s6_dependent_directories_are_synthesized_before_the_real_node() {
    let mut input = String::from("SVN-fs-dump-format-version: 3\n\n");
    input.push_str(&revision(1));
    input.push_str(&add_file("repo/dir1/dir2/file", "hello"));

    let cfg = config(MatchModeConfig::Include, &["repo/dir1"]);
    let mut probe = FixtureProbe::new();
    let out = run(&input, &cfg, &mut probe);

    let pos1 = out.find("Node-path: repo/dir1\n").unwrap();
    let pos2 = out.find("Node-path: repo/dir1/dir2\n").unwrap();
    let pos3 = out.find("Node-path: repo/dir1/dir2/file\n").unwrap();
    assert!(pos1 < pos2 && pos2 < pos3);
    assert_eq!(out.matches("svndumpfilter generated").count(), 2);
}

#[test]
fn s7_strips_mergeinfo_and_shrinks_prop_content_length() {
    let mergeinfo_props = "K 13\nsvn:mergeinfo\nV 8\n/branch:1\nK 10\nsvn:author\nV 3\nbob\nPROPS-END\n";
    let mut node = format!("Node-path: trunk/a\nNode-kind: file\nNode-action: change\nProp-content-length: {}\n", mergeinfo_props.len());
    node.push_str(&format!("Content-length: {}\n\n{}\n\n", mergeinfo_props.len(), mergeinfo_props));

    let mut input = String::from("SVN-fs-dump-format-version: 3\n\n");
    input.push_str(&revision(1));
    input.push_str(&node);

    let mut cfg = config(MatchModeConfig::Include, &["trunk"]);
    cfg.strip_mergeinfo = true;
    let mut probe = FixtureProbe::new();
    let out = run(&input, &cfg, &mut probe);

    assert!(!out.contains("svn:mergeinfo"));
    assert!(out.contains("svn:author"));
    let shrunk_len = mergeinfo_props.len() - "K 13\nsvn:mergeinfo\nV 8\n/branch:1\n".len();
    assert!(out.contains(&format!("Prop-content-length: {shrunk_len}\n")));
}

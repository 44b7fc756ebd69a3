use gedgraph::export::{to_gedcom, to_json};
use gedgraph::graph::XrefId;
use gedgraph::parser::{parse, LineError, LinkPolicy, ParseConfig, ParseError, Parser};

const FAMILY: &str = "\
0 HEAD
1 SOUR gedgraph
1 GEDC
2 VERS 5.5.1
1 CHAR UTF-8
0 @I1@ INDI
1 NAME John /Smith/
1 BIRT
2 DATE 1 JAN 1900
2 PLAC London
1 BIRT
2 DATE 2 FEB 1901
1 _AGE 42
1 FAMS @F1@
0 @I2@ INDI
1 NAME Mary /Jones/
1 FAMS @F1@
1 NOTE Met in
2 CONT the spring
0 @I3@ INDI
1 NAME Ann /Smith/
1 FAMC @F1@
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
1 CHIL @I3@
0 @S1@ SOUR
1 TITL Parish register
0 TRLR
";

#[test]
fn test_records_and_header() {
    let doc = parse(FAMILY).unwrap();
    let graph = &doc.graph;

    assert_eq!(graph.individual_count(), 3);
    assert_eq!(graph.family_count(), 1);
    assert_eq!(graph.collection("SOUR").map(|c| c.len()), Some(1));
    assert_eq!(graph.meta().version.as_deref(), Some("5.5.1"));
    assert_eq!(graph.meta().charset.as_deref(), Some("UTF-8"));

    let head = graph.header().unwrap();
    assert_eq!(graph.get_value(head, "GEDC.VERS"), Some("5.5.1"));
    graph.validate().unwrap();
}

#[test]
fn test_path_notations_agree() {
    let graph = parse(FAMILY).unwrap().graph;
    let john = graph.record("I1").unwrap();

    let dotted = graph.get(john, "BIRT.DATE");
    assert_eq!(graph.get(john, "BIRT.0.DATE"), dotted);
    assert_eq!(graph.get(john, "BIRT.items[0].DATE.0"), dotted);
    assert_eq!(graph.get(john, "birt.date"), dotted);

    assert_eq!(graph.get_value(john, "BIRT.1.DATE"), Some("2 FEB 1901"));
    assert_eq!(graph.get_value(john, "BIRT.items[1].DATE"), Some("2 FEB 1901"));
    assert_eq!(graph.get(john, "BIRT.2"), None);
    assert_eq!(graph.get(john, "DEAT.DATE"), None);
    assert_eq!(graph.get_typed::<u32>(john, "_AGE"), Some(42));
    assert_eq!(graph.get_typed::<u32>(john, "NAME"), None);
    assert!(graph.try_get(john, "BIRT..DATE").is_err());
}

#[test]
fn test_references_resolve_both_ways() {
    let graph = parse(FAMILY).unwrap().graph;
    let family = graph.record("F1").unwrap();
    let ann = graph.record("I3").unwrap();

    let chil = graph.get(family, "CHIL").unwrap();
    assert_eq!(graph.node(chil).unwrap().reference, Some(ann));
    assert_eq!(graph.pointer(chil), Some(&XrefId::new("I3")));

    let famc = graph.get(ann, "FAMC").unwrap();
    assert!(graph.node(family).unwrap().referenced_by.contains(&famc));
}

#[test]
fn test_packed_values_expand() {
    let text = "\
0 @I1@ INDI
1 FAMS @F1@, @F2@
2 _NOTE shared
0 @F1@ FAM
1 HUSB @I1@
0 @F2@ FAM
1 HUSB @I1@
";
    let graph = parse(text).unwrap().graph;
    let john = graph.record("I1").unwrap();
    let fams = graph.node(john).unwrap().children("FAMS").to_vec();

    assert_eq!(fams.len(), 2);
    assert_eq!(graph.pointer(fams[0]), Some(&XrefId::new("F1")));
    assert_eq!(graph.pointer(fams[1]), Some(&XrefId::new("F2")));
    for fam in fams {
        assert_eq!(graph.get_value(fam, "_NOTE"), Some("shared"));
    }
    graph.validate().unwrap();
}

#[test]
fn test_level_jumps_are_clamped() {
    let graph = parse("0 @I1@ INDI\n3 NAME Ann\n5 GIVN Ann\n1 SEX F\n").unwrap().graph;
    let ann = graph.record("I1").unwrap();

    let name = graph.get(ann, "NAME").unwrap();
    assert_eq!(graph.node(name).unwrap().depth, 1);
    let givn = graph.get(ann, "NAME.GIVN").unwrap();
    assert_eq!(graph.node(givn).unwrap().depth, 2);
    assert_eq!(graph.get_value(ann, "SEX"), Some("F"));
}

#[test]
fn test_continuation_lines() {
    let graph = parse("0 @N1@ NOTE line one\nline two\n\n0 @I1@ INDI\n").unwrap().graph;
    let note = graph.record("N1").unwrap();
    assert_eq!(graph.node(note).unwrap().value(), Some("line one\nline two"));

    let err = parse("not a line\n0 HEAD\n").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Line {
            index: 0,
            source: LineError::OrphanContinuation,
            ..
        }
    ));
}

#[test]
fn test_purge_strips_and_marks() {
    let text = "\
0 HEAD
1 CHAR UTF-8
0 @I1@ INDI
1 NAME Ann
1 NOTE long story
2 CONT more
1 OBJE
2 FILE photo.jpg
1 _SRC @S1@
1 SOUR @S1@
0 @S1@ SOUR
1 TITL Register
0 TRLR
";
    let parser = Parser::with_config(ParseConfig::default().with_purge_threshold(16));
    let doc = parser.parse(text).unwrap();
    let graph = &doc.graph;

    assert!(graph.meta().purged);
    assert!(graph.record("S1").is_none());
    assert!(graph.collection("SOUR").is_none());

    let ann = graph.record("I1").unwrap();
    assert!(graph.get(ann, "NOTE").is_none());
    assert!(graph.get(ann, "OBJE").is_none());
    assert!(graph.get(ann, "SOUR").is_none());

    // Points at a purged record, so it stays text
    let src = graph.get(ann, "_SRC").unwrap();
    assert_eq!(graph.node(src).unwrap().reference, None);
    assert_eq!(graph.node(src).unwrap().value(), Some("@S1@"));
    graph.validate().unwrap();

    assert!(doc.raw.contains("1 _PURGED Y\n"));
    let again = parser.parse(&doc.raw).unwrap();
    assert_eq!(again.raw, doc.raw);
}

#[test]
fn test_small_input_not_purged() {
    let doc = parse(FAMILY).unwrap();
    assert!(!doc.graph.meta().purged);
    assert!(doc.graph.record("S1").is_some());
    assert!(!doc.raw.contains("_PURGED"));
}

#[test]
fn test_ignored_members_leave_collection() {
    let text = "\
0 @I1@ INDI
1 NAME Ann
1 FAMC @F1@
0 @I2@ INDI
1 _IGNORE Y
0 @I3@ INDI
1 NAME Kept
1 _IGNORE N
0 @F1@ FAM
1 HUSB @I2@
1 CHIL @I1@
";
    let graph = parse(text).unwrap().graph;

    assert_eq!(graph.individual_count(), 2);
    assert!(graph.ignored().contains_key("I2"));
    assert!(!graph.collection("INDI").unwrap().contains_key("I2"));

    let family = graph.record("F1").unwrap();
    let husb = graph.get(family, "HUSB").unwrap();
    assert_eq!(graph.node(husb).unwrap().reference, graph.record("I2"));
    graph.validate().unwrap();
}

#[test]
fn test_member_groups() {
    let text = "\
0 @I1@ INDI
1 _MEMBER cousins
0 @I2@ INDI
1 _MEMBER cousins
1 _MEMBER choir
0 @F1@ FAM
1 _MEMBER cousins
";
    let graph = parse(text).unwrap().graph;
    let members = graph.members();

    assert_eq!(members.len(), 2);
    let cousins: Vec<&str> = members["cousins"].members.iter().map(|x| x.as_str()).collect();
    assert_eq!(cousins, vec!["I1", "I2"]);
    assert_eq!(members["choir"].members.len(), 1);

    let definition = graph.node(members["cousins"].definition).unwrap();
    assert_eq!(definition.tag.as_str(), "_MEMBER");
}

const LINKED: &str = "\
0 @I1@ INDI
1 NAME Ann /Smith/
0 @I2@ INDI
1 NAME Annie /Smith/
1 _LINK @I1@
1 FAMS @F1@
0 @F1@ FAM
1 WIFE @I2@
";

#[test]
fn test_linking_pass_merge() {
    let parser = Parser::with_config(ParseConfig::default().with_link("_LINK", LinkPolicy::Merge));
    let graph = parser.parse(LINKED).unwrap().graph;

    assert!(graph.record("I2").is_none());
    assert_eq!(graph.individual_count(), 1);

    let ann = graph.record("I1").unwrap();
    assert_eq!(graph.get_value(ann, "NAME.0"), Some("Ann /Smith/"));
    assert_eq!(graph.get_value(ann, "NAME.1"), Some("Annie /Smith/"));
    assert!(graph.get(ann, "_LINK").is_none());
    assert_eq!(graph.get_value(ann, "FAMS"), Some("@F1@"));

    let family = graph.record("F1").unwrap();
    assert_eq!(graph.get_value(family, "WIFE"), Some("@I1@"));
    graph.validate().unwrap();
}

#[test]
fn test_linking_pass_clone() {
    let parser = Parser::with_config(ParseConfig::default().with_link("_LINK", LinkPolicy::Clone));
    let graph = parser.parse(LINKED).unwrap().graph;

    assert_eq!(graph.individual_count(), 2);
    let ann = graph.record("I1").unwrap();
    let annie = graph.record("I2").unwrap();

    assert_eq!(graph.node(ann).unwrap().children("NAME").len(), 1);
    assert_eq!(graph.get_value(annie, "NAME.0"), Some("Annie /Smith/"));
    assert_eq!(graph.get_value(annie, "NAME.1"), Some("Ann /Smith/"));
    assert_eq!(graph.get_value(annie, "_LINK"), Some("@I1@"));

    let family = graph.record("F1").unwrap();
    assert_eq!(graph.get_value(family, "WIFE"), Some("@I2@"));
    graph.validate().unwrap();
}

#[test]
fn test_config_from_yaml() {
    let config: ParseConfig = serde_yaml::from_str(
        "purge_threshold: 1024\nlink:\n  tag: _LINK\n  policy: merge\n",
    )
    .unwrap();
    assert_eq!(config.purge_threshold, 1024);
    assert_eq!(config.member_tag.as_ref().map(|t| t.as_str()), Some("_MEMBER"));

    let graph = Parser::with_config(config).parse(LINKED).unwrap().graph;
    assert_eq!(graph.individual_count(), 1);
}

#[test]
fn test_gedcom_round_trip() {
    let graph = parse(FAMILY).unwrap().graph;
    let text = to_gedcom(&graph);
    let again = parse(&text).unwrap().graph;

    assert_eq!(to_json(&again), to_json(&graph));
    assert_eq!(to_gedcom(&again), text);
}

#[test]
fn test_round_trip_keeps_ignored_members() {
    let graph = parse("0 @I1@ INDI\n1 _IGNORE Y\n0 @I2@ INDI\n1 NAME Ann\n").unwrap().graph;
    let again = parse(&to_gedcom(&graph)).unwrap().graph;
    assert_eq!(to_json(&again), to_json(&graph));
    assert_eq!(again.ignored().len(), 1);
}

#[test]
fn test_references_to_widely_spaced_records() {
    let graph = parse("0  @I1@  INDI\n1 NAME Ann\n0   @F1@ FAM\n1 HUSB @I1@\n").unwrap().graph;
    let family = graph.record("F1").unwrap();
    let husb = graph.get(family, "HUSB").unwrap();

    assert_eq!(graph.node(husb).unwrap().reference, graph.record("I1"));
    assert!(graph.record("I1").is_some());
    graph.validate().unwrap();
}

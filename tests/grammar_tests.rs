use bnf_interp::{BnfError, BnfParser, BnfParserBuilder, ErrorKind, Grammar, NodeKind, OutputFormat};

fn fixture(name: &str) -> String {
    format!("{}/tests/grammars/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn parser(name: &str) -> BnfParser {
    BnfParserBuilder::new()
        .add_grammar_file(fixture(name))
        .unwrap_or_else(|e| panic!("{e}"))
        .build()
        .unwrap()
}

#[test]
fn select_query() {
    let p = parser("0.bnf");
    let tree = p.parse("SELECT a FROM t").unwrap();

    assert_eq!(tree.size(), 9);
    insta::assert_snapshot!(OutputFormat::Txt.render(&tree), @r"
    <S>
     <selection>
      SELECT
      <criterion>
       a
      FROM
      <S>
       <tablename>
        t
    ");
}

#[test]
fn nested_select() {
    let p = parser("0.bnf");
    let tree = p.parse("SELECT a FROM SELECT b FROM t").unwrap();

    let inner = tree
        .path_first("<S>.<selection>.<S>.<selection>.<criterion>.*")
        .unwrap();
    assert_eq!(inner.token(), "b");
    assert!(p.try_parse("SELECT a FROM").unwrap().is_none());
    assert!(p.try_parse("SELECT foo FROM bar").unwrap().is_some());
}

#[test]
fn partial_parsing() {
    let builder = BnfParserBuilder::new()
        .add_grammar_file(fixture("0.bnf"))
        .unwrap();
    let strict = builder.clone().build().unwrap();
    let partial = builder.partial_parsing(true).build().unwrap();

    let tree = partial.parse("SELECT <criterion> FROM t").unwrap();
    assert_eq!(tree.size(), 8);
    let marker = tree.path_first("<S>.<selection>.<criterion>").unwrap();
    assert_eq!(marker.kind(), NodeKind::Leaf);

    assert!(partial.try_parse("SELECT <foo> FROM t").unwrap().is_none());
    assert!(strict.try_parse("SELECT <criterion> FROM t").unwrap().is_none());
}

#[test]
fn partial_marker_in_place_of_rule() {
    let grammar = "<S> := <A> b\n<A> := foo | bar";
    let partial = BnfParserBuilder::new()
        .add_grammar(grammar)
        .unwrap()
        .partial_parsing(true)
        .build()
        .unwrap();
    assert_eq!(partial.parse("<A> b").unwrap().size(), 3);
    assert_eq!(partial.parse("bar b").unwrap().size(), 4);

    let strict = BnfParserBuilder::new().add_grammar(grammar).unwrap().build().unwrap();
    assert_eq!(strict.parse("<A> b").unwrap_err().kind(), ErrorKind::ParsingFailed);
}

#[test]
fn missing_rule() {
    let p = BnfParserBuilder::new()
        .add_grammar("<S> := <A> b")
        .unwrap()
        .build()
        .unwrap();
    let err = p.parse("x b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRule);
    insta::assert_snapshot!(err, @"cannot find rule for token <A>");
}

#[test]
fn recursion_limit() {
    let p = BnfParserBuilder::new()
        .add_grammar("<S> := <S> a | a")
        .unwrap()
        .max_recursion_steps(2)
        .build()
        .unwrap();
    let err = p.parse("a a").unwrap_err();
    assert!(matches!(err, BnfError::MaximumRecursionReached(2)));
    insta::assert_snapshot!(err, @"maximum recursion steps of 2 reached; if the input string is indeed valid, try increasing the limit");
}

#[test]
fn optional_symbols() {
    let p = parser("optional.bnf");
    let alternatives: Vec<String> = p
        .start_rule()
        .alternatives()
        .iter()
        .map(ToString::to_string)
        .collect();
    insta::assert_compact_debug_snapshot!(alternatives, @r#"["ε", "<b>", "<a>", "<a> <b>"]"#);

    assert_eq!(p.parse("").unwrap().size(), 2);
    assert_eq!(p.parse("alpha").unwrap().size(), 3);
    assert_eq!(p.parse("beta").unwrap().size(), 3);
    assert_eq!(p.parse("alpha beta").unwrap().size(), 5);
    assert!(p.try_parse("beta alpha").unwrap().is_none());
}

#[test]
fn sticky_alternatives_come_last() {
    let sticky = BnfParserBuilder::new()
        .sticky_rules(true)
        .add_grammar_file(fixture("sticky.bnf"))
        .unwrap()
        .build()
        .unwrap();
    insta::assert_snapshot!(sticky.start_rule(), @"<tok> := <kw> | <num> || <id>");

    let tree = sticky.parse("42").unwrap();
    assert!(tree.path_first("<tok>.<num>").is_some());
    assert!(sticky.parse("if").unwrap().path_first("<tok>.<kw>").is_some());
    assert!(sticky.parse("x1").unwrap().path_first("<tok>.<id>").is_some());

    let plain = parser("sticky.bnf");
    assert_eq!(plain.start_rule().alternatives().len(), 2);
    assert!(plain.try_parse("x1").unwrap().is_none());
    assert!(plain.try_parse("if || x1").unwrap().is_some());
}

#[test]
fn semicolon_terminates_declaration() {
    let p = BnfParserBuilder::new()
        .add_grammar("<package_declaration> := package <package_name>? ;\n<package_name> := ^[a-z]+ # lower case")
        .unwrap()
        .build()
        .unwrap();
    insta::assert_snapshot!(p.start_rule(), @"<package_declaration> := package ; | package <package_name> ;");

    let tree = p.parse("package boe ;").unwrap();
    assert_eq!(tree.size(), 5);
    assert!(p.try_parse("package ;").unwrap().is_some());
    assert!(p.try_parse("package boe").unwrap().is_none());
}

#[test]
fn case_insensitive_terminals() {
    let p = BnfParserBuilder::new()
        .case_sensitive(false)
        .add_grammar_file(fixture("0.bnf"))
        .unwrap()
        .build()
        .unwrap();
    assert!(p.try_parse("select a from t").unwrap().is_some());
    assert!(parser("0.bnf").try_parse("select a from t").unwrap().is_none());
}

#[test]
fn captures_become_children() {
    let p = parser("pairs.bnf");
    let tree = p.parse("a=1 ; bc=23").unwrap();
    let captures: Vec<&str> = tree
        .path("<pairs>.<pairs>.<pair>.*.*")
        .into_iter()
        .map(|n| n.token())
        .collect();
    insta::assert_compact_debug_snapshot!(captures, @r#"["bc", "23"]"#);
}

#[test]
fn injected_cases() {
    let p = BnfParserBuilder::new()
        .add_grammar_file(fixture("0.bnf"))
        .unwrap()
        .add_case_to_rule("<S>", "*")
        .unwrap()
        .insert_case_to_rule(0, "<criterion>", "COUNT ( * )")
        .unwrap()
        .insert_case_to_rule(9, "<tablename>", "DUAL")
        .unwrap()
        .add_case_to_rule("<nope>", "x")
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(p.start_rule().alternatives()[0].to_string(), "*");
    assert!(p.try_parse("SELECT COUNT ( * ) FROM *").unwrap().is_some());
    assert!(p.rule("<nope>").is_none());
    let tablename = p.rule("<tablename>").unwrap().alternatives();
    assert_eq!(tablename.last().unwrap().to_string(), "DUAL");
}

#[test]
fn display_recompiles_to_same_parser() {
    let original = parser("arithmetic.bnf");
    let shown = original.to_string();
    let recompiled = BnfParserBuilder::new().add_grammar(&shown).unwrap().build().unwrap();
    assert_eq!(recompiled.to_string(), shown);

    for input in ["( 1 + ( 2 * 3 ) )", "- ( 4 * - 5 )", "17"] {
        let tree = original.parse(input).unwrap();
        assert_eq!(recompiled.parse(input).unwrap(), tree);
        assert_eq!(original.parse(input).unwrap(), tree);
    }
}

#[test]
fn diagnostics() {
    let grammar = Grammar::parse(
        "<S> := <A> x | <B>\n<A> := x | y\n",
        bnf_interp::CompileOptions::default(),
    )
    .unwrap();
    assert_eq!(grammar.dangling_reference(), Some(("<S>", "<B>")));

    let mut terminals: Vec<String> = grammar.terminal_tokens().iter().map(ToString::to_string).collect();
    terminals.sort();
    insta::assert_compact_debug_snapshot!(terminals, @r#"["x", "y"]"#);
}

#[test]
fn grammar_sources_agree() {
    let path = fixture("arithmetic.bnf");
    let text = std::fs::read_to_string(&path).unwrap();

    let from_file = BnfParserBuilder::new().add_grammar_file(&path).unwrap().build().unwrap();
    let from_str = BnfParserBuilder::new().add_grammar(&text).unwrap().build().unwrap();
    let from_reader = BnfParserBuilder::new()
        .add_grammar_reader(text.as_bytes())
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(from_file.to_string(), from_str.to_string());
    assert_eq!(from_reader.to_string(), from_str.to_string());

    let err = BnfParserBuilder::new()
        .add_grammar_file(fixture("missing.bnf"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

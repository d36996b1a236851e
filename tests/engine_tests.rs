//! Execution semantics of the five node kinds, driven through `Parser::run`.

use parsegraph::{
    pattern, seq, Choice, Definitions, ErrorKind, NestingMode, ParseOutcome, Parser, ParserConfig,
    Repeat, Sequence, Value,
};

fn compile(defs: Definitions) -> Parser {
    Parser::compile(&defs).unwrap()
}

fn run(parser: &Parser, rule: &str, input: &str) -> ParseOutcome {
    parser.run(rule, input).unwrap()
}

fn s(text: &str) -> Value {
    Value::from(text)
}

// ---
// Terminals
// ---

#[test]
fn test_terminal_is_anchored_at_cursor() {
    let parser = compile(
        Definitions::new()
            .define("ab", pattern("ab"))
            .define("shifted", seq([pattern("x"), "ab".into()])),
    );

    let outcome = run(&parser, "ab", "xab");
    assert!(!outcome.success);
    assert_eq!(outcome.position, 0);
    assert_eq!(outcome.result, Value::Null);

    let outcome = run(&parser, "shifted", "xab");
    assert!(outcome.success);
    assert_eq!(outcome.position, 3);
    assert_eq!(outcome.result, Value::map([("ab", s("ab"))]));
}

#[test]
fn test_terminal_returns_first_capture_group() {
    let parser = compile(
        Definitions::new()
            .define("quoted", pattern(r#""([^"]*)""#))
            .define("optional_group", pattern("a(b)?")),
    );

    let outcome = run(&parser, "quoted", r#""hi" rest"#);
    assert_eq!(outcome.result, s("hi"));
    assert_eq!(outcome.position, 4);

    let outcome = run(&parser, "optional_group", "a");
    assert!(outcome.success);
    assert_eq!(outcome.result, s(""));
}

#[test]
fn test_positions_are_byte_offsets() {
    let parser = compile(Definitions::new().define("e", pattern("é")));
    let outcome = run(&parser, "e", "éa");
    assert!(outcome.success);
    assert_eq!(outcome.position, 2);
}

// ---
// Sequences
// ---

#[test]
fn test_sequence_collapse_returns_component_result() {
    let parser = compile(
        Definitions::new()
            .define("word", pattern("[a-z]+"))
            .define("wrapped", seq([pattern(r"\["), "word::".into(), pattern(r"\]")])),
    );
    let outcome = run(&parser, "wrapped", "[abc]");
    assert!(outcome.is_complete("[abc]"));
    assert_eq!(outcome.result, s("abc"));
}

#[test]
fn test_sequence_collects_named_components() {
    let parser = compile(
        Definitions::new()
            .define("word", pattern("[a-z]+"))
            .define(
                "pair",
                Sequence::new(["word:Left", "word:", "word"]).separator(pattern(" +")),
            ),
    );
    let outcome = run(&parser, "pair", "ab cd ef");
    assert!(outcome.success);
    assert_eq!(
        outcome.result,
        Value::map([("Left", s("ab")), ("word", s("ef"))])
    );
}

#[test]
fn test_sequence_separator_only_between_children() {
    let parser = compile(
        Definitions::new()
            .define("d", pattern(r"\d"))
            .define("triple", Sequence::new(["d:A", "d:B", "d:C"]).separator(pattern(","))),
    );
    let outcome = run(&parser, "triple", "1,2,3,");
    assert!(outcome.success);
    assert_eq!(outcome.position, 5);

    let outcome = run(&parser, "triple", "1,23");
    assert!(!outcome.success);
    assert_eq!(outcome.position, 3);
}

#[test]
fn test_optional_sequence_falls_back_to_default_at_start() {
    let parser = compile(Definitions::new().define(
        "abc",
        Sequence::new([pattern("a"), pattern("b"), pattern("c")]).default("none"),
    ));
    let outcome = run(&parser, "abc", "abx");
    assert!(outcome.success);
    assert_eq!(outcome.position, 0);
    assert_eq!(outcome.result, s("none"));
}

#[test]
fn test_mandatory_sequence_failure_keeps_partial_fields() {
    let parser = compile(
        Definitions::new()
            .define("a", pattern("a"))
            .define("b", pattern("b"))
            .define("ab", seq(["a:A", "b:B"])),
    );
    let outcome = run(&parser, "ab", "ax");
    assert!(!outcome.success);
    assert_eq!(outcome.position, 1);
    assert_eq!(outcome.result, Value::map([("A", s("a")), ("B", Value::Null)]));
}

#[test]
fn test_optional_named_subsequence() {
    let parser = compile(
        Definitions::new().define("word", pattern("[a-z]+")).define(
            "phrase",
            seq::<_, parsegraph::NodeDescription>([
                "word:Head".into(),
                Sequence::new([pattern(" +"), "word::".into()])
                    .name("Tail")
                    .default(Value::Null)
                    .into(),
            ]),
        ),
    );

    let outcome = run(&parser, "phrase", "ab");
    assert!(outcome.is_complete("ab"));
    assert_eq!(outcome.result, Value::map([("Head", s("ab")), ("Tail", Value::Null)]));

    let outcome = run(&parser, "phrase", "ab cd");
    assert!(outcome.is_complete("ab cd"));
    assert_eq!(outcome.result, Value::map([("Head", s("ab")), ("Tail", s("cd"))]));

    // a dangling space rolls back to before the optional part
    let outcome = run(&parser, "phrase", "ab ");
    assert!(outcome.success);
    assert_eq!(outcome.position, 2);
}

// ---
// Alternations
// ---

#[test]
fn test_choice_first_match_wins() {
    let parser = compile(Definitions::new().define("c", Choice::new([pattern("a"), pattern("ab")])));
    let outcome = run(&parser, "c", "ab");
    assert!(outcome.success);
    assert_eq!(outcome.result, s("a"));
    assert_eq!(outcome.position, 1);
}

#[test]
fn test_choice_full_object_lists_every_branch() {
    let parser = compile(
        Definitions::new()
            .define("x", pattern("x"))
            .define("y", pattern("y"))
            .define("c", Choice::new(["x:X", "y:Y"]).nest(NestingMode::FullObject)),
    );
    let outcome = run(&parser, "c", "y");
    assert!(outcome.success);
    assert_eq!(outcome.position, 1);
    assert_eq!(outcome.result, Value::map([("X", Value::Null), ("Y", s("y"))]));
}

#[test]
fn test_choice_full_object_does_not_try_branches_after_a_match() {
    let parser = compile(
        Definitions::new()
            .define("x", pattern("x"))
            .define("xy", pattern("xy"))
            .define("c", Choice::new(["x:X", "xy:XY"]).nest(NestingMode::FullObject)),
    );
    let outcome = run(&parser, "c", "xy");
    assert!(outcome.success);
    assert_eq!(outcome.position, 1);
    assert_eq!(outcome.result, Value::map([("X", s("x")), ("XY", Value::Null)]));
}

#[test]
fn test_choice_match_only_uses_positional_keys() {
    let parser = compile(Definitions::new().define(
        "c",
        Choice::new([pattern("a"), pattern("b")]).nest(NestingMode::MatchOnly),
    ));
    let outcome = run(&parser, "c", "b");
    assert_eq!(outcome.result, Value::map([("property2", s("b"))]));
}

#[test]
fn test_choice_reports_deepest_failure() {
    let parser = compile(
        Definitions::new()
            .define("a", pattern("a"))
            .define("b", pattern("b"))
            .define("c", pattern("c"))
            .define("d", pattern("d"))
            .define("ab", seq(["a:A", "b:B"]))
            .define("acd", seq(["a:A", "c:C", "d:D"]))
            .define("either", Choice::new(["ab", "acd"])),
    );
    let outcome = run(&parser, "either", "acx");
    assert!(!outcome.success);
    assert_eq!(outcome.position, 2);
    assert_eq!(
        outcome.result,
        Value::map([("A", s("a")), ("C", s("c")), ("D", Value::Null)])
    );
}

#[test]
fn test_choice_deepest_failure_tie_keeps_earlier_branch() {
    let parser = compile(
        Definitions::new()
            .define("a", pattern("a"))
            .define("b", pattern("b"))
            .define("c", pattern("c"))
            .define("first", seq(["a:First", "b:B"]))
            .define("second", seq(["a:Second", "c:C"]))
            .define("either", Choice::new(["first", "second"])),
    );
    let outcome = run(&parser, "either", "ax");
    assert!(!outcome.success);
    assert_eq!(outcome.position, 1);
    assert_eq!(
        outcome.result,
        Value::map([("First", s("a")), ("B", Value::Null)])
    );
}

#[test]
fn test_optional_choice_uses_default() {
    let parser = compile(Definitions::new().define("c", Choice::new([pattern("a")]).default("dflt")));
    let outcome = run(&parser, "c", "b");
    assert!(outcome.success);
    assert_eq!(outcome.position, 0);
    assert_eq!(outcome.result, s("dflt"));
}

// ---
// Repetitions
// ---

fn digits(min: usize, max: usize) -> Parser {
    compile(
        Definitions::new()
            .define("d", pattern(r"\d"))
            .define("ds", Repeat::new("d").min(min).max(max)),
    )
}

#[test]
fn test_repeat_within_bounds() {
    let parser = digits(2, 4);
    let outcome = run(&parser, "ds", "123x");
    assert!(outcome.success);
    assert_eq!(outcome.position, 3);
    assert_eq!(outcome.result, Value::List(vec![s("1"), s("2"), s("3")]));
}

#[test]
fn test_repeat_below_min_fails() {
    let parser = digits(2, 4);
    let outcome = run(&parser, "ds", "1x");
    assert!(!outcome.success);
    assert_eq!(outcome.position, 1);
    assert_eq!(outcome.result, Value::List(vec![s("1")]));
}

#[test]
fn test_repeat_stops_at_max() {
    let parser = digits(0, 4);
    let outcome = run(&parser, "ds", "123456");
    assert!(outcome.success);
    assert_eq!(outcome.position, 4);
    assert_eq!(outcome.result.as_list().map(<[Value]>::len), Some(4));
}

#[test]
fn test_repeat_commits_trailing_separator() {
    let parser = compile(
        Definitions::new()
            .define("d", pattern(r"\d"))
            .define("list", Repeat::new("d").separator(pattern(","))),
    );
    let outcome = run(&parser, "list", "1,2,");
    assert!(outcome.success);
    assert_eq!(outcome.position, 4);
    assert_eq!(outcome.result, Value::List(vec![s("1"), s("2")]));
}

#[test]
fn test_failed_repeat_appends_partial_result() {
    let parser = compile(
        Definitions::new()
            .define("k", pattern("[a-z]"))
            .define("v", pattern(r"\d"))
            .define("pair", seq(["k:K".into(), pattern("="), "v:V".into()]))
            .define("pairs", Repeat::new("pair").separator(pattern(" ")).min(2)),
    );
    let outcome = run(&parser, "pairs", "a=1 b=");
    assert!(!outcome.success);
    assert_eq!(outcome.position, 6);
    assert_eq!(
        outcome.result,
        Value::List(vec![
            Value::map([("K", s("a")), ("V", s("1"))]),
            Value::map([("K", s("b")), ("V", Value::Null)]),
        ])
    );
}

#[test]
fn test_unbounded_repeat_stops_without_progress() {
    let parser = compile(
        Definitions::new()
            .define("unbounded", Repeat::new(pattern("a*")))
            .define("bounded", Repeat::new(pattern("a*")).max(3)),
    );
    let outcome = run(&parser, "unbounded", "b");
    assert!(outcome.success);
    assert_eq!(outcome.position, 0);
    assert_eq!(outcome.result, Value::List(vec![s("")]));

    let outcome = run(&parser, "bounded", "b");
    assert_eq!(outcome.result, Value::List(vec![s(""), s(""), s("")]));
}

#[test]
fn test_unbounded_repeat_reaches_min_with_empty_matches() {
    let parser = compile(Definitions::new().define("empties", Repeat::new(pattern("a*")).min(2)));
    let outcome = run(&parser, "empties", "");
    assert!(outcome.success);
    assert_eq!(outcome.position, 0);
    assert_eq!(outcome.result, Value::List(vec![s(""), s("")]));
}

#[test]
fn test_repeat_as_later_alternative_is_attempted() {
    let parser = compile(Definitions::new().define(
        "c",
        Choice::new([pattern("x"), Repeat::new(pattern(r"\d")).min(1).into()]),
    ));
    let outcome = run(&parser, "c", "42");
    assert!(outcome.success);
    assert_eq!(outcome.result, Value::List(vec![s("4"), s("2")]));
}

// ---
// References and the registry
// ---

fn parens() -> Parser {
    compile(Definitions::new().define(
        "expr",
        Choice::new([
            seq([pattern(r"\("), "expr::".into(), pattern(r"\)")]),
            pattern("x"),
        ]),
    ))
}

#[test]
fn test_recursive_reference_parses_nested_input() {
    let parser = parens();
    let outcome = run(&parser, "expr", "((x))");
    assert!(outcome.is_complete("((x))"));
    assert_eq!(outcome.result, s("x"));
}

#[test]
fn test_recursive_reference_rejects_unbalanced_input() {
    let parser = parens();
    let outcome = run(&parser, "expr", "((x)");
    assert!(!outcome.success);
    assert!(!outcome.is_complete("((x)"));
    assert_eq!(outcome.position, 4);
}

#[test]
fn test_default_depth_allows_deep_nesting() {
    let parser = parens();
    let levels = 400;
    let input = format!("{}x{}", "(".repeat(levels), ")".repeat(levels));
    // debug builds need more than the default test thread stack at this depth
    let outcome = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(move || parser.run("expr", &input).map(|o| (o.is_complete(&input), o)))
        .unwrap()
        .join()
        .unwrap()
        .unwrap();
    assert!(outcome.0);
    assert_eq!(outcome.1.result, s("x"));
    assert_eq!(outcome.1.position, 2 * levels + 1);
}

#[test]
fn test_depth_limit_counts_rule_references() {
    let defs = Definitions::new().define(
        "expr",
        Choice::new([
            seq([pattern(r"\("), "expr::".into(), pattern(r"\)")]),
            pattern("x"),
        ]),
    );
    let parser = Parser::compile_with(&defs, ParserConfig { max_depth: 3 }).unwrap();

    // the entry rule itself is not entered through a reference
    assert!(run(&parser, "expr", "(((x)))").is_complete("(((x)))"));

    let err = parser.run("expr", "((((x))))").unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimit { limit: 3 });
}

#[test]
fn test_compiling_twice_is_deterministic() {
    let defs = Definitions::new()
        .define("d", pattern(r"\d"))
        .define("pair", seq(["d:L".into(), pattern(":"), "d:R".into()]))
        .define("pairs", Repeat::new("pair").separator(pattern(",")));
    let first = Parser::compile(&defs).unwrap();
    let second = Parser::compile(&defs).unwrap();
    for input in ["1:2,3:4", "1:2,3", "", "x"] {
        assert_eq!(run(&first, "pairs", input), run(&second, "pairs", input));
    }
}

#[test]
fn test_parser_shared_across_threads() {
    let parser = parens();
    let inputs = ["x", "(x)", "((x))", "(((x)))", "((x)"];
    std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let parser = &parser;
                scope.spawn(move || parser.run("expr", input).unwrap().is_complete(input))
            })
            .collect();
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![true, true, true, true, false]);
    });
}

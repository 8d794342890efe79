// Table-driven robustness tests for the Duck interpreter core.
//
// Each suite feeds named inputs through one stage of the pipeline (lexer,
// expression evaluator, statement classifier, program loader) and checks
// either the produced value or the error message.

use duck::error::DuckError;
use duck::evaluator::evaluate_expression;
use duck::lexer::{Keyword, Lexer, Operator, Punctuation, TokenType};
use duck::program::Program;
use duck::statement::{classify, StatementKind};
use duck::tables::{ArrayTable, SymbolTable};

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// What a stage produced for one input. `None` when the stage has no value
/// worth comparing (the lexer stage; token sequences are checked separately).
type StageOutput = Result<Option<f64>, DuckError>;

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_value: Option<f64>,
    pub expected_error_contains: Option<String>,
}

impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_value: None,
            expected_error_contains: None,
        }
    }

    pub fn should_equal(name: &str, input: &str, value: f64) -> Self {
        Self {
            expected_value: Some(value),
            ..Self::should_succeed(name, input)
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            should_succeed: false,
            ..Self::should_succeed(name, input)
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
            ..Self::should_succeed(name, input)
        }
    }
}

/// Test suite containing multiple test cases run through one stage.
pub struct TestSuite {
    pub name: String,
    pub stage: fn(&str) -> StageOutput,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str, stage: fn(&str) -> StageOutput) -> Self {
        Self {
            name: name.to_string(),
            stage,
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Run all tests in this suite
    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(self.stage, test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ✓ {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  ✗ {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  💥 {}: CRASHED - {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

/// Run a single test case, catching panics so they count as crashes.
fn run_single_test(stage: fn(&str) -> StageOutput, test: &TestCase) -> TestResult {
    let input = test.input.clone();
    let result = std::panic::catch_unwind(move || stage(&input));

    match result {
        Ok(outcome) => match (outcome, test.should_succeed) {
            (Ok(value), true) => match (test.expected_value, value) {
                (Some(expected), Some(actual)) if !same_number(expected, actual) => {
                    TestResult::Fail(format!("Expected {}, got {}", expected, actual))
                }
                (Some(expected), None) => {
                    TestResult::Fail(format!("Expected {}, stage produced no value", expected))
                }
                _ => TestResult::Pass,
            },
            (Ok(_), false) => {
                TestResult::Fail("Expected failure, but it succeeded".to_string())
            }
            (Err(error), false) => match &test.expected_error_contains {
                Some(expected) if !error.message.contains(expected.as_str()) => {
                    TestResult::Fail(format!(
                        "Error message '{}' doesn't contain expected text '{}'",
                        error.message, expected
                    ))
                }
                _ => TestResult::Pass,
            },
            (Err(error), true) => TestResult::Fail(format!(
                "Expected success, but got error: {}",
                error.message
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

fn same_number(expected: f64, actual: f64) -> bool {
    (expected.is_nan() && actual.is_nan()) || expected == actual
}

// ============================================================================
// Pipeline stages
// ============================================================================

fn lex_stage(input: &str) -> StageOutput {
    Lexer::new(input.to_string()).scan_tokens().map(|_| None)
}

/// Tables shared by the expression suite: `x = 3`, `zero = 0`, and a
/// three-element array `a` with only `a[1] = 7` assigned.
fn expression_stage(input: &str) -> StageOutput {
    let mut symbols = SymbolTable::new();
    symbols.record("x", 3.0);
    symbols.record("zero", 0.0);

    let mut arrays = ArrayTable::new();
    arrays.declare("a", 3.0).expect("declare a");
    arrays.assign("a", 1.0, 7.0).expect("assign a[1]");

    evaluate_expression(input, &symbols, &arrays).map(Some)
}

/// Encodes the classification as a number so the harness can compare it.
fn classify_stage(input: &str) -> StageOutput {
    let tokens = Lexer::new(input.to_string()).scan_tokens()?;
    let kind = classify(input, &tokens)?;
    let code = match kind {
        StatementKind::Assignment => 0.0,
        StatementKind::If => 1.0,
        StatementKind::Goto => 2.0,
        StatementKind::Dim => 3.0,
        StatementKind::Print => 4.0,
        StatementKind::Read => 5.0,
        StatementKind::Stop => 6.0,
        StatementKind::End => 7.0,
    };
    Ok(Some(code))
}

/// Produces the number of statements the loader kept.
fn load_stage(input: &str) -> StageOutput {
    Program::parse(input).map(|program| Some(program.len() as f64))
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_lexer_tests() -> TestSuite {
    let mut suite = TestSuite::new("Lexer", lex_stage);

    suite.add_test(TestCase::should_succeed("assignment", "x1 = 3.5;"));
    suite.add_test(TestCase::should_succeed("underscore_identifier", "_tmp = _tmp + 1;"));
    suite.add_test(TestCase::should_succeed("multi_char_operators", "a<=b>=c==d!=e;"));
    suite.add_test(TestCase::should_succeed("string_with_operators", "print \"a+b; [c]\";"));
    suite.add_test(TestCase::should_succeed("tabs_and_spaces", "\tx\t=  1 ;"));
    suite.add_test(TestCase::should_succeed("trailing_dot_number", "x = 5.;"));
    suite.add_test(TestCase::should_succeed("leading_dot_number", "x = .5;"));
    suite.add_test(TestCase::should_succeed("empty", ""));

    suite.add_test(TestCase::should_fail_with_message(
        "two_decimal_points",
        "x = 3.14.15;",
        "'3.14.15' is an unrecognized expression.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string",
        "print \"abc;",
        "End of string not defined",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "digit_led_identifier",
        "9lives = 1;",
        "'9lives' is an unrecognized expression.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unknown_symbol",
        "x = y @ z;",
        "'@' is an unrecognized expression.",
    ));
    suite.add_test(TestCase::should_fail("colon_in_word", "a:b = 1;"));
    suite.add_test(TestCase::should_fail("lone_dot", "x = .;"));

    suite
}

fn create_expression_tests() -> TestSuite {
    let mut suite = TestSuite::new("Expressions", expression_stage);

    // === PRECEDENCE ===
    suite.add_test(TestCase::should_equal("multiplication_binds_tighter", "2+3*4", 14.0));
    suite.add_test(TestCase::should_equal("parentheses_override", "(2+3)*4", 20.0));
    suite.add_test(TestCase::should_equal("left_associative_minus", "10-4-3", 3.0));
    suite.add_test(TestCase::should_equal("left_associative_divide", "16/4/2", 2.0));
    suite.add_test(TestCase::should_equal("fractional_result", "10/4", 2.5));
    suite.add_test(TestCase::should_equal("comparison_loosest", "1+1 == 2", 1.0));
    suite.add_test(TestCase::should_equal("comparison_after_sum", "2 > 1 + 5", 0.0));
    suite.add_test(TestCase::should_equal("less", "1 < 2", 1.0));
    suite.add_test(TestCase::should_equal("less_equal_false", "2 <= 1", 0.0));
    suite.add_test(TestCase::should_equal("not_equal_false", "3 != 3", 0.0));
    suite.add_test(TestCase::should_equal("greater_equal", "3 >= 3", 1.0));
    suite.add_test(TestCase::should_equal("single_paren_group", "(2)", 2.0));
    let deep = "(".repeat(60) + "1" + &")".repeat(60);
    suite.add_test(TestCase::should_equal("deeply_nested_parens", &deep, 1.0));

    // === UNARY ===
    suite.add_test(TestCase::should_equal("leading_negation", "-2+3", 1.0));
    suite.add_test(TestCase::should_equal("leading_plus", "+5", 5.0));
    suite.add_test(TestCase::should_equal("not_zero", "!0", 1.0));
    suite.add_test(TestCase::should_equal("not_nonzero", "!5", 0.0));
    suite.add_test(TestCase::should_equal("minus_negative", "3 - -2", 5.0));
    suite.add_test(TestCase::should_equal("compact_minus_negative", "2--2", 4.0));
    suite.add_test(TestCase::should_equal("times_negative", "2*-3", -6.0));
    suite.add_test(TestCase::should_equal("negated_group", "-(2+3)", -5.0));
    suite.add_test(TestCase::should_equal("negated_product", "-2*3", -6.0));
    suite.add_test(TestCase::should_equal("not_of_comparison", "!(1==2)", 1.0));
    suite.add_test(TestCase::should_equal("negate_inside_group", "-(-2)", 2.0));
    suite.add_test(TestCase::should_fail_with_message(
        "double_unary_minus",
        "- - 2",
        "is an invalid operation",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "double_not",
        "!!1",
        "is an invalid operation",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "star_without_left_operand",
        "* 2",
        "needs a value on its left",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "bang_as_binary",
        "2 ! 3",
        "is not a binary operator",
    ));

    // === VARIABLES AND ARRAYS ===
    suite.add_test(TestCase::should_equal("scalar_variable", "x*2", 6.0));
    suite.add_test(TestCase::should_equal("array_element", "a[1]+1", 8.0));
    suite.add_test(TestCase::should_equal("computed_index", "a[x-2]", 7.0));
    suite.add_test(TestCase::should_equal("index_inside_group", "(a[1])", 7.0));
    suite.add_test(TestCase::should_fail_with_message(
        "unassigned_variable",
        "y + 1",
        "The variable y has not been assigned a value.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "uninitialized_element",
        "a[0]",
        "has not been initialized",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "index_equal_to_size",
        "a[3]",
        "out of bounds",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "negative_index",
        "a[-1]",
        "is negative",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "fractional_index",
        "a[1.5]",
        "is not a whole number",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "undeclared_array",
        "b[0]",
        "'b' has not been declared as an array",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_close_bracket",
        "a[1",
        "']' character is missing",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_index",
        "a[]",
        "Arithmetic expression missing.",
    ));

    // === MALFORMED ===
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren",
        "(2+3",
        "Ending parenthesis missing.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_paren",
        "2+3)",
        "Opening parenthesis missing.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_parentheses",
        "()",
        "There must be an arithmetic expression inside parentheses.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "adjacent_operands",
        "2 3",
        "Numbers must have an operator between them.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "adjacent_variable_operands",
        "x zero",
        "Numbers must have an operator between them.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "trailing_operator",
        "2 +",
        "cannot end with operators",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "operand_before_paren",
        "2(3)",
        "An operand cannot precede '('.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_expression",
        "",
        "Arithmetic expression missing.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "string_operand",
        "\"hi\" + 1",
        "Strings cannot be used as values.",
    ));
    suite.add_test(TestCase::should_fail("keyword_operand", "2 + print"));

    // === TERMINATORS ===
    suite.add_test(TestCase::should_equal("stops_at_comma", "4 , 5", 4.0));
    suite.add_test(TestCase::should_equal("stops_at_semicolon", "4 + 1; 9", 5.0));
    suite.add_test(TestCase::should_equal("stops_at_goto", "2 + 3 goto L", 5.0));
    suite.add_test(TestCase::should_equal("stops_at_bracket", "6 ] 1", 6.0));

    // === IEEE DIVISION ===
    suite.add_test(TestCase::should_equal("divide_by_zero", "1/0", f64::INFINITY));
    suite.add_test(TestCase::should_equal("negative_divide_by_zero", "-1/zero", f64::NEG_INFINITY));
    suite.add_test(TestCase::should_equal("zero_over_zero", "0/0", f64::NAN));

    suite
}

fn create_classifier_tests() -> TestSuite {
    let mut suite = TestSuite::new("Statement Classifier", classify_stage);

    suite.add_test(TestCase::should_equal("scalar_assignment", "x = 1;", 0.0));
    suite.add_test(TestCase::should_equal("array_assignment", "a[2] = 1;", 0.0));
    suite.add_test(TestCase::should_equal("nested_index_assignment", "a[a[0]] = 1;", 0.0));
    suite.add_test(TestCase::should_equal("keyword_prefixed_name", "printer = 2;", 0.0));
    suite.add_test(TestCase::should_equal("if", "if (x) goto L;", 1.0));
    suite.add_test(TestCase::should_equal("goto", "goto L;", 2.0));
    suite.add_test(TestCase::should_equal("dim", "dim a[3];", 3.0));
    suite.add_test(TestCase::should_equal("print", "print x;", 4.0));
    suite.add_test(TestCase::should_equal("read", "read x;", 5.0));
    suite.add_test(TestCase::should_equal("stop", "stop;", 6.0));
    suite.add_test(TestCase::should_equal("end", "end;", 7.0));

    suite.add_test(TestCase::should_fail_with_message(
        "comparison_only",
        "x == 1;",
        "Unable to determine statement type",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "number_target",
        "3 = x;",
        "No proper variable or array to assign value to.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_index_target",
        "a[] = 1;",
        "Array index unspecified",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_index_target",
        "a[1 = 2;",
        "Missing ']' character to end array expression.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "two_names_target",
        "x y = 1;",
        "x y is an invalid expression to which to assign a value.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "quoted_target",
        "\"s\" = 1;",
        "Invalid syntax.",
    ));

    suite
}

fn create_loader_tests() -> TestSuite {
    let mut suite = TestSuite::new("Program Loader", load_stage);

    suite.add_test(TestCase::should_equal("single_stop", "stop;", 1.0));
    suite.add_test(TestCase::should_equal(
        "blank_and_comment_lines_dropped",
        "// header\n\nx = 1;   // trailing\n\t\nstop;\n",
        2.0,
    ));
    suite.add_test(TestCase::should_equal("labeled_stop", "L: stop;", 1.0));
    suite.add_test(TestCase::should_equal(
        "colon_inside_string",
        "print \"a:b\";\nstop;",
        2.0,
    ));
    suite.add_test(TestCase::should_equal(
        "comment_marker_inside_string",
        "print \"http://x\";\nstop;",
        2.0,
    ));
    suite.add_test(TestCase::should_equal("crlf_line_endings", "x = 1;\r\nstop;\r\n", 2.0));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_stop",
        "x = 1;\nprint x;",
        "Missing stop statement.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "stop_only_in_comment",
        "x = 1; // stop;",
        "Missing stop statement.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "invalid_label_name",
        "1L: stop;",
        "'1L' is an invalid label name.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "keyword_label",
        "print: stop;",
        "'print' is an invalid label name.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "label_without_statement",
        "L:\nstop;",
        "Labeled line has no adjoining statement.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "duplicate_label",
        "L: x = 1;\nL: stop;",
        "Multiple labels with the same name",
    ));

    suite
}

// ============================================================================
// Token Sequences
// ============================================================================

fn lex(statement: &str) -> Vec<(TokenType, String)> {
    Lexer::new(statement.to_string())
        .scan_tokens()
        .expect("statement lexes")
        .into_iter()
        .map(|t| (t.token_type, t.lexeme))
        .collect()
}

#[test]
fn lexer_token_sequences() {
    let p = |kind: Punctuation| TokenType::Punctuation(kind);
    let id = |name: &str| (TokenType::Identifier, name.to_string());

    assert_eq!(
        lex("if (a<=b) goto L;"),
        vec![
            (TokenType::Keyword(Keyword::If), "if".to_string()),
            (p(Punctuation::LeftParen), "(".to_string()),
            id("a"),
            (TokenType::Operator(Operator::LessEqual), "<=".to_string()),
            id("b"),
            (p(Punctuation::RightParen), ")".to_string()),
            (TokenType::Keyword(Keyword::Goto), "goto".to_string()),
            id("L"),
            (p(Punctuation::Semicolon), ";".to_string()),
        ]
    );

    // `= =` is two `=` signs, `==` is one operator.
    assert_eq!(
        lex("a = = b").iter().map(|(t, _)| t.clone()).collect::<Vec<_>>(),
        vec![
            TokenType::Identifier,
            p(Punctuation::Equal),
            p(Punctuation::Equal),
            TokenType::Identifier,
        ]
    );
    assert_eq!(
        lex("a==b!=c")[1..4].iter().map(|(t, _)| t.clone()).collect::<Vec<_>>(),
        vec![
            TokenType::Operator(Operator::EqualEqual),
            TokenType::Identifier,
            TokenType::Operator(Operator::BangEqual),
        ]
    );

    // Signs are separate operators; the number carries only its magnitude.
    assert_eq!(
        lex("x=-2.5;"),
        vec![
            id("x"),
            (p(Punctuation::Equal), "=".to_string()),
            (TokenType::Operator(Operator::Minus), "-".to_string()),
            (TokenType::Number(2.5), "2.5".to_string()),
            (p(Punctuation::Semicolon), ";".to_string()),
        ]
    );
}

#[test]
fn lexer_strips_quotes_from_strings() {
    let tokens = Lexer::new("print \"a, b;\", x;".to_string())
        .scan_tokens()
        .expect("statement lexes");

    assert_eq!(tokens.len(), 5);
    assert_eq!(tokens[1].token_type, TokenType::String);
    assert_eq!(tokens[1].lexeme, "a, b;");
    assert_eq!((tokens[1].span.start, tokens[1].span.end), (6, 13));
    assert_eq!(tokens[1].to_string(), "\"a, b;\"");
}

#[test]
fn lexer_reports_end_of_statement() {
    let mut lexer = Lexer::new("  x  ".to_string());

    let first = lexer.next_token().expect("lexes").expect("one token");
    assert_eq!(first.lexeme, "x");
    assert_eq!((first.span.start, first.span.end), (2, 3));
    assert!(lexer.next_token().expect("lexes").is_none());
    assert!(lexer.next_token().expect("lexes").is_none());

    let mut empty = Lexer::new(String::new());
    assert!(empty.next_token().expect("lexes").is_none());
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_core_tests() {
    println!("🧪 Duck Interpreter Core Test Suite");
    println!("===================================\n");

    let suites = vec![
        create_lexer_tests(),
        create_expression_tests(),
        create_classifier_tests(),
        create_loader_tests(),
    ];

    let mut failing_suites = Vec::new();
    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            failing_suites.push(results.suite_name);
        }
    }

    assert!(
        failing_suites.is_empty(),
        "suites with failures: {:?}",
        failing_suites
    );
}

use rox as lox;

use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::report::Reporter;
use lox::resolver::Resolver;
use lox::runner::Lox;
use lox::scanner::Scanner;

/// Drives a source string through the full pipeline, returning the captured
/// output and the two diagnostic flags.
fn run(source: &str) -> (String, bool, bool) {
    let mut out: Vec<u8> = Vec::new();

    let mut session = Lox::new(&mut out);
    session.run(source.as_bytes().to_vec());

    let syntax = session.had_syntax_error();
    let runtime = session.had_runtime_error();
    drop(session);

    let output = String::from_utf8(out).expect("interpreter output is UTF-8");
    (output, syntax, runtime)
}

fn run_ok(source: &str) -> String {
    let (output, syntax, runtime) = run(source);

    assert!(!syntax, "unexpected syntax error in {:?}", source);
    assert!(!runtime, "unexpected runtime error in {:?}", source);

    output
}

fn expect_runtime_error(source: &str) {
    let (_, syntax, runtime) = run(source);

    assert!(!syntax, "unexpected syntax error in {:?}", source);
    assert!(runtime, "expected a runtime error in {:?}", source);
}

fn expect_syntax_error(source: &str) {
    let (output, syntax, _) = run(source);

    assert!(syntax, "expected a syntax error in {:?}", source);
    // A flagged program must not execute.
    assert_eq!("", output);
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions and printing
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn arithmetic_respects_precedence() {
    assert_eq!("7\n", run_ok("print 1 + 2 * 3;"));
}

#[test]
fn strings_concatenate() {
    assert_eq!(
        "hi there\n",
        run_ok("var a = \"hi\"; var b = a + \" there\"; print b;")
    );
}

#[test]
fn integral_results_print_without_a_fraction() {
    assert_eq!("4\n", run_ok("print 8 / 2;"));
    assert_eq!("0.75\n", run_ok("print 0.5 + 0.25;"));
    assert_eq!("-3\n", run_ok("print -3;"));
}

#[test]
fn division_by_zero_follows_ieee_semantics() {
    assert_eq!("inf\n", run_ok("print 1 / 0;"));
}

#[test]
fn equality_is_structural_for_primitives() {
    assert_eq!("true\n", run_ok("print 1 == 1;"));
    assert_eq!("true\n", run_ok("print \"a\" == \"a\";"));
    assert_eq!("true\n", run_ok("print nil == nil;"));
    assert_eq!("false\n", run_ok("print 1 == \"1\";"));
    assert_eq!("true\n", run_ok("print 1 != 2;"));
}

#[test]
fn equality_is_identity_for_instances() {
    assert_eq!(
        "false\ntrue\n",
        run_ok("class K {} var a = K(); var b = K(); print a == b; var c = a; print a == c;")
    );
}

#[test]
fn zero_and_empty_string_are_truthy() {
    assert_eq!("yes\n", run_ok("if (0) print \"yes\";"));
    assert_eq!("yes\n", run_ok("if (\"\") print \"yes\";"));
    assert_eq!(
        "no\n",
        run_ok("if (nil) print \"yes\"; else print \"no\";")
    );
    assert_eq!(
        "no\n",
        run_ok("if (false) print \"yes\"; else print \"no\";")
    );
}

#[test]
fn logical_operators_return_their_operands() {
    assert_eq!("fallback\n", run_ok("print nil or \"fallback\";"));
    assert_eq!("2\n", run_ok("print 1 and 2;"));
    assert_eq!("1\n", run_ok("print 1 or 2;"));
    assert_eq!("nil\n", run_ok("print nil and 2;"));
}

#[test]
fn logical_operators_short_circuit() {
    let source = "\
fun sideEffect() { print \"evaluated\"; return true; }
print false and sideEffect();
print true or sideEffect();
";

    assert_eq!("false\ntrue\n", run_ok(source));
}

#[test]
fn callables_have_display_forms() {
    assert_eq!("<fn f>\n", run_ok("fun f() {} print f;"));
    assert_eq!("K\n", run_ok("class K {} print K;"));
    assert_eq!("K instance\n", run_ok("class K {} print K();"));
    assert_eq!("<native fn>\n", run_ok("print clock;"));
}

#[test]
fn clock_yields_a_number() {
    assert_eq!("true\n", run_ok("print clock() > 0;"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Variables, scopes, and control flow
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn a_block_local_shadows_and_then_unveils_the_outer_binding() {
    assert_eq!(
        "inner\nouter\n",
        run_ok("var x = \"outer\"; { var x = \"inner\"; print x; } print x;")
    );
}

#[test]
fn assignment_evaluates_to_the_assigned_value() {
    assert_eq!("2\n2\n", run_ok("var a = 1; print a = 2; print a;"));
}

#[test]
fn while_loops_run_until_the_condition_is_falsy() {
    assert_eq!(
        "3\n2\n1\n",
        run_ok("var n = 3; while (n > 0) { print n; n = n - 1; }")
    );
}

#[test]
fn for_loops_cover_init_condition_and_increment() {
    assert_eq!(
        "0\n1\n2\n",
        run_ok("for (var i = 0; i < 3; i = i + 1) print i;")
    );
}

#[test]
fn a_for_loop_initializer_scopes_its_variable_to_the_loop() {
    expect_runtime_error("for (var i = 0; i < 1; i = i + 1) {} print i;");
}

#[test]
fn an_uninitialized_variable_is_nil() {
    assert_eq!("nil\n", run_ok("var a; print a;"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Functions, closures, and returns
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn functions_return_values() {
    assert_eq!(
        "3\n",
        run_ok("fun add(a, b) { return a + b; } print add(1, 2);")
    );
}

#[test]
fn a_function_without_a_return_yields_nil() {
    assert_eq!("nil\n", run_ok("fun noop() {} print noop();"));
}

#[test]
fn recursion_works() {
    assert_eq!(
        "8\n",
        run_ok("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(6);")
    );
}

#[test]
fn return_unwinds_out_of_nested_blocks_and_loops() {
    assert_eq!(
        "2\n",
        run_ok("fun f() { while (true) { { return 2; } } } print f();")
    );
}

#[test]
fn a_closure_counter_retains_its_environment() {
    let source = "\
fun makeCounter() { var i = 0; fun count() { i = i + 1; print i; } return count; }
var c = makeCounter(); c(); c(); c();
";

    assert_eq!("1\n2\n3\n", run_ok(source));
}

#[test]
fn two_counters_do_not_share_state() {
    let source = "\
fun makeCounter() { var i = 0; fun count() { i = i + 1; print i; } return count; }
var a = makeCounter(); var b = makeCounter();
a(); a(); b();
";

    assert_eq!("1\n2\n1\n", run_ok(source));
}

#[test]
fn closures_capture_by_reference() {
    let source = "\
fun make() { var a = 1; fun get() { print a; } a = 2; return get; }
make()();
";

    assert_eq!("2\n", run_ok(source));
}

#[test]
fn a_reference_binds_to_the_lexically_enclosing_declaration() {
    // The closure resolved `a` to the global before the shadowing local
    // existed; it must keep observing the global.
    let source = "\
var a = \"global\";
{ fun show() { print a; } show(); var a = \"local\"; show(); }
";

    assert_eq!("global\nglobal\n", run_ok(source));
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes, instances, and this
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn initializers_store_state_on_the_instance() {
    assert_eq!(
        "42\n",
        run_ok("class P { init(x) { this.x = x; } } var p = P(42); print p.x;")
    );
}

#[test]
fn methods_read_instance_state_through_this() {
    let source = "\
class Greeter {
  init(name) { this.name = name; }
  greet() { print \"hello \" + this.name; }
}
Greeter(\"lox\").greet();
";

    assert_eq!("hello lox\n", run_ok(source));
}

#[test]
fn a_bound_method_remembers_its_instance() {
    let source = "\
class Box { init(v) { this.v = v; } show() { print this.v; } }
var m = Box(7).show;
m();
";

    assert_eq!("7\n", run_ok(source));
}

#[test]
fn fields_shadow_methods() {
    let source = "\
class C { m() { return \"method\"; } }
var c = C();
print c.m();
c.m = \"field\";
print c.m;
";

    assert_eq!("method\nfield\n", run_ok(source));
}

#[test]
fn instances_share_by_reference() {
    let source = "\
class K {}
var a = K();
var b = a;
b.field = 1;
print a.field;
";

    assert_eq!("1\n", run_ok(source));
}

#[test]
fn an_early_return_in_init_still_yields_the_instance() {
    let source = "\
class F {
  init(n) {
    this.n = n;
    if (n < 1) return;
    this.n = n * 2;
  }
}
print F(0).n;
print F(2).n;
";

    assert_eq!("0\n4\n", run_ok(source));
}

#[test]
fn a_class_without_init_takes_no_arguments() {
    assert_eq!("K instance\n", run_ok("class K {} print K();"));
    expect_runtime_error("class K {} K(1);");
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn subtracting_a_number_from_a_string_is_a_runtime_error() {
    expect_runtime_error("\"x\" - 1;");
}

#[test]
fn the_runtime_error_message_names_the_operand_rule() {
    let scanner = Scanner::new(b"\"x\" - 1;".to_vec());
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    let mut reporter = Reporter::new();
    let mut parser = Parser::new(tokens, 0, &mut reporter);
    let statements = parser.parse();

    let mut out: Vec<u8> = Vec::new();
    let mut interpreter = Interpreter::new(&mut out);

    let mut resolver = Resolver::new(&mut interpreter, &mut reporter);
    resolver.resolve(&statements);

    let error = interpreter
        .interpret(&statements)
        .expect_err("expected a runtime error");

    let rendered = error.to_string();
    assert!(rendered.contains("Operands must be numbers."));
    assert!(rendered.contains("[line 1]"));
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    expect_runtime_error("\"str\"();");
    expect_runtime_error("nil();");
}

#[test]
fn arity_is_checked_exactly() {
    expect_runtime_error("fun f(a) {} f();");
    expect_runtime_error("fun f(a) {} f(1, 2);");
    expect_runtime_error("clock(1);");
}

#[test]
fn reading_an_undefined_variable_is_a_runtime_error() {
    expect_runtime_error("print q;");
}

#[test]
fn global_assignment_requires_a_prior_declaration() {
    expect_runtime_error("q = 1;");
}

#[test]
fn property_access_requires_an_instance() {
    expect_runtime_error("true.x;");
    expect_runtime_error("\"s\".len = 1;");
}

#[test]
fn reading_a_missing_property_is_a_runtime_error() {
    expect_runtime_error("class K {} print K().missing;");
}

#[test]
fn a_runtime_error_stops_the_current_run() {
    let (output, syntax, runtime) = run("print \"before\"; \"x\" - 1; print \"after\";");

    assert!(!syntax);
    assert!(runtime);
    assert_eq!("before\n", output);
}

// ─────────────────────────────────────────────────────────────────────────────
// Static (resolve) errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn returning_from_top_level_code_is_an_error() {
    expect_syntax_error("return 1;");
}

#[test]
fn this_outside_a_class_is_an_error() {
    expect_syntax_error("print this;");
    expect_syntax_error("fun f() { return this; } f();");
}

#[test]
fn duplicate_locals_in_one_scope_are_an_error() {
    expect_syntax_error("{ var a = 1; var a = 2; }");
}

#[test]
fn globals_may_be_redeclared() {
    assert_eq!("2\n", run_ok("var a = 1; var a = 2; print a;"));
}

#[test]
fn reading_a_local_in_its_own_initializer_is_an_error() {
    expect_syntax_error("var a = 1; { var a = a; }");
}

#[test]
fn returning_a_value_from_an_initializer_is_an_error() {
    expect_syntax_error("class C { init() { return 1; } }");
}

#[test]
fn a_bare_return_in_an_initializer_is_allowed() {
    assert_eq!(
        "C instance\n",
        run_ok("class C { init() { return; } } print C();")
    );
}

#[test]
fn a_syntax_error_prevents_execution() {
    let (output, syntax, _) = run("print 1; print ;");

    assert!(syntax);
    assert_eq!("", output);
}

// ─────────────────────────────────────────────────────────────────────────────
// Session behavior (REPL semantics)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn state_persists_across_runs_in_one_session() {
    let mut out: Vec<u8> = Vec::new();

    let mut session = Lox::new(&mut out);
    session.run(b"var a = 1;".to_vec());
    session.run(b"print a;".to_vec());
    drop(session);

    assert_eq!("1\n", String::from_utf8(out).unwrap());
}

#[test]
fn closures_built_in_an_earlier_run_keep_their_resolutions() {
    let mut out: Vec<u8> = Vec::new();

    let mut session = Lox::new(&mut out);
    session.run(
        b"fun makeCounter() { var i = 0; fun count() { i = i + 1; print i; } return count; } var c = makeCounter();"
            .to_vec(),
    );
    session.run(b"c(); c();".to_vec());
    drop(session);

    assert_eq!("1\n2\n", String::from_utf8(out).unwrap());
}

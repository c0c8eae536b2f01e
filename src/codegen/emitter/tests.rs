use std::collections::HashSet;

use super::*;
use crate::runtime::{Halt, Machine};
use crate::syntax::parser::Parser;

const LCL_BASE: i16 = 300;
const ARG_BASE: i16 = 400;
const THIS_BASE: i16 = 3000;
const THAT_BASE: i16 = 3010;

fn parse(name: &str, file_id: u16, source: &str) -> Module {
    Parser::new(source, file_id).parse_module(name).unwrap()
}

fn translate(name: &str, source: &str) -> Vec<Asm> {
    let mut emitter = Emitter::new();
    emitter.emit_module(&parse(name, 0, source)).unwrap();
    emitter.finish()
}

/// Bootstrap + several modules, as a directory build would produce.
fn translate_program(modules: &[(&str, &str)]) -> Vec<Asm> {
    let mut emitter = Emitter::new();
    emitter.emit_bootstrap(256, "Sys.init");
    for (i, (name, source)) in modules.iter().enumerate() {
        emitter.emit_module(&parse(name, i as u16, source)).unwrap();
    }
    emitter.finish()
}

fn render(asm: &[Asm]) -> String {
    asm.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run a bare (non-bootstrapped) fragment with fixed segment bases.
fn run_fragment(asm: &[Asm]) -> Machine {
    let mut m = Machine::load(asm).unwrap();
    m.set_ram(0, 256);
    m.set_ram(1, LCL_BASE);
    m.set_ram(2, ARG_BASE);
    m.set_ram(3, THIS_BASE);
    m.set_ram(4, THAT_BASE);
    let result = m.run(100_000).unwrap();
    assert_eq!(result.halt, Halt::EndOfProgram);
    m
}

fn run_program(asm: &[Asm]) -> Machine {
    let mut m = Machine::load(asm).unwrap();
    let result = m.run(5_000_000).unwrap();
    assert_eq!(result.halt, Halt::SelfLoop);
    m
}

fn stack_after(source: &str) -> Vec<i16> {
    let m = run_fragment(&translate("Main", source));
    m.stack().to_vec()
}

fn labels(asm: &[Asm]) -> Vec<&str> {
    asm.iter()
        .filter_map(|a| match a {
            Asm::Label(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

// ── Exact sequences ───────────────────────────────────────────────

#[test]
fn test_push_constant_then_pop_local_sequence() {
    let asm = translate("Main", "push constant 7\npop local 2\n");
    insta::assert_snapshot!(render(&asm), @r"
    @7
    D=A
    @SP
    A=M
    M=D
    @SP
    M=M+1
    @LCL
    D=M
    @2
    D=D+A
    @R13
    M=D
    @SP
    AM=M-1
    D=M
    @R13
    A=M
    M=D
    ");
}

#[test]
fn test_comparison_sequence() {
    let asm = translate("Main", "eq\n");
    insta::assert_snapshot!(render(&asm), @r"
    @SP
    AM=M-1
    D=M
    @SP
    AM=M-1
    D=M-D
    @Main$cmp$0
    D;JEQ
    D=0
    @Main$cmp$1
    0;JMP
    (Main$cmp$0)
    D=-1
    (Main$cmp$1)
    @SP
    A=M
    M=D
    @SP
    M=M+1
    ");
}

#[test]
fn test_bootstrap_sets_sp_then_calls_entry() {
    let mut emitter = Emitter::new();
    emitter.emit_bootstrap(256, "Sys.init");
    let text = render(emitter.output());
    assert!(text.starts_with("@256\nD=A\n@SP\nM=D\n@Sys.init$ret$0\nD=A\n"));
    assert!(text.ends_with("@Sys.init\n0;JMP\n(Sys.init$ret$0)"));
}

#[test]
fn test_only_three_line_forms() {
    let asm = translate_program(&[(
        "Sys",
        "function Sys.init 2\npush constant 1\nneg\nif-goto X\nlabel X\ncall Sys.f 0\nreturn\nfunction Sys.f 0\npush constant 0\nreturn\n",
    )]);
    for line in render(&asm).lines() {
        let ok = line.starts_with('@')
            || (line.starts_with('(') && line.ends_with(')'))
            || line.contains('=')
            || line.contains(';');
        assert!(ok, "unexpected line form: {}", line);
        assert_eq!(line.parse::<Asm>().unwrap().to_string(), line);
    }
}

// ── Arithmetic ────────────────────────────────────────────────────

#[test]
fn test_sub() {
    assert_eq!(stack_after("push constant 7\npush constant 2\nsub\n"), vec![5]);
}

#[test]
fn test_lt_false_and_true() {
    assert_eq!(stack_after("push constant 7\npush constant 2\nlt\n"), vec![0]);
    assert_eq!(stack_after("push constant 2\npush constant 7\nlt\n"), vec![-1]);
}

#[test]
fn test_gt_and_eq() {
    assert_eq!(stack_after("push constant 7\npush constant 2\ngt\n"), vec![-1]);
    assert_eq!(stack_after("push constant 2\npush constant 7\ngt\n"), vec![0]);
    assert_eq!(stack_after("push constant 4\npush constant 4\neq\n"), vec![-1]);
    assert_eq!(stack_after("push constant 4\npush constant 5\neq\n"), vec![0]);
    assert_eq!(stack_after("push constant 4\npush constant 4\ngt\n"), vec![0]);
}

#[test]
fn test_add_neg_and_or_not() {
    assert_eq!(stack_after("push constant 10\npush constant 5\nadd\n"), vec![15]);
    assert_eq!(stack_after("push constant 10\nneg\n"), vec![-10]);
    assert_eq!(stack_after("push constant 12\npush constant 10\nand\n"), vec![8]);
    assert_eq!(stack_after("push constant 12\npush constant 10\nor\n"), vec![14]);
    assert_eq!(stack_after("push constant 0\nnot\n"), vec![-1]);
}

#[test]
fn test_operands_keep_order_below_the_top() {
    assert_eq!(
        stack_after("push constant 1\npush constant 9\npush constant 3\nsub\n"),
        vec![1, 6]
    );
}

// ── Segments ──────────────────────────────────────────────────────

#[test]
fn test_end_to_end_local_add() {
    let m = run_fragment(&translate(
        "Main",
        "push constant 10\npop local 0\npush local 0\npush constant 5\nadd\n",
    ));
    assert_eq!(m.stack(), &[15]);
    assert_eq!(m.ram(LCL_BASE as u16), 10);
}

#[test]
fn test_push_pop_round_trip_every_segment() {
    let cases: [(&str, u16); 10] = [
        ("local", 0),
        ("local", 3),
        ("argument", 1),
        ("this", 2),
        ("that", 5),
        ("static", 4),
        ("temp", 0),
        ("temp", 7),
        ("pointer", 0),
        ("pointer", 1),
    ];
    for (segment, index) in cases {
        let source = format!("push {segment} {index}\npop {segment} {index}\n");
        let asm = translate("Main", &source);
        let mut m = Machine::load(&asm).unwrap();
        m.set_ram(0, 256);
        m.set_ram(1, LCL_BASE);
        m.set_ram(2, ARG_BASE);
        m.set_ram(3, THIS_BASE);
        m.set_ram(4, THAT_BASE);
        let addr = match segment {
            "local" => LCL_BASE as u16 + index,
            "argument" => ARG_BASE as u16 + index,
            "this" => THIS_BASE as u16 + index,
            "that" => THAT_BASE as u16 + index,
            "static" => m.symbol("Main.4").unwrap(),
            "temp" => 5 + index,
            _ => 3 + index,
        };
        let value = if segment == "pointer" { 5000 } else { 1234 };
        m.set_ram(addr, value);
        m.run(1_000).unwrap();
        assert_eq!(m.ram(addr), value, "{} {}", segment, index);
        assert_eq!(m.sp(), 256, "{} {}", segment, index);
    }
}

#[test]
fn test_pointer_redirects_this_and_that() {
    let m = run_fragment(&translate(
        "Main",
        "push constant 5000\npop pointer 0\npush constant 6000\npop pointer 1\npush constant 11\npop this 2\npush constant 22\npop that 3\n",
    ));
    assert_eq!(m.ram(3), 5000);
    assert_eq!(m.ram(4), 6000);
    assert_eq!(m.ram(5002), 11);
    assert_eq!(m.ram(6003), 22);
}

#[test]
fn test_temp_maps_to_r5_through_r12() {
    let m = run_fragment(&translate(
        "Main",
        "push constant 8\npop temp 0\npush constant 9\npop temp 7\n",
    ));
    assert_eq!(m.ram(5), 8);
    assert_eq!(m.ram(12), 9);
}

#[test]
fn test_static_is_namespaced_per_module() {
    let mut emitter = Emitter::new();
    emitter
        .emit_module(&parse("Foo", 0, "push constant 1\npop static 0\n"))
        .unwrap();
    emitter
        .emit_module(&parse("Bar", 1, "push constant 2\npop static 0\n"))
        .unwrap();
    let asm = emitter.finish();
    let m = run_fragment(&asm);
    let foo = m.symbol("Foo.0").unwrap();
    let bar = m.symbol("Bar.0").unwrap();
    assert_ne!(foo, bar);
    assert_eq!(m.ram(foo), 1);
    assert_eq!(m.ram(bar), 2);
}

#[test]
fn test_pop_constant_is_an_error() {
    let mut emitter = Emitter::new();
    let err = emitter
        .emit_module(&parse("Main", 0, "push constant 1\npop constant 3\n"))
        .unwrap_err();
    assert_eq!(err.message, "cannot pop into the constant segment");
    assert_eq!(err.span.start, 16);
}

#[test]
fn test_out_of_range_pointer_aborts_translation() {
    let mut emitter = Emitter::new();
    let err = emitter
        .emit_module(&parse("Main", 0, "push pointer 2\n"))
        .unwrap_err();
    assert!(err.message.starts_with("pointer index 2 out of range"));
}

// ── Control flow ──────────────────────────────────────────────────

#[test]
fn test_if_goto_loop_sums_down() {
    // local 0 = n, local 1 = acc; acc = 5 + 4 + 3 + 2 + 1
    let source = "\
push constant 5
pop local 0
push constant 0
pop local 1
label LOOP
push local 0
push constant 0
eq
if-goto DONE
push local 1
push local 0
add
pop local 1
push local 0
push constant 1
sub
pop local 0
goto LOOP
label DONE
push local 1
";
    let m = run_fragment(&translate("Main", source));
    assert_eq!(m.stack(), &[15]);
}

#[test]
fn test_if_goto_falls_through_on_zero() {
    let source = "push constant 0\nif-goto SKIP\npush constant 1\nlabel SKIP\npush constant 2\n";
    assert_eq!(stack_after(source), vec![1, 2]);
}

#[test]
fn test_labels_are_scoped_to_functions_across_files() {
    let mut emitter = Emitter::new();
    emitter
        .emit_module(&parse("Foo", 0, "function Foo.foo 0\nlabel LOOP\ngoto LOOP\n"))
        .unwrap();
    emitter
        .emit_module(&parse("Bar", 1, "function Bar.bar 0\nlabel LOOP\ngoto LOOP\n"))
        .unwrap();
    let asm = emitter.finish();
    let defined = labels(&asm);
    assert!(defined.contains(&"Foo.foo$LOOP"));
    assert!(defined.contains(&"Bar.bar$LOOP"));
    assert!(Machine::load(&asm).is_ok());
}

#[test]
fn test_module_scope_label_distinct_from_same_named_function() {
    let asm = translate(
        "Foo",
        "label L\ngoto L\nfunction Foo 0\nlabel L\npush constant 0\nreturn\n",
    );
    assert_eq!(labels(&asm), ["Foo$$L", "Foo", "Foo$L"]);
    assert!(Machine::load(&asm).is_ok());
}

#[test]
fn test_repeated_comparisons_never_reuse_labels() {
    let asm = translate_program(&[
        (
            "Sys",
            "function Sys.init 0\npush constant 1\npush constant 1\neq\npush constant 1\npush constant 2\neq\nlt\ngt\nreturn\n",
        ),
        (
            "Main",
            "function Main.f 0\npush constant 3\npush constant 3\neq\nreturn\nfunction Main.g 0\ncall Main.f 0\ncall Main.f 0\nreturn\n",
        ),
    ]);
    let defined = labels(&asm);
    let unique: HashSet<_> = defined.iter().collect();
    assert_eq!(unique.len(), defined.len(), "duplicate label in {:?}", defined);
    assert!(Machine::load(&asm).is_ok());
}

// ── Calling convention ────────────────────────────────────────────

#[test]
fn test_call_with_no_args_reserves_header() {
    let asm = translate_program(&[("Sys", "function Sys.init 0\nlabel END\ngoto END\n")]);
    let m = run_program(&asm);
    assert_eq!(m.sp(), 261);
    assert_eq!(m.ram(1), 261);
    assert_eq!(m.ram(2), 256);
    let ret = Machine::load(&asm).unwrap().symbol("Sys.init$ret$0").unwrap();
    assert_eq!(m.ram(256) as u16, ret);
    assert_eq!(&[m.ram(257), m.ram(258), m.ram(259), m.ram(260)], &[0, 0, 0, 0]);
}

#[test]
fn test_function_zeroes_its_locals() {
    let sys = "function Sys.init 3\npush local 0\npush local 1\npush local 2\nadd\nadd\npop temp 0\nlabel END\ngoto END\n";
    let asm = translate_program(&[("Sys", sys)]);
    let mut m = Machine::load(&asm).unwrap();
    for addr in 256..300 {
        m.set_ram(addr, 99);
    }
    assert_eq!(m.run(100_000).unwrap().halt, Halt::SelfLoop);
    assert_eq!(m.ram(5), 0);
    assert_eq!(m.ram(1), 261);
    assert_eq!(m.sp(), 264);
    assert_eq!(&[m.ram(261), m.ram(262), m.ram(263)], &[0, 0, 0]);
}

#[test]
fn test_return_value_lands_in_first_argument_slot() {
    let sys = "\
function Sys.init 0
push constant 100
push constant 30
push constant 12
call Main.add2 2
pop temp 1
pop temp 0
label END
goto END
";
    let main = "function Main.add2 0\npush argument 0\npush argument 1\nadd\nreturn\n";
    let m = run_program(&translate_program(&[("Sys", sys), ("Main", main)]));
    assert_eq!(m.ram(6), 42);
    assert_eq!(m.ram(5), 100);
    assert_eq!(m.sp(), 261);
}

#[test]
fn test_zero_arg_return_reads_address_before_overwrite() {
    let sys = "function Sys.init 0\ncall Main.seven 0\npop temp 0\nlabel END\ngoto END\n";
    let main = "function Main.seven 0\npush constant 7\nreturn\n";
    let m = run_program(&translate_program(&[("Sys", sys), ("Main", main)]));
    assert_eq!(m.ram(5), 7);
    assert_eq!(m.sp(), 261);
}

const RECURSIVE_SUM: &str = "\
function Main.sum 1
push argument 0
pop pointer 1
push argument 0
pop pointer 0
push argument 0
pop local 0
push local 0
push constant 0
eq
if-goto BASE
push local 0
push local 0
push constant 1
sub
call Main.sum 1
add
return
label BASE
push constant 0
return
";

fn recursive_sum_program(n: u16) -> Vec<Asm> {
    let sys = format!(
        "function Sys.init 0\npush constant 3000\npop pointer 0\npush constant 3010\npop pointer 1\npush constant {n}\ncall Main.sum 1\npop temp 0\nlabel END\ngoto END\n"
    );
    translate_program(&[("Sys", &sys), ("Main", RECURSIVE_SUM)])
}

#[test]
fn test_recursive_calls_restore_frame() {
    let m = run_program(&recursive_sum_program(4));
    assert_eq!(m.ram(5), 10);
    // Back in Sys.init's frame with an empty working stack.
    assert_eq!(m.sp(), 261);
    assert_eq!(m.ram(1), 261);
    assert_eq!(m.ram(2), 256);
    assert_eq!(m.ram(3), 3000);
    assert_eq!(m.ram(4), 3010);
}

#[test]
fn test_deep_recursion() {
    let m = run_program(&recursive_sum_program(100));
    assert_eq!(m.ram(5), 5050);
    assert_eq!(m.sp(), 261);
    assert_eq!(m.ram(3), 3000);
}

#[test]
fn test_return_labels_unique_per_call_site() {
    let sys = "function Sys.init 0\ncall Main.seven 0\ncall Main.seven 0\nadd\npop temp 0\nlabel END\ngoto END\n";
    let main = "function Main.seven 0\npush constant 7\nreturn\n";
    let asm = translate_program(&[("Sys", sys), ("Main", main)]);
    let defined = labels(&asm);
    assert!(defined.contains(&"Main.seven$ret$1"));
    assert!(defined.contains(&"Main.seven$ret$2"));
    let m = run_program(&asm);
    assert_eq!(m.ram(5), 14);
}

// ── Determinism ───────────────────────────────────────────────────

#[test]
fn test_identical_input_gives_identical_output() {
    let first = render(&recursive_sum_program(4));
    let second = render(&recursive_sum_program(4));
    assert_eq!(first, second);
}

#[test]
fn test_reset_restarts_label_numbering() {
    let module = parse("Main", 0, "push constant 1\npush constant 2\nlt\ncall Main.f 0\n");
    let mut emitter = Emitter::new();
    emitter.emit_module(&module).unwrap();
    let first = render(emitter.output());
    emitter.reset();
    assert_eq!(emitter.ctx, TranslationContext::new());
    emitter.emit_module(&module).unwrap();
    assert_eq!(render(emitter.output()), first);
}

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use minilisp::lexer::{lex, tokenize};
use minilisp::parser::parse_str;
use minilisp::{Environment, eval_str};

// A reasonably varied program for benchmarking the reader and evaluator
const BENCH_INPUT: &str = r#"
(def double (lambda (x) (plus x x)))
(def r1 (lambda (x r) (if (eq 10 x) "true" (r (plus 1 x) r))))
(def count (lambda (n acc) (if (eq n 0) acc (count (plus n -1) (plus acc 1)))))
(defmacro five (lambda (xs) 5))
(p "string with spaces" (quote (a b c)) 123 -10)
(cons "a" (quote ("b" "c" ("d" "e"))))
(car (cdr (quote (1 2 3 4 5 6 7 8 9 10))))
(five one two three)
(double (double (double 5)))
(r1 0 r1)
(count 200 0)
"#;

fn bench_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reader");

    group.bench_with_input(BenchmarkId::new("lex", "program"), &BENCH_INPUT, |b, input| {
        b.iter(|| lex(black_box(input)))
    });
    group.bench_with_input(
        BenchmarkId::new("tokenize", "program"),
        &BENCH_INPUT,
        |b, input| b.iter(|| tokenize(black_box(input))),
    );
    group.bench_with_input(
        BenchmarkId::new("parse_str", "program"),
        &BENCH_INPUT,
        |b, input| b.iter(|| parse_str(black_box(input))),
    );

    group.finish();
}

fn bench_evaluator(c: &mut Criterion) {
    let mut group = c.benchmark_group("Evaluator");

    // `p` writes to stdout, so it is left out of the evaluation benchmark.
    let program: String = BENCH_INPUT
        .lines()
        .filter(|line| !line.starts_with("(p "))
        .collect::<Vec<_>>()
        .join("\n");

    group.bench_with_input(
        BenchmarkId::new("eval_str", "program"),
        &program,
        |b, input| {
            b.iter(|| {
                let env = Environment::new_global_populated();
                eval_str(black_box(input), env)
            })
        },
    );

    group.finish();
}

criterion_group!(benches, bench_reader, bench_evaluator);
criterion_main!(benches);

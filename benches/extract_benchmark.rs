use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use go_surface::check::{SemanticChecker, SourceChecker};
use go_surface::syntax::{parse_source, tokenize, ParseOptions, ParsedFile};
use go_surface::{Extractor, ImportChain, TypeResolver};
use std::fmt::Write as _;
use std::hint::black_box as bb;

// =============================================================================
// Corpus
// =============================================================================

const SMALL_HELLO_WORLD: &str = r#"
package main

// Greeting is printed by main.
const Greeting = "Hello, World!"

func main() {
    println(Greeting)
}
"#;

const MEDIUM_STRUCT_METHODS: &str = r#"
package geometry

// Point is a location on a plane.
type Point struct {
    X, Y float64 `json:"x"`
}

func (p Point) Abs() float64 {
    return sqrt(p.X*p.X + p.Y*p.Y)
}

func (p *Point) Scale(f float64) {
    p.X = p.X * f
    p.Y = p.Y * f
}

// Rectangle is axis aligned.
type Rectangle struct {
    Min, Max Point
    Label    string `json:"label,omitempty"`
}

func (r Rectangle) Area() float64 {
    return (r.Max.X - r.Min.X) * (r.Max.Y - r.Min.Y)
}

type Shape interface {
    Area() float64
}

func sqrt(x float64) float64 { return x }
"#;

const LARGE_COMPLEX: &str = r#"
package compiler

type TokenKind int

const (
    TokEOF TokenKind = iota
    TokIdent
    TokNumber
    TokString
)

const MaxDepth = 1 << 10

var Keywords = map[string]TokenKind{"func": TokIdent}

type Token struct {
    Kind TokenKind
    Text string
    Line int
}

type Lexer struct {
    input  []byte
    pos    int
    line   int
    tokens []Token
}

type Visitor interface {
    Visit(tok Token) (next Visitor, err error)
    Done() <-chan struct{}
}

type Handler func(tok *Token, depth int) bool

type Table[K comparable, V any] struct {
    entries map[K][]V
    Parent  *Table[K, V]
}

func NewLexer(source string) *Lexer {
    return &Lexer{
        input: []byte(source),
        pos:   0,
        line:  1,
    }
}

func (l *Lexer) NextToken() Token {
    if l.pos >= len(l.input) {
        return Token{Kind: TokEOF, Line: l.line}
    }
    l.pos++
    return Token{Kind: TokIdent, Line: l.line}
}

func (l *Lexer) Walk(v Visitor, handlers ...Handler) (int, error) {
    return 0, nil
}
"#;

/// `n` exported structs, each with a method and a typed constant.
fn generated_package(n: usize) -> String {
    let mut src = String::from("package gen\n\n");
    for i in 0..n {
        let _ = write!(
            src,
            "// Item{i} is generated.\ntype Item{i} struct {{\n\tID int `json:\"id\"`\n\tNext *Item{i}\n}}\n\n\
             const Size{i} int = {i}\n\n\
             func (it *Item{i}) Get(key string) (value []byte, ok bool) {{ return nil, false }}\n\n"
        );
    }
    src
}

fn parsed(src: &str) -> ParsedFile {
    parse_source("bench.go", src, ParseOptions::default()).expect("benchmark source parses")
}

fn corpora() -> [(&'static str, &'static str); 3] {
    [
        ("small", SMALL_HELLO_WORLD),
        ("medium", MEDIUM_STRUCT_METHODS),
        ("large", LARGE_COMPLEX),
    ]
}

// =============================================================================
// Benchmark 1: front end (lexing and parsing)
// =============================================================================

fn bench_front_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("front_end");

    for (name, input) in corpora() {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("tokenize", name), &input, |b, &input| {
            b.iter(|| bb(tokenize(bb(input)).tokens.len()));
        });
        group.bench_with_input(BenchmarkId::new("parse", name), &input, |b, &input| {
            b.iter(|| bb(parse_source("bench.go", bb(input), ParseOptions::default()).is_ok()));
        });
    }

    group.finish();
}

// =============================================================================
// Benchmark 2: extraction over an already parsed file
//  - syntax: source-text signatures only
//  - resolved: check + extraction, no imports involved
// =============================================================================

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");

    for (name, input) in corpora() {
        let file = parsed(input);
        group.throughput(Throughput::Bytes(input.len() as u64));

        group.bench_with_input(BenchmarkId::new("syntax", name), &file, |b, file| {
            b.iter(|| bb(Extractor::new(TypeResolver::syntax(file)).extract()));
        });

        group.bench_with_input(BenchmarkId::new("resolved", name), &file, |b, file| {
            b.iter_batched(
                ImportChain::new,
                |chain| {
                    let info = SourceChecker::strict()
                        .check("bench", &[file], &chain)
                        .expect("benchmark source checks");
                    let types = info.file(0).cloned().unwrap_or_default();
                    bb(Extractor::new(TypeResolver::resolved(file, &info, &types)).extract())
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// =============================================================================
// Benchmark 3: scalability with declaration count
// =============================================================================

fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");

    for &n in &[10usize, 100, 500, 1000] {
        let src = generated_package(n);
        let file = parsed(&src);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("parse_and_extract_syntax", n), &src, |b, src| {
            b.iter(|| {
                let file = parsed(bb(src));
                bb(Extractor::new(TypeResolver::syntax(&file)).extract())
            });
        });

        group.bench_with_input(BenchmarkId::new("check_and_extract", n), &file, |b, file| {
            b.iter(|| {
                let chain = ImportChain::new();
                let info = SourceChecker::strict()
                    .check("gen", &[file], &chain)
                    .expect("generated source checks");
                let types = info.file(0).cloned().unwrap_or_default();
                bb(Extractor::new(TypeResolver::resolved(file, &info, &types)).extract())
            });
        });
    }

    group.finish();
}

// =============================================================================
// Criterion registration
// =============================================================================

criterion_group!(benches, bench_front_end, bench_extract, bench_scalability);
criterion_main!(benches);

use go_surface_syntax::ast::{GenDeclKind, ImportName, InterfaceElem, Spec, TopLevelDecl, Type};
use go_surface_syntax::{parse_source, ParseOptions, ParsedFile};

fn parse(src: &str) -> ParsedFile {
    match parse_source("test.go", src, ParseOptions::default()) {
        Ok(file) => file,
        Err(e) => panic!("{e}"),
    }
}

const SAMPLE: &str = r#"// Package sample is documentation.
package sample

import (
	"fmt"
	str "strings"
	. "math"
	_ "embed"
)

// Greeting is the default greeting.
const Greeting = "hi"

const (
	A = iota
	B
	C
)

// Shape describes things with area.
type Shape interface {
	// Area returns the area.
	Area() float64
	fmt.Stringer
}

type Point struct {
	X, Y int `json:"x"`
	label string
}

// Dist returns the distance.
func (p *Point) Dist(q Point) (float64, error) {
	return Sqrt(float64(p.X*q.X)), nil
}

func Map[T, U any](xs []T, f func(T) U) []U { return nil }
"#;

#[test]
fn parses_a_realistic_file() {
    let file = parse(SAMPLE);
    assert_eq!(file.package_name(), "sample");
    assert!(file.root.doc.is_some());
    assert_eq!(file.root.decls.len(), 7);
}

#[test]
fn import_names_and_paths() {
    let file = parse(SAMPLE);
    let TopLevelDecl::Gen(imports) = &file.root.decls[0] else {
        panic!("expected imports");
    };
    assert_eq!(imports.kind, GenDeclKind::Import);
    let specs: Vec<(Option<ImportName>, String)> = imports
        .specs
        .iter()
        .map(|s| match s {
            Spec::Import(i) => (i.name, file.string_value(i.path).into_owned()),
            _ => panic!("expected import spec"),
        })
        .collect();
    assert_eq!(specs[0].1, "fmt");
    assert!(specs[0].0.is_none());
    assert!(matches!(specs[1].0, Some(ImportName::Name(n)) if file.name(n) == "str"));
    assert!(matches!(specs[2].0, Some(ImportName::Dot(_))));
    assert!(matches!(specs[3].0, Some(ImportName::Blank(_))));
}

#[test]
fn docs_attach_to_declarations() {
    let file = parse(SAMPLE);
    let TopLevelDecl::Gen(konst) = &file.root.decls[1] else {
        panic!("expected const");
    };
    let doc = konst.doc.map(|g| file.comment_texts(g).collect::<Vec<_>>());
    assert_eq!(doc, Some(vec!["// Greeting is the default greeting."]));

    let TopLevelDecl::Func(dist) = &file.root.decls[5] else {
        panic!("expected method");
    };
    assert!(dist.recv.is_some());
    assert!(dist.doc.is_some());
    assert_eq!(dist.sig.results.as_ref().map(|r| r.fields.len()), Some(2));
}

#[test]
fn iota_indices_follow_group_order() {
    let file = parse(SAMPLE);
    let TopLevelDecl::Gen(group) = &file.root.decls[2] else {
        panic!("expected const group");
    };
    assert!(group.grouped);
    let iotas: Vec<u32> = group
        .specs
        .iter()
        .map(|s| match s {
            Spec::Value(v) => v.iota,
            _ => u32::MAX,
        })
        .collect();
    assert_eq!(iotas, vec![0, 1, 2]);
}

#[test]
fn interface_methods_and_embeds() {
    let file = parse(SAMPLE);
    let TopLevelDecl::Gen(decl) = &file.root.decls[3] else {
        panic!("expected type decl");
    };
    let Spec::Type(spec) = &decl.specs[0] else {
        panic!("expected type spec");
    };
    let Type::Interface { elems } = &file.arena.types[spec.typ] else {
        panic!("expected interface");
    };
    assert_eq!(elems.len(), 2);
    assert!(matches!(&elems[0], InterfaceElem::Method { doc: Some(_), .. }));
    assert!(matches!(&elems[1], InterfaceElem::Embed(_)));
}

#[test]
fn generic_function_type_params() {
    let file = parse(SAMPLE);
    let TopLevelDecl::Func(f) = &file.root.decls[6] else {
        panic!("expected func");
    };
    assert_eq!(f.type_params.len(), 1);
    assert_eq!(f.type_params[0].names.len(), 2);
    assert_eq!(f.sig.params.fields.len(), 2);
}

#[test]
fn without_comments_no_docs_are_attached() {
    let file = parse_source("a.go", SAMPLE, ParseOptions { comments: false })
        .unwrap_or_else(|e| panic!("{e}"));
    assert!(file.root.doc.is_none());
    assert!(file.root.comments.is_empty());
}

#[test]
fn syntax_errors_report_position() {
    let err = parse_source("bad.go", "package p\n\nfunc (\n", ParseOptions::default())
        .err()
        .map(|e| (e.line, e.path.clone(), e.to_string()));
    let (line, path, msg) = err.unwrap_or_else(|| panic!("expected failure"));
    assert_eq!(path, "bad.go");
    assert!(line >= 3, "{msg}");
    assert!(msg.starts_with("bad.go:"), "{msg}");
}

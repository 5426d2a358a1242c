// tests/embed_tests.rs

use goembed::assets::{Addresser, FsLoader, LoadErrorKind, MemoryLoader};
use goembed::syntax::{self, Decl, SourceFile};
use goembed::{EmbedError, EmbedOptions, Embedded, Embedder, Outcome, SourceContext};

const FIXTURE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/webapp");

fn embed_with(loader: &MemoryLoader, text: &str) -> Result<Embedded, EmbedError> {
    Embedder::with_loader(EmbedOptions::default(), loader)
        .embed_source(&SourceContext::from_file("main.go", text))
}

fn identifier_for(filename: &str) -> String {
    let addresser = Addresser::default();
    addresser.identifier(&addresser.address(filename))
}

fn reparse(text: &str) -> SourceFile {
    syntax::parse(&SourceContext::from_file("out.go", text)).unwrap()
}

/// One line per top-level declaration: `import`, `var NAME`, `func NAME`...
fn outline(file: &SourceFile) -> Vec<String> {
    file.decls
        .iter()
        .map(|decl| match &decl.value {
            Decl::Import(_) => "import".to_string(),
            Decl::Const(v) => format!("const {}", v.specs[0].value.names[0].value),
            Decl::Var(v) => format!("var {}", v.specs[0].value.names[0].value),
            Decl::Type(t) => format!("type {}", t.specs[0].value.name.value),
            Decl::Func(f) => format!("func {}", f.name.value),
        })
        .collect()
}

// ---
// No-op and determinism
// ---

#[test]
fn test_file_without_marker_import_is_untouched() {
    let text = "package main\n\nimport \"fmt\"\n\n// Hello.\nfunc main() {\n\tfmt.Println(\"hi\")  // odd spacing stays\n}\n";
    let loader = MemoryLoader::new();
    let embedded = embed_with(&loader, text).unwrap();

    assert_eq!(embedded.source, text);
    assert_eq!(embedded.report.outcome, Outcome::Unchanged);
    assert!(loader.loads().is_empty());
}

#[test]
fn test_output_is_deterministic() {
    let text = "package main\n\nimport \"github.com/sysr-q/assets\"\n\nfunc main() {\n\ta := assets.MustRead(\"a.txt\")\n\tb := assets.MustRead(\"b.txt\")\n\t_, _ = a, b\n}\n";
    let loader = MemoryLoader::new()
        .with_file("a.txt", *b"alpha")
        .with_file("b.txt", *b"beta");

    let first = embed_with(&loader, text).unwrap();
    let second = embed_with(&loader, text).unwrap();
    assert_eq!(first.source, second.source);
}

// ---
// Call sites
// ---

#[test]
fn test_repeated_filename_shares_one_declaration() {
    let text = "package main\n\nimport \"github.com/sysr-q/assets\"\n\nfunc main() {\n\ta := assets.MustRead(\"a.txt\")\n\tb := assets.Read(\"a.txt\")\n\tc := string(assets.MustRead(`a.txt`))\n\t_, _, _ = a, b, c\n}\n";
    let loader = MemoryLoader::new().with_file("a.txt", *b"x");
    let embedded = embed_with(&loader, text).unwrap();

    let id = identifier_for("a.txt");
    assert_eq!(loader.loads(), ["a.txt"]);
    assert_eq!(embedded.report.rewrites, 3);
    assert_eq!(embedded.report.assets.len(), 1);
    assert_eq!(embedded.source.matches(&format!("var {id} =")).count(), 1);
    assert!(embedded.source.contains(&format!("\ta := {id}\n")));
    assert!(embedded.source.contains(&format!("\tb := {id}\n")));
    assert!(embedded.source.contains(&format!("\tc := string({id})\n")));
}

#[test]
fn test_every_expression_position_is_rewritten() {
    let text = "package main\n\nimport \"github.com/sysr-q/assets\"\n\nfunc main() {\n\tassets.MustRead(\"bare.txt\")\n\tx := assets.MustRead(\"rhs.txt\")\n\tuse(len(assets.Read(\"nested.txt\")), x)\n}\n";
    let loader = MemoryLoader::new()
        .with_file("bare.txt", *b"1")
        .with_file("rhs.txt", *b"2")
        .with_file("nested.txt", *b"3");
    let embedded = embed_with(&loader, text).unwrap();

    assert_eq!(embedded.report.rewrites, 3);
    assert_eq!(embedded.report.assets.len(), 3);
    assert!(!embedded.source.contains("assets.MustRead"));
    assert!(!embedded.source.contains("assets.Read("));
    assert!(embedded.source.contains(&format!("\t_ = {}\n", identifier_for("bare.txt"))));
    assert!(embedded.source.contains(&format!("\tx := {}\n", identifier_for("rhs.txt"))));
    assert!(embedded
        .source
        .contains(&format!("\tuse(len({}), x)\n", identifier_for("nested.txt"))));
}

#[test]
fn test_call_sites_inside_closures_and_composites() {
    let text = "package main\n\nimport \"github.com/sysr-q/assets\"\n\nvar pages = map[string][]byte{\n\t\"index\": assets.MustRead(\"index.html\"),\n}\n\nvar lazy = func() []byte { return assets.MustRead(\"late.txt\") }\n";
    let loader = MemoryLoader::new()
        .with_file("index.html", *b"i")
        .with_file("late.txt", *b"l");
    let embedded = embed_with(&loader, text).unwrap();

    assert_eq!(embedded.report.rewrites, 2);
    assert!(embedded
        .source
        .contains(&format!("\t\"index\": {},\n", identifier_for("index.html"))));
    assert!(embedded.source.contains(&format!("return {}", identifier_for("late.txt"))));
}

#[test]
fn test_non_literal_calls_are_preserved() {
    let text = "package main\n\nimport \"github.com/sysr-q/assets\"\n\nfunc load(name string) []byte {\n\treturn assets.MustRead(name)\n}\n\nvar a = assets.MustRead(\"a\", \"b\")\nvar b = assets.MustRead((\"c\"))\nvar c = assets.Open(\"d\")\n";
    let loader = MemoryLoader::new();
    let embedded = embed_with(&loader, text).unwrap();

    assert!(loader.loads().is_empty());
    assert!(embedded.report.assets.is_empty());
    assert!(embedded.source.contains("\treturn assets.MustRead(name)\n"));
    assert!(embedded.source.contains("var a = assets.MustRead(\"a\", \"b\")\n"));
    assert!(embedded.source.contains("var b = assets.MustRead((\"c\"))\n"));
    assert!(embedded.source.contains("var c = assets.Open(\"d\")\n"));
    // The import keeper is still emitted.
    assert!(embedded.source.contains("var _ = assets.Read\n"));
}

#[test]
fn test_other_packages_with_same_function_names_are_ignored() {
    let text = "package main\n\nimport (\n\t\"github.com/sysr-q/assets\"\n\tother \"example.com/assets\"\n)\n\nvar a = other.MustRead(\"a.txt\")\n";
    let loader = MemoryLoader::new();
    let embedded = embed_with(&loader, text).unwrap();
    assert!(embedded.source.contains("var a = other.MustRead(\"a.txt\")\n"));
    assert!(loader.loads().is_empty());
}

// ---
// Declaration order
// ---

#[test]
fn test_declarations_follow_header_in_first_appearance_order() {
    let text = "package main\n\nimport \"os\"\nimport \"github.com/sysr-q/assets\"\n\nconst name = \"x\"\n\ntype T struct{}\n\nfunc f() []byte { return assets.MustRead(\"second.txt\") }\n\nvar first = assets.Read(\"first.txt\")\n\nfunc g() []byte { return assets.MustRead(\"second.txt\") }\n";
    let loader = MemoryLoader::new()
        .with_file("first.txt", *b"1")
        .with_file("second.txt", *b"2");
    let embedded = embed_with(&loader, text).unwrap();

    let second = identifier_for("second.txt");
    let first = identifier_for("first.txt");
    assert_eq!(
        outline(&reparse(&embedded.source)),
        [
            "import".to_string(),
            "import".to_string(),
            format!("var {second}"),
            format!("var {first}"),
            "var _".to_string(),
            "const name".to_string(),
            "type T".to_string(),
            "func f".to_string(),
            "var first".to_string(),
            "func g".to_string(),
        ]
    );
}

// ---
// Failures
// ---

#[test]
fn test_missing_asset_is_fatal() {
    let text = "package main\n\nimport \"github.com/sysr-q/assets\"\n\nvar a = assets.MustRead(\"missing.html\")\n";
    let err = embed_with(&MemoryLoader::new(), text).unwrap_err();
    match err {
        EmbedError::Load {
            filename,
            error,
            span,
            ..
        } => {
            assert_eq!(filename, "missing.html");
            assert_eq!(error.kind, LoadErrorKind::NotFound);
            assert_eq!(span.offset(), text.find("\"missing.html\"").unwrap());
        }
        other => panic!("expected a load error, got {other:?}"),
    }
}

#[test]
fn test_missing_asset_names_the_path_tried() {
    let dir = tempfile::tempdir().unwrap();
    let options = EmbedOptions {
        asset_root: dir.path().to_path_buf(),
        ..EmbedOptions::default()
    };
    let text = "package main\n\nimport \"github.com/sysr-q/assets\"\n\nvar a = assets.MustRead(\"nope.txt\")\n";
    let err = Embedder::new(options)
        .embed_source(&SourceContext::from_file("main.go", text))
        .unwrap_err();
    match err {
        EmbedError::Load { hint: Some(hint), .. } => assert!(hint.contains("nope.txt")),
        other => panic!("expected a load error with a hint, got {other:?}"),
    }
}

#[test]
fn test_existing_identifier_collides() {
    let id = identifier_for("a.txt");
    let text = format!(
        "package main\n\nimport \"github.com/sysr-q/assets\"\n\nfunc {id}() {{}}\n\nvar a = assets.MustRead(\"a.txt\")\n"
    );
    let err = embed_with(&MemoryLoader::new().with_file("a.txt", *b"a"), &text).unwrap_err();
    assert!(
        matches!(err, EmbedError::IdentifierCollision { ref identifier, ref filename, .. } if *identifier == id && filename == "a.txt")
    );
}

#[test]
fn test_malformed_source_is_a_parse_error() {
    let text = "package main\n\nimport \"github.com/sysr-q/assets\"\n\nfunc main() {\n";
    let err = embed_with(&MemoryLoader::new(), text).unwrap_err();
    assert!(matches!(err, EmbedError::Parse { .. }));
}

// ---
// End to end
// ---

#[test]
fn test_embeds_small_file_on_one_line() {
    let text = "package main\n\nimport \"github.com/sysr-q/assets\"\n\nfunc main() {\n\tpage := assets.MustRead(\"templates/index.html\")\n\t_ = page\n}\n";
    let loader = MemoryLoader::new().with_file("templates/index.html", [0x3c_u8, 0x68, 0x31, 0x3e]);
    let embedded = embed_with(&loader, text).unwrap();

    let id = identifier_for("templates/index.html");
    assert_eq!(id.len(), "Asset_".len() + 12);
    assert_eq!(
        embedded.source,
        format!(
            "package main\n\nimport \"github.com/sysr-q/assets\"\n\nvar {id} = []byte{{0x3c, 0x68, 0x31, 0x3e}}\nvar _ = assets.Read\n\nfunc main() {{\n\tpage := {id}\n\t_ = page\n}}\n"
        )
    );
}

#[test]
fn test_webapp_fixture() {
    let source = SourceContext::from_file(
        "main.go",
        std::fs::read_to_string(format!("{FIXTURE_DIR}/main.go")).unwrap(),
    );
    let embedder = Embedder::with_loader(EmbedOptions::default(), FsLoader::new(FIXTURE_DIR));
    let embedded = embedder.embed_source(&source).unwrap();

    let layout = identifier_for("templates/layout.html");
    let index = identifier_for("templates/index.html");
    let out = &embedded.source;

    assert_eq!(embedded.report.rewrites, 3);
    assert_eq!(
        embedded
            .report
            .assets
            .iter()
            .map(|a| a.filename.as_str())
            .collect::<Vec<_>>(),
        ["templates/layout.html", "templates/index.html"]
    );
    assert!(out.contains(&format!("\ts := string({layout})\n")));
    assert!(out.contains(&format!("\ts := string({index})\n")));
    assert!(out.contains(&format!("\t// /dev/null for you!\n\t_ = string({layout})\n")));
    assert!(out.contains(&format!("var {index} = []byte{{0x3c, 0x68, 0x31, 0x3e}}\n")));
    assert!(out.contains(")\n\nvar Asset_"));
    assert!(out.contains("var _ = assets.Read\n\nvar Foo_1234 = []byte{0x01, 0x02, 0x03}\n"));
    assert!(!out.contains("assets.MustRead"));

    assert_eq!(
        outline(&reparse(out)),
        [
            "import".to_string(),
            format!("var {layout}"),
            format!("var {index}"),
            "var _".to_string(),
            "var Foo_1234".to_string(),
            "func tmpl".to_string(),
            "func indexHandler".to_string(),
            "func main".to_string(),
        ]
    );
}

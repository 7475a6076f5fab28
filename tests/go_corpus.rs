use go_surface::{parse_source, Config};
use walkdir::WalkDir;

/// Extracts every `.go` file under `$GO_SURFACE_CORPUS` in syntax mode.
#[test]
fn extracts_go_corpus_if_configured() {
    let Some(root) = std::env::var_os("GO_SURFACE_CORPUS") else {
        eprintln!("GO_SURFACE_CORPUS not set; skipping corpus test");
        return;
    };

    let config = Config::syntax_only();
    let mut total = 0usize;
    let mut declarations = 0usize;

    for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }
        // testdata holds deliberately broken sources
        if path.components().any(|c| c.as_os_str() == "testdata") {
            continue;
        }
        let Ok(src) = std::fs::read_to_string(path) else {
            continue;
        };

        total += 1;
        match parse_source(&src, &path.to_string_lossy(), &config) {
            Ok(file) => {
                declarations += file.constants.len()
                    + file.variables.len()
                    + file.structs.len()
                    + file.interfaces.len()
                    + file.methods.len();
            }
            Err(err) => panic!("corpus extraction failed after {total} files: {err}"),
        }
    }

    eprintln!("extracted {declarations} exported declarations from {total} Go files");
}

#![no_main]

use go_surface::{Extractor, TypeResolver};
use go_surface_syntax::{parse_source, ParseOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let src = String::from_utf8_lossy(data);

    match parse_source("fuzz.go", src.as_ref(), ParseOptions::default()) {
        Ok(file) => {
            // every recorded span must slice the source
            for (id, _) in file.arena.types.iter() {
                let span = file.arena.types.span(id);
                assert!(span.start <= span.end && span.end as usize <= src.len());
            }
            let out = Extractor::new(TypeResolver::syntax(&file)).extract();
            assert_eq!(out.package, file.package_name());
        }
        Err(failure) => {
            assert!(!failure.diags.is_empty());
            assert!(failure.line >= 1 && failure.column >= 1);
        }
    }
});

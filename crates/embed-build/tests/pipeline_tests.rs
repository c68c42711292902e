//! End-to-end pipeline tests
//!
//! Builds a scratch project against a fake Arduino distribution with a
//! recording toolchain, then checks which external commands ran.

mod common;

use common::{Fixture, RecordingToolchain};
use embed_build::{BuildError, DirKind, Pipeline, Target, Tool};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::rc::Rc;

fn pipeline(fixture: &Fixture, libraries: &[&str]) -> (Pipeline, Rc<RecordingToolchain>) {
    let toolchain = Rc::new(RecordingToolchain::new());
    let pipeline = Pipeline::new(
        fixture.config(libraries.iter().copied()),
        Rc::clone(&toolchain) as Rc<dyn embed_build::Toolchain>,
    );
    (pipeline, toolchain)
}

fn full_build_tools() -> Vec<Tool> {
    vec![
        Tool::CxxCompiler,
        Tool::CCompiler,
        Tool::CxxCompiler,
        Tool::CCompiler,
        Tool::CxxCompiler,
        Tool::Archiver,
        Tool::Linker,
        Tool::Size,
        Tool::ObjCopy,
    ]
}

#[test]
fn test_fresh_checkout_runs_every_step_once() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);

    pipeline.run(Target::Hex).unwrap();

    assert_eq!(toolchain.tools(), full_build_tools());
    let core = fixture.core_dir();
    assert_eq!(
        toolchain.compiled_sources(),
        vec![
            fixture.path("src/main.cpp"),
            fixture.path("src/util.c"),
            core.join("HardwareSerial.cpp"),
            core.join("wiring.c"),
            core.join("wiring_pulse.S"),
        ]
    );

    let build = fixture.build_dir();
    assert!(build.join("main.o").exists());
    assert!(build.join("arduino/wiring.o").exists());
    assert!(build.join("libcore.a").exists());
    assert!(build.join("main.elf").exists());
    assert!(build.join("main.hex").exists());
}

#[test]
fn test_second_build_runs_nothing() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);

    pipeline.run(Target::Hex).unwrap();
    toolchain.clear();

    let report = pipeline.run(Target::Hex).unwrap();
    assert_eq!(toolchain.count(), 0);
    assert!(report.is_noop());
}

#[test]
fn test_touching_project_source_relinks_only() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);

    pipeline.run(Target::Hex).unwrap();
    fixture.age_tree(&fixture.build_dir(), 500);
    fixture.set_age(&fixture.path("src/main.cpp"), 100);
    toolchain.clear();

    pipeline.run(Target::Hex).unwrap();

    assert_eq!(
        toolchain.tools(),
        vec![Tool::CxxCompiler, Tool::Linker, Tool::Size, Tool::ObjCopy]
    );
    assert_eq!(toolchain.compiled_sources(), vec![fixture.path("src/main.cpp")]);
}

#[test]
fn test_touching_library_source_rebuilds_archive() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);

    pipeline.run(Target::Hex).unwrap();
    fixture.age_tree(&fixture.build_dir(), 500);
    fixture.set_age(&fixture.core_dir().join("wiring.c"), 100);
    toolchain.clear();

    pipeline.run(Target::Hex).unwrap();

    assert_eq!(
        toolchain.tools(),
        vec![
            Tool::CCompiler,
            Tool::Archiver,
            Tool::Linker,
            Tool::Size,
            Tool::ObjCopy
        ]
    );
    assert_eq!(
        toolchain.compiled_sources(),
        vec![fixture.core_dir().join("wiring.c")]
    );
}

#[test]
fn test_clean_then_build_matches_fresh_checkout() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);

    pipeline.run(Target::Hex).unwrap();
    pipeline.run(Target::Clean).unwrap();
    assert!(!fixture.build_dir().exists());

    toolchain.clear();
    pipeline.run(Target::Hex).unwrap();
    assert_eq!(toolchain.tools(), full_build_tools());
}

#[test]
fn test_clean_without_build_dir() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);

    let report = pipeline.run(Target::Clean).unwrap();
    assert_eq!(report.executed, vec!["clean"]);
    assert_eq!(toolchain.count(), 0);
}

#[test]
fn test_unknown_library_fails_before_any_tool_runs() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino", "NoSuchLib"]);

    match pipeline.run(Target::Hex) {
        Err(BuildError::ResolutionFailure { library, kind, .. }) => {
            assert_eq!(library, "NoSuchLib");
            assert_eq!(kind, DirKind::Include);
        }
        other => panic!("Expected ResolutionFailure, got {:?}", other),
    }
    assert_eq!(toolchain.count(), 0);
}

#[test]
fn test_unknown_library_without_project_sources() {
    let fixture = Fixture::new();
    std::fs::remove_dir_all(fixture.path("src")).unwrap();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino", "NoSuchLib"]);

    match pipeline.run(Target::Hex) {
        Err(BuildError::ResolutionFailure { library, kind, .. }) => {
            assert_eq!(library, "NoSuchLib");
            assert_eq!(kind, DirKind::Source);
        }
        other => panic!("Expected ResolutionFailure, got {:?}", other),
    }
    assert_eq!(toolchain.count(), 0);
}

#[test]
fn test_sources_sharing_a_stem_are_rejected() {
    let fixture = Fixture::new();
    fixture.write("src/main.c", "int main(void) { return 0; }\n");
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);

    match pipeline.run(Target::Hex) {
        Err(BuildError::DuplicateObject {
            object,
            first,
            second,
        }) => {
            assert_eq!(object, fixture.build_dir().join("main.o"));
            assert_eq!(first, fixture.path("src/main.c"));
            assert_eq!(second, fixture.path("src/main.cpp"));
        }
        other => panic!("Expected DuplicateObject, got {:?}", other),
    }
    assert_eq!(toolchain.count(), 0);
    assert!(!fixture.build_dir().join("main.elf").exists());
}

#[test]
fn test_failed_compile_stops_pipeline() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);
    toolchain.fail_on("util.c");

    let result = pipeline.run(Target::Hex);
    assert!(matches!(result, Err(BuildError::ToolchainFailure { .. })));

    assert_eq!(toolchain.tools(), vec![Tool::CxxCompiler, Tool::CCompiler]);
    assert!(!fixture.build_dir().join("libcore.a").exists());
    assert!(!fixture.build_dir().join("main.elf").exists());
    assert!(!fixture.build_dir().join("main.hex").exists());
}

#[test]
fn test_install_uploads_after_hex() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);

    pipeline.run(Target::Install).unwrap();

    let calls = toolchain.calls();
    let upload = calls.last().unwrap();
    assert_eq!(upload.tool, Tool::Uploader);
    assert_eq!(upload.program, "avrdude");
    let hex = fixture.build_dir().join("main.hex");
    assert_eq!(
        upload.args,
        vec![
            "-V".to_string(),
            "-p".to_string(),
            "atmega328p".to_string(),
            "-D".to_string(),
            "-c".to_string(),
            "arduino".to_string(),
            "-P".to_string(),
            "/dev/ttyUSB9".to_string(),
            "-b".to_string(),
            "115200".to_string(),
            "-U".to_string(),
            format!("flash:w:{}:i", hex.display()),
        ]
    );

    // The image is fresh now; installing again only uploads
    toolchain.clear();
    pipeline.run(Target::Install).unwrap();
    assert_eq!(toolchain.tools(), vec![Tool::Uploader]);
}

#[test]
fn test_project_local_library_is_compiled_and_included() {
    let fixture = Fixture::new();
    fixture.write("libraries/Blinker/Blinker.cpp", "");
    fixture.write("libraries/Blinker/Blinker.h", "");
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino", "Blinker"]);

    pipeline.run(Target::Hex).unwrap();

    assert!(toolchain
        .compiled_sources()
        .contains(&fixture.path("libraries/Blinker/Blinker.cpp")));
    assert!(fixture.build_dir().join("Blinker/Blinker.o").exists());

    let include = format!("-I{}", fixture.path("libraries/Blinker").display());
    let main_compile = &toolchain.calls()[0];
    assert!(main_compile.args.contains(&include));

    let archive = toolchain
        .calls()
        .into_iter()
        .find(|c| c.tool == Tool::Archiver)
        .unwrap();
    assert!(archive
        .args
        .contains(&fixture.build_dir().join("Blinker/Blinker.o").display().to_string()));
}

#[test]
fn test_single_object_can_be_requested() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);

    let object: PathBuf = fixture.build_dir().join("arduino/wiring_pulse.o");
    pipeline.invoke(object.to_str().unwrap()).unwrap();

    assert_eq!(toolchain.tools(), vec![Tool::CxxCompiler]);
    assert_eq!(
        toolchain.compiled_sources(),
        vec![fixture.core_dir().join("wiring_pulse.S")]
    );
    assert!(object.exists());
}

#[test]
fn test_object_without_source_has_no_rule() {
    let fixture = Fixture::new();
    let (pipeline, toolchain) = pipeline(&fixture, &["arduino"]);

    let object = fixture.build_dir().join("ghost.o");
    match pipeline.invoke(object.to_str().unwrap()) {
        Err(BuildError::NoRule { target }) => assert_eq!(target, fixture.path("src/ghost.cpp")),
        other => panic!("Expected NoRule, got {:?}", other),
    }
    assert_eq!(toolchain.count(), 0);
}

#[test]
fn test_tasks_are_described() {
    let fixture = Fixture::new();
    let (pipeline, _) = pipeline(&fixture, &["arduino"]);

    let expected: Vec<(&str, Option<&str>)> = Target::all()
        .iter()
        .map(|t| (t.name(), Some(t.description())))
        .collect();
    assert_eq!(pipeline.graph().task_descriptions(), expected);
}

//! Shared fixtures for pipeline tests

#![allow(dead_code)]

use embed_build::{BuildConfig, BuildError, BuildResult, Invocation, Tool, Toolchain};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Toolchain double that records every invocation and writes the files the
/// real program would have produced
#[derive(Default)]
pub struct RecordingToolchain {
    calls: RefCell<Vec<Invocation>>,
    fail_on: RefCell<Option<String>>,
}

impl RecordingToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any invocation whose arguments mention `needle`
    pub fn fail_on(&self, needle: &str) {
        *self.fail_on.borrow_mut() = Some(needle.to_string());
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.calls.borrow().iter().map(|c| c.tool).collect()
    }

    pub fn count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Source file of every compile, in order
    pub fn compiled_sources(&self) -> Vec<PathBuf> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c.tool, Tool::CCompiler | Tool::CxxCompiler))
            .filter_map(|c| {
                let pos = c.args.iter().position(|a| a == "-c")?;
                Some(PathBuf::from(&c.args[pos - 1]))
            })
            .collect()
    }
}

impl Toolchain for RecordingToolchain {
    fn run(&self, invocation: &Invocation) -> BuildResult<()> {
        self.calls.borrow_mut().push(invocation.clone());

        if let Some(needle) = self.fail_on.borrow().as_deref() {
            if invocation.args.iter().any(|a| a.contains(needle)) {
                return Err(BuildError::ToolchainFailure {
                    program: invocation.program.clone(),
                    reason: "exit status 1".to_string(),
                });
            }
        }

        let output = match invocation.tool {
            Tool::CCompiler | Tool::CxxCompiler | Tool::Linker => invocation
                .args
                .iter()
                .position(|a| a == "-o")
                .map(|pos| invocation.args[pos + 1].clone()),
            Tool::Archiver => invocation.args.get(1).cloned(),
            Tool::ObjCopy => invocation.args.last().cloned(),
            Tool::Size | Tool::Uploader => None,
        };
        if let Some(output) = output {
            fs::write(&output, invocation.to_string()).map_err(|e| BuildError::io(&output, e))?;
        }
        Ok(())
    }
}

/// Scratch project with an Arduino distribution next to it
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Project with `src/main.cpp`, `src/util.c` and a three-file core
    pub fn new() -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
        };
        fixture.write("src/main.cpp", "void setup() {}\nvoid loop() {}\n");
        fixture.write("src/util.c", "int util(void) { return 1; }\n");
        fixture.write("include/util.h", "int util(void);\n");
        let core = fixture.core_dir();
        fixture.write_at(&core.join("wiring.c"), "");
        fixture.write_at(&core.join("HardwareSerial.cpp"), "");
        fixture.write_at(&core.join("wiring_pulse.S"), "");
        fixture.write_at(&core.join("Arduino.h"), "");
        fixture.age_tree(fixture.root(), 1000);
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn toolchain_root(&self) -> PathBuf {
        self.root().join("arduino-1.8.19")
    }

    pub fn core_dir(&self) -> PathBuf {
        self.toolchain_root()
            .join("hardware/arduino/avr/cores/arduino")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root().join("build")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn config<I, S>(&self, libraries: I) -> BuildConfig
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BuildConfig::builder()
            .project_root(self.root())
            .toolchain_root(self.toolchain_root())
            .libraries(libraries)
            .port("/dev/ttyUSB9")
            .build()
    }

    pub fn write(&self, relative: &str, contents: &str) {
        self.write_at(&self.path(relative), contents);
    }

    pub fn write_at(&self, path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// Set the mtime of a file to `secs_ago` seconds in the past
    pub fn set_age(&self, path: &Path, secs_ago: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
            .unwrap();
    }

    /// Age every file below `dir`
    pub fn age_tree(&self, dir: &Path, secs_ago: u64) {
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                self.set_age(entry.path(), secs_ago);
            }
        }
    }
}
